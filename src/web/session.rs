use crate::db;
use crate::domain::models::UserRole;
use crate::web::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub struct SessionClaims {
    pub user_id: Uuid,
    pub role: UserRole,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid token format")]
    Invalid,
    #[error("signature mismatch")]
    Signature,
    #[error("expired")]
    Expired,
    #[error("bad role")]
    Role,
}

pub fn sign_session(user_id: Uuid, role: UserRole, key: &[u8]) -> Result<String, SessionError> {
    sign_with_expiry(user_id, role, key, Duration::hours(SESSION_TTL_HOURS))
}

fn sign_with_expiry(
    user_id: Uuid,
    role: UserRole,
    key: &[u8],
    ttl: Duration,
) -> Result<String, SessionError> {
    let exp = Utc::now() + ttl;
    let payload = format!("{}|{}|{}", user_id, role.as_str(), exp.timestamp());
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SessionError::Invalid)?;
    mac.update(payload.as_bytes());
    let sig = mac.finalize().into_bytes();
    Ok(format!(
        "{}.{}",
        general_purpose::STANDARD.encode(payload.as_bytes()),
        general_purpose::STANDARD.encode(sig)
    ))
}

pub fn verify_session(token: &str, key: &[u8]) -> Result<SessionClaims, SessionError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 2 {
        return Err(SessionError::Invalid);
    }
    let payload_bytes = general_purpose::STANDARD
        .decode(parts[0])
        .map_err(|_| SessionError::Invalid)?;
    let sig_bytes = general_purpose::STANDARD
        .decode(parts[1])
        .map_err(|_| SessionError::Invalid)?;

    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SessionError::Invalid)?;
    mac.update(&payload_bytes);
    mac.verify_slice(&sig_bytes)
        .map_err(|_| SessionError::Signature)?;

    let payload = String::from_utf8(payload_bytes).map_err(|_| SessionError::Invalid)?;
    let pieces: Vec<&str> = payload.split('|').collect();
    if pieces.len() != 3 {
        return Err(SessionError::Invalid);
    }
    let user_id = Uuid::parse_str(pieces[0]).map_err(|_| SessionError::Invalid)?;
    let role = UserRole::try_from(pieces[1]).map_err(|_| SessionError::Role)?;
    let exp: i64 = pieces[2].parse().map_err(|_| SessionError::Invalid)?;
    if Utc::now().timestamp() > exp {
        return Err(SessionError::Expired);
    }
    Ok(SessionClaims { user_id, role, exp })
}

/// Token from the Authorization bearer header, or a `session` cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get(axum::http::header::AUTHORIZATION) {
        if let Ok(val) = auth.to_str() {
            if let Some(bearer) = val.strip_prefix("Bearer ") {
                return Some(bearer.trim().to_string());
            }
        }
    }
    if let Some(cookie) = headers.get(axum::http::header::COOKIE) {
        if let Ok(val) = cookie.to_str() {
            for pair in val.split(';') {
                if let Some(rest) = pair.trim().strip_prefix("session=") {
                    return Some(rest.to_string());
                }
            }
        }
    }
    None
}

/// Axum extractor for an authenticated caller. Verifies the token and that
/// the user still exists before letting the handler run.
pub struct UserSession {
    pub user_id: Uuid,
    pub role: UserRole,
}

#[async_trait]
impl<S> FromRequestParts<S> for UserSession
where
    S: Send + Sync,
    crate::state::SharedState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let shared = crate::state::SharedState::from_ref(state);

        let token = extract_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Authentication token required.".into()))?;

        let claims = verify_session(&token, &shared.session_key).map_err(|e| {
            tracing::warn!("session verification failed: {}", e);
            ApiError::Unauthorized("Invalid or expired token.".into())
        })?;

        let user = db::find_user_by_id(&shared.pool, claims.user_id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| {
                ApiError::Unauthorized("User associated with this token no longer exists.".into())
            })?;

        // the database is authoritative; a stale token role only matters for logging
        if user.role != claims.role {
            tracing::debug!("role changed since token was issued for user {}", user.id);
        }

        Ok(UserSession {
            user_id: user.id,
            role: user.role,
        })
    }
}

impl UserSession {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role != UserRole::Admin {
            return Err(ApiError::Forbidden(
                "You do not have permission to perform this action.".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn sign_verify_round_trip() {
        let user_id = Uuid::new_v4();
        let token = sign_session(user_id, UserRole::Admin, KEY).unwrap();
        let claims = verify_session(&token, KEY).unwrap();
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.role, UserRole::Admin);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = sign_session(Uuid::new_v4(), UserRole::User, KEY).unwrap();
        let forged = sign_session(Uuid::new_v4(), UserRole::Admin, KEY).unwrap();
        // graft the forged payload onto the original signature
        let mixed = format!(
            "{}.{}",
            forged.split('.').next().unwrap(),
            token.split('.').nth(1).unwrap()
        );
        assert!(matches!(
            verify_session(&mixed, KEY),
            Err(SessionError::Signature)
        ));
    }

    #[test]
    fn wrong_key_is_rejected() {
        let token = sign_session(Uuid::new_v4(), UserRole::User, KEY).unwrap();
        assert!(matches!(
            verify_session(&token, b"another-key-another-key-another!"),
            Err(SessionError::Signature)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token =
            sign_with_expiry(Uuid::new_v4(), UserRole::User, KEY, Duration::hours(-1)).unwrap();
        assert!(matches!(
            verify_session(&token, KEY),
            Err(SessionError::Expired)
        ));
    }

    #[test]
    fn token_extraction_prefers_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Bearer abc.def".parse().unwrap(),
        );
        headers.insert(
            axum::http::header::COOKIE,
            "theme=dark; session=xyz.123".parse().unwrap(),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("abc.def"));

        headers.remove(axum::http::header::AUTHORIZATION);
        assert_eq!(extract_token(&headers).as_deref(), Some("xyz.123"));
    }
}
