use crate::db;
use crate::domain::models::UserRole;
use crate::middleware::RateLimiter;
use crate::state::SharedState;
use crate::web::error::ApiError;
use crate::web::session::{self, UserSession};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, SaltString},
    Argon2, PasswordVerifier,
};
use axum::{
    extract::{ConnectInfo, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use uuid::Uuid;

// Brute-force protection: 5 attempts per minute per IP.
static LOGIN_RATE_LIMITER: Lazy<RateLimiter> = Lazy::new(|| RateLimiter::new(5, 60));

/// Drop stale limiter entries; driven by the maintenance task in `main`.
pub async fn prune_login_limiter() {
    LOGIN_RATE_LIMITER.prune().await;
}

#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    pub email: String,
    pub password: String,
    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserView,
    pub token: String,
}

impl RegisterPayload {
    fn validate(&self) -> Result<(), ApiError> {
        let email = normalize_email(&self.email);
        if email.is_empty() || !email.contains('@') {
            return Err(ApiError::BadRequest("A valid email is required.".into()));
        }
        if self.password.len() < 8 {
            return Err(ApiError::BadRequest(
                "Password must be at least 8 characters long.".into(),
            ));
        }
        Ok(())
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/", get(list_users))
        .route("/:id", get(get_user).delete(delete_user))
        .with_state(state)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(rand_core::OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("failed to hash password: {e}")))
}

fn user_view(user: db::DbUser) -> UserView {
    UserView {
        id: user.id,
        email: user.email,
        role: user.role,
        created_at: user.created_at,
    }
}

async fn register(
    State(state): State<SharedState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    payload.validate()?;
    let email = normalize_email(&payload.email);

    if db::find_user_by_email(&state.pool, &email)
        .await
        .map_err(ApiError::Internal)?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "User with this email already exists.".into(),
        ));
    }

    let hash = hash_password(&payload.password)?;
    let role = payload.role.unwrap_or(UserRole::User);

    let user = match db::insert_user(&state.pool, &email, &hash, role).await {
        Ok(user) => user,
        Err(e) if db::is_unique_violation(&e) => {
            return Err(ApiError::Conflict(
                "User with this email already exists.".into(),
            ));
        }
        Err(e) => return Err(ApiError::Internal(e)),
    };

    let token = session::sign_session(user.id, user.role, &state.session_key)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("failed to sign session: {e}")))?;

    tracing::info!("registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully.".into(),
            user: user_view(user),
            token,
        }),
    ))
}

async fn login(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<SharedState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<AuthResponse>, ApiError> {
    let ip = addr.ip().to_string();
    if !LOGIN_RATE_LIMITER.check(&ip).await {
        tracing::warn!("login rate limit exceeded for IP {}", ip);
        return Err(ApiError::TooManyRequests);
    }

    let email = normalize_email(&payload.email);
    let user = db::find_user_by_email(&state.pool, &email)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::Unauthorized("Incorrect email or password.".into()))?;

    let parsed_hash = PasswordHash::new(&user.hash)
        .map_err(|_| ApiError::Unauthorized("Incorrect email or password.".into()))?;
    Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized("Incorrect email or password.".into()))?;

    let token = session::sign_session(user.id, user.role, &state.session_key)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("failed to sign session: {e}")))?;

    Ok(Json(AuthResponse {
        message: "Login successful.".into(),
        user: user_view(user),
        token,
    }))
}

async fn list_users(
    session: UserSession,
    State(state): State<SharedState>,
) -> Result<Json<Vec<UserView>>, ApiError> {
    session.require_admin()?;

    let users = db::list_users(&state.pool)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(users.into_iter().map(user_view).collect()))
}

async fn get_user(
    session: UserSession,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserView>, ApiError> {
    // admins can read anyone, users only themselves
    if session.user_id != id {
        session.require_admin()?;
    }

    let user = db::find_user_by_id(&state.pool, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("User"))?;
    Ok(Json(user_view(user)))
}

async fn delete_user(
    session: UserSession,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    session.require_admin()?;

    if session.user_id == id {
        return Err(ApiError::BadRequest(
            "You cannot delete your own account.".into(),
        ));
    }

    let deleted = db::delete_user(&state.pool, id)
        .await
        .map_err(ApiError::Internal)?;
    if !deleted {
        return Err(ApiError::not_found("User"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_payload_rejects_bad_inputs() {
        let short = RegisterPayload {
            email: "a@b.co".into(),
            password: "short".into(),
            role: None,
        };
        assert!(short.validate().is_err());

        let bad_email = RegisterPayload {
            email: "not-an-email".into(),
            password: "long enough".into(),
            role: None,
        };
        assert!(bad_email.validate().is_err());

        let ok = RegisterPayload {
            email: "Admin@Example.com ".into(),
            password: "long enough".into(),
            role: Some(UserRole::Admin),
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("correct horse battery").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default()
            .verify_password(b"correct horse battery", &parsed)
            .is_ok());
        assert!(Argon2::default()
            .verify_password(b"wrong password", &parsed)
            .is_err());
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  User@EXAMPLE.com "), "user@example.com");
    }
}
