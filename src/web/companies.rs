use crate::db;
use crate::state::SharedState;
use crate::web::error::ApiError;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub issuer_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CompanyPayload {
    pub name: String,
    pub issuer_id: Uuid,
    pub logo_url: Option<String>,
    pub description: Option<String>,
}

impl CompanyPayload {
    fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::BadRequest("\"name\" is required".into()));
        }
        if let Some(url) = self.logo_url() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ApiError::BadRequest(
                    "\"logo_url\" must be a valid uri".into(),
                ));
            }
        }
        Ok(())
    }

    fn logo_url(&self) -> Option<&str> {
        self.logo_url.as_deref().filter(|u| !u.is_empty())
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }
}

#[derive(Serialize)]
struct IssuerBrief {
    id: Uuid,
    name: String,
}

#[derive(Serialize)]
struct CompanyView {
    id: Uuid,
    issuer_id: Uuid,
    name: String,
    logo_url: Option<String>,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    issuer: IssuerBrief,
}

#[derive(Serialize)]
struct CompanyDetail {
    #[serde(flatten)]
    company: db::Company,
    issuer: db::Issuer,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list_companies).post(create_company))
        .route(
            "/:id",
            get(get_company).put(update_company).delete(delete_company),
        )
        .with_state(state)
}

async fn list_companies(
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<CompanyView>>, ApiError> {
    let companies = db::list_companies(&state.pool, params.issuer_id)
        .await
        .map_err(ApiError::Internal)?;

    let views = companies
        .into_iter()
        .map(|c| CompanyView {
            id: c.id,
            issuer_id: c.issuer_id,
            name: c.name,
            logo_url: c.logo_url,
            description: c.description,
            created_at: c.created_at,
            updated_at: c.updated_at,
            issuer: IssuerBrief {
                id: c.issuer_id,
                name: c.issuer_name,
            },
        })
        .collect();
    Ok(Json(views))
}

async fn get_company(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CompanyDetail>, ApiError> {
    let company = db::get_company(&state.pool, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Company"))?;
    let issuer = db::get_issuer(&state.pool, company.issuer_id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Issuer"))?;
    Ok(Json(CompanyDetail { company, issuer }))
}

async fn create_company(
    State(state): State<SharedState>,
    Json(payload): Json<CompanyPayload>,
) -> Result<(StatusCode, Json<db::Company>), ApiError> {
    payload.validate()?;
    ensure_issuer_exists(&state, payload.issuer_id).await?;

    let company = db::insert_company(
        &state.pool,
        payload.issuer_id,
        payload.name.trim(),
        payload.logo_url(),
        payload.description(),
    )
    .await
    .map_err(ApiError::Internal)?;
    Ok((StatusCode::CREATED, Json(company)))
}

async fn update_company(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CompanyPayload>,
) -> Result<Json<db::Company>, ApiError> {
    payload.validate()?;
    ensure_issuer_exists(&state, payload.issuer_id).await?;

    let company = db::update_company(
        &state.pool,
        id,
        payload.issuer_id,
        payload.name.trim(),
        payload.logo_url(),
        payload.description(),
    )
    .await
    .map_err(ApiError::Internal)?
    .ok_or_else(|| ApiError::not_found("Company"))?;
    Ok(Json(company))
}

async fn delete_company(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match db::delete_company(&state.pool, id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(ApiError::not_found("Company")),
        Err(e) if db::is_fk_violation(&e) => Err(ApiError::BadRequest(
            "Cannot delete company because it has recorded responses or reports.".into(),
        )),
        Err(e) => Err(ApiError::Internal(e)),
    }
}

async fn ensure_issuer_exists(state: &SharedState, issuer_id: Uuid) -> Result<(), ApiError> {
    db::get_issuer(&state.pool, issuer_id)
        .await
        .map_err(ApiError::Internal)?
        .map(|_| ())
        .ok_or_else(|| ApiError::BadRequest("Associated issuer not found".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(logo_url: Option<&str>) -> CompanyPayload {
        CompanyPayload {
            name: "TechCorp Inc.".into(),
            issuer_id: Uuid::nil(),
            logo_url: logo_url.map(str::to_string),
            description: None,
        }
    }

    #[test]
    fn rejects_non_http_logo_url() {
        assert!(payload(Some("ftp://logo.png")).validate().is_err());
        assert!(payload(Some("https://cdn.example.com/logo.png"))
            .validate()
            .is_ok());
    }

    #[test]
    fn empty_logo_url_is_treated_as_absent() {
        let p = payload(Some(""));
        assert!(p.validate().is_ok());
        assert_eq!(p.logo_url(), None);
    }
}
