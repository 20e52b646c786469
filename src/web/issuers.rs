use crate::db;
use crate::state::SharedState;
use crate::web::error::ApiError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct IssuerPayload {
    pub name: String,
    pub description: Option<String>,
}

impl IssuerPayload {
    fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::BadRequest("\"name\" is required".into()));
        }
        Ok(())
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }
}

#[derive(Serialize)]
struct IssuerDetail {
    #[serde(flatten)]
    issuer: db::Issuer,
    companies: Vec<db::Company>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list_issuers).post(create_issuer))
        .route(
            "/:id",
            get(get_issuer).put(update_issuer).delete(delete_issuer),
        )
        .with_state(state)
}

async fn list_issuers(State(state): State<SharedState>) -> Result<Json<Vec<db::Issuer>>, ApiError> {
    let issuers = db::list_issuers(&state.pool)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(issuers))
}

async fn get_issuer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<IssuerDetail>, ApiError> {
    let issuer = db::get_issuer(&state.pool, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Issuer"))?;
    let companies = db::companies_for_issuer(&state.pool, id)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(IssuerDetail { issuer, companies }))
}

async fn create_issuer(
    State(state): State<SharedState>,
    Json(payload): Json<IssuerPayload>,
) -> Result<(StatusCode, Json<db::Issuer>), ApiError> {
    payload.validate()?;
    let issuer = db::insert_issuer(&state.pool, payload.name.trim(), payload.description())
        .await
        .map_err(ApiError::Internal)?;
    Ok((StatusCode::CREATED, Json(issuer)))
}

async fn update_issuer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<IssuerPayload>,
) -> Result<Json<db::Issuer>, ApiError> {
    payload.validate()?;
    let issuer = db::update_issuer(&state.pool, id, payload.name.trim(), payload.description())
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Issuer"))?;
    Ok(Json(issuer))
}

async fn delete_issuer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match db::delete_issuer(&state.pool, id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(ApiError::not_found("Issuer")),
        Err(e) if db::is_fk_violation(&e) => Err(ApiError::BadRequest(
            "Cannot delete issuer because it is associated with companies.".into(),
        )),
        Err(e) => Err(ApiError::Internal(e)),
    }
}
