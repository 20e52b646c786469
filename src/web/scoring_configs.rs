use crate::db;
use crate::domain::models::{AggregationMethod, Section};
use crate::state::SharedState;
use crate::web::error::ApiError;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub questionnaire_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ScoringConfigPayload {
    pub questionnaire_id: Uuid,
    pub section: Section,
    pub aggregation_method: AggregationMethod,
    pub weight: f64,
}

impl ScoringConfigPayload {
    fn validate(&self) -> Result<(), ApiError> {
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(ApiError::BadRequest(
                "\"weight\" must be a non-negative number".into(),
            ));
        }
        Ok(())
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list_configs).post(create_config))
        .route(
            "/:id",
            get(get_config).put(update_config).delete(delete_config),
        )
        .with_state(state)
}

fn duplicate_section_error(section: Section) -> ApiError {
    ApiError::Conflict(format!(
        "A scoring configuration for section '{section}' already exists for this questionnaire."
    ))
}

async fn list_configs(
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<db::ScoringConfig>>, ApiError> {
    let configs = db::list_scoring_configs(&state.pool, params.questionnaire_id)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(configs))
}

async fn get_config(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<db::ScoringConfig>, ApiError> {
    let config = db::get_scoring_config(&state.pool, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Scoring config"))?;
    Ok(Json(config))
}

async fn create_config(
    State(state): State<SharedState>,
    Json(payload): Json<ScoringConfigPayload>,
) -> Result<(StatusCode, Json<db::ScoringConfig>), ApiError> {
    payload.validate()?;
    ensure_questionnaire_exists(&state, payload.questionnaire_id).await?;

    if db::find_scoring_config(&state.pool, payload.questionnaire_id, payload.section)
        .await
        .map_err(ApiError::Internal)?
        .is_some()
    {
        return Err(duplicate_section_error(payload.section));
    }

    let config = match db::insert_scoring_config(
        &state.pool,
        payload.questionnaire_id,
        payload.section,
        payload.aggregation_method,
        payload.weight,
    )
    .await
    {
        Ok(config) => config,
        // a concurrent create can still hit the unique constraint
        Err(e) if db::is_unique_violation(&e) => {
            return Err(duplicate_section_error(payload.section))
        }
        Err(e) => return Err(ApiError::Internal(e)),
    };

    Ok((StatusCode::CREATED, Json(config)))
}

async fn update_config(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ScoringConfigPayload>,
) -> Result<Json<db::ScoringConfig>, ApiError> {
    payload.validate()?;
    ensure_questionnaire_exists(&state, payload.questionnaire_id).await?;

    let current = db::get_scoring_config(&state.pool, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Scoring config"))?;

    if payload.questionnaire_id != current.questionnaire_id || payload.section != current.section {
        if let Some(existing) =
            db::find_scoring_config(&state.pool, payload.questionnaire_id, payload.section)
                .await
                .map_err(ApiError::Internal)?
        {
            if existing.id != id {
                return Err(duplicate_section_error(payload.section));
            }
        }
    }

    let config = match db::update_scoring_config(
        &state.pool,
        id,
        payload.questionnaire_id,
        payload.section,
        payload.aggregation_method,
        payload.weight,
    )
    .await
    {
        Ok(Some(config)) => config,
        Ok(None) => return Err(ApiError::not_found("Scoring config")),
        Err(e) if db::is_unique_violation(&e) => {
            return Err(duplicate_section_error(payload.section))
        }
        Err(e) => return Err(ApiError::Internal(e)),
    };

    Ok(Json(config))
}

async fn delete_config(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = db::delete_scoring_config(&state.pool, id)
        .await
        .map_err(ApiError::Internal)?;
    if !deleted {
        return Err(ApiError::not_found("Scoring config"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn ensure_questionnaire_exists(
    state: &SharedState,
    questionnaire_id: Uuid,
) -> Result<(), ApiError> {
    db::get_questionnaire(&state.pool, questionnaire_id)
        .await
        .map_err(ApiError::Internal)?
        .map(|_| ())
        .ok_or_else(|| ApiError::BadRequest("Associated questionnaire not found".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_must_be_non_negative_and_finite() {
        let mut payload = ScoringConfigPayload {
            questionnaire_id: Uuid::nil(),
            section: Section::Environmental,
            aggregation_method: AggregationMethod::WeightedAverage,
            weight: 0.4,
        };
        assert!(payload.validate().is_ok());

        payload.weight = -0.1;
        assert!(payload.validate().is_err());

        payload.weight = f64::NAN;
        assert!(payload.validate().is_err());

        payload.weight = 0.0;
        assert!(payload.validate().is_ok());
    }
}
