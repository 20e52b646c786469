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
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct QuestionnairePayload {
    pub name: String,
    pub description: Option<String>,
}

impl QuestionnairePayload {
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
struct QuestionWithOptions {
    #[serde(flatten)]
    question: db::Question,
    options: Vec<db::QuestionOption>,
}

#[derive(Serialize)]
struct QuestionnaireDetail {
    #[serde(flatten)]
    questionnaire: db::Questionnaire,
    questions: Vec<QuestionWithOptions>,
    scoring_configs: Vec<db::ScoringConfig>,
    reports: Vec<db::Report>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list_questionnaires).post(create_questionnaire))
        .route(
            "/:id",
            get(get_questionnaire)
                .put(update_questionnaire)
                .delete(delete_questionnaire),
        )
        .with_state(state)
}

async fn list_questionnaires(
    State(state): State<SharedState>,
) -> Result<Json<Vec<db::QuestionnaireSummary>>, ApiError> {
    let questionnaires = db::list_questionnaires(&state.pool)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(questionnaires))
}

async fn get_questionnaire(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuestionnaireDetail>, ApiError> {
    let questionnaire = db::get_questionnaire(&state.pool, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Questionnaire"))?;

    let questions = db::list_questions(&state.pool, Some(id))
        .await
        .map_err(ApiError::Internal)?;
    let question_ids: Vec<Uuid> = questions.iter().map(|q| q.id).collect();
    let mut options_by_question: HashMap<Uuid, Vec<db::QuestionOption>> = HashMap::new();
    for option in db::options_for_questions(&state.pool, &question_ids)
        .await
        .map_err(ApiError::Internal)?
    {
        options_by_question
            .entry(option.question_id)
            .or_default()
            .push(option);
    }

    let questions = questions
        .into_iter()
        .map(|question| QuestionWithOptions {
            options: options_by_question.remove(&question.id).unwrap_or_default(),
            question,
        })
        .collect();

    let scoring_configs = db::list_scoring_configs(&state.pool, Some(id))
        .await
        .map_err(ApiError::Internal)?;
    let reports = db::reports_for_questionnaire(&state.pool, id)
        .await
        .map_err(ApiError::Internal)?;

    Ok(Json(QuestionnaireDetail {
        questionnaire,
        questions,
        scoring_configs,
        reports,
    }))
}

async fn create_questionnaire(
    State(state): State<SharedState>,
    Json(payload): Json<QuestionnairePayload>,
) -> Result<(StatusCode, Json<db::Questionnaire>), ApiError> {
    payload.validate()?;
    let questionnaire =
        db::insert_questionnaire(&state.pool, payload.name.trim(), payload.description())
            .await
            .map_err(ApiError::Internal)?;
    Ok((StatusCode::CREATED, Json(questionnaire)))
}

async fn update_questionnaire(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuestionnairePayload>,
) -> Result<Json<db::Questionnaire>, ApiError> {
    payload.validate()?;
    let questionnaire =
        db::update_questionnaire(&state.pool, id, payload.name.trim(), payload.description())
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::not_found("Questionnaire"))?;
    Ok(Json(questionnaire))
}

async fn delete_questionnaire(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match db::delete_questionnaire(&state.pool, id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(ApiError::not_found("Questionnaire")),
        Err(e) if db::is_fk_violation(&e) => Err(ApiError::BadRequest(
            "Cannot delete questionnaire because it is associated with questions, scoring configs, or reports."
                .into(),
        )),
        Err(e) => Err(ApiError::Internal(e)),
    }
}
