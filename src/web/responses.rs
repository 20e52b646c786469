use crate::db;
use crate::domain::models::{QuestionType, Section};
use crate::domain::scoring::{resolve_response_score, ScoreOption};
use crate::state::SharedState;
use crate::web::error::ApiError;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub company_id: Option<Uuid>,
    pub questionnaire_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResponsePayload {
    pub company_id: Uuid,
    pub question_id: Uuid,
    pub value: String,
    // score is resolved server-side, never accepted from the client
}

impl ResponsePayload {
    fn validate(&self) -> Result<(), ApiError> {
        if self.value.is_empty() {
            return Err(ApiError::BadRequest("\"value\" is required".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkPayload {
    pub responses: Vec<ResponsePayload>,
}

#[derive(Serialize)]
struct CompanyBrief {
    id: Uuid,
    name: String,
    logo_url: Option<String>,
}

#[derive(Serialize)]
struct QuestionBrief {
    id: Uuid,
    text: String,
    #[serde(rename = "type")]
    question_type: QuestionType,
    section: Section,
}

#[derive(Serialize)]
struct ResponseView {
    id: Uuid,
    company_id: Uuid,
    question_id: Uuid,
    value: String,
    score: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    company: CompanyBrief,
    question: QuestionBrief,
}

#[derive(Serialize)]
struct QuestionDetail {
    #[serde(flatten)]
    question: db::Question,
    options: Vec<db::QuestionOption>,
}

#[derive(Serialize)]
struct ResponseDetail {
    #[serde(flatten)]
    response: db::Response,
    company: db::Company,
    question: QuestionDetail,
}

#[derive(Serialize)]
struct BulkError {
    payload: ResponsePayload,
    message: String,
}

#[derive(Serialize)]
struct BulkOutcome {
    success_count: usize,
    failure_count: usize,
    results: Vec<db::Response>,
    errors: Vec<BulkError>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list_responses).post(upsert_response))
        .route("/bulk", post(bulk_upsert))
        .route(
            "/:id",
            get(get_response).put(update_response).delete(delete_response),
        )
        .with_state(state)
}

async fn list_responses(
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ResponseView>>, ApiError> {
    let responses = db::list_responses(&state.pool, params.company_id, params.questionnaire_id)
        .await
        .map_err(ApiError::Internal)?;

    let views = responses
        .into_iter()
        .map(|r| ResponseView {
            id: r.id,
            company_id: r.company_id,
            question_id: r.question_id,
            value: r.value,
            score: r.score,
            created_at: r.created_at,
            updated_at: r.updated_at,
            company: CompanyBrief {
                id: r.company_id,
                name: r.company_name,
                logo_url: r.company_logo_url,
            },
            question: QuestionBrief {
                id: r.question_id,
                text: r.question_text,
                question_type: r.question_type,
                section: r.section,
            },
        })
        .collect();
    Ok(Json(views))
}

async fn get_response(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResponseDetail>, ApiError> {
    let response = db::get_response(&state.pool, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Response"))?;

    let company = db::get_company(&state.pool, response.company_id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Company"))?;
    let question = db::get_question(&state.pool, response.question_id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Question"))?;
    let options = db::options_for_question(&state.pool, question.id)
        .await
        .map_err(ApiError::Internal)?;

    Ok(Json(ResponseDetail {
        response,
        company,
        question: QuestionDetail { question, options },
    }))
}

async fn upsert_response(
    State(state): State<SharedState>,
    Json(payload): Json<ResponsePayload>,
) -> Result<(StatusCode, Json<db::Response>), ApiError> {
    payload.validate()?;
    ensure_pair_exists(&state, payload.company_id, payload.question_id).await?;

    let score = resolve_score(&state, payload.question_id, &payload.value).await?;
    let response = db::upsert_response(
        &state.pool,
        payload.company_id,
        payload.question_id,
        &payload.value,
        score,
    )
    .await
    .map_err(ApiError::Internal)?;

    Ok((StatusCode::CREATED, Json(response)))
}

async fn update_response(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ResponsePayload>,
) -> Result<Json<db::Response>, ApiError> {
    payload.validate()?;
    ensure_pair_exists(&state, payload.company_id, payload.question_id).await?;

    // company and question are fixed; only the value (and thus the score) moves
    let score = resolve_score(&state, payload.question_id, &payload.value).await?;
    let response = db::update_response(&state.pool, id, &payload.value, score)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Response"))?;
    Ok(Json(response))
}

async fn delete_response(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = db::delete_response(&state.pool, id)
        .await
        .map_err(ApiError::Internal)?;
    if !deleted {
        return Err(ApiError::not_found("Response"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn bulk_upsert(
    State(state): State<SharedState>,
    Json(payload): Json<BulkPayload>,
) -> Result<(StatusCode, Json<BulkOutcome>), ApiError> {
    if payload.responses.is_empty() {
        return Err(ApiError::BadRequest(
            "\"responses\" must contain at least 1 items".into(),
        ));
    }

    let mut results = Vec::new();
    let mut errors = Vec::new();

    for item in payload.responses {
        if let Err(e) = item.validate() {
            errors.push(BulkError {
                payload: item,
                message: e.to_string(),
            });
            continue;
        }
        if let Err(e) = ensure_pair_exists(&state, item.company_id, item.question_id).await {
            errors.push(BulkError {
                payload: item,
                message: e.to_string(),
            });
            continue;
        }

        let score = match resolve_score(&state, item.question_id, &item.value).await {
            Ok(score) => score,
            Err(e) => {
                errors.push(BulkError {
                    payload: item,
                    message: e.to_string(),
                });
                continue;
            }
        };

        match db::upsert_response(&state.pool, item.company_id, item.question_id, &item.value, score)
            .await
        {
            Ok(response) => results.push(response),
            Err(e) => errors.push(BulkError {
                payload: item,
                message: e.to_string(),
            }),
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(BulkOutcome {
            success_count: results.len(),
            failure_count: errors.len(),
            results,
            errors,
        }),
    ))
}

async fn ensure_pair_exists(
    state: &SharedState,
    company_id: Uuid,
    question_id: Uuid,
) -> Result<(), ApiError> {
    let company = db::get_company(&state.pool, company_id)
        .await
        .map_err(ApiError::Internal)?;
    let question = db::get_question(&state.pool, question_id)
        .await
        .map_err(ApiError::Internal)?;
    if company.is_none() || question.is_none() {
        return Err(ApiError::BadRequest(
            "Invalid company_id or question_id".into(),
        ));
    }
    Ok(())
}

/// Look up the question's type and options and resolve the score to store.
async fn resolve_score(
    state: &SharedState,
    question_id: Uuid,
    value: &str,
) -> Result<Option<i32>, ApiError> {
    let question = db::get_question(&state.pool, question_id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::BadRequest("Question not found for score calculation".into()))?;

    let options: Vec<ScoreOption> = db::options_for_question(&state.pool, question_id)
        .await
        .map_err(ApiError::Internal)?
        .into_iter()
        .map(|o| ScoreOption {
            value: o.value,
            score: o.score,
        })
        .collect();

    Ok(resolve_response_score(question.question_type, &options, value)?)
}
