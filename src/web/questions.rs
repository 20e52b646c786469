use crate::db;
use crate::domain::models::{QuestionType, Section};
use crate::state::SharedState;
use crate::web::error::ApiError;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub questionnaire_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct OptionPayload {
    pub text: String,
    pub value: String,
    pub score: i32,
}

#[derive(Debug, Deserialize)]
pub struct QuestionPayload {
    pub questionnaire_id: Uuid,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub section: Section,
    pub order_index: Option<i32>,
    pub options: Option<Vec<OptionPayload>>,
}

impl QuestionPayload {
    /// Non-text questions need at least two options with unique values;
    /// text_input questions must not carry any.
    fn validate(&self) -> Result<(), ApiError> {
        if self.text.trim().is_empty() {
            return Err(ApiError::BadRequest("\"text\" is required".into()));
        }

        let options = self.options.as_deref().unwrap_or(&[]);

        if self.question_type.is_scored() {
            if options.len() < 2 {
                return Err(ApiError::BadRequest(
                    "Options are required for multiple_choice, yes_no, and scale question types."
                        .into(),
                ));
            }
        } else if !options.is_empty() {
            return Err(ApiError::BadRequest(
                "Options should not be provided for text_input question type.".into(),
            ));
        }

        let mut seen = HashSet::new();
        for option in options {
            if option.text.trim().is_empty() || option.value.is_empty() {
                return Err(ApiError::BadRequest(
                    "Each option requires a text and a value.".into(),
                ));
            }
            if !seen.insert(option.value.as_str()) {
                return Err(ApiError::BadRequest(format!(
                    "Duplicate option value '{}' within the question.",
                    option.value
                )));
            }
        }
        Ok(())
    }

    fn new_options(&self) -> Vec<db::NewOption<'_>> {
        self.options
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .map(|o| db::NewOption {
                text: &o.text,
                value: &o.value,
                score: o.score,
            })
            .collect()
    }
}

#[derive(Serialize)]
struct QuestionWithOptions {
    #[serde(flatten)]
    question: db::Question,
    options: Vec<db::QuestionOption>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list_questions).post(create_question))
        .route(
            "/:id",
            get(get_question).put(update_question).delete(delete_question),
        )
        .with_state(state)
}

async fn list_questions(
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<QuestionWithOptions>>, ApiError> {
    let questions = db::list_questions(&state.pool, params.questionnaire_id)
        .await
        .map_err(ApiError::Internal)?;

    let question_ids: Vec<Uuid> = questions.iter().map(|q| q.id).collect();
    let mut options_by_question: std::collections::HashMap<Uuid, Vec<db::QuestionOption>> =
        std::collections::HashMap::new();
    for option in db::options_for_questions(&state.pool, &question_ids)
        .await
        .map_err(ApiError::Internal)?
    {
        options_by_question
            .entry(option.question_id)
            .or_default()
            .push(option);
    }

    let views = questions
        .into_iter()
        .map(|question| QuestionWithOptions {
            options: options_by_question.remove(&question.id).unwrap_or_default(),
            question,
        })
        .collect();
    Ok(Json(views))
}

async fn get_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuestionWithOptions>, ApiError> {
    let question = db::get_question(&state.pool, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Question"))?;
    let options = db::options_for_question(&state.pool, id)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(QuestionWithOptions { question, options }))
}

async fn create_question(
    State(state): State<SharedState>,
    Json(payload): Json<QuestionPayload>,
) -> Result<(StatusCode, Json<QuestionWithOptions>), ApiError> {
    payload.validate()?;
    ensure_questionnaire_exists(&state, payload.questionnaire_id).await?;

    let question = db::insert_question(
        &state.pool,
        payload.questionnaire_id,
        payload.text.trim(),
        payload.question_type,
        payload.section,
        payload.order_index.unwrap_or(0),
        &payload.new_options(),
    )
    .await
    .map_err(ApiError::Internal)?;

    let options = db::options_for_question(&state.pool, question.id)
        .await
        .map_err(ApiError::Internal)?;
    Ok((
        StatusCode::CREATED,
        Json(QuestionWithOptions { question, options }),
    ))
}

async fn update_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuestionPayload>,
) -> Result<Json<QuestionWithOptions>, ApiError> {
    payload.validate()?;
    ensure_questionnaire_exists(&state, payload.questionnaire_id).await?;

    let question = db::update_question(
        &state.pool,
        id,
        payload.questionnaire_id,
        payload.text.trim(),
        payload.question_type,
        payload.section,
        payload.order_index.unwrap_or(0),
        &payload.new_options(),
    )
    .await
    .map_err(ApiError::Internal)?
    .ok_or_else(|| ApiError::not_found("Question"))?;

    let options = db::options_for_question(&state.pool, question.id)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(QuestionWithOptions { question, options }))
}

async fn delete_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    // options and responses go with the question via cascade
    let deleted = db::delete_question(&state.pool, id)
        .await
        .map_err(ApiError::Internal)?;
    if !deleted {
        return Err(ApiError::not_found("Question"));
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

    fn base_payload(question_type: QuestionType, options: Option<Vec<OptionPayload>>) -> QuestionPayload {
        QuestionPayload {
            questionnaire_id: Uuid::nil(),
            text: "Do you publish an annual sustainability report?".into(),
            question_type,
            section: Section::Governance,
            order_index: Some(1),
            options,
        }
    }

    fn yes_no_options() -> Vec<OptionPayload> {
        vec![
            OptionPayload {
                text: "Yes".into(),
                value: "yes".into(),
                score: 4,
            },
            OptionPayload {
                text: "No".into(),
                value: "no".into(),
                score: 1,
            },
        ]
    }

    #[test]
    fn scored_questions_require_two_options() {
        let missing = base_payload(QuestionType::YesNo, None);
        assert!(missing.validate().is_err());

        let single = base_payload(
            QuestionType::MultipleChoice,
            Some(vec![OptionPayload {
                text: "Only".into(),
                value: "only".into(),
                score: 1,
            }]),
        );
        assert!(single.validate().is_err());

        let ok = base_payload(QuestionType::YesNo, Some(yes_no_options()));
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn text_input_refuses_options() {
        let with_options = base_payload(QuestionType::TextInput, Some(yes_no_options()));
        assert!(with_options.validate().is_err());

        let bare = base_payload(QuestionType::TextInput, None);
        assert!(bare.validate().is_ok());
    }

    #[test]
    fn duplicate_option_values_are_rejected() {
        let mut options = yes_no_options();
        options[1].value = "yes".into();
        let payload = base_payload(QuestionType::YesNo, Some(options));
        assert!(payload.validate().is_err());
    }
}
