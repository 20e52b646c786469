use crate::db;
use crate::domain::models::Section;
use crate::domain::scoring::{compute_scorecard, ScoredResponse, SectionRule};
use crate::services::export;
use crate::state::SharedState;
use crate::web::error::ApiError;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
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

#[derive(Debug, Deserialize)]
pub struct GeneratePayload {
    pub company_id: Uuid,
    pub questionnaire_id: Uuid,
}

#[derive(Serialize)]
struct CompanyBrief {
    id: Uuid,
    name: String,
}

#[derive(Serialize)]
struct QuestionnaireBrief {
    id: Uuid,
    name: String,
}

#[derive(Serialize)]
struct ReportView {
    id: Uuid,
    company_id: Uuid,
    questionnaire_id: Uuid,
    overall_score: Option<f64>,
    section_scores: serde_json::Value,
    created_at: DateTime<Utc>,
    company: CompanyBrief,
    questionnaire: QuestionnaireBrief,
}

#[derive(Serialize)]
struct ReportDetail {
    #[serde(flatten)]
    report: db::Report,
    company: db::Company,
    questionnaire: db::Questionnaire,
}

#[derive(sqlx::FromRow)]
struct ScoredRow {
    section: Section,
    score: Option<i32>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(list_reports))
        .route("/generate", post(generate_report))
        .route("/export/historical", get(export_historical))
        .route("/:id", get(get_report))
        .route("/:id/export", get(export_report))
        .with_state(state)
}

async fn list_reports(
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ReportView>>, ApiError> {
    let reports = db::list_reports(&state.pool, params.company_id, params.questionnaire_id)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(reports.into_iter().map(report_view).collect()))
}

async fn get_report(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReportDetail>, ApiError> {
    let report = db::get_report(&state.pool, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Report"))?;
    let company = db::get_company(&state.pool, report.company_id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Company"))?;
    let questionnaire = db::get_questionnaire(&state.pool, report.questionnaire_id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Questionnaire"))?;
    Ok(Json(ReportDetail {
        report,
        company,
        questionnaire,
    }))
}

/// Run the scoring engine over the current response/config snapshot and
/// persist the result as a new, immutable report. The snapshot is read
/// inside one transaction so a concurrent response write cannot split it.
async fn generate_report(
    State(state): State<SharedState>,
    Json(payload): Json<GeneratePayload>,
) -> Result<(StatusCode, Json<ReportView>), ApiError> {
    let company = db::get_company(&state.pool, payload.company_id)
        .await
        .map_err(ApiError::Internal)?;
    let questionnaire = db::get_questionnaire(&state.pool, payload.questionnaire_id)
        .await
        .map_err(ApiError::Internal)?;
    let (Some(company), Some(questionnaire)) = (company, questionnaire) else {
        return Err(ApiError::BadRequest(
            "Invalid company_id or questionnaire_id".into(),
        ));
    };

    let mut tx = state.pool.begin().await?;

    let scored: Vec<ScoredRow> = sqlx::query_as(
        r#"
        SELECT q.section, r.score
        FROM responses r
        JOIN questions q ON q.id = r.question_id
        WHERE r.company_id = $1 AND q.questionnaire_id = $2
        "#,
    )
    .bind(company.id)
    .bind(questionnaire.id)
    .fetch_all(&mut *tx)
    .await?;

    let configs: Vec<db::ScoringConfig> = sqlx::query_as(
        r#"
        SELECT id, questionnaire_id, section, aggregation_method, weight,
               created_at, updated_at
        FROM scoring_configs
        WHERE questionnaire_id = $1
        ORDER BY section ASC
        "#,
    )
    .bind(questionnaire.id)
    .fetch_all(&mut *tx)
    .await?;

    let responses: Vec<ScoredResponse> = scored
        .iter()
        .map(|row| ScoredResponse {
            section: row.section,
            score: row.score,
        })
        .collect();
    let rules: Vec<SectionRule> = configs
        .iter()
        .map(|config| SectionRule {
            section: config.section,
            method: config.aggregation_method,
            weight: config.weight,
        })
        .collect();

    let card = compute_scorecard(&responses, &rules)?;
    let section_scores = serde_json::to_value(&card.section_scores)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("serializing section scores: {e}")))?;

    let report: db::Report = sqlx::query_as(
        r#"
        INSERT INTO reports (id, company_id, questionnaire_id, overall_score, section_scores)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, company_id, questionnaire_id, overall_score, section_scores, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(company.id)
    .bind(questionnaire.id)
    .bind(card.overall_score)
    .bind(section_scores)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        "generated report {} for company {} / questionnaire {}",
        report.id,
        company.id,
        questionnaire.id
    );

    Ok((
        StatusCode::CREATED,
        Json(ReportView {
            id: report.id,
            company_id: report.company_id,
            questionnaire_id: report.questionnaire_id,
            overall_score: report.overall_score,
            section_scores: report.section_scores,
            created_at: report.created_at,
            company: CompanyBrief {
                id: company.id,
                name: company.name,
            },
            questionnaire: QuestionnaireBrief {
                id: questionnaire.id,
                name: questionnaire.name,
            },
        }),
    ))
}

async fn export_report(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let report = db::get_report(&state.pool, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Report"))?;
    let company = db::get_company(&state.pool, report.company_id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Company"))?;
    let questionnaire = db::get_questionnaire(&state.pool, report.questionnaire_id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Questionnaire"))?;

    let responses =
        db::list_responses(&state.pool, Some(report.company_id), Some(report.questionnaire_id))
            .await
            .map_err(ApiError::Internal)?;

    let section_scores = Section::ALL
        .iter()
        .filter_map(|section| {
            section_score(&report.section_scores, *section)
                .map(|score| (section.as_str().to_string(), score))
        })
        .collect();

    let data = export::ReportExport {
        company_name: company.name.clone(),
        questionnaire_name: questionnaire.name,
        generated_at: report.created_at,
        overall_score: report.overall_score,
        section_scores,
        responses: responses
            .into_iter()
            .map(|r| export::ResponseLine {
                section: r.section.as_str().to_string(),
                question: r.question_text,
                value: r.value,
                score: r.score,
            })
            .collect(),
    };

    let bytes = export::render_report_csv(&data).map_err(ApiError::Internal)?;
    let filename = format!(
        "ESG_Report_{}_{}.csv",
        company.name.replace(char::is_whitespace, "_"),
        report.id
    );
    Ok(csv_attachment(filename, bytes))
}

async fn export_historical(
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let reports = db::list_reports(&state.pool, params.company_id, params.questionnaire_id)
        .await
        .map_err(ApiError::Internal)?;

    if reports.is_empty() {
        return Err(ApiError::NotFound(
            "No reports found for the specified criteria.".into(),
        ));
    }

    let lines: Vec<export::HistoricalLine> = reports
        .into_iter()
        .map(|r| export::HistoricalLine {
            report_id: r.id,
            company_name: r.company_name,
            questionnaire_name: r.questionnaire_name,
            overall_score: r.overall_score,
            environmental: section_score(&r.section_scores, Section::Environmental),
            social: section_score(&r.section_scores, Section::Social),
            governance: section_score(&r.section_scores, Section::Governance),
            created_at: r.created_at,
        })
        .collect();

    let bytes = export::render_historical_csv(&lines).map_err(ApiError::Internal)?;
    let filename = format!(
        "ESG_Historical_Reports_{}.csv",
        Utc::now().format("%Y-%m-%d")
    );
    Ok(csv_attachment(filename, bytes))
}

fn report_view(report: db::ReportWithContext) -> ReportView {
    ReportView {
        id: report.id,
        company_id: report.company_id,
        questionnaire_id: report.questionnaire_id,
        overall_score: report.overall_score,
        section_scores: report.section_scores,
        created_at: report.created_at,
        company: CompanyBrief {
            id: report.company_id,
            name: report.company_name,
        },
        questionnaire: QuestionnaireBrief {
            id: report.questionnaire_id,
            name: report.questionnaire_name,
        },
    }
}

fn section_score(scores: &serde_json::Value, section: Section) -> Option<f64> {
    scores.get(section.as_str()).and_then(|v| v.as_f64())
}

fn csv_attachment(filename: String, bytes: Vec<u8>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
}
