pub mod seed;

use crate::domain::models::{AggregationMethod, QuestionType, Section, UserRole};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Serialize, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub email: String,
    pub hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct Issuer {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct Company {
    pub id: Uuid,
    pub issuer_id: Uuid,
    pub name: String,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub struct CompanyWithIssuer {
    pub id: Uuid,
    pub issuer_id: Uuid,
    pub name: String,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub issuer_name: String,
}

#[derive(Debug, Serialize, FromRow)]
pub struct Questionnaire {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct QuestionnaireSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub question_count: i64,
    pub report_count: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct Question {
    pub id: Uuid,
    pub questionnaire_id: Uuid,
    pub text: String,
    pub question_type: QuestionType,
    pub section: Section,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct QuestionOption {
    pub id: Uuid,
    pub question_id: Uuid,
    pub text: String,
    pub value: String,
    pub score: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct Response {
    pub id: Uuid,
    pub company_id: Uuid,
    pub question_id: Uuid,
    pub value: String,
    pub score: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Response joined with its company and question for list views.
#[derive(Debug, FromRow)]
pub struct ResponseWithContext {
    pub id: Uuid,
    pub company_id: Uuid,
    pub question_id: Uuid,
    pub value: String,
    pub score: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub company_name: String,
    pub company_logo_url: Option<String>,
    pub question_text: String,
    pub question_type: QuestionType,
    pub section: Section,
}

#[derive(Debug, Serialize, FromRow)]
pub struct ScoringConfig {
    pub id: Uuid,
    pub questionnaire_id: Uuid,
    pub section: Section,
    pub aggregation_method: AggregationMethod,
    pub weight: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct Report {
    pub id: Uuid,
    pub company_id: Uuid,
    pub questionnaire_id: Uuid,
    pub overall_score: Option<f64>,
    pub section_scores: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Report joined with company and questionnaire names for lists/exports.
#[derive(Debug, FromRow)]
pub struct ReportWithContext {
    pub id: Uuid,
    pub company_id: Uuid,
    pub questionnaire_id: Uuid,
    pub overall_score: Option<f64>,
    pub section_scores: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub company_name: String,
    pub questionnaire_name: String,
}

// ---------------------------------------------------------------------------
// users

pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<DbUser>> {
    let user = sqlx::query_as::<_, DbUser>(
        "SELECT id, email, hash, role, created_at, updated_at FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn find_user_by_id(pool: &PgPool, id: Uuid) -> Result<Option<DbUser>> {
    let user = sqlx::query_as::<_, DbUser>(
        "SELECT id, email, hash, role, created_at, updated_at FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn insert_user(pool: &PgPool, email: &str, hash: &str, role: UserRole) -> Result<DbUser> {
    let user = sqlx::query_as::<_, DbUser>(
        r#"
        INSERT INTO users (id, email, hash, role)
        VALUES ($1, $2, $3, $4)
        RETURNING id, email, hash, role, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(hash)
    .bind(role)
    .fetch_one(pool)
    .await?;
    Ok(user)
}

pub async fn list_users(pool: &PgPool) -> Result<Vec<DbUser>> {
    let users = sqlx::query_as::<_, DbUser>(
        "SELECT id, email, hash, role, created_at, updated_at FROM users ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(users)
}

pub async fn delete_user(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------------------
// issuers

pub async fn list_issuers(pool: &PgPool) -> Result<Vec<Issuer>> {
    let issuers = sqlx::query_as::<_, Issuer>(
        "SELECT id, name, description, created_at, updated_at FROM issuers ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(issuers)
}

pub async fn get_issuer(pool: &PgPool, id: Uuid) -> Result<Option<Issuer>> {
    let issuer = sqlx::query_as::<_, Issuer>(
        "SELECT id, name, description, created_at, updated_at FROM issuers WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(issuer)
}

pub async fn insert_issuer(pool: &PgPool, name: &str, description: Option<&str>) -> Result<Issuer> {
    let issuer = sqlx::query_as::<_, Issuer>(
        r#"
        INSERT INTO issuers (id, name, description)
        VALUES ($1, $2, $3)
        RETURNING id, name, description, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await?;
    Ok(issuer)
}

pub async fn update_issuer(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    description: Option<&str>,
) -> Result<Option<Issuer>> {
    let issuer = sqlx::query_as::<_, Issuer>(
        r#"
        UPDATE issuers
        SET name = $2, description = $3, updated_at = now()
        WHERE id = $1
        RETURNING id, name, description, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .fetch_optional(pool)
    .await?;
    Ok(issuer)
}

pub async fn delete_issuer(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM issuers WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn companies_for_issuer(pool: &PgPool, issuer_id: Uuid) -> Result<Vec<Company>> {
    let companies = sqlx::query_as::<_, Company>(
        r#"
        SELECT id, issuer_id, name, logo_url, description, created_at, updated_at
        FROM companies
        WHERE issuer_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(issuer_id)
    .fetch_all(pool)
    .await?;
    Ok(companies)
}

// ---------------------------------------------------------------------------
// companies

pub async fn list_companies(
    pool: &PgPool,
    issuer_id: Option<Uuid>,
) -> Result<Vec<CompanyWithIssuer>> {
    let companies = sqlx::query_as::<_, CompanyWithIssuer>(
        r#"
        SELECT
            c.id, c.issuer_id, c.name, c.logo_url, c.description,
            c.created_at, c.updated_at,
            i.name AS issuer_name
        FROM companies c
        JOIN issuers i ON i.id = c.issuer_id
        WHERE $1::uuid IS NULL OR c.issuer_id = $1
        ORDER BY c.created_at DESC
        "#,
    )
    .bind(issuer_id)
    .fetch_all(pool)
    .await?;
    Ok(companies)
}

pub async fn get_company(pool: &PgPool, id: Uuid) -> Result<Option<Company>> {
    let company = sqlx::query_as::<_, Company>(
        r#"
        SELECT id, issuer_id, name, logo_url, description, created_at, updated_at
        FROM companies
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(company)
}

pub async fn insert_company(
    pool: &PgPool,
    issuer_id: Uuid,
    name: &str,
    logo_url: Option<&str>,
    description: Option<&str>,
) -> Result<Company> {
    let company = sqlx::query_as::<_, Company>(
        r#"
        INSERT INTO companies (id, issuer_id, name, logo_url, description)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, issuer_id, name, logo_url, description, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(issuer_id)
    .bind(name)
    .bind(logo_url)
    .bind(description)
    .fetch_one(pool)
    .await?;
    Ok(company)
}

pub async fn update_company(
    pool: &PgPool,
    id: Uuid,
    issuer_id: Uuid,
    name: &str,
    logo_url: Option<&str>,
    description: Option<&str>,
) -> Result<Option<Company>> {
    let company = sqlx::query_as::<_, Company>(
        r#"
        UPDATE companies
        SET issuer_id = $2, name = $3, logo_url = $4, description = $5, updated_at = now()
        WHERE id = $1
        RETURNING id, issuer_id, name, logo_url, description, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(issuer_id)
    .bind(name)
    .bind(logo_url)
    .bind(description)
    .fetch_optional(pool)
    .await?;
    Ok(company)
}

pub async fn delete_company(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM companies WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------------------
// questionnaires

pub async fn list_questionnaires(pool: &PgPool) -> Result<Vec<QuestionnaireSummary>> {
    let questionnaires = sqlx::query_as::<_, QuestionnaireSummary>(
        r#"
        SELECT
            q.id, q.name, q.description, q.created_at, q.updated_at,
            (SELECT COUNT(*) FROM questions WHERE questionnaire_id = q.id) AS question_count,
            (SELECT COUNT(*) FROM reports WHERE questionnaire_id = q.id) AS report_count
        FROM questionnaires q
        ORDER BY q.created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(questionnaires)
}

pub async fn get_questionnaire(pool: &PgPool, id: Uuid) -> Result<Option<Questionnaire>> {
    let questionnaire = sqlx::query_as::<_, Questionnaire>(
        "SELECT id, name, description, created_at, updated_at FROM questionnaires WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(questionnaire)
}

pub async fn insert_questionnaire(
    pool: &PgPool,
    name: &str,
    description: Option<&str>,
) -> Result<Questionnaire> {
    let questionnaire = sqlx::query_as::<_, Questionnaire>(
        r#"
        INSERT INTO questionnaires (id, name, description)
        VALUES ($1, $2, $3)
        RETURNING id, name, description, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await?;
    Ok(questionnaire)
}

pub async fn update_questionnaire(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    description: Option<&str>,
) -> Result<Option<Questionnaire>> {
    let questionnaire = sqlx::query_as::<_, Questionnaire>(
        r#"
        UPDATE questionnaires
        SET name = $2, description = $3, updated_at = now()
        WHERE id = $1
        RETURNING id, name, description, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .fetch_optional(pool)
    .await?;
    Ok(questionnaire)
}

pub async fn delete_questionnaire(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM questionnaires WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------------------
// questions

pub async fn list_questions(pool: &PgPool, questionnaire_id: Option<Uuid>) -> Result<Vec<Question>> {
    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, questionnaire_id, text, question_type, section, order_index,
               created_at, updated_at
        FROM questions
        WHERE $1::uuid IS NULL OR questionnaire_id = $1
        ORDER BY order_index ASC
        "#,
    )
    .bind(questionnaire_id)
    .fetch_all(pool)
    .await?;
    Ok(questions)
}

pub async fn get_question(pool: &PgPool, id: Uuid) -> Result<Option<Question>> {
    let question = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, questionnaire_id, text, question_type, section, order_index,
               created_at, updated_at
        FROM questions
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(question)
}

pub async fn options_for_question(pool: &PgPool, question_id: Uuid) -> Result<Vec<QuestionOption>> {
    let options = sqlx::query_as::<_, QuestionOption>(
        r#"
        SELECT id, question_id, text, value, score, created_at, updated_at
        FROM question_options
        WHERE question_id = $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(question_id)
    .fetch_all(pool)
    .await?;
    Ok(options)
}

pub async fn options_for_questions(
    pool: &PgPool,
    question_ids: &[Uuid],
) -> Result<Vec<QuestionOption>> {
    let options = sqlx::query_as::<_, QuestionOption>(
        r#"
        SELECT id, question_id, text, value, score, created_at, updated_at
        FROM question_options
        WHERE question_id = ANY($1)
        ORDER BY created_at ASC
        "#,
    )
    .bind(question_ids)
    .fetch_all(pool)
    .await?;
    Ok(options)
}

pub struct NewOption<'a> {
    pub text: &'a str,
    pub value: &'a str,
    pub score: i32,
}

pub async fn insert_question(
    pool: &PgPool,
    questionnaire_id: Uuid,
    text: &str,
    question_type: QuestionType,
    section: Section,
    order_index: i32,
    options: &[NewOption<'_>],
) -> Result<Question> {
    let mut tx = pool.begin().await?;

    let question = sqlx::query_as::<_, Question>(
        r#"
        INSERT INTO questions (id, questionnaire_id, text, question_type, section, order_index)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, questionnaire_id, text, question_type, section, order_index,
                  created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(questionnaire_id)
    .bind(text)
    .bind(question_type)
    .bind(section)
    .bind(order_index)
    .fetch_one(&mut *tx)
    .await?;

    for option in options {
        sqlx::query(
            r#"
            INSERT INTO question_options (id, question_id, text, value, score)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(question.id)
        .bind(option.text)
        .bind(option.value)
        .bind(option.score)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(question)
}

/// Update a question and replace its option set wholesale. Replacing is the
/// simplest way to cover added, removed, and edited options in one write.
pub async fn update_question(
    pool: &PgPool,
    id: Uuid,
    questionnaire_id: Uuid,
    text: &str,
    question_type: QuestionType,
    section: Section,
    order_index: i32,
    options: &[NewOption<'_>],
) -> Result<Option<Question>> {
    let mut tx = pool.begin().await?;

    let question = sqlx::query_as::<_, Question>(
        r#"
        UPDATE questions
        SET questionnaire_id = $2, text = $3, question_type = $4, section = $5,
            order_index = $6, updated_at = now()
        WHERE id = $1
        RETURNING id, questionnaire_id, text, question_type, section, order_index,
                  created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(questionnaire_id)
    .bind(text)
    .bind(question_type)
    .bind(section)
    .bind(order_index)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(question) = question else {
        tx.rollback().await?;
        return Ok(None);
    };

    sqlx::query("DELETE FROM question_options WHERE question_id = $1")
        .bind(question.id)
        .execute(&mut *tx)
        .await?;

    for option in options {
        sqlx::query(
            r#"
            INSERT INTO question_options (id, question_id, text, value, score)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(question.id)
        .bind(option.text)
        .bind(option.value)
        .bind(option.score)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(Some(question))
}

pub async fn delete_question(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------------------
// responses

pub async fn list_responses(
    pool: &PgPool,
    company_id: Option<Uuid>,
    questionnaire_id: Option<Uuid>,
) -> Result<Vec<ResponseWithContext>> {
    let responses = sqlx::query_as::<_, ResponseWithContext>(
        r#"
        SELECT
            r.id, r.company_id, r.question_id, r.value, r.score,
            r.created_at, r.updated_at,
            c.name AS company_name,
            c.logo_url AS company_logo_url,
            q.text AS question_text,
            q.question_type,
            q.section
        FROM responses r
        JOIN companies c ON c.id = r.company_id
        JOIN questions q ON q.id = r.question_id
        WHERE ($1::uuid IS NULL OR r.company_id = $1)
          AND ($2::uuid IS NULL OR q.questionnaire_id = $2)
        ORDER BY r.created_at DESC
        "#,
    )
    .bind(company_id)
    .bind(questionnaire_id)
    .fetch_all(pool)
    .await?;
    Ok(responses)
}

pub async fn get_response(pool: &PgPool, id: Uuid) -> Result<Option<Response>> {
    let response = sqlx::query_as::<_, Response>(
        r#"
        SELECT id, company_id, question_id, value, score, created_at, updated_at
        FROM responses
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(response)
}

/// One response per (company, question): concurrent writes for the same
/// pair collapse into the latest value.
pub async fn upsert_response(
    pool: &PgPool,
    company_id: Uuid,
    question_id: Uuid,
    value: &str,
    score: Option<i32>,
) -> Result<Response> {
    let response = sqlx::query_as::<_, Response>(
        r#"
        INSERT INTO responses (id, company_id, question_id, value, score)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (company_id, question_id)
        DO UPDATE SET value = EXCLUDED.value, score = EXCLUDED.score, updated_at = now()
        RETURNING id, company_id, question_id, value, score, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(company_id)
    .bind(question_id)
    .bind(value)
    .bind(score)
    .fetch_one(pool)
    .await?;
    Ok(response)
}

pub async fn update_response(
    pool: &PgPool,
    id: Uuid,
    value: &str,
    score: Option<i32>,
) -> Result<Option<Response>> {
    let response = sqlx::query_as::<_, Response>(
        r#"
        UPDATE responses
        SET value = $2, score = $3, updated_at = now()
        WHERE id = $1
        RETURNING id, company_id, question_id, value, score, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(value)
    .bind(score)
    .fetch_optional(pool)
    .await?;
    Ok(response)
}

pub async fn delete_response(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM responses WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------------------
// scoring configs

pub async fn list_scoring_configs(
    pool: &PgPool,
    questionnaire_id: Option<Uuid>,
) -> Result<Vec<ScoringConfig>> {
    let configs = sqlx::query_as::<_, ScoringConfig>(
        r#"
        SELECT id, questionnaire_id, section, aggregation_method, weight,
               created_at, updated_at
        FROM scoring_configs
        WHERE $1::uuid IS NULL OR questionnaire_id = $1
        ORDER BY questionnaire_id ASC, section ASC
        "#,
    )
    .bind(questionnaire_id)
    .fetch_all(pool)
    .await?;
    Ok(configs)
}

pub async fn get_scoring_config(pool: &PgPool, id: Uuid) -> Result<Option<ScoringConfig>> {
    let config = sqlx::query_as::<_, ScoringConfig>(
        r#"
        SELECT id, questionnaire_id, section, aggregation_method, weight,
               created_at, updated_at
        FROM scoring_configs
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(config)
}

pub async fn find_scoring_config(
    pool: &PgPool,
    questionnaire_id: Uuid,
    section: Section,
) -> Result<Option<ScoringConfig>> {
    let config = sqlx::query_as::<_, ScoringConfig>(
        r#"
        SELECT id, questionnaire_id, section, aggregation_method, weight,
               created_at, updated_at
        FROM scoring_configs
        WHERE questionnaire_id = $1 AND section = $2
        "#,
    )
    .bind(questionnaire_id)
    .bind(section)
    .fetch_optional(pool)
    .await?;
    Ok(config)
}

pub async fn insert_scoring_config(
    pool: &PgPool,
    questionnaire_id: Uuid,
    section: Section,
    aggregation_method: AggregationMethod,
    weight: f64,
) -> Result<ScoringConfig> {
    let config = sqlx::query_as::<_, ScoringConfig>(
        r#"
        INSERT INTO scoring_configs (id, questionnaire_id, section, aggregation_method, weight)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, questionnaire_id, section, aggregation_method, weight,
                  created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(questionnaire_id)
    .bind(section)
    .bind(aggregation_method)
    .bind(weight)
    .fetch_one(pool)
    .await?;
    Ok(config)
}

pub async fn update_scoring_config(
    pool: &PgPool,
    id: Uuid,
    questionnaire_id: Uuid,
    section: Section,
    aggregation_method: AggregationMethod,
    weight: f64,
) -> Result<Option<ScoringConfig>> {
    let config = sqlx::query_as::<_, ScoringConfig>(
        r#"
        UPDATE scoring_configs
        SET questionnaire_id = $2, section = $3, aggregation_method = $4,
            weight = $5, updated_at = now()
        WHERE id = $1
        RETURNING id, questionnaire_id, section, aggregation_method, weight,
                  created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(questionnaire_id)
    .bind(section)
    .bind(aggregation_method)
    .bind(weight)
    .fetch_optional(pool)
    .await?;
    Ok(config)
}

pub async fn delete_scoring_config(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM scoring_configs WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------------------
// reports

pub async fn list_reports(
    pool: &PgPool,
    company_id: Option<Uuid>,
    questionnaire_id: Option<Uuid>,
) -> Result<Vec<ReportWithContext>> {
    let reports = sqlx::query_as::<_, ReportWithContext>(
        r#"
        SELECT
            r.id, r.company_id, r.questionnaire_id, r.overall_score,
            r.section_scores, r.created_at,
            c.name AS company_name,
            q.name AS questionnaire_name
        FROM reports r
        JOIN companies c ON c.id = r.company_id
        JOIN questionnaires q ON q.id = r.questionnaire_id
        WHERE ($1::uuid IS NULL OR r.company_id = $1)
          AND ($2::uuid IS NULL OR r.questionnaire_id = $2)
        ORDER BY r.company_id ASC, r.created_at DESC
        "#,
    )
    .bind(company_id)
    .bind(questionnaire_id)
    .fetch_all(pool)
    .await?;
    Ok(reports)
}

pub async fn get_report(pool: &PgPool, id: Uuid) -> Result<Option<Report>> {
    let report = sqlx::query_as::<_, Report>(
        r#"
        SELECT id, company_id, questionnaire_id, overall_score, section_scores, created_at
        FROM reports
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(report)
}

pub async fn reports_for_questionnaire(pool: &PgPool, questionnaire_id: Uuid) -> Result<Vec<Report>> {
    let reports = sqlx::query_as::<_, Report>(
        r#"
        SELECT id, company_id, questionnaire_id, overall_score, section_scores, created_at
        FROM reports
        WHERE questionnaire_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(questionnaire_id)
    .fetch_all(pool)
    .await?;
    Ok(reports)
}

// ---------------------------------------------------------------------------
// error classification

/// Foreign-key restriction (Postgres 23503): a delete hit dependent rows.
pub fn is_fk_violation(err: &anyhow::Error) -> bool {
    has_sqlstate(err, "23503")
}

/// Unique-constraint violation (Postgres 23505).
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    has_sqlstate(err, "23505")
}

fn has_sqlstate(err: &anyhow::Error, code: &str) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .and_then(|db| db.code())
        .map(|c| c == code)
        .unwrap_or(false)
}
