use crate::domain::models::{AggregationMethod, QuestionType, Section};
use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

struct SeedOption<'a> {
    text: &'a str,
    value: &'a str,
    score: i32,
}

struct SeedQuestion<'a> {
    text: &'a str,
    question_type: QuestionType,
    section: Section,
    order_index: i32,
    options: Vec<SeedOption<'a>>,
    // demo answer recorded for the sample company
    answer: &'a str,
}

/// Seed the demo dataset on an empty database: one issuer, one company,
/// one questionnaire with a question per section, the company's answers,
/// per-section average configs, and a first report snapshot.
pub async fn seed_all(pool: &PgPool) -> Result<()> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questionnaires")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        return Ok(());
    }

    let issuer_id = Uuid::new_v4();
    sqlx::query("INSERT INTO issuers (id, name, description) VALUES ($1, $2, $3)")
        .bind(issuer_id)
        .bind("Sample Issuer")
        .bind("A sample issuer for testing")
        .execute(pool)
        .await?;

    let company_id = Uuid::new_v4();
    sqlx::query("INSERT INTO companies (id, issuer_id, name) VALUES ($1, $2, $3)")
        .bind(company_id)
        .bind(issuer_id)
        .bind("TechCorp Inc.")
        .execute(pool)
        .await?;

    let questionnaire_id = Uuid::new_v4();
    sqlx::query("INSERT INTO questionnaires (id, name, description) VALUES ($1, $2, $3)")
        .bind(questionnaire_id)
        .bind("ESG Assessment Questionnaire")
        .bind("A comprehensive ESG assessment questionnaire")
        .execute(pool)
        .await?;

    let questions = vec![
        SeedQuestion {
            text: "What percentage of your energy comes from renewable sources?",
            question_type: QuestionType::Scale,
            section: Section::Environmental,
            order_index: 1,
            options: vec![
                SeedOption { text: "0-25%", value: "0-25", score: 1 },
                SeedOption { text: "26-50%", value: "26-50", score: 2 },
                SeedOption { text: "51-75%", value: "51-75", score: 3 },
                SeedOption { text: "76-100%", value: "76-100", score: 4 },
            ],
            answer: "76-100",
        },
        SeedQuestion {
            text: "Do you have a diversity and inclusion policy?",
            question_type: QuestionType::YesNo,
            section: Section::Social,
            order_index: 2,
            options: vec![
                SeedOption { text: "Yes", value: "yes", score: 4 },
                SeedOption { text: "No", value: "no", score: 1 },
            ],
            answer: "yes",
        },
        SeedQuestion {
            text: "Do you have a code of ethics for employees?",
            question_type: QuestionType::YesNo,
            section: Section::Governance,
            order_index: 3,
            options: vec![
                SeedOption { text: "Yes", value: "yes", score: 4 },
                SeedOption { text: "No", value: "no", score: 1 },
            ],
            answer: "yes",
        },
    ];

    for question in &questions {
        let question_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO questions (id, questionnaire_id, text, question_type, section, order_index)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(question_id)
        .bind(questionnaire_id)
        .bind(question.text)
        .bind(question.question_type)
        .bind(question.section)
        .bind(question.order_index)
        .execute(pool)
        .await?;

        let mut answer_score = None;
        for option in &question.options {
            sqlx::query(
                r#"
                INSERT INTO question_options (id, question_id, text, value, score)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(question_id)
            .bind(option.text)
            .bind(option.value)
            .bind(option.score)
            .execute(pool)
            .await?;

            if option.value == question.answer {
                answer_score = Some(option.score);
            }
        }

        sqlx::query(
            r#"
            INSERT INTO responses (id, company_id, question_id, value, score)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(company_id)
        .bind(question_id)
        .bind(question.answer)
        .bind(answer_score)
        .execute(pool)
        .await?;
    }

    for section in Section::ALL {
        sqlx::query(
            r#"
            INSERT INTO scoring_configs (id, questionnaire_id, section, aggregation_method, weight)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(questionnaire_id)
        .bind(section)
        .bind(AggregationMethod::Average)
        .bind(1.0_f64)
        .execute(pool)
        .await?;
    }

    sqlx::query(
        r#"
        INSERT INTO reports (id, company_id, questionnaire_id, overall_score, section_scores)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(company_id)
    .bind(questionnaire_id)
    .bind(4.0_f64)
    .bind(serde_json::json!({
        "Environmental": 4.0,
        "Social": 4.0,
        "Governance": 4.0,
    }))
    .execute(pool)
    .await?;

    tracing::info!("Seeded demo issuer, company, questionnaire and report");
    Ok(())
}
