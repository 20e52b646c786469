//! CSV rendering for report downloads. Pure data-to-bytes functions; the
//! handlers own the HTTP side (headers, attachment naming).

use anyhow::Result;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub struct ResponseLine {
    pub section: String,
    pub question: String,
    pub value: String,
    pub score: Option<i32>,
}

pub struct ReportExport {
    pub company_name: String,
    pub questionnaire_name: String,
    pub generated_at: DateTime<Utc>,
    pub overall_score: Option<f64>,
    /// Section label to score, in report order.
    pub section_scores: Vec<(String, f64)>,
    pub responses: Vec<ResponseLine>,
}

pub struct HistoricalLine {
    pub report_id: Uuid,
    pub company_name: String,
    pub questionnaire_name: String,
    pub overall_score: Option<f64>,
    pub environmental: Option<f64>,
    pub social: Option<f64>,
    pub governance: Option<f64>,
    pub created_at: DateTime<Utc>,
}

fn fmt_score(score: Option<f64>) -> String {
    match score {
        Some(s) => format!("{s:.2}"),
        None => "N/A".to_string(),
    }
}

/// One report: header block, per-section scores, then the underlying
/// responses.
pub fn render_report_csv(report: &ReportExport) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(vec![]);

    let generated_at = report.generated_at.to_rfc3339();
    let overall = fmt_score(report.overall_score);
    writer.write_record(["Company", report.company_name.as_str()])?;
    writer.write_record(["Questionnaire", report.questionnaire_name.as_str()])?;
    writer.write_record(["Report Generated", generated_at.as_str()])?;
    writer.write_record(["Overall ESG Score", overall.as_str()])?;
    writer.write_record([""])?;

    writer.write_record(["Section", "Score"])?;
    for (section, score) in &report.section_scores {
        let score = fmt_score(Some(*score));
        writer.write_record([section.as_str(), score.as_str()])?;
    }
    writer.write_record([""])?;

    writer.write_record(["Section", "Question", "Response", "Score"])?;
    for line in &report.responses {
        let score = line
            .score
            .map(|s| s.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        writer.write_record([
            line.section.as_str(),
            line.question.as_str(),
            line.value.as_str(),
            score.as_str(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("finalizing csv: {e}"))
}

/// Historical summary: one row per report with fixed per-section columns.
pub fn render_historical_csv(lines: &[HistoricalLine]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(vec![]);

    writer.write_record([
        "Report ID",
        "Company Name",
        "Questionnaire Name",
        "Overall Score",
        "Environmental Score",
        "Social Score",
        "Governance Score",
        "Created At",
    ])?;

    for line in lines {
        writer.write_record([
            line.report_id.to_string(),
            line.company_name.clone(),
            line.questionnaire_name.clone(),
            fmt_score(line.overall_score),
            fmt_score(line.environmental),
            fmt_score(line.social),
            fmt_score(line.governance),
            line.created_at.to_rfc3339(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("finalizing csv: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> ReportExport {
        ReportExport {
            company_name: "TechCorp Inc.".into(),
            questionnaire_name: "ESG Assessment Questionnaire".into(),
            generated_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            overall_score: Some(4.0),
            section_scores: vec![
                ("Environmental".into(), 4.0),
                ("Social".into(), 4.0),
                ("Governance".into(), 4.0),
            ],
            responses: vec![
                ResponseLine {
                    section: "Environmental".into(),
                    question: "What percentage of your energy comes from renewable sources?".into(),
                    value: "76-100".into(),
                    score: Some(4),
                },
                ResponseLine {
                    section: "Governance".into(),
                    question: "Describe your board structure".into(),
                    value: "Two-tier board".into(),
                    score: None,
                },
            ],
        }
    }

    #[test]
    fn report_csv_carries_scores_and_responses() {
        let bytes = render_report_csv(&sample_report()).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("Company,TechCorp Inc.\n"));
        assert!(text.contains("Overall ESG Score,4.00"));
        assert!(text.contains("Environmental,4.00"));
        assert!(text.contains("76-100,4"));
        // unscored text answer exports as N/A, not 0
        assert!(text.contains("Two-tier board,N/A"));
    }

    #[test]
    fn missing_overall_score_is_na() {
        let mut report = sample_report();
        report.overall_score = None;
        let text = String::from_utf8(render_report_csv(&report).unwrap()).unwrap();
        assert!(text.contains("Overall ESG Score,N/A"));
    }

    #[test]
    fn historical_csv_has_one_row_per_report() {
        let lines = vec![HistoricalLine {
            report_id: Uuid::nil(),
            company_name: "TechCorp Inc.".into(),
            questionnaire_name: "ESG Assessment Questionnaire".into(),
            overall_score: Some(3.67),
            environmental: Some(4.0),
            social: Some(3.0),
            governance: None,
            created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        }];
        let text = String::from_utf8(render_historical_csv(&lines).unwrap()).unwrap();

        let mut rows = text.lines();
        assert!(rows.next().unwrap().starts_with("Report ID,Company Name"));
        let row = rows.next().unwrap();
        assert!(row.contains("3.67"));
        assert!(row.contains("N/A"));
        assert!(rows.next().is_none());
    }
}
