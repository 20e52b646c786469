//! Scoring engine: turns a snapshot of responses plus per-section
//! aggregation rules into section scores and an overall score.
//!
//! The functions here are pure. Callers materialize the snapshot (one
//! transactional read) and persist the resulting [`ScoreCard`] as an
//! immutable report.

use std::collections::BTreeMap;

use serde::Serialize;

use super::models::{AggregationMethod, QuestionType, Section};

/// One response as the engine sees it: the section its question belongs to
/// and the score resolved at write time. `None` marks an unscored
/// text_input answer.
#[derive(Debug, Clone, Copy)]
pub struct ScoredResponse {
    pub section: Section,
    pub score: Option<i32>,
}

/// A questionnaire's aggregation rule for one section.
#[derive(Debug, Clone, Copy)]
pub struct SectionRule {
    pub section: Section,
    pub method: AggregationMethod,
    pub weight: f64,
}

/// A scoring option on a question, reduced to what resolution needs.
#[derive(Debug, Clone)]
pub struct ScoreOption {
    pub value: String,
    pub score: i32,
}

/// Computed snapshot for one (company, questionnaire) pair. Sections that
/// produced no score are absent from the map, not zeroed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreCard {
    pub overall_score: Option<f64>,
    pub section_scores: BTreeMap<Section, f64>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ScoringError {
    #[error("no responses found for the given company and questionnaire")]
    NoResponses,
    #[error("no scoring configurations found for the given questionnaire")]
    NoScoringConfig,
    #[error("invalid value '{value}' for question type '{question_type}'")]
    InvalidOptionValue {
        value: String,
        question_type: QuestionType,
    },
}

/// Resolve the score to store on a response.
///
/// text_input questions never score, whatever was submitted. Every other
/// type must match one of its options exactly (case-sensitive); a miss is
/// an error, never a silent zero.
pub fn resolve_response_score(
    question_type: QuestionType,
    options: &[ScoreOption],
    value: &str,
) -> Result<Option<i32>, ScoringError> {
    if !question_type.is_scored() {
        return Ok(None);
    }

    options
        .iter()
        .find(|opt| opt.value == value)
        .map(|opt| Some(opt.score))
        .ok_or_else(|| ScoringError::InvalidOptionValue {
            value: value.to_string(),
            question_type,
        })
}

/// Aggregate a response snapshot into section scores and an overall score.
///
/// Sections with responses but no rule are skipped; sections with a rule
/// but no scored responses are absent from the output and from the overall
/// arithmetic. The overall score takes one of two branches: when every
/// rule is weighted_average it is Σ section score / Σ weight (the weight
/// thus applies twice, once inside the section score and once in the
/// divisor — kept for compatibility); otherwise it is the mean of the
/// strictly positive section scores, so an exact-zero section is excluded
/// by policy.
pub fn compute_scorecard(
    responses: &[ScoredResponse],
    rules: &[SectionRule],
) -> Result<ScoreCard, ScoringError> {
    if responses.is_empty() {
        return Err(ScoringError::NoResponses);
    }
    if rules.is_empty() {
        return Err(ScoringError::NoScoringConfig);
    }

    let mut tallies: BTreeMap<Section, (f64, u32)> =
        rules.iter().map(|rule| (rule.section, (0.0, 0))).collect();

    for response in responses {
        let Some(score) = response.score else { continue };
        if let Some((total, count)) = tallies.get_mut(&response.section) {
            *total += f64::from(score);
            *count += 1;
        }
    }

    let mut section_scores = BTreeMap::new();
    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;

    for rule in rules {
        let (total, count) = tallies[&rule.section];
        if count == 0 {
            continue;
        }

        let raw = match rule.method {
            AggregationMethod::Sum => total,
            AggregationMethod::Average => total / f64::from(count),
            AggregationMethod::WeightedAverage => (total / f64::from(count)) * rule.weight,
        };
        section_scores.insert(rule.section, round2(raw));

        if rule.method == AggregationMethod::WeightedAverage {
            weighted_sum += raw;
            weight_sum += rule.weight;
        }
    }

    let all_weighted = rules
        .iter()
        .all(|rule| rule.method == AggregationMethod::WeightedAverage);

    let overall_score = if all_weighted && weight_sum > 0.0 {
        Some(round2(weighted_sum / weight_sum))
    } else {
        let positive: Vec<f64> = section_scores
            .values()
            .copied()
            .filter(|score| *score > 0.0)
            .collect();
        if positive.is_empty() {
            None
        } else {
            Some(round2(positive.iter().sum::<f64>() / positive.len() as f64))
        }
    };

    Ok(ScoreCard {
        overall_score,
        section_scores,
    })
}

/// Two decimal places, half away from zero.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(section: Section, method: AggregationMethod, weight: f64) -> SectionRule {
        SectionRule {
            section,
            method,
            weight,
        }
    }

    fn resp(section: Section, score: i32) -> ScoredResponse {
        ScoredResponse {
            section,
            score: Some(score),
        }
    }

    fn options() -> Vec<ScoreOption> {
        vec![
            ScoreOption {
                value: "yes".into(),
                score: 4,
            },
            ScoreOption {
                value: "no".into(),
                score: 1,
            },
        ]
    }

    #[test]
    fn sum_section_is_exact_sum() {
        let card = compute_scorecard(
            &[
                resp(Section::Environmental, 1),
                resp(Section::Environmental, 2),
                resp(Section::Environmental, 4),
            ],
            &[rule(Section::Environmental, AggregationMethod::Sum, 1.0)],
        )
        .unwrap();
        assert_eq!(card.section_scores[&Section::Environmental], 7.0);
        assert_eq!(card.overall_score, Some(7.0));
    }

    #[test]
    fn average_section_is_mean_rounded() {
        let card = compute_scorecard(
            &[
                resp(Section::Social, 1),
                resp(Section::Social, 2),
                resp(Section::Social, 2),
            ],
            &[rule(Section::Social, AggregationMethod::Average, 1.0)],
        )
        .unwrap();
        // 5 / 3 = 1.666... rounds half away from zero at 2dp
        assert_eq!(card.section_scores[&Section::Social], 1.67);
    }

    #[test]
    fn weighted_average_scales_the_mean() {
        let card = compute_scorecard(
            &[resp(Section::Governance, 3), resp(Section::Governance, 5)],
            &[rule(
                Section::Governance,
                AggregationMethod::WeightedAverage,
                0.5,
            )],
        )
        .unwrap();
        assert_eq!(card.section_scores[&Section::Governance], 2.0);
    }

    #[test]
    fn all_weighted_overall_divides_by_weight_sum() {
        // E: mean 3 * w2 = 6, S: mean 2 * w1 = 2; overall (6 + 2) / 3
        let card = compute_scorecard(
            &[
                resp(Section::Environmental, 3),
                resp(Section::Social, 2),
            ],
            &[
                rule(Section::Environmental, AggregationMethod::WeightedAverage, 2.0),
                rule(Section::Social, AggregationMethod::WeightedAverage, 1.0),
            ],
        )
        .unwrap();
        assert_eq!(card.section_scores[&Section::Environmental], 6.0);
        assert_eq!(card.section_scores[&Section::Social], 2.0);
        assert_eq!(card.overall_score, Some(2.67));
    }

    #[test]
    fn single_weighted_section_overall_recovers_the_mean() {
        let card = compute_scorecard(
            &[resp(Section::Social, 4), resp(Section::Social, 2)],
            &[rule(Section::Social, AggregationMethod::WeightedAverage, 3.0)],
        )
        .unwrap();
        // (mean 3 * w3) / w3 = 3
        assert_eq!(card.overall_score, Some(3.0));
    }

    #[test]
    fn mixed_overall_excludes_zero_sections() {
        // Governance sums to exactly 0 and must not drag the mean down.
        let card = compute_scorecard(
            &[
                resp(Section::Environmental, 4),
                resp(Section::Social, 2),
                resp(Section::Governance, 1),
                resp(Section::Governance, -1),
            ],
            &[
                rule(Section::Environmental, AggregationMethod::Average, 1.0),
                rule(Section::Social, AggregationMethod::Average, 1.0),
                rule(Section::Governance, AggregationMethod::Sum, 1.0),
            ],
        )
        .unwrap();
        assert_eq!(card.section_scores[&Section::Governance], 0.0);
        assert_eq!(card.overall_score, Some(3.0));
    }

    #[test]
    fn three_average_sections_reference_scenario() {
        let card = compute_scorecard(
            &[
                resp(Section::Environmental, 4),
                resp(Section::Social, 4),
                resp(Section::Governance, 4),
            ],
            &[
                rule(Section::Environmental, AggregationMethod::Average, 1.0),
                rule(Section::Social, AggregationMethod::Average, 1.0),
                rule(Section::Governance, AggregationMethod::Average, 1.0),
            ],
        )
        .unwrap();
        assert_eq!(card.section_scores.len(), 3);
        for section in Section::ALL {
            assert_eq!(card.section_scores[&section], 4.0);
        }
        assert_eq!(card.overall_score, Some(4.0));
    }

    #[test]
    fn unscored_responses_leave_section_absent() {
        // A section answered only through text_input has no score at all.
        let card = compute_scorecard(
            &[
                resp(Section::Environmental, 2),
                ScoredResponse {
                    section: Section::Social,
                    score: None,
                },
            ],
            &[
                rule(Section::Environmental, AggregationMethod::Average, 1.0),
                rule(Section::Social, AggregationMethod::Average, 1.0),
            ],
        )
        .unwrap();
        assert!(!card.section_scores.contains_key(&Section::Social));
        assert_eq!(card.overall_score, Some(2.0));
    }

    #[test]
    fn section_without_rule_is_skipped() {
        let card = compute_scorecard(
            &[
                resp(Section::Environmental, 4),
                resp(Section::Governance, 1),
            ],
            &[rule(Section::Environmental, AggregationMethod::Average, 1.0)],
        )
        .unwrap();
        assert_eq!(card.section_scores.len(), 1);
        assert_eq!(card.overall_score, Some(4.0));
    }

    #[test]
    fn all_zero_sections_yield_null_overall() {
        let card = compute_scorecard(
            &[resp(Section::Environmental, 0)],
            &[rule(Section::Environmental, AggregationMethod::Sum, 1.0)],
        )
        .unwrap();
        assert_eq!(card.section_scores[&Section::Environmental], 0.0);
        assert_eq!(card.overall_score, None);
    }

    #[test]
    fn empty_inputs_are_errors() {
        assert_eq!(
            compute_scorecard(&[], &[rule(Section::Social, AggregationMethod::Sum, 1.0)]),
            Err(ScoringError::NoResponses)
        );
        assert_eq!(
            compute_scorecard(&[resp(Section::Social, 1)], &[]),
            Err(ScoringError::NoScoringConfig)
        );
    }

    #[test]
    fn aggregation_is_idempotent() {
        let responses = [
            resp(Section::Environmental, 3),
            resp(Section::Social, 1),
            resp(Section::Governance, 2),
        ];
        let rules = [
            rule(Section::Environmental, AggregationMethod::WeightedAverage, 0.4),
            rule(Section::Social, AggregationMethod::WeightedAverage, 0.35),
            rule(Section::Governance, AggregationMethod::WeightedAverage, 0.25),
        ];
        let first = compute_scorecard(&responses, &rules).unwrap();
        let second = compute_scorecard(&responses, &rules).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn text_input_always_resolves_to_none() {
        let score =
            resolve_response_score(QuestionType::TextInput, &options(), "anything at all").unwrap();
        assert_eq!(score, None);
    }

    #[test]
    fn option_lookup_is_exact_and_case_sensitive() {
        let score = resolve_response_score(QuestionType::YesNo, &options(), "yes").unwrap();
        assert_eq!(score, Some(4));

        let err = resolve_response_score(QuestionType::YesNo, &options(), "Yes").unwrap_err();
        assert_eq!(
            err,
            ScoringError::InvalidOptionValue {
                value: "Yes".into(),
                question_type: QuestionType::YesNo,
            }
        );
    }
}
