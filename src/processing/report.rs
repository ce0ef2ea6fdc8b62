use serde::Serialize;

use crate::domain::match_result::{ConfidenceBand, MatchMethod, MatchResult};

/// A line item accepted with a REVIEW band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewItem {
    pub line_number: usize,
    pub identifier: Option<String>,
    pub description: String,
    pub confidence: f32,
}

/// Per-batch summary of match results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchReport {
    pub reference: String,
    pub total: usize,
    pub exact_code: usize,
    pub semantic: usize,
    pub none: usize,
    pub auto: usize,
    pub review: usize,
    pub average_confidence: f32,
    pub flagged_for_review: Vec<ReviewItem>,
}

impl MatchReport {
    pub fn from_results(reference: &str, results: &[MatchResult]) -> Self {
        let mut report = MatchReport {
            reference: reference.to_string(),
            total: results.len(),
            ..Default::default()
        };

        let mut confidence_sum = 0.0_f64;
        for (position, result) in results.iter().enumerate() {
            match result.method {
                MatchMethod::ExactCode => report.exact_code += 1,
                MatchMethod::Semantic => report.semantic += 1,
                MatchMethod::None => report.none += 1,
            }
            match result.band {
                Some(ConfidenceBand::Auto) => report.auto += 1,
                Some(ConfidenceBand::Review) => {
                    report.review += 1;
                    report.flagged_for_review.push(ReviewItem {
                        line_number: position + 1,
                        identifier: result.identifier.clone(),
                        description: result.line_item.description.clone(),
                        confidence: result.confidence,
                    });
                }
                None => {}
            }
            confidence_sum += f64::from(result.confidence);
        }

        if !results.is_empty() {
            report.average_confidence = (confidence_sum / results.len() as f64) as f32;
        }

        report
    }
}
