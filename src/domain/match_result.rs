use serde::{Deserialize, Serialize};

use crate::domain::line_item::LineItem;

/// How a line item was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    ExactCode,
    Semantic,
    None,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::ExactCode => "exact_code",
            MatchMethod::Semantic => "semantic",
            MatchMethod::None => "none",
        }
    }
}

/// Confidence label attached to semantic matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceBand {
    /// Accepted without human review.
    Auto,
    /// Accepted but flagged for human review.
    Review,
}

impl ConfidenceBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceBand::Auto => "AUTO",
            ConfidenceBand::Review => "REVIEW",
        }
    }
}

/// A ranked semantic candidate kept for review tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub identifier: String,
    pub name: String,
    pub score: f32,
}

/// Outcome of matching a single [`LineItem`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub identifier: Option<String>,
    pub name: Option<String>,
    pub method: MatchMethod,
    pub confidence: f32,
    pub band: Option<ConfidenceBand>,
    pub diagnostic: Option<String>,
    pub candidates: Vec<Candidate>,
    pub line_item: LineItem,
}

impl MatchResult {
    pub fn exact(identifier: &str, name: &str, line_item: LineItem) -> Self {
        Self {
            identifier: Some(identifier.to_string()),
            name: Some(name.to_string()),
            method: MatchMethod::ExactCode,
            confidence: 1.0,
            band: None,
            diagnostic: None,
            candidates: Vec::new(),
            line_item,
        }
    }

    pub fn semantic(
        best: &Candidate,
        band: ConfidenceBand,
        candidates: Vec<Candidate>,
        line_item: LineItem,
    ) -> Self {
        Self {
            identifier: Some(best.identifier.clone()),
            name: Some(best.name.clone()),
            method: MatchMethod::Semantic,
            confidence: best.score.clamp(0.0, 1.0),
            band: Some(band),
            diagnostic: None,
            candidates,
            line_item,
        }
    }

    /// Unresolved line item; identifier and name are always empty.
    pub fn none(confidence: f32, diagnostic: impl Into<String>, line_item: LineItem) -> Self {
        Self {
            identifier: None,
            name: None,
            method: MatchMethod::None,
            confidence: confidence.clamp(0.0, 1.0),
            band: None,
            diagnostic: Some(diagnostic.into()),
            candidates: Vec::new(),
            line_item,
        }
    }

    pub fn with_candidates(mut self, candidates: Vec<Candidate>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Prepend an earlier-stage note to the diagnostic.
    pub fn with_note(mut self, note: Option<String>) -> Self {
        if let Some(note) = note {
            self.diagnostic = Some(match self.diagnostic.take() {
                Some(existing) => format!("{note}; {existing}"),
                None => note,
            });
        }
        self
    }

    pub fn needs_review(&self) -> bool {
        self.band == Some(ConfidenceBand::Review)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_serializes_as_snake_case() {
        let json = serde_json::to_string(&MatchMethod::ExactCode).expect("serialize");
        assert_eq!(json, "\"exact_code\"");
        assert_eq!(MatchMethod::None.as_str(), "none");
    }

    #[test]
    fn band_serializes_as_label() {
        let json = serde_json::to_string(&ConfidenceBand::Review).expect("serialize");
        assert_eq!(json, "\"REVIEW\"");
    }

    #[test]
    fn none_result_never_carries_identifier() {
        let result = MatchResult::none(1.7, "no candidate", LineItem::new(Some("X1"), "thing"));

        assert_eq!(result.identifier, None);
        assert_eq!(result.method, MatchMethod::None);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn note_is_prepended_to_diagnostic() {
        let result = MatchResult::none(0.2, "below threshold", LineItem::new(None, "thing"))
            .with_note(Some("collision rejected".to_string()));

        assert_eq!(
            result.diagnostic.as_deref(),
            Some("collision rejected; below threshold")
        );
    }
}
