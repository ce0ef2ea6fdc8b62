//! Exact-then-semantic matching of extracted line items.

use std::sync::Arc;

use futures::future;

use crate::domain::line_item::LineItem;
use crate::domain::match_result::{Candidate, ConfidenceBand, MatchResult};
use crate::error::EmptyCatalogError;
use crate::models::config::MatcherSettings;
use crate::processing::embedding::{EmbeddingProvider, embed_query_with_timeout, query_embedding_text};
use crate::processing::index::CatalogIndex;

/// What the confidence policy decides for a semantic score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Accept(ConfidenceBand),
    Reject,
}

/// One row of the confidence policy table.
pub struct ConfidenceRule {
    pub name: &'static str,
    pub applies: fn(f32, &MatcherSettings) -> bool,
    pub outcome: Outcome,
}

/// Confidence policy, evaluated top to bottom; the first applicable rule wins.
pub const CONFIDENCE_RULES: &[ConfidenceRule] = &[
    ConfidenceRule {
        name: "auto",
        applies: |score, settings| score >= settings.high_threshold,
        outcome: Outcome::Accept(ConfidenceBand::Auto),
    },
    ConfidenceRule {
        name: "review",
        applies: |score, settings| score >= settings.low_threshold,
        outcome: Outcome::Accept(ConfidenceBand::Review),
    },
    ConfidenceRule {
        name: "reject",
        applies: |_, _| true,
        outcome: Outcome::Reject,
    },
];

/// Classify a semantic similarity score with [`CONFIDENCE_RULES`].
pub fn classify(score: f32, settings: &MatcherSettings) -> Outcome {
    CONFIDENCE_RULES
        .iter()
        .find(|rule| (rule.applies)(score, settings))
        .map(|rule| rule.outcome)
        .unwrap_or(Outcome::Reject)
}

enum Stage {
    Exact,
    Semantic { note: Option<String> },
    Resolved(MatchResult),
}

/// Matches line items against one catalog index snapshot.
pub struct Matcher {
    index: Arc<CatalogIndex>,
    provider: Arc<dyn EmbeddingProvider>,
    settings: MatcherSettings,
}

impl Matcher {
    pub fn new(
        index: Arc<CatalogIndex>,
        provider: Arc<dyn EmbeddingProvider>,
        settings: MatcherSettings,
    ) -> Self {
        Self {
            index,
            provider,
            settings,
        }
    }

    /// Resolve a single line item. Never fails: problems end up as a `none`
    /// result carrying a diagnostic.
    pub async fn match_item(&self, item: LineItem) -> MatchResult {
        let mut stage = Stage::Exact;
        loop {
            stage = match stage {
                Stage::Exact => self.exact_stage(&item),
                Stage::Semantic { note } => {
                    Stage::Resolved(self.semantic_stage(&item).await.with_note(note))
                }
                Stage::Resolved(result) => {
                    log::debug!(
                        "Resolved line item {:?}: method={}, identifier={:?}, confidence={:.3}",
                        item.description,
                        result.method.as_str(),
                        result.identifier,
                        result.confidence
                    );
                    return result;
                }
            };
        }
    }

    /// Resolve every item of a batch independently, preserving order.
    pub async fn match_batch(&self, items: Vec<LineItem>) -> Vec<MatchResult> {
        future::join_all(items.into_iter().map(|item| self.match_item(item))).await
    }

    fn exact_stage(&self, item: &LineItem) -> Stage {
        let Some(identifier) = item.identifier() else {
            return Stage::Semantic { note: None };
        };

        let normalizer = self.index.normalizer();
        let query = normalizer.normalize(identifier);

        if let Some(record) = self.index.lookup_exact(&query) {
            if normalizer.normalize(&record.identifier) == query {
                return Stage::Resolved(MatchResult::exact(
                    &record.identifier,
                    &record.name,
                    item.clone(),
                ));
            }
            log::warn!(
                "Exact lookup for {query} returned {}, treating as not found",
                record.identifier
            );
        }

        let note = match self.index.closest_identifier(&query) {
            Some((record, similarity))
                if similarity > self.settings.identifier_collision_threshold
                    && self.index.normalized_identifier(record) != query =>
            {
                log::warn!(
                    "Rejected near-identical identifier {} for query {identifier} (similarity {similarity:.3})",
                    record.identifier
                );
                format!(
                    "identifier {identifier} not in catalog; near-identical {} (similarity {similarity:.3}) rejected as non-exact",
                    record.identifier
                )
            }
            _ => format!("identifier {identifier} not in catalog"),
        };

        Stage::Semantic { note: Some(note) }
    }

    async fn semantic_stage(&self, item: &LineItem) -> MatchResult {
        let Some(query) = query_embedding_text(item) else {
            return MatchResult::none(0.0, "blank description, nothing to embed", item.clone());
        };
        if self.index.is_empty() {
            return MatchResult::none(0.0, EmptyCatalogError.to_string(), item.clone());
        }

        let embedding = match embed_query_with_timeout(
            self.provider.as_ref(),
            query,
            self.settings.embedding_timeout(),
        )
        .await
        {
            Ok(embedding) => embedding,
            Err(error) => {
                log::warn!("Semantic stage degraded to none: {error}");
                return MatchResult::none(0.0, error.to_string(), item.clone());
            }
        };

        let candidates: Vec<Candidate> =
            match self.index.lookup_semantic(&embedding, self.settings.top_k) {
                Ok(scored) => scored
                    .into_iter()
                    .map(|scored| Candidate {
                        identifier: scored.record.identifier.clone(),
                        name: scored.record.name.clone(),
                        score: scored.score,
                    })
                    .collect(),
                Err(error) => {
                    log::warn!("Semantic lookup failed: {error}");
                    return MatchResult::none(0.0, error.to_string(), item.clone());
                }
            };

        let Some(best) = candidates.first().cloned() else {
            return MatchResult::none(0.0, "no semantic candidate", item.clone());
        };

        match classify(best.score, &self.settings) {
            Outcome::Accept(band) => MatchResult::semantic(&best, band, candidates, item.clone()),
            Outcome::Reject => MatchResult::none(
                best.score,
                format!(
                    "best candidate {} scored {:.3}, below {:.2}",
                    best.identifier, best.score, self.settings.low_threshold
                ),
                item.clone(),
            )
            .with_candidates(candidates),
        }
    }
}
