use crate::domain::line_item::MatchBatch;
use crate::processing::matcher::Matcher;
use crate::processing::report::MatchReport;
use crate::repository::MatchResultWriter;

/// Match every line item of a batch, persist the results and report.
///
/// Persistence failures are logged; the report is still produced so the
/// batch outcome is never lost from the logs.
pub async fn process_match_message<R>(batch: MatchBatch, matcher: &Matcher, repo: &R) -> MatchReport
where
    R: MatchResultWriter,
{
    let reference = batch.reference;
    log::info!(
        "Received match batch {reference} with {} line items",
        batch.items.len()
    );

    let results = matcher.match_batch(batch.items).await;

    if let Err(e) = repo.save_matches(&reference, &results) {
        log::error!("Failed to save matches for batch {reference}: {e}");
    }

    let report = MatchReport::from_results(&reference, &results);

    log::info!(
        "Finished match batch {reference}: total={}, exact_code={}, semantic={}, none={}, auto={}, review={}, average_confidence={:.3}",
        report.total,
        report.exact_code,
        report.semantic,
        report.none,
        report.auto,
        report.review,
        report.average_confidence
    );
    if report.review > 0 {
        let lines = report
            .flagged_for_review
            .iter()
            .map(|item| item.line_number.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        log::warn!("Batch {reference} has line items flagged for review: {lines}");
    }

    report
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::domain::line_item::LineItem;
    use crate::domain::match_result::{MatchMethod, MatchResult};
    use crate::models::config::MatcherSettings;
    use crate::processing::index::CatalogIndex;
    use crate::processing::normalize::IdentifierNormalizer;
    use crate::processing::testing::KeywordProvider;
    use crate::repository::errors::{RepositoryError, RepositoryResult};

    #[derive(Default)]
    struct FakeMatchRepo {
        fail: bool,
        saved: Mutex<Vec<(String, Vec<MatchMethod>)>>,
    }

    impl MatchResultWriter for FakeMatchRepo {
        fn save_matches(
            &self,
            batch_reference: &str,
            results: &[MatchResult],
        ) -> RepositoryResult<usize> {
            if self.fail {
                return Err(RepositoryError::ValidationError(
                    "injected save failure".to_string(),
                ));
            }
            let mut saved = self.saved.lock().expect("saved mutex poisoned");
            saved.push((
                batch_reference.to_string(),
                results.iter().map(|result| result.method).collect(),
            ));
            Ok(results.len())
        }
    }

    fn empty_matcher() -> Matcher {
        Matcher::new(
            Arc::new(CatalogIndex::empty(IdentifierNormalizer::default())),
            Arc::new(KeywordProvider::products()),
            MatcherSettings::default(),
        )
    }

    fn batch() -> MatchBatch {
        MatchBatch {
            reference: "email-7".to_string(),
            items: vec![
                LineItem::new(Some("SDS2373"), "Duro Seal A"),
                LineItem::new(None, ""),
            ],
        }
    }

    #[tokio::test]
    async fn results_are_saved_in_item_order() {
        let repo = FakeMatchRepo::default();

        let report = process_match_message(batch(), &empty_matcher(), &repo).await;

        assert_eq!(report.total, 2);
        assert_eq!(report.none, 2);
        assert_eq!(
            *repo.saved.lock().expect("saved mutex poisoned"),
            vec![(
                "email-7".to_string(),
                vec![MatchMethod::None, MatchMethod::None]
            )]
        );
    }

    #[tokio::test]
    async fn save_failure_still_reports() {
        let repo = FakeMatchRepo {
            fail: true,
            ..Default::default()
        };

        let report = process_match_message(batch(), &empty_matcher(), &repo).await;

        assert_eq!(report.reference, "email-7");
        assert_eq!(report.total, 2);
    }
}
