//! Identifier normalization shared by the catalog index and the matcher.

use crate::models::config::NormalizationSettings;

/// Characters removed from identifiers when separator stripping is enabled.
const SEPARATORS: &[char] = &['-', '_', '.', '/', ' '];

/// Pure identifier normalization: trim, then optionally case-fold and strip
/// separators. The index and the matcher must hold the same instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifierNormalizer {
    settings: NormalizationSettings,
}

impl Default for IdentifierNormalizer {
    fn default() -> Self {
        Self::new(NormalizationSettings::default())
    }
}

impl IdentifierNormalizer {
    pub fn new(settings: NormalizationSettings) -> Self {
        Self { settings }
    }

    pub fn normalize(&self, identifier: &str) -> String {
        let trimmed = identifier.trim();
        let mut normalized: String = if self.settings.strip_separators {
            trimmed.chars().filter(|c| !SEPARATORS.contains(c)).collect()
        } else {
            trimmed.to_string()
        };
        if self.settings.case_fold {
            normalized = normalized.to_uppercase();
        }
        normalized
    }
}
