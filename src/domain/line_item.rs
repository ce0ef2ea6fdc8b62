use serde::{Deserialize, Serialize};

/// A product mention extracted from an inbound email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub identifier: Option<String>,
    pub description: String,
    /// Originating email or message reference, never interpreted.
    #[serde(default)]
    pub context: serde_json::Value,
}

impl LineItem {
    pub fn new(identifier: Option<&str>, description: &str) -> Self {
        Self {
            identifier: identifier.map(str::to_string),
            description: description.to_string(),
            context: serde_json::Value::Null,
        }
    }

    /// Identifier with surrounding whitespace removed, `None` when blank.
    pub fn identifier(&self) -> Option<&str> {
        self.identifier
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Description with surrounding whitespace removed, `None` when blank.
    pub fn description(&self) -> Option<&str> {
        Some(self.description.trim()).filter(|value| !value.is_empty())
    }
}

/// Line items extracted from one email, matched and reported together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchBatch {
    pub reference: String,
    pub items: Vec<LineItem>,
}
