//! Configuration model loaded from external sources.

use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Clone, Debug, Deserialize)]
/// Service configuration shared by the startup path and the message loop.
pub struct ServerConfig {
    pub database_url: String,
    pub zmq_address: String,
    pub embedding_model: String,
    pub matcher: MatcherSettings,
    pub normalization: NormalizationSettings,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
/// Thresholds and limits of the matching decision procedure.
pub struct MatcherSettings {
    pub high_threshold: f32,
    pub low_threshold: f32,
    pub identifier_collision_threshold: f32,
    pub top_k: usize,
    pub embedding_timeout_ms: u64,
}

impl Default for MatcherSettings {
    fn default() -> Self {
        Self {
            high_threshold: crate::HIGH_CONFIDENCE_THRESHOLD,
            low_threshold: crate::LOW_CONFIDENCE_THRESHOLD,
            identifier_collision_threshold: crate::IDENTIFIER_COLLISION_THRESHOLD,
            top_k: 3,
            embedding_timeout_ms: 5000,
        }
    }
}

impl MatcherSettings {
    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_millis(self.embedding_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let in_unit = |value: f32| (0.0..=1.0).contains(&value);
        if !in_unit(self.low_threshold)
            || !in_unit(self.high_threshold)
            || !in_unit(self.identifier_collision_threshold)
        {
            return Err(ConfigError::Invalid(
                "thresholds must lie within [0, 1]".to_string(),
            ));
        }
        if self.low_threshold > self.high_threshold {
            return Err(ConfigError::Invalid(format!(
                "low_threshold {} exceeds high_threshold {}",
                self.low_threshold, self.high_threshold
            )));
        }
        if self.top_k == 0 {
            return Err(ConfigError::Invalid("top_k must be at least 1".to_string()));
        }
        if self.embedding_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "embedding_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
/// Identifier normalization switches.
pub struct NormalizationSettings {
    pub case_fold: bool,
    pub strip_separators: bool,
}

impl Default for NormalizationSettings {
    fn default() -> Self {
        Self {
            case_fold: true,
            strip_separators: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from defaults, `config/default.yaml`, the file named
    /// by `APP_CONFIG` and `APP_*` environment variables (nested keys use `__`,
    /// e.g. `APP_MATCHER__LOW_THRESHOLD`), in that order.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("database_url", "app.db")?
            .set_default("zmq_address", "tcp://127.0.0.1:5556")?
            .set_default("embedding_model", "multilingual-e5-large")?
            .set_default(
                "matcher.high_threshold",
                f64::from(crate::HIGH_CONFIDENCE_THRESHOLD),
            )?
            .set_default(
                "matcher.low_threshold",
                f64::from(crate::LOW_CONFIDENCE_THRESHOLD),
            )?
            .set_default(
                "matcher.identifier_collision_threshold",
                f64::from(crate::IDENTIFIER_COLLISION_THRESHOLD),
            )?
            .set_default("matcher.top_k", 3)?
            .set_default("matcher.embedding_timeout_ms", 5000)?
            .set_default("normalization.case_fold", true)?
            .set_default("normalization.strip_separators", false)?
            .add_source(File::with_name("config/default").required(false));

        if let Ok(path) = std::env::var("APP_CONFIG") {
            builder = builder.add_source(File::with_name(&path).required(true));
        }

        let config: ServerConfig = builder
            .add_source(environment_source())
            .build()?
            .try_deserialize()?;

        config.matcher.validate()?;
        Ok(config)
    }
}

fn environment_source() -> Environment {
    Environment::with_prefix("APP")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
