pub mod db;
pub mod domain;
pub mod error;
pub mod models;
pub mod processing;
pub mod repository;
pub mod schema;

/// Semantic similarity at or above which a match is accepted automatically.
pub const HIGH_CONFIDENCE_THRESHOLD: f32 = 0.95;

/// Semantic similarity below which no match is reported.
pub const LOW_CONFIDENCE_THRESHOLD: f32 = 0.70;

/// Identifier similarity above which a non-identical code is treated as a
/// near-collision and rejected as an exact match.
pub const IDENTIFIER_COLLISION_THRESHOLD: f32 = 0.95;
