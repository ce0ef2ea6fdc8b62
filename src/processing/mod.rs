use serde::Deserialize;

use crate::domain::line_item::MatchBatch;

pub mod catalog;
pub mod embedding;
pub mod index;
pub mod matcher;
pub mod matching;
pub mod normalize;
pub mod rebuild;
pub mod report;

#[cfg(test)]
pub(crate) mod testing;

#[derive(Deserialize, Debug)]
pub enum ZMQMessage {
    Match(MatchBatch),
    RebuildCatalog,
}
