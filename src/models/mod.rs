pub mod catalog;
pub mod config;
pub mod line_item_match;
