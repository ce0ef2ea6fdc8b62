use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::match_result::MatchResult;
use crate::schema::line_item_matches;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = line_item_matches)]
pub struct LineItemMatch {
    pub id: i32,
    pub batch_reference: String,
    pub line_number: i32,
    pub product_code: Option<String>,
    pub product_name: Option<String>,
    pub match_method: String,
    pub match_score: f32,
    pub diagnostic: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = line_item_matches)]
pub struct NewLineItemMatch {
    pub batch_reference: String,
    pub line_number: i32,
    pub product_code: Option<String>,
    pub product_name: Option<String>,
    pub match_method: String,
    pub match_score: f32,
    pub diagnostic: Option<String>,
    pub created_at: NaiveDateTime,
}

impl NewLineItemMatch {
    pub fn from_result(
        batch_reference: &str,
        line_number: i32,
        result: &MatchResult,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            batch_reference: batch_reference.to_string(),
            line_number,
            product_code: result.identifier.clone(),
            product_name: result.name.clone(),
            match_method: result.method.as_str().to_string(),
            match_score: result.confidence,
            diagnostic: result.diagnostic.clone(),
            created_at,
        }
    }
}
