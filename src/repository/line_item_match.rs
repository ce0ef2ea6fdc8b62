use chrono::Utc;
use diesel::prelude::*;

use crate::domain::match_result::MatchResult;
use crate::models::line_item_match::{LineItemMatch, NewLineItemMatch};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, MatchResultWriter};

impl MatchResultWriter for DieselRepository {
    fn save_matches(
        &self,
        batch_reference: &str,
        results: &[MatchResult],
    ) -> RepositoryResult<usize> {
        use crate::schema::line_item_matches;

        if results.is_empty() {
            return Ok(0);
        }

        let created_at = Utc::now().naive_utc();
        let rows = results
            .iter()
            .enumerate()
            .map(|(position, result)| {
                let line_number = i32::try_from(position + 1).map_err(|_| {
                    RepositoryError::ValidationError(format!(
                        "batch {batch_reference} has too many line items"
                    ))
                })?;
                Ok(NewLineItemMatch::from_result(
                    batch_reference,
                    line_number,
                    result,
                    created_at,
                ))
            })
            .collect::<RepositoryResult<Vec<_>>>()?;

        let mut conn = self.conn()?;
        let inserted = conn.transaction(|conn| {
            diesel::insert_into(line_item_matches::table)
                .values(&rows)
                .execute(conn)
        })?;

        Ok(inserted)
    }
}

impl DieselRepository {
    pub fn list_matches(&self, batch_reference: &str) -> RepositoryResult<Vec<LineItemMatch>> {
        use crate::schema::line_item_matches;

        let mut conn = self.conn()?;

        let rows = line_item_matches::table
            .filter(line_item_matches::batch_reference.eq(batch_reference))
            .order(line_item_matches::line_number.asc())
            .select(LineItemMatch::as_select())
            .load::<LineItemMatch>(&mut conn)?;

        Ok(rows)
    }
}
