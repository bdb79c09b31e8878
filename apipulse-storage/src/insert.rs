//! Batched multi-row insert construction.
//!
//! One statement per request, one placeholder group per admitted row, in the
//! same relative order as the admission loop produced them. Placeholder
//! indices are strictly increasing and contiguous across the whole statement;
//! skipped events contribute nothing, so there are never gaps.

use apipulse_core::StoredRow;
use sqlx::{Postgres, QueryBuilder};

/// Columns per stored row. The flat argument list of a built statement is
/// always an exact multiple of this.
pub const COLUMNS_PER_ROW: usize = 12;

/// Build a single parameter-bound `INSERT` for the given rows.
///
/// The caller guarantees `rows` is non-empty; the handler short-circuits to
/// a client error before ever reaching the builder with nothing to insert.
pub fn build_insert(rows: &[StoredRow]) -> QueryBuilder<'_, Postgres> {
    debug_assert!(!rows.is_empty(), "builder requires at least one admitted row");

    let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
        "INSERT INTO requests (api_key, path, hostname, ip_address, user_agent, \
         status, response_time, method, framework, location, user_id, created_at) ",
    );
    builder.push_values(rows, |mut b, row| {
        b.push_bind(&row.api_key)
            .push_bind(&row.path)
            .push_bind(&row.hostname)
            .push_bind(&row.ip_address)
            .push_bind(&row.user_agent)
            .push_bind(row.status)
            .push_bind(row.response_time)
            .push_bind(row.method)
            .push_bind(row.framework)
            .push_bind(&row.location)
            .push_bind(&row.user_id)
            .push_bind(&row.created_at);
    });
    builder
}
