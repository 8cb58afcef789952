//! Database layer for draft-sync
//!
//! SQLite persistence substrate. The draft store only needs a durable
//! key-value map, so the schema is deliberately small.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] - Database lifecycle, schema migrations
//! - [`kv`] - Key-value document storage (backs the draft store)
//! - [`state`] - Runtime state (shutdown tracking)

use sqlx::sqlite::SqlitePool;

mod kv;
mod migrations;
mod state;

/// Database handle for draft-sync
pub struct Database {
    pool: SqlitePool,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
