//! Abstraction over the row store receiving user profiles.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Error;

/// A table-oriented store. Implemented by the Supabase gateway and by test doubles.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert `row` into `table`, merging with an existing row that has the same
    /// value in the `on_conflict` column.
    async fn upsert(&self, table: &str, on_conflict: &str, row: Value) -> Result<(), Error>;

    /// Return every row of `table` as the store encodes it.
    async fn select_all(&self, table: &str) -> Result<Value, Error>;
}
