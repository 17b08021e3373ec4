//! Record store doubles shared by the domain tests.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{DomainErrorKind, Error, ExternalErrorKind};
use crate::record_store::RecordStore;
use crate::UpstreamFailure;

/// Keeps every upserted `(table, on_conflict, row)` in memory.
#[derive(Default)]
pub(crate) struct RecordingStore {
    rows: Mutex<Vec<(String, String, Value)>>,
    fail: bool,
}

impl RecordingStore {
    pub(crate) fn failing() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub(crate) fn rows(&self) -> Vec<(String, String, Value)> {
        self.rows.lock().unwrap().clone()
    }

    fn unavailable() -> Error {
        Error::new(
            DomainErrorKind::External(ExternalErrorKind::RecordStore(UpstreamFailure::Status(
                503,
            ))),
            "record store is down",
        )
    }
}

#[async_trait]
impl RecordStore for RecordingStore {
    async fn upsert(&self, table: &str, on_conflict: &str, row: Value) -> Result<(), Error> {
        if self.fail {
            return Err(Self::unavailable());
        }
        self.rows
            .lock()
            .unwrap()
            .push((table.to_string(), on_conflict.to_string(), row));
        Ok(())
    }

    async fn select_all(&self, table: &str) -> Result<Value, Error> {
        if self.fail {
            return Err(Self::unavailable());
        }
        Ok(Value::Array(
            self.rows()
                .into_iter()
                .filter(|(t, _, _)| t == table)
                .map(|(_, _, row)| row)
                .collect(),
        ))
    }
}
