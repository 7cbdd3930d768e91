// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::error::AppError;
use crate::domain::record::{RawRecord, RecordPatch};
use crate::infrastructure::store::TableBackend;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// In-process table backend for dry runs against fixtures and for tests.
/// Unknown tables read as empty; updates to unknown row ids are rejected.
#[derive(Default)]
pub struct MemoryBackend {
    tables: Mutex<HashMap<String, Vec<RawRecord>>>,
    patches: Mutex<Vec<(String, RecordPatch)>>,
    fetches: AtomicUsize,
    fail_updates: Mutex<Option<String>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a table from `(id, fields)` pairs. `fields` must be a JSON object.
    pub fn with_table(self, table: &str, rows: Vec<(i64, Value)>) -> Self {
        let records = rows
            .into_iter()
            .map(|(id, fields)| RawRecord {
                id,
                fields: match fields {
                    Value::Object(map) => map,
                    _ => Map::new(),
                },
            })
            .collect();
        lock(&self.tables).insert(table.to_string(), records);
        self
    }

    /// Make every subsequent update fail with `reason`.
    pub fn fail_updates_with(&self, reason: &str) {
        *lock(&self.fail_updates) = Some(reason.to_string());
    }

    pub fn rows(&self, table: &str) -> Vec<RawRecord> {
        lock(&self.tables).get(table).cloned().unwrap_or_default()
    }

    pub fn row(&self, table: &str, id: i64) -> Option<RawRecord> {
        self.rows(table).into_iter().find(|r| r.id == id)
    }

    pub fn patches(&self) -> Vec<(String, RecordPatch)> {
        lock(&self.patches).clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

impl TableBackend for MemoryBackend {
    async fn fetch_records(&self, table: &str) -> Result<Vec<RawRecord>, AppError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        Ok(self.rows(table))
    }

    async fn update_records(&self, table: &str, patches: Vec<RecordPatch>) -> Result<(), AppError> {
        if let Some(reason) = lock(&self.fail_updates).clone() {
            return Err(AppError::Store {
                table: table.to_string(),
                reason,
            });
        }
        let mut tables = lock(&self.tables);
        let rows = tables.entry(table.to_string()).or_default();
        for patch in &patches {
            let row = rows
                .iter_mut()
                .find(|r| r.id == patch.id)
                .ok_or_else(|| AppError::Store {
                    table: table.to_string(),
                    reason: format!("row {} does not exist", patch.id),
                })?;
            for (column, value) in &patch.fields {
                row.fields.insert(column.clone(), value.clone());
            }
        }
        drop(tables);
        let mut log = lock(&self.patches);
        log.extend(patches.into_iter().map(|p| (table.to_string(), p)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn updates_merge_into_existing_rows() {
        let backend = MemoryBackend::new().with_table("Wallets", vec![(1, json!({"Address": "0x1"}))]);
        let mut fields = Map::new();
        fields.insert("Value".into(), json!(3.0));
        backend
            .update_records("Wallets", vec![RecordPatch { id: 1, fields }])
            .await
            .unwrap();
        let row = backend.row("Wallets", 1).unwrap();
        assert_eq!(row.fields.get("Address"), Some(&json!("0x1")));
        assert_eq!(row.fields.get("Value"), Some(&json!(3.0)));
    }

    #[tokio::test]
    async fn update_of_unknown_row_is_rejected() {
        let backend = MemoryBackend::new().with_table("Wallets", vec![]);
        let err = backend
            .update_records(
                "Wallets",
                vec![RecordPatch {
                    id: 5,
                    fields: Map::new(),
                }],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Store { .. }));
    }
}
