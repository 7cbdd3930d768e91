// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

pub mod grist;
pub mod memory;

use crate::common::parsing::normalize_column;
use crate::domain::constants::{
    DEFAULT_CHAINS_TABLE, DEFAULT_SETTINGS_TABLE, DEFAULT_WALLETS_TABLE,
};
use crate::domain::error::AppError;
use crate::domain::record::{ChainRow, RawRecord, RecordPatch, RowUpdate, SettingRow, WalletRow};

/// Table-level access to the spreadsheet backend.
#[allow(async_fn_in_trait)]
pub trait TableBackend {
    async fn fetch_records(&self, table: &str) -> Result<Vec<RawRecord>, AppError>;
    async fn update_records(&self, table: &str, patches: Vec<RecordPatch>) -> Result<(), AppError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub wallets: String,
    pub settings: String,
    pub chains: String,
}

impl TableNames {
    pub fn new(wallets: &str, settings: &str, chains: &str) -> Self {
        Self {
            wallets: normalize_column(wallets),
            settings: normalize_column(settings),
            chains: normalize_column(chains),
        }
    }
}

impl Default for TableNames {
    fn default() -> Self {
        Self::new(
            DEFAULT_WALLETS_TABLE,
            DEFAULT_SETTINGS_TABLE,
            DEFAULT_CHAINS_TABLE,
        )
    }
}

/// Selects rows by id, state and/or name. Empty filter matches nothing.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub id: Option<i64>,
    pub state: Option<String>,
    pub name: Option<String>,
}

impl RecordFilter {
    fn matches(&self, row: &WalletRow) -> bool {
        if self.id.is_none() && self.state.is_none() && self.name.is_none() {
            return false;
        }
        if let Some(id) = self.id {
            // id wins over the other criteria
            return row.id == id;
        }
        let state_ok = self
            .state
            .as_deref()
            .is_none_or(|s| row.state.as_deref() == Some(s));
        let name_ok = self
            .name
            .as_deref()
            .is_none_or(|n| row.name.as_deref() == Some(n));
        state_ok && name_ok
    }
}

/// Record store adapter: typed reads, column-normalized writes, settings and chain lookups.
pub struct RecordStore<B> {
    backend: B,
    tables: TableNames,
    dry_run: bool,
}

impl<B: TableBackend> RecordStore<B> {
    pub fn new(backend: B, tables: TableNames) -> Self {
        Self {
            backend,
            tables,
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn tables(&self) -> &TableNames {
        &self.tables
    }

    fn resolve_table(&self, table: Option<&str>, default: &str) -> String {
        table
            .map(normalize_column)
            .unwrap_or_else(|| default.to_string())
    }

    pub async fn fetch_table(&self, table: Option<&str>) -> Result<Vec<RawRecord>, AppError> {
        let table = self.resolve_table(table, &self.tables.wallets);
        let records = self.backend.fetch_records(&table).await?;
        tracing::debug!(target: "store", table = %table, rows = records.len(), "Fetched table");
        Ok(records)
    }

    pub async fn fetch_wallets(&self, table: Option<&str>) -> Result<Vec<WalletRow>, AppError> {
        let records = self.fetch_table(table).await?;
        Ok(records.iter().map(WalletRow::from_record).collect())
    }

    pub async fn find_records(
        &self,
        filter: &RecordFilter,
        table: Option<&str>,
    ) -> Result<Vec<WalletRow>, AppError> {
        let rows = self.fetch_wallets(table).await?;
        Ok(rows.into_iter().filter(|row| filter.matches(row)).collect())
    }

    /// Write one or more columns on exactly one row. No retry here.
    pub async fn update(
        &self,
        row_id: i64,
        update: RowUpdate,
        table: Option<&str>,
    ) -> Result<(), AppError> {
        if update.is_empty() {
            return Ok(());
        }
        let table = self.resolve_table(table, &self.tables.wallets);
        let patch = update.into_patch(row_id)?;
        if self.dry_run {
            tracing::info!(
                target: "store",
                table = %table,
                row_id,
                fields = %serde_json::Value::Object(patch.fields.clone()),
                "Dry run: skipping update"
            );
            return Ok(());
        }
        tracing::debug!(target: "store", table = %table, row_id, "Updating row");
        self.backend.update_records(&table, vec![patch]).await
    }

    pub async fn find_setting(&self, name: &str, table: Option<&str>) -> Result<String, AppError> {
        let table = self.resolve_table(table, &self.tables.settings);
        let records = self.backend.fetch_records(&table).await?;
        let row = records
            .iter()
            .map(SettingRow::from_record)
            .find(|row| row.setting.as_deref() == Some(name))
            .ok_or_else(|| AppError::SettingNotFound {
                name: name.to_string(),
                table: table.clone(),
            })?;
        match row.value {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(AppError::SettingEmpty {
                name: name.to_string(),
            }),
        }
    }

    /// Resolve a chain's API base URL by row id.
    pub async fn find_chain(&self, chain_id: Option<i64>, table: Option<&str>) -> Result<String, AppError> {
        let chain_id = match chain_id {
            Some(id) if id != 0 => id,
            _ => return Err(AppError::Chain("chain id is not set".into())),
        };
        let table = self.resolve_table(table, &self.tables.chains);
        let records = self.backend.fetch_records(&table).await?;
        if records.is_empty() {
            return Err(AppError::Chain(format!("table {table} is empty")));
        }
        let chain = records
            .iter()
            .map(ChainRow::from_record)
            .find(|row| row.id == chain_id)
            .ok_or_else(|| AppError::Chain(format!("chain {chain_id} not found in {table}")))?;
        chain
            .api
            .ok_or_else(|| AppError::Chain(format!("chain {chain_id} has no API")))
    }
}

/// Parse a chain reference cell; blank means unset.
pub fn parse_chain_id(raw: &str) -> Result<Option<i64>, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if let Ok(id) = trimmed.parse::<i64>() {
        return Ok(Some(id));
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 => Ok(Some(f as i64)),
        _ => Err(AppError::Chain(format!("invalid chain id {trimmed:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryBackend;
    use super::*;
    use serde_json::json;

    fn store() -> RecordStore<MemoryBackend> {
        let backend = MemoryBackend::new()
            .with_table(
                "Settings",
                vec![
                    (1, json!({"Setting": "URL", "Value": "https://api.example/balance/"})),
                    (2, json!({"Setting": "Path", "Value": ""})),
                    (3, json!({"Setting": "Chain", "Value": 2})),
                ],
            )
            .with_table(
                "Chains",
                vec![
                    (1, json!({"API": "https://one.example/"})),
                    (2, json!({"API": "https://two.example/"})),
                    (3, json!({"API": ""})),
                ],
            )
            .with_table(
                "Wallets",
                vec![
                    (1, json!({"Address": "0xa", "State": "WiP", "Name": "alpha"})),
                    (2, json!({"Address": "0xb", "State": "Dirty", "Name": "beta"})),
                    (3, json!({"Address": "0xc", "State": "WiP", "Name": "gamma"})),
                ],
            );
        RecordStore::new(backend, TableNames::default())
    }

    #[tokio::test]
    async fn find_setting_returns_value_or_typed_miss() {
        let store = store();
        assert_eq!(
            store.find_setting("URL", None).await.unwrap(),
            "https://api.example/balance/"
        );
        assert!(matches!(
            store.find_setting("Path", None).await,
            Err(AppError::SettingEmpty { .. })
        ));
        let missing = store.find_setting("Nope", None).await.unwrap_err();
        assert!(matches!(missing, AppError::SettingNotFound { ref table, .. } if table == "Settings"));
    }

    #[tokio::test]
    async fn find_chain_rejects_unset_missing_and_empty_api() {
        let store = store();
        assert_eq!(
            store.find_chain(Some(2), None).await.unwrap(),
            "https://two.example/"
        );
        assert!(matches!(store.find_chain(None, None).await, Err(AppError::Chain(_))));
        assert!(matches!(store.find_chain(Some(0), None).await, Err(AppError::Chain(_))));
        assert!(matches!(store.find_chain(Some(9), None).await, Err(AppError::Chain(_))));
        assert!(matches!(store.find_chain(Some(3), None).await, Err(AppError::Chain(_))));
        assert!(matches!(
            store.find_chain(Some(1), Some("Empty chains")).await,
            Err(AppError::Chain(msg)) if msg.contains("Empty_chains")
        ));
    }

    #[tokio::test]
    async fn update_writes_normalized_columns() {
        let store = store();
        store
            .update(2, RowUpdate::new().set("Deploy date", 10i64), None)
            .await
            .unwrap();
        let patches = store.backend().patches();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].0, "Wallets");
        assert_eq!(patches[0].1.fields.get("Deploy_date"), Some(&json!(10)));
    }

    #[tokio::test]
    async fn dry_run_never_reaches_backend() {
        let store = store().with_dry_run(true);
        store
            .update(1, RowUpdate::new().set("Value", 1.0), None)
            .await
            .unwrap();
        assert!(store.backend().patches().is_empty());
    }

    #[tokio::test]
    async fn find_records_filters_by_state_and_name() {
        let store = store();
        let wip = RecordFilter {
            state: Some("WiP".into()),
            ..Default::default()
        };
        let ids: Vec<i64> = store
            .find_records(&wip, None)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);

        let named = RecordFilter {
            state: Some("WiP".into()),
            name: Some("gamma".into()),
            ..Default::default()
        };
        assert_eq!(store.find_records(&named, None).await.unwrap()[0].id, 3);

        let by_id = RecordFilter {
            id: Some(2),
            ..Default::default()
        };
        assert_eq!(store.find_records(&by_id, None).await.unwrap()[0].id, 2);
        assert!(store
            .find_records(&RecordFilter::default(), None)
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn chain_ids_parse_from_integer_or_float_cells() {
        assert_eq!(parse_chain_id("").unwrap(), None);
        assert_eq!(parse_chain_id("7").unwrap(), Some(7));
        assert_eq!(parse_chain_id("7.0").unwrap(), Some(7));
        assert!(parse_chain_id("abc").is_err());
    }
}
