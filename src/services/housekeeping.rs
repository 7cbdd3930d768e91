// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::constants::*;
use crate::domain::error::AppError;
use crate::domain::record::{RowUpdate, WalletRow};
use crate::infrastructure::store::{RecordFilter, RecordStore, TableBackend};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HousekeepingReport {
    pub scanned: usize,
    pub updated: usize,
    pub defaults_filled: usize,
    pub old_version_dirty: usize,
    pub wip_timeouts: usize,
    pub retries_initialized: usize,
}

fn blank(field: &Option<String>) -> bool {
    field.as_deref().is_none_or(str::is_empty)
}

/// Apply the four normalization rules, in order, to a single row.
/// Later rules see the fields written by earlier ones.
pub fn normalize_row(row: &WalletRow, now: i64, report: &mut HousekeepingReport) -> RowUpdate {
    let mut state = row.state.clone().unwrap_or_default();
    let mut version = row.version.clone().unwrap_or_default();
    let mut update = RowUpdate::new();

    // 1: fill defaults
    let mut filled = false;
    if state.is_empty() {
        state = STATE_DIRTY.to_string();
        update.insert(COL_STATE, STATE_DIRTY);
        filled = true;
    }
    if version.is_empty() {
        version = DEFAULT_VERSION.to_string();
        update.insert(COL_VERSION, DEFAULT_VERSION);
        filled = true;
    }
    if filled {
        report.defaults_filled += 1;
    }

    // 2: old version outside a known state
    if version == DEFAULT_VERSION && ![STATE_WIP, STATE_DIRTY, STATE_ERROR].contains(&state.as_str()) {
        state = STATE_DIRTY.to_string();
        update.insert(COL_STATE, STATE_DIRTY);
        update.insert(COL_STATUS, STATUS_OLD_VERSION);
        report.old_version_dirty += 1;
    }

    // 3: stale WiP
    if let Some(deployed) = row.deploy_date
        && state == STATE_WIP
        && now - deployed > MAX_WIP_AGE_SECS
    {
        update.insert(COL_STATE, STATE_DIRTY);
        update.insert(COL_STATUS, STATUS_WIP_TIMEOUT);
        report.wip_timeouts += 1;
    }

    // 4: retries counter
    if blank(&row.retries) {
        update.insert(COL_RETRIES, DEFAULT_RETRIES);
        report.retries_initialized += 1;
    }

    update
}

/// Table normalization pass over the wallets table. Not part of the poll loop.
/// With a filter only the matching rows are scanned.
pub async fn run_housekeeping<B: TableBackend>(
    store: &RecordStore<B>,
    now: i64,
    filter: Option<&RecordFilter>,
) -> Result<HousekeepingReport, AppError> {
    let rows = match filter {
        Some(filter) => store.find_records(filter, None).await?,
        None => store.fetch_wallets(None).await?,
    };
    let mut report = HousekeepingReport {
        scanned: rows.len(),
        ..Default::default()
    };
    tracing::info!(target: "housekeeping", rows = rows.len(), "Running table normalization");

    for row in &rows {
        let update = normalize_row(row, now, &mut report);
        if update.is_empty() {
            continue;
        }
        tracing::debug!(
            target: "housekeeping",
            row_id = row.id,
            columns = %update.columns().collect::<Vec<_>>().join(","),
            "Normalizing row"
        );
        store.update(row.id, update, None).await?;
        report.updated += 1;
    }

    tracing::info!(
        target: "housekeeping",
        updated = report.updated,
        defaults = report.defaults_filled,
        old_version = report.old_version_dirty,
        wip_timeouts = report.wip_timeouts,
        retries = report.retries_initialized,
        "Table normalization finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::FieldValue;
    use crate::infrastructure::store::TableNames;
    use crate::infrastructure::store::memory::MemoryBackend;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000;

    fn text(s: &str) -> Option<FieldValue> {
        Some(FieldValue::Text(s.to_string()))
    }

    #[test]
    fn empty_state_and_version_get_defaults() {
        let row = WalletRow {
            id: 1,
            retries: Some("1/4".into()),
            ..Default::default()
        };
        let mut report = HousekeepingReport::default();
        let update = normalize_row(&row, NOW, &mut report);
        assert_eq!(update.get("State").cloned(), text("Dirty"));
        assert_eq!(update.get("Version").cloned(), text("av1"));
        assert!(update.get("Status").is_none());
        assert!(update.get("Retries").is_none());
    }

    #[test]
    fn old_version_in_unknown_state_goes_dirty() {
        let row = WalletRow {
            id: 1,
            state: Some("Done".into()),
            version: Some("av1".into()),
            retries: Some("0/4".into()),
            ..Default::default()
        };
        let mut report = HousekeepingReport::default();
        let update = normalize_row(&row, NOW, &mut report);
        assert_eq!(update.get("State").cloned(), text("Dirty"));
        assert_eq!(update.get("Status").cloned(), text("Set Dirty by old Version"));
        assert_eq!(report.old_version_dirty, 1);
    }

    #[test]
    fn stale_wip_times_out_but_fresh_wip_stays() {
        let stale = WalletRow {
            id: 1,
            state: Some("WiP".into()),
            version: Some("av2".into()),
            deploy_date: Some(NOW - MAX_WIP_AGE_SECS - 1),
            retries: Some("0/4".into()),
            ..Default::default()
        };
        let mut report = HousekeepingReport::default();
        let update = normalize_row(&stale, NOW, &mut report);
        assert_eq!(update.get("State").cloned(), text("Dirty"));
        assert_eq!(update.get("Status").cloned(), text("Set Dirty by WiP Timeout"));

        let fresh = WalletRow {
            deploy_date: Some(NOW - MAX_WIP_AGE_SECS),
            ..stale
        };
        assert!(normalize_row(&fresh, NOW, &mut report).is_empty());
    }

    #[test]
    fn missing_retries_initialized() {
        let row = WalletRow {
            id: 1,
            state: Some("Dirty".into()),
            version: Some("av1".into()),
            ..Default::default()
        };
        let mut report = HousekeepingReport::default();
        let update = normalize_row(&row, NOW, &mut report);
        assert_eq!(update.len(), 1);
        assert_eq!(update.get("Retries").cloned(), text("0/4"));
    }

    #[tokio::test]
    async fn second_pass_changes_nothing() {
        let backend = MemoryBackend::new().with_table(
            "Wallets",
            vec![
                (1, json!({})),
                (2, json!({"State": "Done", "Version": "av1", "Retries": "2/4"})),
                (3, json!({"State": "WiP", "Version": "av2", "Deploy_date": NOW - 3 * 3600})),
                (4, json!({"State": "WiP", "Version": "av1", "Deploy_date": NOW - 60, "Retries": "1/4"})),
                (5, json!({"State": "Error", "Version": "av3", "Retries": ""})),
            ],
        );
        let store = RecordStore::new(backend, TableNames::default());

        let first = run_housekeeping(&store, NOW, None).await.unwrap();
        assert_eq!(first.scanned, 5);
        assert_eq!(first.updated, 4);
        let writes_after_first = store.backend().patches().len();

        let second = run_housekeeping(&store, NOW, None).await.unwrap();
        assert_eq!(second.updated, 0);
        assert_eq!(store.backend().patches().len(), writes_after_first);

        let row3 = store.backend().row("Wallets", 3).unwrap();
        assert_eq!(row3.fields.get("State"), Some(&json!("Dirty")));
        assert_eq!(row3.fields.get("Status"), Some(&json!("Set Dirty by WiP Timeout")));
        assert_eq!(row3.fields.get("Retries"), Some(&json!("0/4")));
        let row4 = store.backend().row("Wallets", 4).unwrap();
        assert_eq!(row4.fields.get("State"), Some(&json!("WiP")));
    }

    #[tokio::test]
    async fn filter_limits_the_pass_to_matching_rows() {
        let backend = MemoryBackend::new().with_table(
            "Wallets",
            vec![
                (1, json!({"State": "WiP", "Version": "av2", "Deploy_date": NOW - 3 * 3600})),
                (2, json!({"State": "WiP", "Version": "av2", "Deploy_date": NOW - 3 * 3600})),
                (3, json!({})),
            ],
        );
        let store = RecordStore::new(backend, TableNames::default());

        let by_id = RecordFilter {
            id: Some(2),
            ..Default::default()
        };
        let report = run_housekeeping(&store, NOW, Some(&by_id)).await.unwrap();
        assert_eq!(report.scanned, 1);
        assert_eq!(report.wip_timeouts, 1);
        let touched: Vec<i64> = store.backend().patches().iter().map(|(_, p)| p.id).collect();
        assert_eq!(touched, vec![2]);

        let by_state = RecordFilter {
            state: Some("WiP".into()),
            ..Default::default()
        };
        let report = run_housekeeping(&store, NOW, Some(&by_state)).await.unwrap();
        assert_eq!(report.scanned, 1);
        let row3 = store.backend().row("Wallets", 3).unwrap();
        assert!(row3.fields.get("State").is_none());
    }
}
