// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::parsing::json_number;
use crate::domain::constants::{
    COL_COMMENT, COL_VALUE, MISSING_PATHS_PREFIX, SETTING_CHAIN, SETTING_PATH, SETTING_URL,
};
use crate::domain::error::AppError;
use crate::domain::record::RowUpdate;
use crate::infrastructure::network::http::get_json;
use crate::infrastructure::store::{RecordStore, TableBackend, parse_chain_id};
use crate::services::fetcher::BalanceFetcher;
use reqwest::Client;
use serde_json::Value;
use serde_json_path::JsonPath;
use std::borrow::Cow;

/// Total of all matched paths plus a diagnostic for the ones that matched nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSum {
    pub total: f64,
    pub message: String,
}

impl PathSum {
    pub fn is_complete(&self) -> bool {
        self.message.is_empty()
    }
}

/// Root a relative path ("a.b", "[0].a") at `$`; rooted paths pass through unchanged.
fn rooted_path(path: &str) -> Cow<'_, str> {
    if path.starts_with('$') {
        Cow::Borrowed(path)
    } else if path.starts_with('[') {
        Cow::Owned(format!("${path}"))
    } else {
        Cow::Owned(format!("$.{path}"))
    }
}

/// Evaluate `expr` (`path1 + path2 + ...`) against `body` and sum the first match of each path.
/// Unmatched paths are reported in `message` and never fail the call.
pub fn sum_data_paths(expr: &str, body: &Value) -> Result<PathSum, AppError> {
    let mut total = 0.0;
    let mut missing: Vec<&str> = Vec::new();

    for raw in expr.split('+') {
        let path_str = raw.trim();
        if path_str.is_empty() {
            return Err(AppError::Parse(format!("empty data path in {expr:?}")));
        }
        let path = JsonPath::parse(&rooted_path(path_str))
            .map_err(|e| AppError::Parse(format!("invalid data path {path_str:?}: {e}")))?;
        let nodes = path.query(body);
        match nodes.first() {
            Some(found) => {
                let value = json_number(found).ok_or_else(|| {
                    AppError::Parse(format!("value at {path_str} is not numeric: {found}"))
                })?;
                tracing::info!(target: "fetcher", path = path_str, value, "Found value");
                total += value;
            }
            None => {
                tracing::warn!(target: "fetcher", path = path_str, "No value found for path");
                missing.push(path_str);
            }
        }
    }

    if !total.is_finite() {
        return Err(AppError::Parse(format!("sum of {expr:?} is not finite")));
    }

    let message = if missing.is_empty() {
        String::new()
    } else {
        format!("{MISSING_PATHS_PREFIX}{}", missing.join(", "))
    };
    Ok(PathSum { total, message })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPathPlan {
    pub base_url: String,
    pub expression: String,
}

/// Generic fetcher: GET `base_url + address`, then sum a data-path expression.
#[derive(Debug, Clone, Default)]
pub struct DataPathFetcher;

impl DataPathFetcher {
    pub fn new() -> Self {
        Self
    }

    async fn resolve_base_url<B: TableBackend>(store: &RecordStore<B>) -> Result<String, AppError> {
        match store.find_setting(SETTING_URL, None).await {
            Ok(url) => Ok(url),
            Err(url_err) if url_err.is_lookup_miss() => {
                let chain = match store.find_setting(SETTING_CHAIN, None).await {
                    Ok(raw) => raw,
                    Err(chain_err) if chain_err.is_lookup_miss() => return Err(url_err),
                    Err(other) => return Err(other),
                };
                tracing::debug!(target: "fetcher", chain = %chain, "URL setting absent; resolving via chain");
                store.find_chain(parse_chain_id(&chain)?, None).await
            }
            Err(other) => Err(other),
        }
    }
}

impl BalanceFetcher for DataPathFetcher {
    type Plan = DataPathPlan;

    async fn plan<B: TableBackend>(&self, store: &RecordStore<B>) -> Result<DataPathPlan, AppError> {
        let base_url = Self::resolve_base_url(store).await?;
        let expression = store.find_setting(SETTING_PATH, None).await?;
        tracing::info!(target: "fetcher", url = %base_url, path = %expression, "Resolved endpoint");
        Ok(DataPathPlan {
            base_url,
            expression,
        })
    }

    async fn fetch(
        &self,
        plan: &DataPathPlan,
        address: &str,
        client: &Client,
    ) -> Result<RowUpdate, AppError> {
        let url = format!("{}{}", plan.base_url, address);
        let body = get_json(client, &url, "balance API").await?;
        let sum = sum_data_paths(&plan.expression, &body)?;
        Ok(RowUpdate::new()
            .set(COL_VALUE, sum.total)
            .set(COL_COMMENT, sum.message))
    }
}
