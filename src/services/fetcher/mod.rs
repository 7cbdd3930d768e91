// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

pub mod data_path;
pub mod portfolio;

use crate::domain::error::AppError;
use crate::domain::record::RowUpdate;
use crate::infrastructure::store::{RecordStore, TableBackend};
use reqwest::Client;
use std::fmt::Debug;
use std::str::FromStr;

/// Balance strategy plugged into the polling driver.
///
/// `plan` runs once per iteration that has candidates and resolves any
/// datastore-held parameters. Its failures are configuration errors and abort
/// the iteration. `fetch` runs per row and its failures mark only that row.
#[allow(async_fn_in_trait)]
pub trait BalanceFetcher {
    type Plan: Debug;

    async fn plan<B: TableBackend>(&self, store: &RecordStore<B>) -> Result<Self::Plan, AppError>;

    async fn fetch(
        &self,
        plan: &Self::Plan,
        address: &str,
        client: &Client,
    ) -> Result<RowUpdate, AppError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Single endpoint + settings-driven data-path sum.
    DataPath,
    /// Fixed price / cross-chain / on-chain endpoints.
    Portfolio,
}

impl FromStr for Profile {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "data_path" | "datapath" | "generic" => Ok(Profile::DataPath),
            "portfolio" | "fixed" => Ok(Profile::Portfolio),
            other => Err(AppError::Config(format!("unknown profile {other:?}"))),
        }
    }
}
