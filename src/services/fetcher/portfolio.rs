// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::parsing::json_lossy_f64;
use crate::domain::constants::{
    COL_HYPERCORE_VALUE, COL_HYPEREVM_VALUE, COL_VALUE, CROSSCHAIN_FIELD, DEFAULT_CROSSCHAIN_URL,
    DEFAULT_ONCHAIN_URL, DEFAULT_PRICE_URL, ONCHAIN_FIELD, PRICE_FIELD,
};
use crate::domain::error::AppError;
use crate::domain::record::RowUpdate;
use crate::infrastructure::network::http::get_json;
use crate::infrastructure::store::{RecordStore, TableBackend};
use crate::services::fetcher::BalanceFetcher;
use reqwest::Client;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortfolioEndpoints {
    pub price_url: String,
    /// Address is appended.
    pub crosschain_url: String,
    /// Address is appended.
    pub onchain_url: String,
}

impl Default for PortfolioEndpoints {
    fn default() -> Self {
        Self {
            price_url: DEFAULT_PRICE_URL.to_string(),
            crosschain_url: DEFAULT_CROSSCHAIN_URL.to_string(),
            onchain_url: DEFAULT_ONCHAIN_URL.to_string(),
        }
    }
}

/// Token-denominated holdings: USD values divided by the token price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioBalance {
    pub onchain: f64,
    pub crosschain: f64,
}

impl PortfolioBalance {
    pub fn from_usd(price: f64, crosschain_usd: f64, onchain_usd: f64) -> Result<Self, AppError> {
        if price <= 0.0 || !price.is_finite() {
            return Err(AppError::Validation {
                field: PRICE_FIELD.to_string(),
                message: format!("price must be positive, got {price}"),
            });
        }
        let balance = Self {
            onchain: onchain_usd / price,
            crosschain: crosschain_usd / price,
        };
        for (field, ratio) in [
            (ONCHAIN_FIELD, balance.onchain),
            (CROSSCHAIN_FIELD, balance.crosschain),
            (COL_VALUE, balance.total()),
        ] {
            if !ratio.is_finite() {
                return Err(AppError::Validation {
                    field: field.to_string(),
                    message: format!("balance is not finite at price {price}"),
                });
            }
        }
        Ok(balance)
    }

    pub fn total(&self) -> f64 {
        self.onchain + self.crosschain
    }
}

fn numeric_field(body: &Value, field: &str, provider: &str) -> Result<f64, AppError> {
    let raw = body
        .get(field)
        .ok_or_else(|| AppError::Parse(format!("{provider} response has no {field:?} field")))?;
    json_lossy_f64(raw)
        .ok_or_else(|| AppError::Parse(format!("{provider} field {field:?} is not numeric: {raw}")))
}

/// Fixed three-call fetcher: price, cross-chain USD value, on-chain USD value.
#[derive(Debug, Clone, Default)]
pub struct PortfolioFetcher {
    endpoints: PortfolioEndpoints,
}

impl PortfolioFetcher {
    pub fn new(endpoints: PortfolioEndpoints) -> Self {
        Self { endpoints }
    }

    pub async fn check_balance(&self, address: &str, client: &Client) -> Result<PortfolioBalance, AppError> {
        let price_body = get_json(client, &self.endpoints.price_url, "price").await?;
        let price = numeric_field(&price_body, PRICE_FIELD, "price")?;

        let crosschain_url = format!("{}{}", self.endpoints.crosschain_url, address);
        let crosschain_body = get_json(client, &crosschain_url, "crosschain").await?;
        let crosschain_usd = numeric_field(&crosschain_body, CROSSCHAIN_FIELD, "crosschain")?;

        let onchain_url = format!("{}{}", self.endpoints.onchain_url, address);
        let onchain_body = get_json(client, &onchain_url, "onchain").await?;
        let onchain_usd = numeric_field(&onchain_body, ONCHAIN_FIELD, "onchain")?;

        let balance = PortfolioBalance::from_usd(price, crosschain_usd, onchain_usd)?;
        tracing::info!(
            target: "fetcher",
            address,
            price,
            onchain = balance.onchain,
            crosschain = balance.crosschain,
            "Portfolio balance"
        );
        Ok(balance)
    }
}

impl BalanceFetcher for PortfolioFetcher {
    type Plan = ();

    async fn plan<B: TableBackend>(&self, _store: &RecordStore<B>) -> Result<(), AppError> {
        Ok(())
    }

    async fn fetch(&self, _plan: &(), address: &str, client: &Client) -> Result<RowUpdate, AppError> {
        let balance = self.check_balance(address, client).await?;
        Ok(RowUpdate::new()
            .set(COL_HYPERCORE_VALUE, balance.onchain)
            .set(COL_HYPEREVM_VALUE, balance.crosschain)
            .set(COL_VALUE, balance.total()))
    }
}
