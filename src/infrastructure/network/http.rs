// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::domain::error::AppError;
use reqwest::{Client, Proxy};
use serde_json::Value;
use std::time::Duration;

/// Builds outbound clients; one per distinct proxy, all with the same timeout.
#[derive(Clone)]
pub struct HttpClients {
    direct: Client,
    timeout: Duration,
}

impl HttpClients {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let direct = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("HTTP client init failed: {e}")))?;
        Ok(Self { direct, timeout })
    }

    pub fn client_for(&self, proxy: Option<&str>) -> Result<Client, AppError> {
        let Some(proxy) = proxy else {
            return Ok(self.direct.clone());
        };
        let proxy = Proxy::all(proxy)
            .map_err(|e| AppError::Connection(format!("invalid proxy: {e}")))?;
        Client::builder()
            .timeout(self.timeout)
            .proxy(proxy)
            .build()
            .map_err(|e| AppError::Connection(format!("proxied client init failed: {e}")))
    }
}

/// GET `url` and decode the body as JSON.
pub async fn get_json(client: &Client, url: &str, provider: &str) -> Result<Value, AppError> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::Connection(format!("{provider}: {e}")))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(AppError::ApiCall {
            provider: provider.to_string(),
            status: status.as_u16(),
        });
    }
    let body = resp
        .text()
        .await
        .map_err(|e| AppError::Connection(format!("{provider}: body read failed: {e}")))?;
    serde_json::from_str(&body)
        .map_err(|e| AppError::Parse(format!("{provider} returned non-JSON body: {e}")))
}
