// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::error::AppError;
use crate::domain::record::{RawRecord, RecordPatch};
use crate::infrastructure::store::TableBackend;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

#[derive(Deserialize)]
struct RecordsEnvelope {
    records: Vec<RawRecord>,
}

#[derive(Serialize)]
struct PatchEnvelope<'a> {
    records: &'a [RecordPatch],
}

/// Grist document REST backend (`/api/docs/{doc}/tables/{table}/records`).
#[derive(Clone)]
pub struct GristBackend {
    client: Client,
    server: Url,
    doc_id: String,
    api_key: String,
}

impl GristBackend {
    pub fn new(server: &str, doc_id: &str, api_key: &str, timeout: Duration) -> Result<Self, AppError> {
        let server = Url::parse(server.trim())
            .map_err(|e| AppError::Config(format!("Invalid GRIST_SERVER {server:?}: {e}")))?;
        if doc_id.trim().is_empty() {
            return Err(AppError::Config("GRIST_DOC_ID is missing".into()));
        }
        if api_key.trim().is_empty() {
            return Err(AppError::Config("GRIST_API_KEY is missing".into()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Datastore client init failed: {e}")))?;
        Ok(Self {
            client,
            server,
            doc_id: doc_id.trim().to_string(),
            api_key: api_key.trim().to_string(),
        })
    }

    pub fn records_url(&self, table: &str) -> Result<Url, AppError> {
        let mut url = self.server.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Config(format!("GRIST_SERVER {} cannot be a base", self.server)))?
            .pop_if_empty()
            .extend(["api", "docs", self.doc_id.as_str(), "tables", table, "records"]);
        Ok(url)
    }

    fn store_err(table: &str, reason: impl Into<String>) -> AppError {
        AppError::Store {
            table: table.to_string(),
            reason: reason.into(),
        }
    }
}

impl TableBackend for GristBackend {
    async fn fetch_records(&self, table: &str) -> Result<Vec<RawRecord>, AppError> {
        let url = self.records_url(table)?;
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| Self::store_err(table, format!("fetch failed: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Self::store_err(table, format!("fetch returned HTTP {status}")));
        }
        let envelope: RecordsEnvelope = resp
            .json()
            .await
            .map_err(|e| Self::store_err(table, format!("fetch decode failed: {e}")))?;
        Ok(envelope.records)
    }

    async fn update_records(&self, table: &str, patches: Vec<RecordPatch>) -> Result<(), AppError> {
        if patches.is_empty() {
            return Ok(());
        }
        let url = self.records_url(table)?;
        let resp = self
            .client
            .patch(url)
            .bearer_auth(&self.api_key)
            .json(&PatchEnvelope { records: &patches })
            .send()
            .await
            .map_err(|e| Self::store_err(table, format!("update failed: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Self::store_err(
                table,
                format!("update returned HTTP {status}: {}", body.trim()),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> GristBackend {
        GristBackend::new(&server.uri(), "doc1", "secret", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn records_url_joins_segments() {
        let b = GristBackend::new("https://grist.example/", "abc", "k", Duration::from_secs(1)).unwrap();
        assert_eq!(
            b.records_url("Wallets").unwrap().as_str(),
            "https://grist.example/api/docs/abc/tables/Wallets/records"
        );
    }

    #[test]
    fn missing_credentials_are_config_errors() {
        let err = GristBackend::new("https://grist.example", "abc", " ", Duration::from_secs(1))
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Config(_)));
        assert!(GristBackend::new("not a url", "abc", "k", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn fetch_sends_bearer_and_decodes_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/docs/doc1/tables/Wallets/records"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "records": [{"id": 1, "fields": {"Address": "0x1", "Value": null}}]
            })))
            .mount(&server)
            .await;

        let records = backend(&server).fetch_records("Wallets").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[0].fields.get("Address"), Some(&json!("0x1")));
    }

    #[tokio::test]
    async fn update_patches_records_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/docs/doc1/tables/Wallets/records"))
            .and(body_json(json!({"records": [{"id": 3, "fields": {"Value": 1.5}}]})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut fields = Map::new();
        fields.insert("Value".into(), json!(1.5));
        backend(&server)
            .update_records("Wallets", vec![RecordPatch { id: 3, fields }])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rejected_write_surfaces_store_error() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let mut fields = Map::new();
        fields.insert("Value".into(), json!(1));
        let err = backend(&server)
            .update_records("Wallets", vec![RecordPatch { id: 3, fields }])
            .await
            .unwrap_err();
        match err {
            AppError::Store { table, reason } => {
                assert_eq!(table, "Wallets");
                assert!(reason.contains("403"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
