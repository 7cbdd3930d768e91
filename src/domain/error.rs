// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Setting {name} not found in table {table}")]
    SettingNotFound { name: String, table: String },

    #[error("Setting {name} is empty")]
    SettingEmpty { name: String },

    #[error("Chain lookup failed: {0}")]
    Chain(String),

    #[error("Datastore error on table {table}: {reason}")]
    Store { table: String, reason: String },

    #[error("Connection failed to endpoint: {0}")]
    Connection(String),

    #[error("External API error: {provider} responded with {status}")]
    ApiCall { provider: String, status: u16 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation failed for field {field}: {message}")]
    Validation { field: String, message: String },

    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl AppError {
    /// Expected misses on settings lookups, as opposed to I/O failures.
    pub fn is_lookup_miss(&self) -> bool {
        matches!(
            self,
            AppError::SettingNotFound { .. } | AppError::SettingEmpty { .. }
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
