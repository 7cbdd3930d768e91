// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use std::time::Duration;

// Row columns
pub const COL_ADDRESS: &str = "Address";
pub const COL_VALUE: &str = "Value";
pub const COL_COMMENT: &str = "Comment";
pub const COL_PROXY: &str = "Proxy";
pub const COL_NAME: &str = "Name";
pub const COL_STATE: &str = "State";
pub const COL_VERSION: &str = "Version";
pub const COL_DEPLOY_DATE: &str = "Deploy_date";
pub const COL_RETRIES: &str = "Retries";
pub const COL_STATUS: &str = "Status";
pub const COL_SETTING: &str = "Setting";
pub const COL_API: &str = "API";
pub const COL_HYPERCORE_VALUE: &str = "hypercore_hype_value";
pub const COL_HYPEREVM_VALUE: &str = "hyperevm_hype_value";

// Settings keys read by the data-path profile
pub const SETTING_URL: &str = "URL";
pub const SETTING_PATH: &str = "Path";
pub const SETTING_CHAIN: &str = "Chain";

// Row markers
pub const ERROR_SENTINEL: &str = "--";
pub const ERROR_COMMENT_PREFIX: &str = "Error: ";
pub const NO_PROXY_COMMENT: &str = "No proxy";
pub const MISSING_PATHS_PREFIX: &str = "Some paths were not found: ";

// Naive timestamps are interpreted at UTC+3
pub const NAIVE_UTC_OFFSET_SECS: i32 = 3 * 60 * 60;

// Housekeeping
pub const STATE_DIRTY: &str = "Dirty";
pub const STATE_WIP: &str = "WiP";
pub const STATE_ERROR: &str = "Error";
pub const DEFAULT_VERSION: &str = "av1";
pub const DEFAULT_RETRIES: &str = "0/4";
pub const MAX_WIP_AGE_SECS: i64 = 2 * 60 * 60;
pub const STATUS_OLD_VERSION: &str = "Set Dirty by old Version";
pub const STATUS_WIP_TIMEOUT: &str = "Set Dirty by WiP Timeout";

// Default tables
pub const DEFAULT_WALLETS_TABLE: &str = "Wallets";
pub const DEFAULT_SETTINGS_TABLE: &str = "Settings";
pub const DEFAULT_CHAINS_TABLE: &str = "Chains";

// Portfolio profile endpoints
pub const DEFAULT_PRICE_URL: &str = "https://purrfolio.com/api/hype-price";
pub const DEFAULT_CROSSCHAIN_URL: &str = "https://purrfolio.com/api/debank-data?address=";
pub const DEFAULT_ONCHAIN_URL: &str = "https://purrfolio.com/api/hypercore-holdings?address=";
pub const PRICE_FIELD: &str = "price";
pub const CROSSCHAIN_FIELD: &str = "usd_value";
pub const ONCHAIN_FIELD: &str = "grandTotal";

// Driver timing
pub const IDLE_SLEEP: Duration = Duration::from_secs(10);
pub const ERROR_BACKOFF: Duration = Duration::from_secs(10);
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

pub const PROXY_TOKEN_PLACEHOLDER: &str = "{token}";
pub const PROXY_TOKEN_LEN: usize = 10;
