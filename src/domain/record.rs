// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::parsing::{json_number, json_text, normalize_column};
use crate::domain::constants::*;
use crate::domain::error::AppError;
use crate::domain::time::{naive_to_timestamp, zoned_to_timestamp};
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// A row exactly as the datastore returns it.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawRecord {
    pub id: i64,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl RawRecord {
    pub fn field(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    pub fn text(&self, column: &str) -> Option<String> {
        self.field(column).and_then(json_text)
    }
}

/// Field changes for one row, addressed by row id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordPatch {
    pub id: i64,
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(CellValue::Number),
            other => json_text(other).map(CellValue::Text),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

/// Typed view of a wallet row. Blank cells are `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WalletRow {
    pub id: i64,
    pub address: Option<String>,
    pub value: Option<CellValue>,
    pub comment: Option<String>,
    pub proxy: Option<String>,
    pub name: Option<String>,
    pub state: Option<String>,
    pub version: Option<String>,
    pub deploy_date: Option<i64>,
    pub retries: Option<String>,
    pub status: Option<String>,
}

impl WalletRow {
    pub fn from_record(record: &RawRecord) -> Self {
        let trimmed = |column: &str| {
            record
                .text(column)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        Self {
            id: record.id,
            address: trimmed(COL_ADDRESS),
            value: record.field(COL_VALUE).and_then(CellValue::from_json),
            comment: record.text(COL_COMMENT),
            proxy: trimmed(COL_PROXY),
            name: record.text(COL_NAME),
            state: record.text(COL_STATE),
            version: record.text(COL_VERSION),
            deploy_date: record
                .field(COL_DEPLOY_DATE)
                .and_then(json_number)
                .map(|secs| secs as i64),
            retries: record.text(COL_RETRIES),
            status: record.text(COL_STATUS),
        }
    }

    pub fn has_address(&self) -> bool {
        self.address.is_some()
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettingRow {
    pub id: i64,
    pub setting: Option<String>,
    pub value: Option<String>,
}

impl SettingRow {
    pub fn from_record(record: &RawRecord) -> Self {
        Self {
            id: record.id,
            setting: record.text(COL_SETTING),
            value: record.text(COL_VALUE),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChainRow {
    pub id: i64,
    pub api: Option<String>,
}

impl ChainRow {
    pub fn from_record(record: &RawRecord) -> Self {
        Self {
            id: record.id,
            api: record
                .text(COL_API)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        }
    }
}

/// A value headed for one cell. Datetimes are sent as epoch seconds.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Number(f64),
    Integer(i64),
    Naive(NaiveDateTime),
    Zoned(DateTime<FixedOffset>),
}

impl FieldValue {
    /// JSON has no NaN or infinity; those are rejected rather than written as null.
    pub fn to_json(&self, column: &str) -> Result<Value, AppError> {
        Ok(match self {
            FieldValue::Null => Value::Null,
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Number(n) => {
                let number = serde_json::Number::from_f64(*n).ok_or_else(|| AppError::Validation {
                    field: column.to_string(),
                    message: format!("{n} is not a finite number"),
                })?;
                Value::Number(number)
            }
            FieldValue::Integer(i) => Value::from(*i),
            FieldValue::Naive(dt) => Value::from(naive_to_timestamp(*dt)),
            FieldValue::Zoned(dt) => Value::from(zoned_to_timestamp(dt)),
        })
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(dt: NaiveDateTime) -> Self {
        FieldValue::Naive(dt)
    }
}

impl From<DateTime<FixedOffset>> for FieldValue {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        FieldValue::Zoned(dt)
    }
}

/// Ordered set of column writes for a single row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowUpdate {
    fields: BTreeMap<String, FieldValue>,
}

impl RowUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, column: &str, value: impl Into<FieldValue>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: &str, value: impl Into<FieldValue>) {
        self.fields.insert(normalize_column(column), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields.get(&normalize_column(column))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Marks a row as processed-with-failure so it stops being a candidate.
    pub fn error_marker(err: &AppError) -> Self {
        Self::new()
            .set(COL_VALUE, ERROR_SENTINEL)
            .set(COL_COMMENT, format!("{ERROR_COMMENT_PREFIX}{err}"))
    }

    pub fn into_patch(self, id: i64) -> Result<RecordPatch, AppError> {
        let fields: Map<String, Value> = self
            .fields
            .into_iter()
            .map(|(column, value)| {
                let json = value.to_json(&column)?;
                Ok((column, json))
            })
            .collect::<Result<_, AppError>>()?;
        Ok(RecordPatch { id, fields })
    }
}
