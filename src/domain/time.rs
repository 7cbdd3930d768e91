// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::domain::constants::NAIVE_UTC_OFFSET_SECS;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};

/// Offset applied to timestamps that carry no zone of their own.
pub fn naive_offset() -> FixedOffset {
    FixedOffset::east_opt(NAIVE_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Epoch seconds for a naive datetime, read as UTC+3 wall-clock time.
pub fn naive_to_timestamp(dt: NaiveDateTime) -> i64 {
    naive_offset()
        .from_local_datetime(&dt)
        .single()
        .map(|zoned| zoned.timestamp())
        .unwrap_or_else(|| dt.and_utc().timestamp() - i64::from(NAIVE_UTC_OFFSET_SECS))
}

pub fn zoned_to_timestamp(dt: &DateTime<FixedOffset>) -> i64 {
    dt.timestamp()
}

/// Return the current UNIX timestamp in seconds.
pub fn current_unix() -> i64 {
    Utc::now().timestamp()
}
