//! Text encoding of dates and timestamps at the storage boundary.
//!
//! Every value written to or read from the `date`, `startTime` and `endTime`
//! columns goes through this module, so the write and read formats cannot drift.

use chrono::{NaiveDate, NaiveDateTime};

use super::error::StoreError;

/// Format of the `date` column (`2024-03-05`)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format of the `startTime` / `endTime` columns (`2024-03-05 07:30:00`)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn encode_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn decode_date(text: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|source| StoreError::DateParse {
        value: text.to_string(),
        source,
    })
}

/// Encode a timestamp, dropping any sub-second part
pub fn encode_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

pub fn decode_timestamp(text: &str) -> Result<NaiveDateTime, StoreError> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT).map_err(|source| {
        StoreError::TimestampParse {
            value: text.to_string(),
            source,
        }
    })
}

/// `YYYY-MM` prefix used to match the `date` column for a calendar month.
///
/// Only four-digit years are accepted; others are written with a sign or
/// extra digits by `encode_date` and could never match the prefix.
pub fn month_prefix(year: i32, month: u32) -> Result<String, StoreError> {
    if !(0..=9999).contains(&year) {
        return Err(StoreError::InvalidYear(year));
    }
    if !(1..=12).contains(&month) {
        return Err(StoreError::InvalidMonth(month));
    }
    Ok(format!("{year:04}-{month:02}"))
}
