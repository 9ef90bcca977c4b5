//! Data models for recorded runs and their derived summaries.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

/// A run that has not been stored yet (no store-assigned id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRunRecord {
    pub uuid: String,
    pub date: NaiveDate,
    /// Meters
    pub distance: f64,
    /// Seconds
    pub duration: i64,
    pub avg_speed: f64,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

impl NewRunRecord {
    /// Build a record attributed to the start date, with `end_time = start_time + duration`
    /// and the average speed derived from distance and duration.
    ///
    /// Returns `None` if the end time falls outside the representable range.
    pub fn from_start(
        uuid: String,
        start_time: NaiveDateTime,
        distance: f64,
        duration: i64,
    ) -> Option<Self> {
        let end_time = end_after(start_time, duration)?;
        Some(NewRunRecord {
            uuid,
            date: start_time.date(),
            distance,
            duration,
            avg_speed: average_speed(distance, duration),
            start_time,
            end_time,
        })
    }
}

/// Meters per second, 0 for a zero-length run
pub fn average_speed(distance: f64, duration: i64) -> f64 {
    if duration > 0 {
        distance / duration as f64
    } else {
        0.0
    }
}

/// `start + duration` seconds, or `None` on overflow
pub fn end_after(start: NaiveDateTime, duration: i64) -> Option<NaiveDateTime> {
    TimeDelta::try_seconds(duration).and_then(|delta| start.checked_add_signed(delta))
}

/// A persisted run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: i64,
    pub uuid: String,
    pub date: NaiveDate,
    pub distance: f64,
    pub duration: i64,
    pub avg_speed: f64,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

/// Total distance run on one day of a month
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    /// Day of month, 1-31
    pub day: u32,
    pub distance: f64,
}

/// Personal bests and totals across the whole store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub best_distance: f64,
    pub best_speed: f64,
    pub best_duration: i64,
    pub total_distance: i64,
    pub total_runs: i64,
    pub running_days: i64,
    /// Row count of the earliest date group, kept for compatibility with old readers
    pub distinct_day_count: i64,
}
