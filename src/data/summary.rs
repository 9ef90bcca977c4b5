//! Today's distance, as shown on the run screen.

use chrono::NaiveDate;

use super::error::StoreError;
use super::storage::RecordStore;

/// Distances at or above this many meters are shown in kilometers
const KM_THRESHOLD: i64 = 1000;

/// Whole meters run on `today`. Each record's distance is truncated as it is added.
pub fn today_distance(store: &RecordStore, today: NaiveDate) -> Result<i64, StoreError> {
    let records = store.query_by_date(Some(today))?;
    Ok(records.iter().map(|r| r.distance.trunc() as i64).sum())
}

/// Unit a distance is displayed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnit {
    Meters,
    Kilometers,
}

impl DistanceUnit {
    pub fn label(self) -> &'static str {
        match self {
            DistanceUnit::Meters => "m",
            DistanceUnit::Kilometers => "km",
        }
    }
}

/// Scale whole meters to the unit they should be displayed in
pub fn format_distance(meters: i64) -> (f64, DistanceUnit) {
    if meters < KM_THRESHOLD {
        (meters as f64, DistanceUnit::Meters)
    } else {
        (meters as f64 / 1000.0, DistanceUnit::Kilometers)
    }
}

/// `format_distance` rendered as text, e.g. `850 m` or `4.25 km`
pub fn display_distance(meters: i64) -> String {
    let (value, unit) = format_distance(meters);
    format!("{value} {}", unit.label())
}
