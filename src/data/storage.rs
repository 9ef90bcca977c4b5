//! SQLite record store for completed runs.
//!
//! Schema (one table, `run_records`):
//! - `id` integer primary key, assigned on insert
//! - `uuid` caller-supplied, not unique
//! - `date` day the run counts towards (`YYYY-MM-DD`)
//! - `distance` meters, `duration` seconds, `avgSpeed` caller-derived
//! - `startTime` / `endTime` formatted timestamps (see [`super::codec`])
//!
//! Rows are never updated. Multi-row reads are ordered by `startTime` descending.

use std::path::Path;

use chrono::{Datelike, NaiveDate};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use super::codec;
use super::error::StoreError;
use super::models::{DayRecord, NewRunRecord, RunRecord, Stats};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS run_records (
    id integer primary key autoincrement,
    uuid text,
    date date,
    distance double,
    duration int,
    avgSpeed double,
    startTime date,
    endTime date
)";

const SELECT_COLUMNS: &str =
    "SELECT id, uuid, date, distance, duration, avgSpeed, startTime, endTime FROM run_records";

/// Column values as stored, before the text fields are decoded
struct StoredRow {
    id: i64,
    uuid: Option<String>,
    date: String,
    distance: Option<f64>,
    duration: Option<i64>,
    avg_speed: Option<f64>,
    start_time: String,
    end_time: String,
}

impl StoredRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(StoredRow {
            id: row.get(0)?,
            uuid: row.get(1)?,
            date: row.get(2)?,
            distance: row.get(3)?,
            duration: row.get(4)?,
            avg_speed: row.get(5)?,
            start_time: row.get(6)?,
            end_time: row.get(7)?,
        })
    }

    fn decode(self) -> Result<RunRecord, StoreError> {
        Ok(RunRecord {
            id: self.id,
            uuid: self.uuid.unwrap_or_default(),
            date: codec::decode_date(&self.date)?,
            distance: self.distance.unwrap_or_default(),
            duration: self.duration.unwrap_or_default(),
            avg_speed: self.avg_speed.unwrap_or_default(),
            start_time: codec::decode_timestamp(&self.start_time)?,
            end_time: codec::decode_timestamp(&self.end_time)?,
        })
    }
}

/// Durable store of run records backed by a single SQLite connection.
///
/// All operations take the connection lock for their whole duration, so calls
/// from different threads are serialized.
pub struct RecordStore {
    conn: Mutex<Connection>,
}

impl RecordStore {
    /// Open (creating if needed) the store at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "opened record store");
        Self::with_connection(conn)
    }

    /// Open a store that lives only as long as this value
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(CREATE_TABLE)?;
        Ok(RecordStore {
            conn: Mutex::new(conn),
        })
    }

    /// Close the underlying connection, reporting any error SQLite raises on close
    pub fn close(self) -> Result<(), StoreError> {
        self.conn
            .into_inner()
            .close()
            .map_err(|(_, e)| StoreError::from(e))
    }

    /// Insert a record, returning `false` if the write failed.
    ///
    /// The failure is logged; use [`RecordStore::try_insert`] to inspect it.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn insert(&self, record: &NewRunRecord) -> bool {
        match self.try_insert(record) {
            Ok(id) => {
                debug!(uuid = %record.uuid, id, "record added");
                true
            }
            Err(e) => {
                warn!(uuid = %record.uuid, error = %e, "failed to add record");
                false
            }
        }
    }

    /// Insert a record and return its assigned id
    pub fn try_insert(&self, record: &NewRunRecord) -> Result<i64, StoreError> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "INSERT INTO run_records (uuid, date, distance, duration, avgSpeed, startTime, endTime)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.uuid,
                codec::encode_date(record.date),
                record.distance,
                record.duration,
                record.avg_speed,
                codec::encode_timestamp(record.start_time),
                codec::encode_timestamp(record.end_time),
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotInserted);
        }
        Ok(conn.last_insert_rowid())
    }

    /// All records, newest first
    pub fn query_all(&self) -> Result<Vec<RunRecord>, StoreError> {
        self.query_by_date(None)
    }

    /// Records attributed to `date` (all records for `None`), newest first
    pub fn query_by_date(&self, date: Option<NaiveDate>) -> Result<Vec<RunRecord>, StoreError> {
        let conn = self.conn.lock();
        let date = date.map(codec::encode_date);
        select_by_date(&conn, date.as_deref())
    }

    pub fn query_best_distance(&self) -> Result<f64, StoreError> {
        let best: Option<f64> = self.scalar("SELECT MAX(distance) FROM run_records")?;
        Ok(best.unwrap_or(0.0))
    }

    pub fn query_best_speed(&self) -> Result<f64, StoreError> {
        let best: Option<f64> = self.scalar("SELECT MAX(avgSpeed) FROM run_records")?;
        Ok(best.unwrap_or(0.0))
    }

    pub fn query_best_duration(&self) -> Result<i64, StoreError> {
        let best: Option<i64> = self.scalar("SELECT MAX(duration) FROM run_records")?;
        Ok(best.unwrap_or(0))
    }

    /// Sum of all distances, truncated towards zero
    pub fn query_total_distance(&self) -> Result<i64, StoreError> {
        let total: Option<f64> = self.scalar("SELECT SUM(distance) FROM run_records")?;
        Ok(total.map(|t| t.trunc() as i64).unwrap_or(0))
    }

    /// Number of rows in the earliest date group.
    ///
    /// This is the legacy "days run" figure: it counts the rows of one group
    /// rather than the groups themselves. [`RecordStore::query_running_days`]
    /// returns the number of distinct days.
    pub fn query_distinct_day_count(&self) -> Result<i64, StoreError> {
        let conn = self.conn.lock();
        let count: Option<i64> = conn
            .query_row(
                "SELECT COUNT(date) FROM run_records GROUP BY date ORDER BY date LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(count.unwrap_or(0))
    }

    /// Number of distinct dates with at least one run
    pub fn query_running_days(&self) -> Result<i64, StoreError> {
        self.scalar("SELECT COUNT(DISTINCT date) FROM run_records")
    }

    pub fn query_total_runs(&self) -> Result<i64, StoreError> {
        self.scalar("SELECT COUNT(*) FROM run_records")
    }

    /// Bests and totals in one pass over the aggregate queries
    pub fn query_stats(&self) -> Result<Stats, StoreError> {
        Ok(Stats {
            best_distance: self.query_best_distance()?,
            best_speed: self.query_best_speed()?,
            best_duration: self.query_best_duration()?,
            total_distance: self.query_total_distance()?,
            total_runs: self.query_total_runs()?,
            running_days: self.query_running_days()?,
            distinct_day_count: self.query_distinct_day_count()?,
        })
    }

    /// Remove every record. Returns the number of rows deleted.
    pub fn delete_all(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let deleted = conn.execute("DELETE FROM run_records", [])?;
        info!(deleted, "deleted all records");
        Ok(deleted)
    }

    /// Per-day distance totals for one calendar month, in ascending date order.
    ///
    /// Callers plot this against a day-of-month axis, so the order must not change.
    pub fn query_monthly_day_summary(
        &self,
        year: i32,
        month: u32,
    ) -> Result<Vec<DayRecord>, StoreError> {
        let prefix = codec::month_prefix(year, month)?;
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(
            "SELECT DISTINCT date FROM run_records
             WHERE substr(date(date), 1, 7) = ?1 ORDER BY date ASC",
        )?;
        let dates = stmt
            .query_map([&prefix], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut summary = Vec::with_capacity(dates.len());
        for text in dates {
            let date = codec::decode_date(&text)?;
            let records = select_by_date(&conn, Some(&text))?;
            debug!(date = %text, runs = records.len(), "summing day");
            summary.push(DayRecord {
                day: date.day(),
                distance: records.iter().map(|r| r.distance).sum(),
            });
        }

        debug!(month = %prefix, days = summary.len(), "monthly day summary");
        Ok(summary)
    }

    fn scalar<T: rusqlite::types::FromSql>(&self, sql: &str) -> Result<T, StoreError> {
        let conn = self.conn.lock();
        Ok(conn.query_row(sql, [], |row| row.get(0))?)
    }
}

fn select_by_date(conn: &Connection, date: Option<&str>) -> Result<Vec<RunRecord>, StoreError> {
    let rows = match date {
        None => {
            let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY startTime DESC"))?;
            let rows = stmt
                .query_map([], StoredRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        }
        Some(date) => {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} WHERE date = ?1 ORDER BY startTime DESC"
            ))?;
            let rows = stmt
                .query_map([date], StoredRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        }
    };

    rows.into_iter().map(StoredRow::decode).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn day(date: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap()
    }

    fn make_record(date: &str, time: &str, distance: f64) -> NewRunRecord {
        NewRunRecord::from_start(format!("run-{date}-{time}"), at(date, time), distance, 600).unwrap()
    }

    fn store_with(records: &[NewRunRecord]) -> RecordStore {
        let store = RecordStore::open_in_memory().unwrap();
        for record in records {
            assert!(store.insert(record));
        }
        store
    }

    #[test]
    fn test_insert_then_query_by_date_round_trips() {
        let record = NewRunRecord {
            uuid: "4f1c".to_string(),
            date: day("2024-03-05"),
            distance: 5123.75,
            duration: 1834,
            avg_speed: 2.79,
            start_time: at("2024-03-05", "06:58:12"),
            end_time: at("2024-03-05", "07:28:46"),
        };
        let store = store_with(&[record.clone()]);

        let found = store.query_by_date(Some(day("2024-03-05"))).unwrap();
        assert_eq!(found.len(), 1);
        let stored = &found[0];
        assert_eq!(stored.uuid, record.uuid);
        assert_eq!(stored.date, record.date);
        assert_eq!(stored.distance, record.distance);
        assert_eq!(stored.duration, record.duration);
        assert_eq!(stored.avg_speed, record.avg_speed);
        assert_eq!(stored.start_time, record.start_time);
        assert_eq!(stored.end_time, record.end_time);
    }

    #[test]
    fn test_timestamps_are_stored_as_formatted_text() {
        let store = store_with(&[make_record("2024-03-05", "07:30:00", 1000.0)]);
        let conn = store.conn.lock();
        let (start, end): (String, String) = conn
            .query_row("SELECT startTime, endTime FROM run_records", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(start, "2024-03-05 07:30:00");
        assert_eq!(end, "2024-03-05 07:40:00");
    }

    #[test]
    fn test_query_by_date_orders_newest_first() {
        let store = store_with(&[
            make_record("2024-03-05", "12:00:00", 1.0),
            make_record("2024-03-05", "06:00:00", 2.0),
            make_record("2024-03-05", "18:30:00", 3.0),
            make_record("2024-03-06", "09:00:00", 4.0),
        ]);

        let found = store.query_by_date(Some(day("2024-03-05"))).unwrap();
        let starts: Vec<NaiveDateTime> = found.iter().map(|r| r.start_time).collect();
        assert_eq!(
            starts,
            vec![
                at("2024-03-05", "18:30:00"),
                at("2024-03-05", "12:00:00"),
                at("2024-03-05", "06:00:00"),
            ]
        );
    }

    #[test]
    fn test_query_all_returns_every_row_newest_first() {
        let store = store_with(&[
            make_record("2024-03-05", "12:00:00", 1.0),
            make_record("2024-03-07", "06:00:00", 2.0),
            make_record("2024-02-29", "06:00:00", 3.0),
        ]);

        let all = store.query_all().unwrap();
        let distances: Vec<f64> = all.iter().map(|r| r.distance).collect();
        assert_eq!(distances, vec![2.0, 1.0, 3.0]);
    }

    #[test]
    fn test_query_by_date_without_match_is_empty() {
        let store = store_with(&[make_record("2024-03-05", "12:00:00", 1.0)]);
        assert!(store.query_by_date(Some(day("2024-03-06"))).unwrap().is_empty());
        assert!(RecordStore::open_in_memory().unwrap().query_all().unwrap().is_empty());
    }

    #[test]
    fn test_ids_increase_and_are_not_reused() {
        let store = RecordStore::open_in_memory().unwrap();
        let first = store.try_insert(&make_record("2024-03-05", "07:00:00", 1.0)).unwrap();
        let second = store.try_insert(&make_record("2024-03-05", "08:00:00", 1.0)).unwrap();
        assert!(second > first);

        store.delete_all().unwrap();
        let third = store.try_insert(&make_record("2024-03-05", "09:00:00", 1.0)).unwrap();
        assert!(third > second);
    }

    #[test]
    fn test_duplicate_uuids_are_accepted() {
        let mut a = make_record("2024-03-05", "07:00:00", 1.0);
        let mut b = make_record("2024-03-06", "07:00:00", 2.0);
        a.uuid = "same".to_string();
        b.uuid = "same".to_string();
        let store = store_with(&[a, b]);
        assert_eq!(store.query_total_runs().unwrap(), 2);
    }

    #[test]
    fn test_aggregates_default_to_zero_when_empty() {
        let store = RecordStore::open_in_memory().unwrap();
        assert_eq!(store.query_best_distance().unwrap(), 0.0);
        assert_eq!(store.query_best_speed().unwrap(), 0.0);
        assert_eq!(store.query_best_duration().unwrap(), 0);
        assert_eq!(store.query_total_distance().unwrap(), 0);
        assert_eq!(store.query_distinct_day_count().unwrap(), 0);
        assert_eq!(store.query_running_days().unwrap(), 0);
        assert_eq!(store.query_total_runs().unwrap(), 0);
        assert_eq!(store.query_stats().unwrap(), Stats::default());
    }

    #[test]
    fn test_total_distance_sums_and_truncates() {
        let store = store_with(&[
            make_record("2024-03-05", "07:00:00", 500.0),
            make_record("2024-03-05", "08:00:00", 1500.0),
            make_record("2024-03-05", "09:00:00", 2000.0),
        ]);
        assert_eq!(store.query_total_distance().unwrap(), 4000);

        assert!(store.insert(&make_record("2024-03-06", "07:00:00", 0.9)));
        assert_eq!(store.query_total_distance().unwrap(), 4000);
    }

    #[test]
    fn test_best_values() {
        let speeds = [3.2, 5.7, 4.1];
        let records: Vec<NewRunRecord> = speeds
            .iter()
            .enumerate()
            .map(|(i, &speed)| NewRunRecord {
                avg_speed: speed,
                duration: 1000 + i as i64 * 500,
                distance: 4000.0 - i as f64 * 1000.0,
                ..make_record("2024-03-05", &format!("0{i}:00:00"), 0.0)
            })
            .collect();
        let store = store_with(&records);

        assert_eq!(store.query_best_speed().unwrap(), 5.7);
        assert_eq!(store.query_best_distance().unwrap(), 4000.0);
        assert_eq!(store.query_best_duration().unwrap(), 2000);
    }

    #[test]
    fn test_distinct_day_count_counts_earliest_group_only() {
        let store = store_with(&[
            make_record("2024-03-05", "07:00:00", 1.0),
            make_record("2024-03-05", "18:00:00", 1.0),
            make_record("2024-02-28", "07:00:00", 1.0),
            make_record("2024-03-12", "07:00:00", 1.0),
        ]);

        assert_eq!(store.query_distinct_day_count().unwrap(), 1);
        assert_eq!(store.query_running_days().unwrap(), 3);
        assert_eq!(store.query_total_runs().unwrap(), 4);
    }

    #[test]
    fn test_monthly_day_summary_is_ascending_and_summed() {
        let store = store_with(&[
            make_record("2024-03-12", "07:00:00", 2000.0),
            make_record("2024-03-05", "07:00:00", 1000.0),
            make_record("2024-03-05", "19:00:00", 1500.0),
            make_record("2024-04-01", "07:00:00", 9999.0),
            make_record("2024-02-29", "07:00:00", 9999.0),
        ]);

        let summary = store.query_monthly_day_summary(2024, 3).unwrap();
        assert_eq!(
            summary,
            vec![
                DayRecord { day: 5, distance: 2500.0 },
                DayRecord { day: 12, distance: 2000.0 },
            ]
        );
    }

    #[test]
    fn test_monthly_day_summary_edge_cases() {
        let store = store_with(&[make_record("2023-03-05", "07:00:00", 1000.0)]);
        assert!(store.query_monthly_day_summary(2024, 3).unwrap().is_empty());
        assert!(matches!(
            store.query_monthly_day_summary(2024, 13),
            Err(StoreError::InvalidMonth(13))
        ));
    }

    #[test]
    fn test_delete_all_resets_everything() {
        let store = store_with(&[
            make_record("2024-03-05", "07:00:00", 1000.0),
            make_record("2024-03-06", "07:00:00", 2000.0),
        ]);

        assert_eq!(store.delete_all().unwrap(), 2);
        assert!(store.query_all().unwrap().is_empty());
        assert_eq!(store.query_stats().unwrap(), Stats::default());
        assert!(store.query_monthly_day_summary(2024, 3).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_timestamp_surfaces_as_error() {
        let store = RecordStore::open_in_memory().unwrap();
        store
            .conn
            .lock()
            .execute(
                "INSERT INTO run_records (uuid, date, distance, duration, avgSpeed, startTime, endTime)
                 VALUES ('bad', '2024-03-05', 1.0, 1, 1.0, 'Tue Mar 05 07:00', '2024-03-05 07:10:00')",
                [],
            )
            .unwrap();

        assert!(matches!(
            store.query_all(),
            Err(StoreError::TimestampParse { .. })
        ));
    }

    #[test]
    fn test_null_numeric_columns_read_as_zero() {
        let store = RecordStore::open_in_memory().unwrap();
        store
            .conn
            .lock()
            .execute(
                "INSERT INTO run_records (uuid, date, distance, duration, avgSpeed, startTime, endTime)
                 VALUES ('nulls', '2024-03-05', NULL, NULL, NULL, '2024-03-05 07:00:00', '2024-03-05 07:10:00')",
                [],
            )
            .unwrap();
        assert!(store.insert(&make_record("2024-03-05", "08:00:00", 1000.0)));

        let all = store.query_all().unwrap();
        assert_eq!(all.len(), 2);
        let nulls = all.iter().find(|r| r.uuid == "nulls").unwrap();
        assert_eq!(nulls.distance, 0.0);
        assert_eq!(nulls.duration, 0);
        assert_eq!(nulls.avg_speed, 0.0);

        let summary = store.query_monthly_day_summary(2024, 3).unwrap();
        assert_eq!(summary, vec![DayRecord { day: 5, distance: 1000.0 }]);
    }

    #[test]
    fn test_nan_speed_does_not_break_reads() {
        let store = RecordStore::open_in_memory().unwrap();
        let mut record = make_record("2024-03-05", "07:00:00", 1000.0);
        record.avg_speed = f64::NAN;
        store.insert(&record);

        assert!(store.query_all().is_ok());
        assert_eq!(store.query_stats().unwrap().total_distance, 1000);
    }

    #[test]
    fn test_insert_failure_returns_false() {
        let store = RecordStore::open_in_memory().unwrap();
        store.conn.lock().execute_batch("DROP TABLE run_records").unwrap();
        assert!(!store.insert(&make_record("2024-03-05", "07:00:00", 1.0)));
    }

    #[test]
    fn test_records_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("runs.db");

        let store = RecordStore::open(&path).unwrap();
        assert!(store.insert(&make_record("2024-03-05", "07:00:00", 1234.5)));
        store.close().unwrap();

        let reopened = RecordStore::open(&path).unwrap();
        let all = reopened.query_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].distance, 1234.5);
        assert_eq!(all[0].start_time, at("2024-03-05", "07:00:00"));
    }
}
