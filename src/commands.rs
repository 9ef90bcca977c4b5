//! Non-interactive subcommands. Each writes its result to `out`.

use std::io::Write;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::info;

use crate::data::{
    average_speed, display_distance, today_distance, NewRunRecord, RecordStore, RunRecord,
};

/// Fields for `runlog add`; everything optional is derived from the rest
#[derive(Debug, Clone)]
pub struct AddArgs {
    pub distance: f64,
    pub duration: i64,
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    pub date: Option<NaiveDate>,
    pub avg_speed: Option<f64>,
    pub uuid: Option<String>,
}

impl AddArgs {
    fn into_record(self) -> Result<NewRunRecord> {
        if self.distance < 0.0 || !self.distance.is_finite() {
            bail!("distance must be a non-negative number of meters");
        }
        if self.duration < 0 {
            bail!("duration must be a non-negative number of seconds");
        }

        if let Some(speed) = self.avg_speed {
            if speed < 0.0 || !speed.is_finite() {
                bail!("average speed must be a non-negative number");
            }
        }

        let uuid = self
            .uuid
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let mut record = match self.end {
            None => NewRunRecord::from_start(uuid, self.start, self.distance, self.duration)
                .with_context(|| {
                    format!(
                        "duration of {} seconds puts the end time out of range",
                        self.duration
                    )
                })?,
            Some(end) => {
                if end < self.start {
                    bail!("end time {end} is before start time {}", self.start);
                }
                NewRunRecord {
                    uuid,
                    date: self.start.date(),
                    distance: self.distance,
                    duration: self.duration,
                    avg_speed: average_speed(self.distance, self.duration),
                    start_time: self.start,
                    end_time: end,
                }
            }
        };
        if let Some(date) = self.date {
            record.date = date;
        }
        if let Some(speed) = self.avg_speed {
            record.avg_speed = speed;
        }
        Ok(record)
    }
}

pub fn add(store: &RecordStore, args: AddArgs, out: &mut impl Write) -> Result<()> {
    let record = args.into_record()?;
    let id = store
        .try_insert(&record)
        .with_context(|| format!("Failed to add run {}", record.uuid))?;
    info!(id, uuid = %record.uuid, "run added");
    writeln!(out, "Added run {id} ({})", record.uuid)?;
    Ok(())
}

pub fn list(
    store: &RecordStore,
    date: Option<NaiveDate>,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let records = store.query_by_date(date).context("Failed to query runs")?;

    if json {
        serde_json::to_writer_pretty(&mut *out, &records)?;
        writeln!(out)?;
        return Ok(());
    }

    if records.is_empty() {
        writeln!(out, "No runs recorded")?;
        return Ok(());
    }

    writeln!(
        out,
        "{:>5}  {:<10}  {:<19}  {:>10}  {:>8}  {:>6}",
        "id", "date", "start", "distance", "time", "m/s"
    )?;
    for record in &records {
        writeln!(out, "{}", format_row(record))?;
    }
    Ok(())
}

fn format_row(record: &RunRecord) -> String {
    format!(
        "{:>5}  {:<10}  {:<19}  {:>10}  {:>8}  {:>6.2}",
        record.id,
        record.date.format("%Y-%m-%d").to_string(),
        record.start_time.format("%Y-%m-%d %H:%M:%S").to_string(),
        display_distance(record.distance.trunc() as i64),
        format_duration(record.duration),
        record.avg_speed,
    )
}

/// `h:mm:ss`, or `m:ss` under an hour
pub fn format_duration(seconds: i64) -> String {
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

pub fn stats(store: &RecordStore, json: bool, out: &mut impl Write) -> Result<()> {
    let stats = store.query_stats().context("Failed to query stats")?;

    if json {
        serde_json::to_writer_pretty(&mut *out, &stats)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "Best distance:   {}", display_distance(stats.best_distance.trunc() as i64))?;
    writeln!(out, "Best speed:      {:.2} m/s", stats.best_speed)?;
    writeln!(out, "Longest run:     {}", format_duration(stats.best_duration))?;
    writeln!(out, "Total distance:  {}", display_distance(stats.total_distance))?;
    writeln!(out, "Total runs:      {}", stats.total_runs)?;
    writeln!(out, "Running days:    {}", stats.running_days)?;
    writeln!(out, "Legacy day count: {}", stats.distinct_day_count)?;
    Ok(())
}

pub fn today(store: &RecordStore, today: NaiveDate, out: &mut impl Write) -> Result<()> {
    let meters = today_distance(store, today).context("Failed to query today's runs")?;
    writeln!(out, "{}", display_distance(meters))?;
    Ok(())
}

pub fn month(
    store: &RecordStore,
    year: i32,
    month: u32,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let days = store
        .query_monthly_day_summary(year, month)
        .with_context(|| format!("Failed to summarize {year:04}-{month:02}"))?;

    if json {
        serde_json::to_writer_pretty(&mut *out, &days)?;
        writeln!(out)?;
        return Ok(());
    }

    if days.is_empty() {
        writeln!(out, "No runs in {year:04}-{month:02}")?;
        return Ok(());
    }
    for day in &days {
        writeln!(
            out,
            "{year:04}-{month:02}-{:02}  {:>10}",
            day.day,
            display_distance(day.distance.trunc() as i64)
        )?;
    }
    Ok(())
}

pub fn clear(store: &RecordStore, confirmed: bool, out: &mut impl Write) -> Result<()> {
    if !confirmed {
        bail!("Refusing to delete every run without --yes");
    }
    let deleted = store.delete_all().context("Failed to delete runs")?;
    writeln!(out, "Deleted {deleted} runs")?;
    Ok(())
}
