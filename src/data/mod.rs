//! Data layer: the SQLite record store for runs and the summaries derived from it.

mod codec;
mod error;
mod models;
mod storage;
mod summary;

pub use models::{average_speed, DayRecord, NewRunRecord, RunRecord, Stats};
pub use storage::RecordStore;
pub use summary::{display_distance, today_distance};
