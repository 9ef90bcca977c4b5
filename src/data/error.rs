use thiserror::Error;

/// Errors raised by the record store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("malformed timestamp '{value}': {source}")]
    TimestampParse {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("malformed date '{value}': {source}")]
    DateParse {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("insert affected no rows")]
    NotInserted,

    #[error("invalid year {0}, expected 0-9999")]
    InvalidYear(i32),

    #[error("invalid month {0}, expected 1-12")]
    InvalidMonth(u32),

    #[error("failed to create database directory {path:?}: {source}")]
    CreateDir {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}
