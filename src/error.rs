use thiserror::Error;

use crate::pipeline::ingestion::report::IngestionReport;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown data source: {0}")]
    UnknownSource(String),

    #[error("Store error: {message}")]
    Store { message: String },

    #[error("Malformed row {row_index}: {message}")]
    RowDecode { row_index: usize, message: String },

    #[error("Failed to load existing keys for '{collection}': {source}")]
    KeyLoad {
        collection: String,
        #[source]
        source: Box<IngestError>,
    },

    #[error(
        "Flush of chunk {chunk_index} failed after {} chunk(s) ({} records) committed: {source}",
        .report.chunks_committed,
        .report.inserted
    )]
    Flush {
        chunk_index: usize,
        report: Box<IngestionReport>,
        #[source]
        source: Box<IngestError>,
    },
}

impl IngestError {
    /// Row-level errors are absorbed by the controller; everything else ends the run.
    pub fn is_row_level(&self) -> bool {
        matches!(self, IngestError::RowDecode { .. })
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
