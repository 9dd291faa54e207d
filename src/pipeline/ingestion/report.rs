use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

/// Rejected rows kept for diagnostics; later ones are only counted
pub const MAX_RECORDED_ROW_ERRORS: usize = 100;

/// A row excluded as a data error
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    /// 0-based position in the source, header rows included
    pub row_index: usize,
    pub reason: String,
}

/// Counts for one ingestion run
#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    pub run_id: Uuid,
    pub data_source: String,
    pub collection: String,
    pub total_rows: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub errors: usize,
    pub chunks_committed: usize,
    pub row_errors: Vec<RowError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl IngestionReport {
    pub fn new(data_source: &str, collection: &str) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            data_source: data_source.to_string(),
            collection: collection.to_string(),
            total_rows: 0,
            inserted: 0,
            duplicates: 0,
            errors: 0,
            chunks_committed: 0,
            row_errors: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn record_error(&mut self, row_index: usize, reason: impl Into<String>) {
        self.errors += 1;
        if self.row_errors.len() < MAX_RECORDED_ROW_ERRORS {
            self.row_errors.push(RowError {
                row_index,
                reason: reason.into(),
            });
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Rows that carried a usable PPO number
    pub fn valid_rows(&self) -> usize {
        self.inserted + self.duplicates
    }

    pub fn duration_secs(&self) -> Option<f64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds() as f64 / 1000.0)
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {} rows, {} inserted, {} duplicate, {} errors ({} chunks)",
            self.data_source, self.total_rows, self.inserted, self.duplicates, self.errors, self.chunks_committed
        )
    }

    /// Log the final counts
    pub fn emit(&self) {
        info!(
            run_id = %self.run_id,
            data_source = %self.data_source,
            collection = %self.collection,
            total_rows = self.total_rows,
            inserted = self.inserted,
            duplicates = self.duplicates,
            errors = self.errors,
            chunks = self.chunks_committed,
            "Ingestion run complete"
        );
        if self.errors > 0 {
            warn!("{} rows rejected as data errors in run {}", self.errors, self.run_id);
        }
    }
}
