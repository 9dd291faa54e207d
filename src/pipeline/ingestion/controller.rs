use std::collections::HashSet;
use tracing::{debug, error, info, instrument};

use super::report::IngestionReport;
use crate::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_COLLECTION};
use crate::domain::{CanonicalRecord, RawRow};
use crate::error::{IngestError, Result};
use crate::metrics::IngestMetrics;
use crate::pipeline::processing::normalize::{CanonicalRecordBuilder, SourceAdapter};
use crate::storage::PensionerStore;

/// Where a run currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    LoadingKeys,
    Processing,
    Flushing,
    Reporting,
}

/// Tunables for an ingestion run
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub collection: String,
    /// Records per bulk insert; any positive value is correct
    pub chunk_size: usize,
    /// Leading rows skipped as headers
    pub header_rows: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            header_rows: 0,
        }
    }
}

/// Runs one source at a time through adapter, builder and store.
///
/// The key set loaded at the start of a run is the only duplicate check; the
/// store is never asked about individual rows.
pub struct IngestionController<S: PensionerStore> {
    store: S,
    builder: CanonicalRecordBuilder,
    options: IngestOptions,
    phase: RunPhase,
}

impl<S: PensionerStore> IngestionController<S> {
    pub fn new(store: S, builder: CanonicalRecordBuilder, options: IngestOptions) -> Self {
        Self {
            store,
            builder,
            options,
            phase: RunPhase::Idle,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn enter(&mut self, phase: RunPhase) {
        debug!("Run phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// Ingest `rows` produced by `adapter`, tagging records with `data_source`
    #[instrument(skip(self, adapter, rows), fields(adapter = adapter.name()))]
    pub fn run<I>(&mut self, adapter: &dyn SourceAdapter, data_source: &str, rows: I) -> Result<IngestionReport>
    where
        I: IntoIterator<Item = Result<RawRow>>,
    {
        let collection = self.options.collection.clone();
        let mut report = IngestionReport::new(data_source, &collection);
        IngestMetrics::run_started(data_source);
        info!("Starting ingestion run {} for {}", report.run_id, data_source);

        self.enter(RunPhase::LoadingKeys);
        let mut seen = self.load_keys(&collection)?;
        IngestMetrics::keys_loaded(data_source, seen.len());
        info!("Loaded {} existing keys from {}", seen.len(), collection);

        self.enter(RunPhase::Processing);
        let buffer = self.process_rows(adapter, data_source, rows, &mut seen, &mut report)?;
        info!(
            "Processed {} rows: {} new, {} duplicate, {} errors",
            report.total_rows,
            buffer.len(),
            report.duplicates,
            report.errors
        );

        self.enter(RunPhase::Flushing);
        self.flush(&collection, &buffer, &mut report)?;

        self.enter(RunPhase::Reporting);
        report.finish();
        IngestMetrics::run_finished(data_source, report.duration_secs().unwrap_or_default());
        report.emit();
        Ok(report)
    }

    fn load_keys(&self, collection: &str) -> Result<HashSet<String>> {
        self.store
            .existing_keys(collection)
            .map_err(|e| IngestError::KeyLoad {
                collection: collection.to_string(),
                source: Box::new(e),
            })
    }

    fn process_rows<I>(
        &self,
        adapter: &dyn SourceAdapter,
        data_source: &str,
        rows: I,
        seen: &mut HashSet<String>,
        report: &mut IngestionReport,
    ) -> Result<Vec<CanonicalRecord>>
    where
        I: IntoIterator<Item = Result<RawRow>>,
    {
        let mut buffer = Vec::new();

        for (row_index, row) in rows.into_iter().enumerate() {
            if row_index < self.options.header_rows {
                continue;
            }
            report.total_rows += 1;

            let row = match row {
                Ok(row) => row,
                Err(e) if e.is_row_level() => {
                    debug!("Row {} unreadable: {}", row_index, e);
                    IngestMetrics::row_error(data_source);
                    report.record_error(row_index, e.to_string());
                    continue;
                }
                Err(e) => return Err(e),
            };

            let intermediate = match adapter.extract(&row) {
                Ok(intermediate) => intermediate,
                Err(rejection) => {
                    debug!("Row {} rejected: {}", row_index, rejection);
                    IngestMetrics::row_error(data_source);
                    report.record_error(row_index, rejection.to_string());
                    continue;
                }
            };

            let record = self.builder.build(intermediate, data_source);

            // Claim the key now so repeats later in the same file are caught too
            if !seen.insert(record.ppo_number.clone()) {
                debug!("Row {} duplicates PPO {}", row_index, record.ppo_number);
                IngestMetrics::duplicate(data_source);
                report.duplicates += 1;
                continue;
            }
            buffer.push(record);
        }

        Ok(buffer)
    }

    fn flush(&mut self, collection: &str, buffer: &[CanonicalRecord], report: &mut IngestionReport) -> Result<()> {
        let chunk_size = self.options.chunk_size.max(1);

        for (chunk_index, chunk) in buffer.chunks(chunk_size).enumerate() {
            match self.store.bulk_insert(collection, chunk) {
                Ok(written) => {
                    report.inserted += written;
                    report.chunks_committed += 1;
                    IngestMetrics::chunk_flushed(&report.data_source, written);
                    debug!("Committed chunk {} ({} records)", chunk_index, written);
                }
                Err(e) => {
                    error!(
                        "Chunk {} failed after {} chunks committed: {}",
                        chunk_index, report.chunks_committed, e
                    );
                    IngestMetrics::flush_failed(&report.data_source);
                    report.finish();
                    return Err(IngestError::Flush {
                        chunk_index,
                        report: Box::new(report.clone()),
                        source: Box::new(e),
                    });
                }
            }
        }
        Ok(())
    }
}
