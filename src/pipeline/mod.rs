// Ingestion pipeline: reading and deduplicating rows, and normalizing them into canonical records

pub mod ingestion;
pub mod processing;

// Re-export key types from each stage
pub use ingestion::{IngestOptions, IngestionController, IngestionReport, RunPhase};
pub use processing::normalize::{AdapterRegistry, CanonicalRecordBuilder};
