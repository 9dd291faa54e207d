// Run control: readers, the deduplicating controller and its report

pub mod controller;
pub mod reader;
pub mod report;

pub use controller::{IngestOptions, IngestionController, RunPhase};
pub use reader::{NdjsonReader, VecReader};
pub use report::{IngestionReport, RowError};
