pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod storage;

// Record shapes shared across layers
pub mod domain;

pub use domain::{AgeCategory, CanonicalRecord, Cell, IntermediateRecord, RawRow};
pub use error::{IngestError, Result};
