use std::collections::HashSet;

use crate::domain::CanonicalRecord;
use crate::error::Result;

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemoryStore;
pub use sqlite::SqliteStore;

/// Persistent store for canonical pensioner records.
///
/// Calls are blocking; the ingestion controller assumes it is the only writer
/// to a collection for the duration of a run.
pub trait PensionerStore {
    /// Every PPO number already present in `collection`
    fn existing_keys(&self, collection: &str) -> Result<HashSet<String>>;

    /// Append `records` to `collection` as one atomic unit; returns the number written
    fn bulk_insert(&mut self, collection: &str, records: &[CanonicalRecord]) -> Result<usize>;
}

impl<S: PensionerStore + ?Sized> PensionerStore for &mut S {
    fn existing_keys(&self, collection: &str) -> Result<HashSet<String>> {
        (**self).existing_keys(collection)
    }

    fn bulk_insert(&mut self, collection: &str, records: &[CanonicalRecord]) -> Result<usize> {
        (**self).bulk_insert(collection, records)
    }
}
