use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::PensionerStore;
use crate::domain::CanonicalRecord;
use crate::error::{IngestError, Result};

/// In-memory store for dry runs and tests
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: HashMap<String, Vec<CanonicalRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self, collection: &str) -> &[CanonicalRecord] {
        self.collections
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn get(&self, collection: &str, ppo_number: &str) -> Option<&CanonicalRecord> {
        self.records(collection)
            .iter()
            .find(|r| r.ppo_number == ppo_number)
    }
}

impl PensionerStore for InMemoryStore {
    fn existing_keys(&self, collection: &str) -> Result<HashSet<String>> {
        Ok(self
            .records(collection)
            .iter()
            .map(|r| r.ppo_number.clone())
            .collect())
    }

    fn bulk_insert(&mut self, collection: &str, records: &[CanonicalRecord]) -> Result<usize> {
        let stored = self.collections.entry(collection.to_string()).or_default();

        // Reject the whole chunk on a key clash, like a unique index would
        let mut keys: HashSet<&str> = stored.iter().map(|r| r.ppo_number.as_str()).collect();
        for record in records {
            if !keys.insert(record.ppo_number.as_str()) {
                return Err(IngestError::Store {
                    message: format!("duplicate ppo_number '{}' in {}", record.ppo_number, collection),
                });
            }
        }

        stored.extend_from_slice(records);
        debug!("Inserted {} records into in-memory collection {}", records.len(), collection);
        Ok(records.len())
    }
}
