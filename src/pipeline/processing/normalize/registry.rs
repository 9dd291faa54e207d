use std::collections::HashMap;

use super::adapters::{BankExportAdapter, DlcPortalAdapter, ManualListAdapter, PostOfficeAdapter, SourceAdapter};
use crate::error::{IngestError, Result};

/// Registry of source adapters keyed by source identifier
pub struct AdapterRegistry {
    adapters: HashMap<String, Box<dyn SourceAdapter>>,
}

impl AdapterRegistry {
    /// Create a registry holding every built-in adapter
    pub fn new() -> Self {
        let mut registry = Self::empty();

        registry.register(Box::new(DlcPortalAdapter::new()));
        registry.register(Box::new(BankExportAdapter::indian_overseas_bank()));
        registry.register(Box::new(BankExportAdapter::generic()));
        registry.register(Box::new(PostOfficeAdapter::new()));
        registry.register(Box::new(ManualListAdapter::default()));

        registry
    }

    pub fn empty() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Register an adapter under its own source ID, replacing any previous one
    pub fn register(&mut self, adapter: Box<dyn SourceAdapter>) {
        self.adapters.insert(adapter.source_id().to_string(), adapter);
    }

    pub fn get(&self, source_id: &str) -> Option<&dyn SourceAdapter> {
        self.adapters.get(source_id).map(|a| a.as_ref())
    }

    pub fn require(&self, source_id: &str) -> Result<&dyn SourceAdapter> {
        self.get(source_id)
            .ok_or_else(|| IngestError::UnknownSource(source_id.to_string()))
    }

    /// List all registered source IDs, sorted
    pub fn list_sources(&self) -> Vec<&str> {
        let mut sources: Vec<&str> = self.adapters.keys().map(|k| k.as_str()).collect();
        sources.sort_unstable();
        sources
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
