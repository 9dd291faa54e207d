use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::error::Result;

pub const UNKNOWN_STATE: &str = "Unknown";

/// On-disk shape of the pincode table
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeographyFile {
    #[serde(default)]
    pincode_ranges: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    special_cases: HashMap<String, String>,
}

/// Maps 6-digit postal codes to state names
#[derive(Debug, Clone, Default)]
pub struct GeographyResolver {
    /// (state, prefixes) in document order; first match wins
    ranges: Vec<(String, Vec<String>)>,
    special_cases: HashMap<String, String>,
}

impl GeographyResolver {
    /// An empty mapping; every lookup resolves to "Unknown"
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: GeographyFile = serde_json::from_str(content)?;

        let ranges = file
            .pincode_ranges
            .into_iter()
            .map(|(state, prefixes)| {
                let prefixes = match prefixes {
                    serde_json::Value::Array(items) => items
                        .iter()
                        .filter_map(|p| match p {
                            serde_json::Value::String(s) => Some(s.trim().to_string()),
                            serde_json::Value::Number(n) => Some(format!("{:02}", n.as_u64()?)),
                            _ => None,
                        })
                        .collect(),
                    _ => Vec::new(),
                };
                (state, prefixes)
            })
            .collect();

        Ok(Self {
            ranges,
            special_cases: file.special_cases,
        })
    }

    /// Load the table, degrading to an empty mapping when the file is missing or corrupt
    pub fn load_or_empty(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Geography table '{}' unavailable ({}); all states resolve to Unknown", path.display(), e);
                return Self::empty();
            }
        };
        match Self::from_json_str(&content) {
            Ok(resolver) => {
                info!(
                    "Loaded geography table from {} ({} states, {} special cases)",
                    path.display(),
                    resolver.ranges.len(),
                    resolver.special_cases.len()
                );
                resolver
            }
            Err(e) => {
                warn!("Geography table '{}' is corrupt ({}); all states resolve to Unknown", path.display(), e);
                Self::empty()
            }
        }
    }

    pub fn with_prefixes(mut self, state: &str, prefixes: &[&str]) -> Self {
        self.ranges
            .push((state.to_string(), prefixes.iter().map(|p| p.to_string()).collect()));
        self
    }

    pub fn with_special_case(mut self, pincode: &str, state: &str) -> Self {
        self.special_cases.insert(pincode.to_string(), state.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty() && self.special_cases.is_empty()
    }

    pub fn resolve_state(&self, pincode: Option<&str>) -> String {
        self.lookup(pincode).unwrap_or(UNKNOWN_STATE).to_string()
    }

    fn lookup(&self, pincode: Option<&str>) -> Option<&str> {
        let pincode = pincode?.trim();
        if !is_valid_pincode(pincode) {
            return None;
        }
        if let Some(state) = self.special_cases.get(pincode) {
            return Some(state);
        }
        let prefix = &pincode[..2];
        self.ranges
            .iter()
            .find(|(_, prefixes)| prefixes.iter().any(|p| p == prefix))
            .map(|(state, _)| state.as_str())
    }
}

pub fn is_valid_pincode(pincode: &str) -> bool {
    pincode.len() == 6 && pincode.bytes().all(|b| b.is_ascii_digit())
}
