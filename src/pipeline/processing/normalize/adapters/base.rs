use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::domain::{IntermediateRecord, RawRow};

/// Base trait for source-specific field extraction
pub trait SourceAdapter: Send + Sync {
    /// Map one raw row into an intermediate record, or reject the row
    fn extract(&self, row: &RawRow) -> Result<IntermediateRecord, RowRejection>;

    /// Get the source ID this adapter handles
    fn source_id(&self) -> &str;

    /// Get a human-readable name for this adapter
    fn name(&self) -> &str;
}

/// Why a row was excluded from the output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowRejection {
    MissingPpo,
    Malformed(String),
}

impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowRejection::MissingPpo => f.write_str("PPO number is empty"),
            RowRejection::Malformed(reason) => write!(f, "malformed row: {reason}"),
        }
    }
}

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Office-suffix tokens removed from a PSA to get its district, longest first
const PSA_OFFICE_SUFFIXES: [&str; 7] = [" H.O.", " H.O", " HO", " S.O.", " S.O", " SO", ".O"];

/// Shared cell coercions for adapters
pub struct AdapterUtils;

impl AdapterUtils {
    /// Trimmed, whitespace-collapsed text of a cell; empty cells are None
    pub fn text(row: &RawRow, index: usize) -> Option<String> {
        row.get(index)
            .as_text()
            .map(|s| WHITESPACE_RUN.replace_all(&s, " ").into_owned())
    }

    /// Pincode text with thousand-separator commas and inner spaces removed
    pub fn pincode(row: &RawRow, index: usize) -> Option<String> {
        Self::text(row, index).and_then(|s| Self::clean_pincode(&s))
    }

    pub fn clean_pincode(raw: &str) -> Option<String> {
        let cleaned: String = raw.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
        let cleaned = cleaned.strip_suffix(".0").unwrap_or(&cleaned).to_string();
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned)
        }
    }

    /// The PPO number, or a rejection when it is empty after trimming
    pub fn ppo(row: &RawRow, index: usize) -> Result<String, RowRejection> {
        Self::text(row, index).ok_or(RowRejection::MissingPpo)
    }

    /// District implied by a PSA such as "MYSORE H.O"
    pub fn district_from_psa(psa: &str) -> Option<String> {
        let psa = psa.trim();
        let upper = psa.to_ascii_uppercase();
        let stripped = PSA_OFFICE_SUFFIXES
            .iter()
            .find(|suffix| upper.ends_with(*suffix))
            .map(|suffix| &psa[..psa.len() - suffix.len()])
            .unwrap_or(psa)
            .trim();
        if stripped.is_empty() {
            None
        } else {
            Some(stripped.to_string())
        }
    }
}
