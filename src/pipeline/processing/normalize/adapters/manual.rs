use std::collections::HashMap;

use super::base::{AdapterUtils, RowRejection, SourceAdapter};
use crate::constants::MANUAL_SOURCE;
use crate::domain::{IntermediateRecord, RawRow};
use crate::error::{IngestError, Result};

/// Canonical header order for curated lists; also the default positions
pub const MANUAL_COLUMNS: [&str; 12] = [
    "PPO_NO",
    "YOB",
    "DOB",
    "PSA",
    "PSA_DISTRICT",
    "BANK",
    "BRANCH_ADDRESS",
    "BRANCH_PINCODE",
    "ADDRESS",
    "PINCODE",
    "STATE",
    "DISTRICT",
];

/// Header spellings seen in curated lists, mapped to canonical names
const ALIASES: [(&str, &str); 6] = [
    ("PPO", "PPO_NO"),
    ("PPO_NUMBER", "PPO_NO"),
    ("YEAR_OF_BIRTH", "YOB"),
    ("DATE_OF_BIRTH", "DOB"),
    ("PIN_CODE", "PINCODE"),
    ("BANK_NAME", "BANK"),
];

fn normalize_header(name: &str) -> String {
    let upper: String = name
        .trim()
        .to_uppercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let collapsed = upper
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == collapsed)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(collapsed)
}

/// Adapter for manually curated lists whose columns are addressed by header name
pub struct ManualListAdapter {
    columns: HashMap<String, usize>,
}

impl ManualListAdapter {
    /// Resolve column positions from a header row; `PPO_NO` is mandatory
    pub fn from_header(header: &RawRow) -> Result<Self> {
        let mut columns = HashMap::new();
        for (idx, cell) in header.cells.iter().enumerate() {
            if let Some(name) = cell.as_text() {
                columns.entry(normalize_header(&name)).or_insert(idx);
            }
        }
        if !columns.contains_key("PPO_NO") {
            return Err(IngestError::Config(
                "manual list header has no PPO number column".to_string(),
            ));
        }
        Ok(Self { columns })
    }

    /// Resolve column positions from the leading header block; its last row names the columns
    pub fn from_header_block(block: &[RawRow]) -> Result<Self> {
        let header = block
            .last()
            .ok_or_else(|| IngestError::Config("manual list has no header row".to_string()))?;
        Self::from_header(header)
    }

    fn text(&self, row: &RawRow, column: &str) -> Option<String> {
        self.columns.get(column).and_then(|idx| AdapterUtils::text(row, *idx))
    }

    fn pincode(&self, row: &RawRow, column: &str) -> Option<String> {
        self.columns.get(column).and_then(|idx| AdapterUtils::pincode(row, *idx))
    }
}

impl Default for ManualListAdapter {
    fn default() -> Self {
        Self {
            columns: MANUAL_COLUMNS
                .iter()
                .enumerate()
                .map(|(idx, name)| (name.to_string(), idx))
                .collect(),
        }
    }
}

impl SourceAdapter for ManualListAdapter {
    fn extract(&self, row: &RawRow) -> std::result::Result<IntermediateRecord, RowRejection> {
        let ppo = self.text(row, "PPO_NO").ok_or(RowRejection::MissingPpo)?;
        let mut record = IntermediateRecord::new(ppo);

        record.year_of_birth = self.text(row, "YOB");
        record.date_of_birth = self.text(row, "DOB");
        record.pension_sanctioning_authority = self.text(row, "PSA");
        record.psa_district = self.text(row, "PSA_DISTRICT").or_else(|| {
            record
                .pension_sanctioning_authority
                .as_deref()
                .and_then(AdapterUtils::district_from_psa)
        });
        record.bank_name = self.text(row, "BANK");
        record.disbursing_branch_address = self.text(row, "BRANCH_ADDRESS");
        record.disbursing_branch_pincode = self.pincode(row, "BRANCH_PINCODE");
        record.pensioner_postal_address = self.text(row, "ADDRESS");
        record.pensioner_pincode = self.pincode(row, "PINCODE");
        record.state = self.text(row, "STATE").map(|s| s.to_uppercase());
        record.district = self.text(row, "DISTRICT");

        Ok(record)
    }

    fn source_id(&self) -> &str {
        MANUAL_SOURCE
    }

    fn name(&self) -> &str {
        "Manual List Adapter"
    }
}
