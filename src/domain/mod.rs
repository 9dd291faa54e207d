use serde::{Deserialize, Serialize};
use std::fmt;

/// A single spreadsheet cell as handed over by the tabular reader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    /// Render the cell as trimmed text; whole numbers lose their fractional part
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Cell::Number(n) if n.is_finite() => {
                if n.fract() == 0.0 {
                    // No integer cast: large ids must not saturate into one key
                    Some(format!("{n:.0}"))
                } else {
                    Some(n.to_string())
                }
            }
            Cell::Number(_) | Cell::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_text().is_none()
    }
}

impl From<&serde_json::Value> for Cell {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Cell::Empty,
            serde_json::Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Empty),
            serde_json::Value::String(s) => Cell::Text(s.clone()),
            serde_json::Value::Bool(b) => Cell::Text(b.to_string()),
            other => Cell::Text(other.to_string()),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

/// One row of a source sheet, addressed by 0-based position
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    pub cells: Vec<Cell>,
}

impl RawRow {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Cell at `index`; columns past the end of a short row read as empty
    pub fn get(&self, index: usize) -> &Cell {
        self.cells.get(index).unwrap_or(&Cell::Empty)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Cell::is_empty)
    }
}

impl From<Vec<Cell>> for RawRow {
    fn from(cells: Vec<Cell>) -> Self {
        Self::new(cells)
    }
}

/// Sparse adapter output; only the PPO number is guaranteed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntermediateRecord {
    pub ppo_number: String,
    pub year_of_birth: Option<String>,
    pub date_of_birth: Option<String>,
    pub pension_sanctioning_authority: Option<String>,
    pub psa_district: Option<String>,
    pub bank_name: Option<String>,
    pub disbursing_branch_address: Option<String>,
    pub disbursing_branch_pincode: Option<String>,
    pub pensioner_postal_address: Option<String>,
    pub pensioner_pincode: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
}

impl IntermediateRecord {
    pub fn new(ppo_number: impl Into<String>) -> Self {
        Self {
            ppo_number: ppo_number.into(),
            ..Default::default()
        }
    }
}

/// Fixed age brackets used for aggregate reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeCategory {
    #[serde(rename = "Below 60")]
    Below60,
    #[serde(rename = "60-69")]
    Sixties,
    #[serde(rename = "70-79")]
    Seventies,
    #[serde(rename = "80-89")]
    Eighties,
    #[serde(rename = "90+")]
    NinetyPlus,
    Unknown,
}

impl AgeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeCategory::Below60 => "Below 60",
            AgeCategory::Sixties => "60-69",
            AgeCategory::Seventies => "70-79",
            AgeCategory::Eighties => "80-89",
            AgeCategory::NinetyPlus => "90+",
            AgeCategory::Unknown => "Unknown",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        [
            AgeCategory::Below60,
            AgeCategory::Sixties,
            AgeCategory::Seventies,
            AgeCategory::Eighties,
            AgeCategory::NinetyPlus,
            AgeCategory::Unknown,
        ]
        .into_iter()
        .find(|c| c.as_str() == label)
    }
}

impl fmt::Display for AgeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The normalized pensioner record persisted once per PPO number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub ppo_number: String,
    pub year_of_birth: Option<String>,
    pub date_of_birth: Option<String>,
    pub age: Option<u32>,
    pub age_category: AgeCategory,
    pub pension_sanctioning_authority: Option<String>,
    pub psa_district: Option<String>,
    pub bank_name: Option<String>,
    pub disbursing_branch_address: Option<String>,
    pub disbursing_branch_pincode: Option<String>,
    pub pensioner_postal_address: Option<String>,
    pub pensioner_pincode: Option<String>,
    pub state: String,
    pub district: Option<String>,
    pub data_source: String,
}
