use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::domain::AgeCategory;

/// Day-month-year encodings tried in order; ISO dates are accepted last
const DOB_FORMATS: [&str; 4] = ["%d-%m-%Y", "%d/%m/%Y", "%d.%m.%Y", "%Y-%m-%d"];

/// Serial day counts accepted as dates; the lower bound keeps bare years out
const SERIAL_RANGE: std::ops::RangeInclusive<f64> = 10_000.0..=100_000.0;

/// Spreadsheet serial dates count days from this epoch
fn serial_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default()
}

/// Derives ages against an explicit reference date
#[derive(Debug, Clone, Copy)]
pub struct AgeDeriver {
    reference: NaiveDate,
}

impl AgeDeriver {
    pub fn new(reference: NaiveDate) -> Self {
        Self { reference }
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference
    }

    /// `reference_year - year`; None for missing, non-numeric or future years
    pub fn age_from_birth_year(&self, year: Option<&str>) -> Option<u32> {
        let year = parse_year(year?)?;
        let age = self.reference.year() - year;
        u32::try_from(age).ok()
    }

    /// Whole years elapsed, counted as floor(days / 365)
    pub fn age_from_date_of_birth(&self, dob: Option<&str>) -> Option<u32> {
        let dob = parse_date_of_birth(dob?)?;
        let days = (self.reference - dob).num_days();
        if days < 0 {
            return None;
        }
        u32::try_from(days / 365).ok()
    }

    /// Year of birth wins when both representations are present and the year is usable
    pub fn derive(&self, year_of_birth: Option<&str>, date_of_birth: Option<&str>) -> (Option<u32>, AgeCategory) {
        let age = self
            .age_from_birth_year(year_of_birth)
            .or_else(|| self.age_from_date_of_birth(date_of_birth));
        (age, age_category(age))
    }
}

pub fn age_category(age: Option<u32>) -> AgeCategory {
    match age {
        None => AgeCategory::Unknown,
        Some(a) if a < 60 => AgeCategory::Below60,
        Some(a) if a < 70 => AgeCategory::Sixties,
        Some(a) if a < 80 => AgeCategory::Seventies,
        Some(a) if a < 90 => AgeCategory::Eighties,
        Some(_) => AgeCategory::NinetyPlus,
    }
}

fn parse_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    // Numeric cells arrive as "1960" or "1960.0"
    let digits = raw.strip_suffix(".0").unwrap_or(raw);
    digits.parse::<i32>().ok()
}

/// Parse a free-form date of birth using the fixed format list
pub fn parse_date_of_birth(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    // Drop a trailing time component such as "01-02-1955 00:00:00"
    let date_part = raw.split_whitespace().next().unwrap_or(raw);

    if let Some(date) = DOB_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(date_part, fmt)
            .ok()
            .filter(|_| has_full_year(date_part, fmt.starts_with("%Y")))
    }) {
        return Some(date);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        let date_only = raw.split('T').next().unwrap_or(raw);
        return has_full_year(date_only, true).then(|| dt.date());
    }
    date_from_serial(date_part)
}

/// chrono's `%Y` takes any digit count, so "15-08-50" would land in year 50
fn has_full_year(date_part: &str, year_first: bool) -> bool {
    let mut segments = date_part.split(|c: char| !c.is_ascii_digit());
    let year = if year_first {
        segments.next()
    } else {
        segments.last()
    };
    year.map(|y| y.len() == 4).unwrap_or(false)
}

fn date_from_serial(raw: &str) -> Option<NaiveDate> {
    let serial: f64 = raw.parse().ok()?;
    if !SERIAL_RANGE.contains(&serial) {
        return None;
    }
    serial_epoch().checked_add_signed(Duration::days(serial.trunc() as i64))
}
