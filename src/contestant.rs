// 🏋️ Contestant Entity
//
// A contestant is identified by name only. The name lives in the snapshot key,
// not in the record, so the persisted shape stays
// name -> { date_of_birth, age, starting_weight, current_weight, weight_lost, percentage_lost }.

use crate::error::{RegistryError, RegistryResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// ISO calendar date format used for date_of_birth
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// CONTESTANT RECORD
// ============================================================================

/// One persisted contestant entry
///
/// `age`, `weight_lost` and `percentage_lost` are derived at write time and
/// stored alongside their sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContestantRecord {
    /// ISO `YYYY-MM-DD` string, as entered
    pub date_of_birth: String,

    #[serde(default)]
    pub age: u32,

    pub starting_weight: f64,

    pub current_weight: f64,

    #[serde(default)]
    pub weight_lost: f64,

    #[serde(default)]
    pub percentage_lost: f64,
}

impl ContestantRecord {
    /// Fresh record: current weight starts at the starting weight, nothing lost yet
    pub fn new(date_of_birth: String, age: u32, starting_weight: f64) -> Self {
        ContestantRecord {
            date_of_birth,
            age,
            starting_weight,
            current_weight: starting_weight,
            weight_lost: 0.0,
            percentage_lost: 0.0,
        }
    }

    pub fn set_derived(&mut self, weight_lost: f64, percentage_lost: f64) {
        self.weight_lost = weight_lost;
        self.percentage_lost = percentage_lost;
    }
}

// ============================================================================
// READ VIEW
// ============================================================================

/// What `info` exposes: biographical and weight fields, no derived values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContestantView {
    pub name: String,
    pub date_of_birth: String,
    pub age: u32,
    pub starting_weight: f64,
    pub current_weight: f64,
}

impl ContestantView {
    pub fn from_record(name: &str, record: &ContestantRecord) -> Self {
        ContestantView {
            name: name.to_string(),
            date_of_birth: record.date_of_birth.clone(),
            age: record.age,
            starting_weight: record.starting_weight,
            current_weight: record.current_weight,
        }
    }
}

// ============================================================================
// INPUT VALIDATION
// ============================================================================

/// Four-digit year, then only digits and dashes; chrono alone tolerates
/// signs, padding and wider years
fn has_date_shape(input: &str) -> bool {
    let bytes = input.as_bytes();
    bytes.len() > 5
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[5..].iter().all(|b| b.is_ascii_digit() || *b == b'-')
}

/// Parse a `YYYY-MM-DD` date of birth and reject dates after `today`
pub fn parse_date_of_birth(input: &str, today: NaiveDate) -> RegistryResult<NaiveDate> {
    if !has_date_shape(input) {
        return Err(RegistryError::InvalidDate(input.to_string()));
    }

    let dob = NaiveDate::parse_from_str(input, DATE_FORMAT)
        .map_err(|_| RegistryError::InvalidDate(input.to_string()))?;

    if dob > today {
        return Err(RegistryError::InvalidDate(input.to_string()));
    }

    Ok(dob)
}

/// Parse a caller-supplied weight; NaN and infinities count as non-numeric
pub fn parse_weight(field: &'static str, input: &str) -> RegistryResult<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|w| w.is_finite())
        .ok_or_else(|| RegistryError::InvalidNumber {
            field,
            input: input.to_string(),
        })
}

/// Names are identifiers: blank names are refused
pub fn validate_name(name: &str) -> RegistryResult<()> {
    if name.trim().is_empty() {
        Err(RegistryError::InvalidName)
    } else {
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
