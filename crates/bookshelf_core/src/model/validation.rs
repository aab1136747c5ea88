//! Input validation errors and typed parsers shared by author/book models.
//!
//! # Invariants
//! - Dates are normalized to UTC; a bare `YYYY-MM-DD` means midnight UTC.
//! - Validation never touches storage.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation failure for caller-provided catalog input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty after trim.
    BlankField(&'static str),
    /// Identifier does not satisfy ISBN-10/ISBN-13 structure and checksum.
    InvalidIsbn(String),
    /// Date string is neither `YYYY-MM-DD` nor RFC 3339.
    InvalidDate { field: &'static str, value: String },
    /// Genre is not in the closed enumeration.
    UnknownGenre(String),
    /// Page or limit is zero.
    InvalidPagination { field: &'static str, value: u32 },
    /// Identity cannot be the nil UUID.
    NilId,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "{field} must not be blank"),
            Self::InvalidIsbn(value) => write!(f, "isbn must be a valid ISBN, got `{value}`"),
            Self::InvalidDate { field, value } => {
                write!(f, "{field} must be a valid ISO 8601 date, got `{value}`")
            }
            Self::UnknownGenre(value) => write!(
                f,
                "Genre must be one of the following: {}; got `{value}`",
                super::book::Genre::ALL
                    .iter()
                    .map(|genre| genre.label())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::InvalidPagination { field, value } => {
                write!(f, "{field} must be a positive integer, got {value}")
            }
            Self::NilId => write!(f, "id must not be the nil uuid"),
        }
    }
}

impl Error for ValidationError {}

/// Parses a caller date as `YYYY-MM-DD` or an RFC 3339 timestamp.
pub fn parse_date(field: &'static str, value: &str) -> Result<DateTime<Utc>, ValidationError> {
    let trimmed = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    parse_day(field, value).map(start_of_day)
}

/// Parses a calendar day given strictly as `YYYY-MM-DD`.
pub fn parse_day(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ValidationError::InvalidDate {
            field,
            value: value.to_string(),
        }
    })
}

/// Returns the `[start, next_start)` epoch-ms window covering one UTC day.
pub fn day_bounds_ms(day: NaiveDate) -> (i64, i64) {
    let start = start_of_day(day).timestamp_millis();
    let end = day
        .succ_opt()
        .map_or(i64::MAX, |next| start_of_day(next).timestamp_millis());
    (start, end)
}

pub(crate) fn to_epoch_ms(value: &DateTime<Utc>) -> i64 {
    value.timestamp_millis()
}

pub(crate) fn from_epoch_ms(value: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(value).single()
}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(())
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}
