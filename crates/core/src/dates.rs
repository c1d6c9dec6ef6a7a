//! Date normalization for heterogeneous date inputs.
//!
//! Document rows arrive from spreadsheets, legacy exports, and the REST layer,
//! so an expiration date may be an ISO string, a spreadsheet day serial, a
//! Unix timestamp, or an already-typed date. Everything is reduced to a
//! calendar day (`NaiveDate`); time of day is discarded. Normalization never
//! fails loudly: anything that cannot be read yields `None`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Numbers with a magnitude below this are spreadsheet day serials.
pub const SERIAL_DAY_LIMIT: f64 = 100_000.0;

/// Numbers with a magnitude below this (and above the serial limit) are
/// Unix epoch seconds. Anything larger is epoch milliseconds.
pub const EPOCH_SECONDS_LIMIT: f64 = 100_000_000_000.0;

/// Date-time layouts tried by the generic text path, after RFC 3339/2822.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Date-only layouts tried by the generic text path. Day-first, matching the
/// `DD/MM/YYYY` convention of the HR spreadsheets.
const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d"];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A date value of unknown shape, as it arrived at the ingestion boundary.
///
/// Deserialization is untagged: JSON numbers become [`DateInput::Number`] and
/// JSON strings become [`DateInput::Text`]. The typed variants exist for
/// callers that already hold a parsed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateInput {
    Number(f64),
    Text(String),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl DateInput {
    /// Reduce this input to a calendar day, or `None` if it is unreadable.
    pub fn normalize(&self) -> Option<NaiveDate> {
        normalize_date(self)
    }
}

impl From<NaiveDate> for DateInput {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

impl From<DateTime<Utc>> for DateInput {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts)
    }
}

impl From<&str> for DateInput {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for DateInput {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for DateInput {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<f64> for DateInput {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalize any [`DateInput`] to a calendar day.
pub fn normalize_date(input: &DateInput) -> Option<NaiveDate> {
    match input {
        DateInput::Date(date) => Some(*date),
        DateInput::Timestamp(ts) => Some(ts.date_naive()),
        DateInput::Number(n) => normalize_number(*n),
        DateInput::Text(s) => normalize_text(s),
    }
}

/// Normalize an optional input; `None` stays `None`.
pub fn normalize_optional(input: Option<&DateInput>) -> Option<NaiveDate> {
    input.and_then(normalize_date)
}

/// Interpret a bare number as a serial day, epoch seconds, or epoch millis,
/// depending on its magnitude.
pub fn normalize_number(value: f64) -> Option<NaiveDate> {
    if !value.is_finite() {
        return None;
    }

    let magnitude = value.abs();
    if magnitude < SERIAL_DAY_LIMIT {
        from_serial_day(value)
    } else if magnitude < EPOCH_SECONDS_LIMIT {
        DateTime::from_timestamp(value.floor() as i64, 0).map(|dt| dt.date_naive())
    } else {
        let millis = value.floor() as i64;
        DateTime::from_timestamp(millis.div_euclid(1000), 0).map(|dt| dt.date_naive())
    }
}

/// Parse text. Pure-digit strings go through the numeric path; `YYYY-MM-DD`
/// is read as a plain calendar day with no timezone shift; anything else is
/// tried against the generic layouts.
pub fn normalize_text(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if s.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse::<f64>().ok().and_then(normalize_number);
    }

    if is_iso_calendar_date(s) {
        return NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();
    }

    parse_generic(s)
}

/// Days since the spreadsheet epoch (1899-12-30). Fractions are time of day
/// and are dropped.
fn from_serial_day(serial: f64) -> Option<NaiveDate> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let days = TimeDelta::try_days(serial.floor() as i64)?;
    epoch.checked_add_signed(days)
}

fn is_iso_calendar_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit())
}

fn parse_generic(s: &str) -> Option<NaiveDate> {
    // Keep the writer's own offset: converting to UTC first would move
    // late-evening timestamps to the previous or next day.
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.date_naive());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
