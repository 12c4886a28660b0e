//! Parsing of prices, quantities and dates from their external string forms.
//!
//! Prices are stored as integer cents. Conversion goes through `rust_decimal`
//! so a value like `$0.29` maps to exactly 29 cents, never 28.999...

use crate::error::ParseError;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use log::debug;
use rust_decimal::prelude::*;
use std::str::FromStr;

/// Date layout used by the import CSV, the backup CSV and the shell (`MM/DD/YYYY`)
pub const DATE_LAYOUT: &str = "%m/%d/%Y";

const PRICE_EXPECTED: &str = "a dollar amount in the format '$#.##'";

/// Parses a price string such as `$12.30`, `12.3` or `12` into cents.
///
/// A single leading `$` is optional. More than two fractional digits is a
/// [`ParseError::Precision`]; negative amounts, thousands separators and
/// anything non-numeric are a [`ParseError::Format`]. Because fractions of a
/// cent are rejected, no rounding is ever applied.
pub fn parse_price(raw: &str) -> Result<i64, ParseError> {
    let trimmed = raw.trim();
    let amount = trimmed.strip_prefix('$').unwrap_or(trimmed);

    let (whole, frac) = match amount.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (amount, ""),
    };

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !all_digits(whole) || !all_digits(frac) {
        return Err(ParseError::format("price", raw, PRICE_EXPECTED));
    }
    if frac.len() > 2 {
        return Err(ParseError::Precision(raw.to_string()));
    }

    let normalized = format!(
        "{}.{}",
        if whole.is_empty() { "0" } else { whole },
        if frac.is_empty() { "0" } else { frac }
    );
    let cents = Decimal::from_str(&normalized)
        .ok()
        .and_then(|dollars| dollars.checked_mul(Decimal::from(100)))
        .and_then(|cents| cents.to_i64())
        .ok_or_else(|| ParseError::format("price", raw, PRICE_EXPECTED))?;

    debug!("Parsed price '{}' as {} cents", raw, cents);
    Ok(cents)
}

/// Parses a non-negative whole quantity
pub fn parse_quantity(raw: &str) -> Result<u32, ParseError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| ParseError::format("quantity", raw, "a whole number of at least 0"))
}

/// Parses a date string with the given `chrono` layout, e.g. [`DATE_LAYOUT`].
///
/// The result is midnight of the parsed day.
pub fn parse_date(raw: &str, layout: &str) -> Result<NaiveDateTime, ParseError> {
    NaiveDate::parse_from_str(raw.trim(), layout)
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|_| ParseError::format("date", raw, "a date in the format MM/DD/YYYY"))
}

/// Drops the time-of-day component of a timestamp
pub fn normalize_to_midnight(timestamp: NaiveDateTime) -> NaiveDateTime {
    timestamp.date().and_time(NaiveTime::MIN)
}

/// Today's date at midnight, local time. Used for records entered by hand.
pub fn today_midnight() -> NaiveDateTime {
    normalize_to_midnight(Local::now().naive_local())
}

/// Renders cents as `$#.##`
pub fn format_price(cents: i64) -> String {
    format!("${}", Decimal::new(cents, 2))
}

/// Renders a timestamp as `MM/DD/YYYY`
pub fn format_date(timestamp: NaiveDateTime) -> String {
    timestamp.format(DATE_LAYOUT).to_string()
}
