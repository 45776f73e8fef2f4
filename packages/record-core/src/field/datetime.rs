//! Date, Time and DateTime fields.
//!
//! Values are narrow text in `YYYY-MM-DD`, `HH:MM:SS` and
//! `YYYY-MM-DD HH:MM:SS` form. Every write is validated after it is stored;
//! invalid text nulls the field and raises a conversion error.

use super::{string, Field};
use crate::error::RecordError;
use crate::record::Record;
use crate::text::{double_to_string, latin1_to_string};
use crate::types::FieldType;

/// Day serial of 9999-12-31 plus one.
const LATEST_SERIAL: f64 = 2_958_466.0;
/// Days from 1970-01-01 back to the serial epoch 1899-12-30.
const SERIAL_EPOCH_UNIX_DAYS: i64 = -25_569;
const SECONDS_PER_DAY: f64 = 86_400.0;
const EARLIEST_YEAR: u32 = 1400;

fn digits(text: &[u8]) -> Option<u32> {
    text.iter().try_fold(0u32, |acc, &b| {
        b.is_ascii_digit().then(|| acc * 10 + (b - b'0') as u32)
    })
}

fn is_leap_year(year: u32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Checks `YYYY-MM-DD` with a year of at least 1400.
pub fn validate_date(text: &[u8]) -> bool {
    if text.len() != 10 || text[4] != b'-' || text[7] != b'-' {
        return false;
    }
    let (Some(year), Some(month), Some(day)) =
        (digits(&text[..4]), digits(&text[5..7]), digits(&text[8..10]))
    else {
        return false;
    };
    year >= EARLIEST_YEAR && (1..=12).contains(&month) && day != 0 && day <= days_in_month(year, month)
}

/// Checks `HH:MM:SS` on a 24 hour clock.
pub fn validate_time(text: &[u8]) -> bool {
    if text.len() != 8 || text[2] != b':' || text[5] != b':' {
        return false;
    }
    match (digits(&text[..2]), digits(&text[3..5]), digits(&text[6..8])) {
        (Some(h), Some(m), Some(s)) => h <= 23 && m <= 59 && s <= 59,
        _ => false,
    }
}

/// Checks a bare date or `YYYY-MM-DD HH:MM:SS`.
pub fn validate_date_time(text: &[u8]) -> bool {
    match text.len() {
        10 => validate_date(text),
        19 => validate_date(&text[..10]) && text[10] == b' ' && validate_time(&text[11..]),
        _ => false,
    }
}

fn validate(field_type: FieldType, text: &[u8]) -> bool {
    match field_type {
        FieldType::Date => validate_date(text),
        FieldType::Time => validate_time(text),
        _ => validate_date_time(text),
    }
}

/// Converts days since 1970-01-01 to a civil year, month and day.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// Formats an OLE automation date serial as `YYYY-MM-DD HH:MM:SS`.
fn format_serial(value: f64) -> String {
    let whole = value.trunc();
    let (year, month, day) = civil_from_days(whole as i64 + SERIAL_EPOCH_UNIX_DAYS);
    let seconds = ((value - whole) * SECONDS_PER_DAY + 0.5).floor().min(SECONDS_PER_DAY - 1.0) as u32;
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        year,
        month,
        day,
        seconds / 3600,
        seconds / 60 % 60,
        seconds % 60
    )
}

pub(super) fn set_from_double(field: &Field, record: &mut Record, value: f64) -> Result<(), RecordError> {
    if value.is_nan() || value < 0.0 || value >= LATEST_SERIAL {
        string::set_null(field, record)?;
        if value >= LATEST_SERIAL {
            field.report_with(|| {
                format!(
                    "\"{}\" is an invalid datetime - Latest date supported is Dec 31, 9999 (2958466)",
                    double_to_string(value)
                )
            });
        } else {
            field.report_with(|| {
                format!(
                    "\"{}\" is an invalid datetime - Earliest date supported is Dec 30, 1899 (0)",
                    double_to_string(value)
                )
            });
        }
        return Ok(());
    }
    set_from_astring(field, record, format_serial(value).as_bytes())
}

pub(super) fn set_from_astring(field: &Field, record: &mut Record, value: &[u8]) -> Result<(), RecordError> {
    let field_type = field.field_type();
    let padded;
    let input: &[u8] = match field_type {
        FieldType::Time if value.len() == 19 && validate_date(&value[..10]) => &value[11..],
        FieldType::DateTime if value.len() == 10 => {
            padded = [value, &b" 00:00:00"[..]].concat();
            &padded
        }
        _ => value,
    };

    let stored = &input[..input.len().min(field.size() as usize)];
    string::store_narrow(field, record, stored)?;
    if !validate(field_type, stored) {
        string::set_null(field, record)?;
        field.report_with(|| {
            format!(
                "\"{}\" is not a valid {}",
                latin1_to_string(input),
                field_type.name()
            )
        });
    }
    Ok(())
}

