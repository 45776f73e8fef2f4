//! Fixed decimal values: narrow text of the form `-nnn.nn`, always holding
//! exactly `scale` digits after the point.

use super::{string, Field};
use crate::error::RecordError;
use crate::record::{Record, RecordData};
use crate::text::{format_fixed, latin1_to_string};
use crate::types::FieldVal;

/// Longest input echoed in a rounding message.
const ROUNDED_ECHO_CHARS: usize = 64;

fn scale(field: &Field) -> usize {
    field.scale().max(0) as usize
}

fn report_does_not_fit(field: &Field, text: &str) {
    field.report_with(|| {
        format!(
            "\"{}\" does not fit in Fixed Decimal {}.{}",
            text,
            field.size(),
            field.scale()
        )
    });
}

/// True when any digit other than zero is stored.
pub(super) fn get_as_bool(field: &Field, data: RecordData<'_>) -> FieldVal<bool> {
    let raw = string::get_as_blob(field, data);
    if raw.is_null {
        return FieldVal::null();
    }
    FieldVal::new(raw.value.iter().any(|b| (b'1'..=b'9').contains(b)))
}

pub(super) fn set_from_double(field: &Field, record: &mut Record, value: f64) -> Result<(), RecordError> {
    if !value.is_finite() {
        string::set_null(field, record)?;
        report_does_not_fit(field, &value.to_string());
        return Ok(());
    }
    let text = format_fixed(value, scale(field));
    if text.len() > field.size() as usize {
        string::set_null(field, record)?;
        report_does_not_fit(field, &text);
        return Ok(());
    }
    string::store_narrow(field, record, text.as_bytes())
}

pub(super) fn set_from_int64(field: &Field, record: &mut Record, value: i64) -> Result<(), RecordError> {
    let text = value.to_string();
    if text.len() > field.size() as usize {
        string::set_null(field, record)?;
        report_does_not_fit(field, &text);
        return Ok(());
    }
    set_from_astring(field, record, text.as_bytes())
}

/// Checks `[+-]?d+(.d+)?` and returns the digit count after the point.
fn fraction_digits(text: &[u8]) -> Option<usize> {
    let mut pos = 0;
    if matches!(text.first(), Some(b'+' | b'-')) {
        pos += 1;
    }
    let int_start = pos;
    while pos < text.len() && text[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos == int_start {
        return None;
    }
    let mut fraction = 0;
    if pos < text.len() && text[pos] == b'.' {
        pos += 1;
        while pos < text.len() && text[pos].is_ascii_digit() {
            fraction += 1;
            pos += 1;
        }
        if fraction == 0 {
            return None;
        }
    }
    (pos == text.len()).then_some(fraction)
}

/// Adds one unit in the last place, carrying through nines.
fn round_up(digits: &mut Vec<u8>) {
    let mut idx = digits.len();
    loop {
        if idx == 0 {
            digits.insert(0, b'1');
            return;
        }
        idx -= 1;
        match digits[idx] {
            b'.' => continue,
            b'9' => {
                digits[idx] = b'0';
                continue;
            }
            b'+' => digits[idx] = b'1',
            b'-' => {
                digits.insert(idx + 1, b'1');
            }
            _ => digits[idx] += 1,
        }
        return;
    }
}

pub(super) fn set_from_astring(field: &Field, record: &mut Record, value: &[u8]) -> Result<(), RecordError> {
    if value.is_empty() {
        return string::set_null(field, record);
    }

    let mut text = Vec::with_capacity(value.len() + 2);
    if value[0] == b'.' {
        text.push(b'0');
        text.extend_from_slice(value);
    } else if value.starts_with(b"-.") {
        text.extend_from_slice(b"-0");
        text.extend_from_slice(&value[1..]);
    } else {
        text.extend_from_slice(value);
    }

    let Some(mut fraction) = fraction_digits(&text) else {
        string::set_null(field, record)?;
        field.report_with(|| {
            format!(
                "\"{}\" is not a valid FixedDecimal. FixedDecimal values must be of the form: -nnn.nn",
                latin1_to_string(&text)
            )
        });
        return Ok(());
    };

    let scale = scale(field);
    if fraction > scale {
        let mut keep = text.len() - (fraction - scale);
        let dropped = text[keep];
        if scale == 0 {
            keep -= 1;
        }
        text.truncate(keep);
        if (b'5'..=b'9').contains(&dropped) {
            round_up(&mut text);
        }
        fraction = scale;

        field.report_with(|| {
            let mut shown = latin1_to_string(&value[..value.len().min(ROUNDED_ECHO_CHARS)]);
            if value.len() > ROUNDED_ECHO_CHARS {
                shown.push_str("...");
            }
            format!(
                "\"{}\" has too many digits after the decimal and was truncated.",
                shown
            )
        });
    }
    if fraction == 0 && scale != 0 {
        text.push(b'.');
    }
    text.resize(text.len() + (scale - fraction), b'0');

    if text.len() > field.size() as usize {
        string::set_null(field, record)?;
        field.report_with(|| {
            format!(
                "\"{}\" was too long to fit in this FixedDecimal",
                latin1_to_string(&text)
            )
        });
        return Ok(());
    }
    string::store_narrow(field, record, &text)
}
