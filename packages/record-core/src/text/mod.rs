//! Text helpers shared by the typed fields.
//!
//! Narrow strings are Latin-1 bytes, wide strings are UTF-16 code units.
//! Number parsing works on narrow bytes and reports how many bytes it
//! consumed so callers can classify partial conversions.

/// Byte substituted for characters with no Latin-1 form.
pub const REPLACEMENT_BYTE: u8 = b'?';

/// Decodes Latin-1 bytes into a `String`.
pub fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Encodes text as Latin-1.
///
/// Returns the bytes and whether any character had to be replaced.
pub fn string_to_latin1(text: &str) -> (Vec<u8>, bool) {
    let mut lossy = false;
    let bytes = text
        .chars()
        .map(|c| {
            let code = c as u32;
            if code < 256 {
                code as u8
            } else {
                lossy = true;
                REPLACEMENT_BYTE
            }
        })
        .collect();
    (bytes, lossy)
}

/// Narrows UTF-16 units to Latin-1, replacing units >= 256.
pub fn utf16_to_latin1(units: &[u16]) -> (Vec<u8>, bool) {
    let mut lossy = false;
    let bytes = units
        .iter()
        .map(|&u| {
            if u < 256 {
                u as u8
            } else {
                lossy = true;
                REPLACEMENT_BYTE
            }
        })
        .collect();
    (bytes, lossy)
}

/// Widens Latin-1 bytes to UTF-16 units.
pub fn latin1_to_utf16(bytes: &[u8]) -> Vec<u16> {
    bytes.iter().map(|&b| b as u16).collect()
}

/// Reads little-endian UTF-16 units from raw bytes.
pub fn utf16_from_le_bytes(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Writes UTF-16 units as little-endian bytes.
pub fn utf16_to_le_bytes(units: &[u16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(units.len() * 2);
    for unit in units {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out
}

/// Result of an integer scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedInt {
    /// Parsed value, saturated on overflow
    pub value: i64,
    /// Bytes consumed; 0 when no digit was read
    pub consumed: usize,
    /// Value did not fit the requested range
    pub overflow: bool,
}

fn is_space(b: u8) -> bool {
    b.is_ascii_whitespace() || b == 0x0b || b == 0xa0
}

/// Scans a signed integer in `base` (10 or 16), bounded to `[min, max]`.
///
/// Leading whitespace and one sign are skipped. For base 16 an optional
/// `0x` prefix is accepted. Scanning stops at the first non-digit; digits
/// past an overflow are consumed but do not change the saturated value.
pub fn parse_integer(text: &[u8], base: u32, min: i64, max: i64) -> ParsedInt {
    let mut pos = 0;
    while pos < text.len() && is_space(text[pos]) {
        pos += 1;
    }
    let mut negative = false;
    if pos < text.len() && (text[pos] == b'-' || text[pos] == b'+') {
        negative = text[pos] == b'-';
        pos += 1;
    }
    if base == 16
        && pos + 1 < text.len()
        && text[pos] == b'0'
        && (text[pos + 1] == b'x' || text[pos + 1] == b'X')
    {
        pos += 2;
    }

    let digits_start = pos;
    // accumulate as a negative magnitude so the minimum is representable
    let mut acc: i128 = 0;
    let limit_neg = if negative {
        min as i128
    } else {
        -(max as i128)
    };
    let mut overflow = false;
    while pos < text.len() {
        let digit = match (text[pos] as char).to_digit(base) {
            Some(d) => d as i128,
            None => break,
        };
        if !overflow {
            let next = acc * base as i128 - digit;
            if next < limit_neg {
                overflow = true;
            } else {
                acc = next;
            }
        }
        pos += 1;
    }

    if pos == digits_start {
        return ParsedInt {
            value: 0,
            consumed: 0,
            overflow: false,
        };
    }

    let value = if overflow {
        if negative {
            min
        } else {
            max
        }
    } else if negative {
        acc as i64
    } else {
        (-acc) as i64
    };
    ParsedInt {
        value,
        consumed: pos,
        overflow,
    }
}

/// Scans a decimal floating point number.
///
/// Accepts leading whitespace, a sign, digits, `sep` followed by digits,
/// and an exponent introduced by `e`, `E`, `d` or `D`. Returns the value
/// and the number of bytes consumed (0 when no digit was found).
pub fn convert_to_double(text: &[u8], sep: u8) -> (f64, usize) {
    let mut pos = 0;
    while pos < text.len() && is_space(text[pos]) {
        pos += 1;
    }
    let mut normalized = String::with_capacity(text.len());
    if pos < text.len() && (text[pos] == b'+' || text[pos] == b'-') {
        if text[pos] == b'-' {
            normalized.push('-');
        }
        pos += 1;
    }

    let mut digit_count = 0;
    while pos < text.len() && text[pos].is_ascii_digit() {
        normalized.push(text[pos] as char);
        digit_count += 1;
        pos += 1;
    }
    if pos < text.len() && text[pos] == sep {
        pos += 1;
        let mut fraction = String::new();
        while pos < text.len() && text[pos].is_ascii_digit() {
            fraction.push(text[pos] as char);
            digit_count += 1;
            pos += 1;
        }
        // a lone separator with no digits either side is not a number
        if digit_count == 0 {
            return (0.0, 0);
        }
        if normalized.is_empty() || normalized == "-" {
            normalized.push('0');
        }
        if !fraction.is_empty() {
            normalized.push('.');
            normalized.push_str(&fraction);
        }
    }
    if digit_count == 0 {
        return (0.0, 0);
    }

    if pos < text.len() && matches!(text[pos], b'e' | b'E' | b'd' | b'D') {
        let mut exp_pos = pos + 1;
        let mut exponent = String::from("e");
        if exp_pos < text.len() && (text[exp_pos] == b'+' || text[exp_pos] == b'-') {
            if text[exp_pos] == b'-' {
                exponent.push('-');
            }
            exp_pos += 1;
        }
        let exp_digits_start = exp_pos;
        while exp_pos < text.len() && text[exp_pos].is_ascii_digit() {
            exponent.push(text[exp_pos] as char);
            exp_pos += 1;
        }
        if exp_pos > exp_digits_start {
            normalized.push_str(&exponent);
            pos = exp_pos;
        }
    }

    let value = normalized.parse::<f64>().unwrap_or(0.0);
    (value, pos)
}

/// Formats a double with 15 significant digits.
pub fn double_to_string(value: f64) -> String {
    format_significant(value, 15)
}

/// Formats a float with 7 significant digits.
pub fn float_to_string(value: f32) -> String {
    format_significant(value as f64, 7)
}

/// Formats `value` with exactly `scale` digits after the decimal point.
pub fn format_fixed(value: f64, scale: usize) -> String {
    format!("{:.*}", scale, value)
}

/// Splits Rust's `{:e}` output into mantissa and exponent.
fn split_exponent(formatted: &str) -> (&str, i32) {
    match formatted.split_once('e') {
        Some((mantissa, exp)) => (mantissa, exp.parse().unwrap_or(0)),
        None => (formatted, 0),
    }
}

fn c_exponent(exp: i32) -> String {
    let sign = if exp < 0 { '-' } else { '+' };
    format!("e{}{:02}", sign, exp.unsigned_abs())
}

fn trim_fraction_zeros(text: &str) -> &str {
    if !text.contains('.') {
        return text;
    }
    let trimmed = text.trim_end_matches('0');
    trimmed.trim_end_matches('.')
}

/// `%g`-style formatting with `digits` significant digits.
///
/// Exponent form is used when the magnitude needs more than `digits`
/// places either side of the decimal point.
pub fn format_significant(value: f64, digits: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-Inf" } else { "Inf" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let precision = digits.saturating_sub(1);
    let scientific = format!("{:.*e}", precision, value);
    let (mantissa, exp) = split_exponent(&scientific);
    let digits_i = digits as i32;

    let magnitude = value.abs();
    let far = magnitude >= 10f64.powi(digits_i) || magnitude < 10f64.powi(-digits_i);
    if far || exp < -4 || exp >= digits_i {
        return format!("{}{}", trim_fraction_zeros(mantissa), c_exponent(exp));
    }

    let decimals = (digits_i - 1 - exp).max(0) as usize;
    let fixed = format!("{:.*}", decimals, value);
    trim_fraction_zeros(&fixed).to_string()
}
