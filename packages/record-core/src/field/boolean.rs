//! Bool storage: one byte, bit 0 is the value and bit 1 the null flag.

use super::Field;
use crate::error::RecordError;
use crate::record::{Record, RecordData};
use crate::types::FieldVal;

const VALUE_BIT: u8 = 1;
const NULL_BIT: u8 = 2;

/// True for a non-zero digit or `T`/`t`.
pub(super) fn test_char(c: char) -> bool {
    (c != '0' && c.is_ascii_digit()) || c.eq_ignore_ascii_case(&'T')
}

pub(super) fn get(field: &Field, data: RecordData<'_>) -> FieldVal<bool> {
    let byte = data.read_u8(field.offset());
    if byte & NULL_BIT != 0 {
        FieldVal::null()
    } else {
        FieldVal::new(byte & VALUE_BIT != 0)
    }
}

pub(super) fn get_null(field: &Field, data: RecordData<'_>) -> bool {
    get(field, data).is_null
}

pub(super) fn get_as_text(field: &Field, data: RecordData<'_>) -> FieldVal<&'static str> {
    let val = get(field, data);
    if val.is_null {
        FieldVal::with_null(true, "")
    } else if val.value {
        FieldVal::new("True")
    } else {
        FieldVal::new("False")
    }
}

pub(super) fn set(field: &Field, record: &mut Record, value: bool) -> Result<(), RecordError> {
    record.fixed_mut()[field.offset()] = if value { VALUE_BIT } else { 0 };
    Ok(())
}

pub(super) fn set_null(field: &Field, record: &mut Record) -> Result<(), RecordError> {
    record.fixed_mut()[field.offset()] = NULL_BIT;
    Ok(())
}
