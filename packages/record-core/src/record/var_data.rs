//! Encoding of variable-length values in their 4-byte fixed-region slot.
//!
//! Slot values:
//! - `0`: empty value
//! - `1`: null
//! - bits 28..30 non-zero with bit 31 clear: 1 to 3 bytes stored inline in
//!   the low bytes of the slot, length in bits 28..30
//! - otherwise: offset from the slot to a length-prefixed payload in the
//!   var-data region; bit 31 is set when the offset exceeds
//!   [`MAX_FIELD_LENGTH_32`]
//!
//! The inline form relies on little-endian byte order.

use super::{Record, RecordData};
use crate::error::RecordError;
use crate::types::MAX_FIELD_LENGTH_32;

const NULL_SLOT: u32 = 1;
const INLINE_LEN_MASK: u32 = 0x3000_0000;
const EXTENDED_BIT: u32 = 0x8000_0000;

/// Reads the value of a variable-length field.
///
/// # Arguments
/// * `data` - The record
/// * `field_offset` - Offset of the field's slot in the fixed region
///
/// # Returns
/// `None` for a null value, otherwise the payload bytes. A slot pointing
/// outside the record reads as null.
pub fn get_var_data_value(data: RecordData<'_>, field_offset: usize) -> Option<&[u8]> {
    let slot = data.read_u32(field_offset);
    if slot == 0 {
        return Some(&[]);
    }
    if slot == NULL_SLOT {
        return None;
    }
    if slot & EXTENDED_BIT == 0 && slot & INLINE_LEN_MASK != 0 {
        let len = (slot >> 28) as usize;
        return data.slice(field_offset, len);
    }

    let position = field_offset.checked_add((slot & !EXTENDED_BIT) as usize)?;
    let first = data.read_u8(position);
    let (len, prefix_len) = if first & 1 != 0 {
        ((first >> 1) as usize, 1)
    } else {
        ((data.read_u32(position) >> 1) as usize, 4)
    };
    data.slice(position + prefix_len, len)
}

/// Writes the value of a variable-length field.
///
/// `None` stores null. Payloads of 1 to 3 bytes are kept inline in the slot;
/// longer payloads are appended to the record's var-data region.
pub fn set_var_data_value(
    record: &mut Record,
    field_offset: usize,
    value: Option<&[u8]>,
) -> Result<(), RecordError> {
    let slot = match value {
        None => NULL_SLOT,
        Some(bytes) if bytes.is_empty() => 0,
        Some(bytes) if bytes.len() <= 3 => {
            let mut inline = [0u8; 4];
            inline[..bytes.len()].copy_from_slice(bytes);
            u32::from_le_bytes(inline) | ((bytes.len() as u32) << 28)
        }
        Some(bytes) => {
            let position = record.add_var_data(bytes)? + record.fixed_size() - field_offset;
            let mut slot = position as u32;
            if position > MAX_FIELD_LENGTH_32 {
                slot |= EXTENDED_BIT;
            }
            slot
        }
    };
    record.write_u32(field_offset, slot);
    Ok(())
}
