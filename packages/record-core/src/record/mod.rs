//! Record buffers.
//!
//! A record is one row laid out as
//! `[fixed region][u32 var-data length][var-data payloads]`, where the
//! length word and payload area only exist when the schema holds variable
//! length fields. All multi-byte integers are little-endian.

mod var_data;

pub use var_data::{get_var_data_value, set_var_data_value};

use crate::error::RecordError;
use crate::types::{MAX_FIELD_LENGTH, VAR_DATA_SLOT_SIZE};

/// Read-only view over the bytes of one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordData<'a> {
    bytes: &'a [u8],
}

impl<'a> RecordData<'a> {
    /// Wraps raw record bytes.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns `len` bytes at `offset`, or `None` past the end.
    pub fn slice(&self, offset: usize, len: usize) -> Option<&'a [u8]> {
        let end = offset.checked_add(len)?;
        self.bytes.get(offset..end)
    }

    /// Reads a little-endian `u32` at `offset`, or 0 past the end.
    pub fn read_u32(&self, offset: usize) -> u32 {
        match self.slice(offset, 4) {
            Some(b) => u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
            None => 0,
        }
    }

    /// Reads one byte at `offset`, or 0 past the end.
    pub fn read_u8(&self, offset: usize) -> u8 {
        self.bytes.get(offset).copied().unwrap_or(0)
    }
}

/// An owned, growable record buffer.
///
/// Records are created by a record info. The var-data length word is only
/// written by [`Record::finalize`]; until then it may be stale.
#[derive(Debug, Clone)]
pub struct Record {
    buffer: Vec<u8>,
    fixed_size: usize,
    has_var_data: bool,
    var_data_size: usize,
    length_dirty: bool,
}

impl Record {
    /// Creates a zeroed record with room for the fixed region.
    pub(crate) fn new(fixed_size: usize, has_var_data: bool) -> Result<Self, RecordError> {
        let mut record = Self {
            buffer: Vec::new(),
            fixed_size,
            has_var_data,
            var_data_size: 0,
            length_dirty: true,
        };
        record.allocate(0)?;
        record.reset();
        Ok(record)
    }

    /// Ensures the buffer can hold `min_var_data` bytes of var data.
    ///
    /// Records with var data grow to twice the required size, capped at
    /// [`MAX_FIELD_LENGTH`]. Records without var data only ever hold the
    /// fixed region.
    pub fn allocate(&mut self, min_var_data: usize) -> Result<(), RecordError> {
        let min_size = self
            .fixed_size
            .checked_add(VAR_DATA_SLOT_SIZE)
            .and_then(|n| n.checked_add(min_var_data))
            .filter(|n| *n <= MAX_FIELD_LENGTH)
            .ok_or(RecordError::RecordTooBig {
                limit: MAX_FIELD_LENGTH,
            })?;

        if self.buffer.len() < min_size {
            let capacity = if self.has_var_data {
                (min_size * 2).min(MAX_FIELD_LENGTH)
            } else {
                self.fixed_size
            };
            if capacity > self.buffer.len() {
                self.buffer.resize(capacity, 0);
            }
        }
        Ok(())
    }

    /// Discards all var data. The fixed region is left as is.
    pub fn reset(&mut self) {
        self.var_data_size = 0;
        self.length_dirty = true;
    }

    /// Appends a length-prefixed payload to the var-data region.
    ///
    /// # Returns
    /// The payload's offset within the var-data region, counted from the
    /// start of the length word, so it is never 0.
    pub fn add_var_data(&mut self, bytes: &[u8]) -> Result<usize, RecordError> {
        let len = bytes.len();
        let total = self.fixed_size as u64 + 4 + self.var_data_size as u64 + len as u64;
        if total > MAX_FIELD_LENGTH as u64 {
            return Err(RecordError::RecordTooBig {
                limit: MAX_FIELD_LENGTH,
            });
        }
        self.length_dirty = true;
        let position = self.var_data_size + VAR_DATA_SLOT_SIZE;

        // low bit set marks the one-byte length form
        let stored_len = (len as u32) << 1;
        let mut prefix = [0u8; 4];
        let prefix_len = if len > 0x7f {
            prefix = stored_len.to_le_bytes();
            4
        } else {
            prefix[0] = (stored_len | 1) as u8;
            1
        };
        self.allocate(self.var_data_size + len + prefix_len)?;

        let start = self.fixed_size + VAR_DATA_SLOT_SIZE + self.var_data_size;
        self.buffer[start..start + prefix_len].copy_from_slice(&prefix[..prefix_len]);
        self.var_data_size += prefix_len;

        let start = start + prefix_len;
        self.buffer[start..start + len].copy_from_slice(bytes);
        self.var_data_size += len;
        Ok(position)
    }

    /// Writes the var-data length word and returns a view of the record.
    pub fn finalize(&mut self) -> RecordData<'_> {
        if self.length_dirty && self.has_var_data {
            let size = (self.var_data_size as u32).to_le_bytes();
            self.buffer[self.fixed_size..self.fixed_size + 4].copy_from_slice(&size);
        }
        self.length_dirty = false;
        self.data()
    }

    /// View of the record without finalizing.
    ///
    /// Field values read correctly through this view; the var-data length
    /// word does not until [`Record::finalize`] runs.
    pub fn data(&self) -> RecordData<'_> {
        RecordData::new(&self.buffer[..self.len()])
    }

    /// Total record length: fixed region plus length word and var data.
    pub fn len(&self) -> usize {
        if self.has_var_data {
            self.fixed_size + VAR_DATA_SLOT_SIZE + self.var_data_size
        } else {
            self.fixed_size
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn var_data_size(&self) -> usize {
        self.var_data_size
    }

    pub fn fixed_size(&self) -> usize {
        self.fixed_size
    }

    pub fn has_var_data(&self) -> bool {
        self.has_var_data
    }

    /// Bytes currently allocated for the record.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// True when the length word matches the var data.
    pub fn is_finalized(&self) -> bool {
        !self.length_dirty || !self.has_var_data
    }

    /// Mutable access to the fixed region.
    pub(crate) fn fixed_mut(&mut self) -> &mut [u8] {
        &mut self.buffer[..self.fixed_size]
    }

    /// Mutable access to the header (fixed region plus length word).
    pub(crate) fn header_mut(&mut self) -> &mut [u8] {
        let len = if self.has_var_data {
            self.fixed_size + VAR_DATA_SLOT_SIZE
        } else {
            self.fixed_size
        };
        &mut self.buffer[..len]
    }

    /// Sizes the var-data region for `size` bytes that the caller is about
    /// to fill through [`Record::var_data_mut`]. The length word is taken as
    /// already correct.
    pub(crate) fn prepare_var_data(&mut self, size: usize) -> Result<&mut [u8], RecordError> {
        self.allocate(size)?;
        self.var_data_size = size;
        self.length_dirty = false;
        Ok(self.var_data_mut())
    }

    /// Mutable access to the var-data payload area.
    pub(crate) fn var_data_mut(&mut self) -> &mut [u8] {
        let start = self.fixed_size + VAR_DATA_SLOT_SIZE;
        &mut self.buffer[start..start + self.var_data_size]
    }

    /// Writes a little-endian `u32` into the fixed region.
    pub(crate) fn write_u32(&mut self, offset: usize, value: u32) {
        self.buffer[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }
}
