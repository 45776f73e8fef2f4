//! Record sizing, copying and stream read/write.

use super::RecordInfo;
use crate::error::RecordError;
use crate::record::{Record, RecordData};
use crate::stream::{ByteSink, ByteSource};
use crate::types::{MAX_FIELD_LENGTH, MAX_FIELD_LENGTH_32, VAR_DATA_SLOT_SIZE};

impl RecordInfo {
    fn check_layout(&self, record: &Record) -> Result<(), RecordError> {
        if record.fixed_size() != self.fixed_size || record.has_var_data() != self.contains_var_data {
            return Err(RecordError::LayoutMismatch {
                expected: self.fixed_size,
                actual: record.fixed_size(),
            });
        }
        Ok(())
    }

    /// Size of the record header: the fixed region plus the var-data length
    /// word when the layout has variable-length fields.
    pub fn header_len(&self) -> usize {
        if self.contains_var_data {
            self.fixed_size + VAR_DATA_SLOT_SIZE
        } else {
            self.fixed_size
        }
    }

    /// Total length of a finalized record.
    pub fn record_len(&self, data: RecordData<'_>) -> usize {
        if self.contains_var_data {
            self.header_len() + data.read_u32(self.fixed_size) as usize
        } else {
            self.fixed_size
        }
    }

    /// True when `bytes` holds at least one complete record.
    pub fn has_whole_record(&self, bytes: &[u8]) -> bool {
        let header = self.header_len();
        if bytes.len() < header {
            return false;
        }
        bytes.len() >= self.record_len(RecordData::new(bytes))
    }

    /// Copies a finalized record into `dest`.
    ///
    /// # Returns
    /// The number of bytes copied, or 0 when `dest` is too small.
    pub fn copy_to_buffer(&self, dest: &mut [u8], data: RecordData<'_>) -> usize {
        let len = self.record_len(data);
        match (dest.get_mut(..len), data.slice(0, len)) {
            (Some(dest), Some(src)) => {
                dest.copy_from_slice(src);
                len
            }
            _ => 0,
        }
    }

    /// Replaces the contents of `dest` with a finalized record.
    pub fn copy_record(&self, dest: &mut Record, data: RecordData<'_>) -> Result<(), RecordError> {
        self.check_layout(dest)?;
        dest.reset();
        let header = self.header_len();
        let src_header = data.slice(0, header).ok_or(RecordError::TruncatedRecord {
            expected: header,
            actual: data.len(),
        })?;
        dest.header_mut().copy_from_slice(src_header);
        if self.contains_var_data {
            let size = data.read_u32(self.fixed_size) as usize;
            let payload = data.slice(header, size).ok_or(RecordError::TruncatedRecord {
                expected: header + size,
                actual: data.len(),
            })?;
            dest.prepare_var_data(size)?.copy_from_slice(payload);
        }
        Ok(())
    }

    /// Finalizes `record` and writes it to `sink`.
    ///
    /// # Returns
    /// 1 when the record is larger than the 28-bit length limit older
    /// readers support, otherwise 0.
    pub fn write<S: ByteSink + ?Sized>(
        &self,
        sink: &mut S,
        record: &mut Record,
    ) -> Result<u32, RecordError> {
        self.check_layout(record)?;
        let data = record.finalize();
        let len = self.record_len(data);
        let bytes = data.slice(0, len).ok_or(RecordError::TruncatedRecord {
            expected: len,
            actual: data.len(),
        })?;
        sink.write_bytes(bytes)?;
        Ok(u32::from(len > MAX_FIELD_LENGTH_32))
    }

    /// Reads one record from `source` into `record`.
    pub fn read<S: ByteSource + ?Sized>(
        &self,
        source: &mut S,
        record: &mut Record,
    ) -> Result<(), RecordError> {
        self.check_layout(record)?;
        record.reset();
        source.read_bytes(record.header_mut())?;
        if self.contains_var_data {
            let size = RecordData::new(record.header_mut()).read_u32(self.fixed_size) as usize;
            if self.fixed_size + VAR_DATA_SLOT_SIZE + size > MAX_FIELD_LENGTH {
                return Err(RecordError::RecordTooBig {
                    limit: MAX_FIELD_LENGTH,
                });
            }
            source.read_bytes(record.prepare_var_data(size)?)?;
        }
        Ok(())
    }
}
