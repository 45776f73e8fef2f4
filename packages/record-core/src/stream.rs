//! Byte-stream collaborators used by record read/write.
//!
//! Any `std::io::Read` is a [`ByteSource`] and any `std::io::Write` is a
//! [`ByteSink`]. File containers supply their own buffered or compressed
//! streams through the same traits.

use std::io::{ErrorKind, Read, Write};

use crate::error::RecordError;

/// Source of raw record bytes.
pub trait ByteSource {
    /// Fills `buf` completely.
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), RecordError>;
}

/// Destination for raw record bytes.
pub trait ByteSink {
    /// Writes all of `buf`.
    fn write_bytes(&mut self, buf: &[u8]) -> Result<(), RecordError>;
}

/// Wraps an I/O error with the operation that hit it.
pub fn classify_io_error(error: std::io::Error, context: &'static str) -> RecordError {
    match error.kind() {
        ErrorKind::UnexpectedEof => RecordError::Io {
            context: "reading a truncated record",
            source: error,
        },
        _ => RecordError::Io {
            context,
            source: error,
        },
    }
}

impl<R: Read + ?Sized> ByteSource for R {
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), RecordError> {
        self.read_exact(buf)
            .map_err(|e| classify_io_error(e, "reading record"))
    }
}

impl<W: Write + ?Sized> ByteSink for W {
    fn write_bytes(&mut self, buf: &[u8]) -> Result<(), RecordError> {
        self.write_all(buf)
            .map_err(|e| classify_io_error(e, "writing record"))
    }
}
