//! Per-field conversion error reporting with a cut-off.

use std::cell::{Cell, RefCell};

use crate::engine::{MessageType, SharedSink};

/// Sends conversion errors for one field to the host sink.
///
/// After the sink's limit is reached a final notice is sent and the sink
/// is detached, so later errors on this field are dropped.
pub(crate) struct ConversionReporter {
    sink: RefCell<Option<SharedSink>>,
    count: Cell<u32>,
}

impl ConversionReporter {
    pub(crate) fn new(sink: Option<SharedSink>) -> Self {
        Self {
            sink: RefCell::new(sink),
            count: Cell::new(0),
        }
    }

    pub(crate) fn is_reporting(&self) -> bool {
        self.sink.borrow().is_some()
    }

    pub(crate) fn sink(&self) -> Option<SharedSink> {
        self.sink.borrow().clone()
    }

    /// Attaches a sink and starts counting from zero.
    pub(crate) fn attach(&self, sink: Option<SharedSink>) {
        *self.sink.borrow_mut() = sink;
        self.count.set(0);
    }

    /// Detaches the sink, returning it so it can be put back later.
    pub(crate) fn take(&self) -> Option<SharedSink> {
        self.sink.borrow_mut().take()
    }

    /// Puts back a sink taken with [`ConversionReporter::take`]. The error
    /// count is left alone.
    pub(crate) fn restore(&self, sink: Option<SharedSink>) {
        *self.sink.borrow_mut() = sink;
    }

    pub(crate) fn error_count(&self) -> u32 {
        self.count.get()
    }

    pub(crate) fn report(&self, field_name: &str, message: &str) {
        let Some(sink) = self.sink() else {
            return;
        };
        sink.output_message(
            MessageType::FieldConversionError,
            &format!("{}: {}", field_name, message),
        );

        let count = self.count.get() + 1;
        self.count.set(count);
        let limit = sink.field_conversion_error_limit();
        if limit != 0 && count == limit {
            sink.output_message(
                MessageType::FieldConversionLimitReached,
                &format!("{}: Field Conversion Error Limit Reached", field_name),
            );
            tracing::warn!(field = field_name, limit, "conversion error limit reached");
            *self.sink.borrow_mut() = None;
        }
    }
}

impl Clone for ConversionReporter {
    fn clone(&self) -> Self {
        Self::new(self.sink())
    }
}
