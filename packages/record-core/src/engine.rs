//! Host collaborators: the message sink and the spatial codec.
//!
//! The engine never prints anything a user is meant to see. Fields and
//! record infos hand messages to a [`MessageSink`] supplied by the host.

use std::sync::{Arc, Mutex};

/// Kind of message emitted to the host sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Info = 1,
    Warning = 2,
    Error = 3,
    FieldConversionError = 5,
    FieldConversionLimitReached = 6,
}

/// Receiver for engine messages.
pub trait MessageSink: Send + Sync {
    /// Delivers one message.
    fn output_message(&self, kind: MessageType, message: &str);

    /// Maximum conversion errors reported per field (0 = no limit).
    fn field_conversion_error_limit(&self) -> u32 {
        0
    }
}

/// Shared handle to a host sink.
pub type SharedSink = Arc<dyn MessageSink>;

/// Converts between spatial blobs and GeoJSON text.
pub trait SpatialCodec: Send + Sync {
    /// Renders a spatial blob as GeoJSON, or `None` when it cannot.
    fn to_geojson(&self, blob: &[u8]) -> Option<String>;

    /// Parses GeoJSON into a spatial blob, or `None` when it cannot.
    fn from_geojson(&self, text: &str) -> Option<Vec<u8>>;

    /// Checks that a blob is a well-formed spatial object.
    fn validate(&self, blob: &[u8]) -> bool {
        self.to_geojson(blob).is_some()
    }
}

/// Shared handle to a spatial codec.
pub type SharedCodec = Arc<dyn SpatialCodec>;

/// Sink that forwards every message to `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingSink {
    conversion_error_limit: u32,
}

impl TracingSink {
    /// Creates a sink with the given per-field conversion error limit.
    pub fn new(conversion_error_limit: u32) -> Self {
        Self {
            conversion_error_limit,
        }
    }
}

impl MessageSink for TracingSink {
    fn output_message(&self, kind: MessageType, message: &str) {
        match kind {
            MessageType::Info => tracing::info!("{}", message),
            MessageType::Warning => tracing::warn!("{}", message),
            MessageType::Error => tracing::error!("{}", message),
            MessageType::FieldConversionError | MessageType::FieldConversionLimitReached => {
                tracing::warn!(kind = ?kind, "{}", message)
            }
        }
    }

    fn field_conversion_error_limit(&self) -> u32 {
        self.conversion_error_limit
    }
}

/// Sink that keeps every message in memory.
#[derive(Debug, Default)]
pub struct MessageLog {
    conversion_error_limit: u32,
    messages: Mutex<Vec<(MessageType, String)>>,
}

impl MessageLog {
    /// Creates an empty log with the given per-field conversion error limit.
    pub fn new(conversion_error_limit: u32) -> Self {
        Self {
            conversion_error_limit,
            messages: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of all messages received so far.
    pub fn messages(&self) -> Vec<(MessageType, String)> {
        match self.messages.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Counts messages of one kind.
    pub fn count(&self, kind: MessageType) -> usize {
        self.messages().iter().filter(|(k, _)| *k == kind).count()
    }

    /// Drops all collected messages.
    pub fn clear(&self) {
        match self.messages.lock() {
            Ok(mut guard) => guard.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl MessageSink for MessageLog {
    fn output_message(&self, kind: MessageType, message: &str) {
        let mut guard = match self.messages.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push((kind, message.to_string()));
    }

    fn field_conversion_error_limit(&self) -> u32 {
        self.conversion_error_limit
    }
}
