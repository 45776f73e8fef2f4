//! Schema-driven binary record engine.
//!
//! Provides field schemas, typed field accessors with null handling and
//! lossy conversions, packed record buffers with a variable-data region,
//! record layouts with XML round-tripping, and a planned record copier.

pub mod config;
pub mod copier;
pub mod engine;
pub mod error;
pub mod field;
pub mod record;
pub mod record_info;
pub mod schema;
pub mod stream;
pub mod text;
pub mod types;

pub use config::RecordConfig;
pub use copier::RecordCopier;
pub use engine::{MessageLog, MessageSink, MessageType, SharedCodec, SharedSink, SpatialCodec, TracingSink};
pub use error::RecordError;
pub use field::Field;
pub use record::{Record, RecordData};
pub use record_info::RecordInfo;
pub use schema::FieldSchema;
pub use stream::{ByteSink, ByteSource};
pub use types::{FieldType, FieldVal};
