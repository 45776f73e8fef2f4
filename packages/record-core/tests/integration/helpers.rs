//! Shared fixtures for the integration tests.

use std::sync::Arc;

use record_core::{FieldSchema, FieldType, MessageLog, Record, RecordInfo};

/// A layout with one field of every concrete type.
pub const ALL_TYPES_XML: &str = r#"<RecordInfo>
	<Field name="flag" type="Bool"/>
	<Field name="tiny" type="Byte"/>
	<Field name="small" type="Int16"/>
	<Field name="count" type="Int32"/>
	<Field name="big" type="Int64"/>
	<Field name="amount" scale="2" size="12" type="FixedDecimal"/>
	<Field name="ratio" type="Float"/>
	<Field name="score" type="Double"/>
	<Field name="code" size="8" type="String"/>
	<Field name="label" size="8" type="WString"/>
	<Field name="comment" size="1000" type="V_String"/>
	<Field name="title" size="1000" type="V_WString"/>
	<Field name="day" type="Date"/>
	<Field name="clock" type="Time"/>
	<Field name="stamp" type="DateTime"/>
	<Field name="payload" type="Blob"/>
</RecordInfo>
"#;

/// Builds a layout from `(name, type, size, scale)` tuples.
pub fn layout(fields: &[(&str, FieldType, u32, i32)]) -> RecordInfo {
    let mut info = RecordInfo::new(255, false, None);
    for &(name, field_type, size, scale) in fields {
        info.add_field(FieldSchema::new(name, field_type, size, scale))
            .unwrap();
    }
    info
}

/// Attaches an in-memory message log to every field of `info`.
pub fn attach_log(info: &mut RecordInfo) -> Arc<MessageLog> {
    let log = Arc::new(MessageLog::new(0));
    info.set_message_sink(Some(log.clone()));
    log
}

/// Reads a field as display text, `None` for null.
pub fn text(info: &RecordInfo, record: &Record, name: &str) -> Option<String> {
    info.field_by_name(name)
        .unwrap()
        .get_as_wstring(record.data())
        .unwrap()
        .into_option()
}

/// Sets a field from display text.
pub fn set(info: &RecordInfo, record: &mut Record, name: &str, value: &str) {
    info.field_by_name(name)
        .unwrap()
        .set_from_wstring(record, value)
        .unwrap();
}
