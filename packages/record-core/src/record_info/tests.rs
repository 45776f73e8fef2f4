use super::*;
use crate::engine::{MessageLog, MessageType};
use crate::record::RecordData;
use ntest::timeout;
use std::sync::Arc;

fn info_with_log() -> (RecordInfo, Arc<MessageLog>) {
    let log = Arc::new(MessageLog::new(0));
    let info = RecordInfo::new(255, false, Some(log.clone()));
    (info, log)
}

fn names(info: &RecordInfo) -> Vec<String> {
    info.iter().map(|f| f.name().to_string()).collect()
}

fn add(info: &mut RecordInfo, name: &str, field_type: FieldType, size: u32) {
    info.add_field(FieldSchema::new(name, field_type, size, 0)).unwrap();
}

fn sample_info() -> RecordInfo {
    let mut info = RecordInfo::new(255, false, None);
    add(&mut info, "id", FieldType::Int32, 0);
    add(&mut info, "name", FieldType::V_String, 100);
    add(&mut info, "note", FieldType::V_WString, 100);
    info
}

#[timeout(1000)]
#[test]
fn test_offsets_follow_raw_sizes() {
    let info = sample_info();
    let offsets: Vec<usize> = info.iter().map(|f| f.offset()).collect();
    assert_eq!(offsets, vec![0, 5, 9]);
    assert_eq!(info.fixed_size(), 13);
    assert!(info.contains_var_data());
    assert_eq!(info.header_len(), 17);
    let positions: Vec<i32> = info.iter().map(|f| f.schema().position()).collect();
    assert_eq!(positions, vec![0, 1, 2]);
}

#[timeout(1000)]
#[test]
fn test_duplicate_names_get_numbered() {
    let (mut info, log) = info_with_log();
    add(&mut info, "A", FieldType::Int32, 0);
    add(&mut info, "A", FieldType::Int32, 0);
    add(&mut info, "a", FieldType::Int32, 0);
    // the suffix goes on the incoming spelling
    assert_eq!(names(&info), vec!["A", "A2", "a3"]);
    assert_eq!(log.count(MessageType::Warning), 2);
    assert_eq!(
        log.messages()[0].1,
        "There were multiple fields named \"A\".  The duplicate was renamed."
    );
}

#[timeout(1000)]
#[test]
fn test_quiet_add_skips_warning() {
    let (mut info, log) = info_with_log();
    add(&mut info, "A", FieldType::Int32, 0);
    info.add_field_quiet(FieldSchema::new("A", FieldType::Int32, 0, 0))
        .unwrap();
    assert_eq!(names(&info), vec!["A", "A2"]);
    assert_eq!(log.count(MessageType::Warning), 0);
}

fn assert_names_consistent(info: &RecordInfo) {
    assert_eq!(info.original_names.len(), info.num_fields());
    assert_eq!(info.field_nums.len(), info.num_fields());
    for (index, field) in info.iter().enumerate() {
        assert_eq!(info.field_num(field.name()).unwrap(), index, "{}", field.name());
    }
}

#[timeout(10000)]
#[test]
fn test_exhausted_names_leave_layout_untouched() {
    let mut info = RecordInfo::new(255, false, None);
    let mut exhausted = None;
    for _ in 0..2000 {
        match info.add_field_quiet(FieldSchema::new("A", FieldType::Int32, 0, 0)) {
            Ok(_) => {}
            Err(err) => {
                exhausted = Some(err);
                break;
            }
        }
    }
    assert!(matches!(exhausted, Some(RecordError::UniqueNameExhausted { .. })));
    let count = info.num_fields();
    let fixed = info.fixed_size();
    assert_names_consistent(&info);

    add(&mut info, "B", FieldType::Int32, 0);
    let err = info.rename_field(count, "A").unwrap_err();
    assert!(matches!(err, RecordError::UniqueNameExhausted { .. }));
    assert_eq!(info.field(count).unwrap().name(), "B");
    assert_eq!(info.field_num("b").unwrap(), count);

    let err = info.rename_fields(&[("B", "A")]).unwrap_err();
    assert!(matches!(err, RecordError::UniqueNameExhausted { .. }));
    assert_eq!(info.field_num("B").unwrap(), count);
    assert_eq!(info.fixed_size(), fixed + 5);
    assert_names_consistent(&info);
}

#[timeout(1000)]
#[test]
fn test_duplicate_suffix_rules() {
    let mut info = RecordInfo::new(255, false, None);
    add(&mut info, "Name2", FieldType::Int32, 0);
    add(&mut info, "Name2", FieldType::Int32, 0);
    add(&mut info, "X10", FieldType::Int32, 0);
    add(&mut info, "X10", FieldType::Int32, 0);
    assert_eq!(names(&info), vec!["Name2", "Name3", "X10", "X10_2"]);
}

#[timeout(1000)]
#[test]
fn test_duplicate_suffix_rolls_past_nine() {
    let mut info = RecordInfo::new(255, false, None);
    for _ in 0..10 {
        add(&mut info, "A", FieldType::Bool, 0);
    }
    let names = names(&info);
    assert_eq!(names[8], "A9");
    assert_eq!(names[9], "A9_2");
}

#[timeout(1000)]
#[test]
fn test_requested_name_displaces_generated_name() {
    let mut info = RecordInfo::new(255, false, None);
    add(&mut info, "A", FieldType::Int32, 0);
    add(&mut info, "A", FieldType::Int32, 0);
    add(&mut info, "A2", FieldType::Int32, 0);
    assert_eq!(names(&info), vec!["A", "A3", "A2"]);
    assert_eq!(info.field_num("a3").unwrap(), 1);
    assert_eq!(info.field_num("A2").unwrap(), 2);
}

#[timeout(1000)]
#[test]
fn test_name_normalization() {
    let mut info = RecordInfo::new(5, true, None);
    add(&mut info, "", FieldType::Int32, 0);
    add(&mut info, "1st field", FieldType::Int32, 0);
    add(&mut info, "ABCDEFG", FieldType::Int32, 0);
    assert_eq!(names(&info), vec!["Field", "_1st_", "ABCDE"]);

    let mut loose = RecordInfo::new(255, false, None);
    add(&mut loose, "", FieldType::Int32, 0);
    add(&mut loose, "1st field", FieldType::Int32, 0);
    assert_eq!(names(&loose), vec!["Field_1", "1st field"]);
}

#[timeout(1000)]
#[test]
fn test_fixed_decimal_checks() {
    let mut info = RecordInfo::new(255, false, None);
    let err = info
        .add_field(FieldSchema::new("d", FieldType::FixedDecimal, 5, 4))
        .unwrap_err();
    assert!(matches!(err, RecordError::ScaleTooLarge { scale: 4, size: 5, .. }));

    // wider than 16 bits must not wrap into a small valid scale
    let err = info
        .add_field(FieldSchema::new("w", FieldType::FixedDecimal, 20, 70000))
        .unwrap_err();
    assert!(matches!(err, RecordError::ScaleTooLarge { scale: 70000, size: 20, .. }));

    let err = info
        .add_field(FieldSchema::new("z", FieldType::FixedDecimal, 0, 0))
        .unwrap_err();
    assert!(matches!(err, RecordError::ZeroLengthField { .. }));

    info.add_field(FieldSchema::new("ok", FieldType::FixedDecimal, 5, 3))
        .unwrap();
    assert_eq!(info.num_fields(), 1);
}

#[timeout(1000)]
#[test]
fn test_long_fixed_string_warns() {
    let (mut info, log) = info_with_log();
    add(&mut info, "s", FieldType::String, 20_000);
    assert_eq!(
        log.messages()[0],
        (
            MessageType::Warning,
            "String fields are limited to 16384 bytes.  Use a V_String field instead.".to_string()
        )
    );
    let err = info
        .add_field(FieldSchema::new("empty", FieldType::WString, 0, 0))
        .unwrap_err();
    assert!(matches!(err, RecordError::ZeroLengthField { .. }));
}

#[timeout(1000)]
#[test]
fn test_add_field_with_rejects_negative_size() {
    let mut info = RecordInfo::new(255, false, None);
    assert!(info
        .add_field_with("n", FieldType::String, -1, 0, "", "")
        .is_err());
    let field = info
        .add_field_with("s", FieldType::String, 8, 0, "src", "desc")
        .unwrap();
    assert_eq!(field.schema().source(), "src");
    assert_eq!(field.schema().description(), "desc");
}

#[timeout(1000)]
#[test]
fn test_lookups() {
    let info = sample_info();
    assert_eq!(info.field_num("NAME").unwrap(), 1);
    assert_eq!(info.field_num_opt("missing"), None);
    let err = info.field_num("missing").unwrap_err();
    assert_eq!(
        err.to_string(),
        "The field \"missing\" is missing. Compare the tool configuration with the input stream."
    );
    assert_eq!(info.field_num_by_type(FieldType::V_WString).unwrap(), 2);
    assert!(matches!(
        info.field_by_type(FieldType::Double),
        Err(RecordError::FieldTypeNotFound { .. })
    ));
    assert!(info.field_and_index_by_type(FieldType::Int32, 1).is_none());
    assert_eq!(info.num_fields_by_type(FieldType::V_String), 1);
    assert!(matches!(
        info.field(7),
        Err(RecordError::FieldIndexOutOfRange { index: 7, count: 3 })
    ));
}

#[timeout(1000)]
#[test]
fn test_renames() {
    let mut info = sample_info();
    info.rename_field(0, "key").unwrap();
    assert_eq!(info.field_num("key").unwrap(), 0);
    assert!(info.field_num_opt("id").is_none());

    info.rename_fields(&[("name", "note"), ("note", "name")]).unwrap();
    assert_eq!(names(&info), vec!["key", "note", "name"]);

    info.swap_field_names(0, 1).unwrap();
    assert_eq!(names(&info), vec!["note", "key", "name"]);
    assert_eq!(info.field_num("key").unwrap(), 1);

    let err = info.rename_field_by_name("nope", "x").unwrap_err();
    assert!(matches!(err, RecordError::FieldMissing { .. }));
}

#[timeout(1000)]
#[test]
fn test_hash_ignores_names() {
    let a = sample_info();
    let mut b = RecordInfo::new(255, false, None);
    add(&mut b, "x", FieldType::Int32, 0);
    add(&mut b, "y", FieldType::V_String, 100);
    add(&mut b, "z", FieldType::V_WString, 100);
    assert_eq!(a.hash(), b.hash());
    assert!(a.equal_types(&b, false));
    assert!(!a.compare_schemas(&b));

    let mut c = b.clone();
    add(&mut c, "extra", FieldType::Bool, 0);
    assert_ne!(b.hash(), c.hash());
    assert!(b.equal_types(&c, true));
    assert!(!b.equal_types(&c, false));
}

#[timeout(1000)]
#[test]
fn test_clone_keeps_layout() {
    let info = sample_info();
    let copy = info.clone();
    assert_eq!(info, copy);
    assert_eq!(copy.field_num("note").unwrap(), 2);
    assert_eq!(copy.fixed_size(), info.fixed_size());
}

#[timeout(1000)]
#[test]
fn test_field_xml_text() {
    assert_eq!(
        RecordInfo::create_field_xml("id", FieldType::Int32, 4, 0, "", ""),
        "\t<Field name=\"id\" type=\"Int32\"/>\n"
    );
    assert_eq!(
        RecordInfo::create_field_xml("amt", FieldType::FixedDecimal, 10, 2, "src", "a \"b\""),
        "\t<Field description=\"a &quot;b&quot;\" name=\"amt\" scale=\"2\" size=\"10\" source=\"src\" type=\"FixedDecimal\"/>\n"
    );
}

#[timeout(1000)]
#[test]
fn test_xml_round_trip() {
    let mut info = sample_info();
    info.add_field(FieldSchema::with_metadata(
        "amount",
        FieldType::FixedDecimal,
        12,
        3,
        "Formula: x",
        "Total <gross>",
    ))
    .unwrap();
    let xml = info.record_xml_metadata(true);
    assert!(xml.starts_with("<RecordInfo>\n"));
    assert!(xml.ends_with("</RecordInfo>\n"));

    let parsed = RecordInfo::from_xml(&xml, 255, false).unwrap();
    assert_eq!(parsed, info);
    assert_eq!(parsed.field(3).unwrap().schema().source(), "Formula: x");
    assert_eq!(parsed.field(3).unwrap().schema().description(), "Total <gross>");
    assert_eq!(parsed.record_xml_metadata(true), xml);

    let without_source = info.record_xml_metadata(false);
    assert!(!without_source.contains("source="));
}

#[timeout(1000)]
#[test]
fn test_init_from_xml_is_additive() {
    let xml = "<Meta><RecordInfo>\n\t<Field name=\"a\" type=\"Int16\"/>\n</RecordInfo></Meta>";
    let mut info = RecordInfo::new(255, false, None);
    info.init_from_xml(xml, None, false).unwrap();
    info.init_from_xml(xml, Some("in_"), false).unwrap();
    info.init_from_xml(xml, None, false).unwrap();
    assert_eq!(names(&info), vec!["a", "in_a", "a2"]);

    info.init_from_xml("<Other/>", None, false).unwrap();
    assert_eq!(info.num_fields(), 3);
}

#[timeout(1000)]
#[test]
fn test_lock_in_mismatch() {
    let plain = "<RecordInfo>\n</RecordInfo>\n";
    let locked = "<RecordInfo LockIn=\"True\" >\n</RecordInfo>\n";

    let mut info = RecordInfo::new(255, false, None);
    info.set_lock_in(true);
    assert!(matches!(
        info.init_from_xml(plain, None, false),
        Err(RecordError::LockInRequired)
    ));
    info.init_from_xml(locked, None, false).unwrap();
    assert_eq!(info.record_xml_metadata(false), locked);

    let mut open = RecordInfo::new(255, false, None);
    assert!(matches!(
        open.init_from_xml(locked, None, false),
        Err(RecordError::LockInNotSupported)
    ));
    open.init_from_xml(locked, None, true).unwrap();
}

#[timeout(1000)]
#[test]
fn test_bad_field_xml_is_an_error() {
    let mut info = RecordInfo::new(255, false, None);
    let err = info
        .init_from_xml("<RecordInfo><Field name=\"a\" type=\"Nope\"/></RecordInfo>", None, false)
        .unwrap_err();
    assert!(matches!(err, RecordError::UnknownFieldType { .. }));
}

fn filled_record(info: &RecordInfo) -> Record {
    let mut record = info.create_record().unwrap();
    info.field(0).unwrap().set_from_int32(&mut record, 42).unwrap();
    info.field(1)
        .unwrap()
        .set_from_astring(&mut record, b"hello world")
        .unwrap();
    info.field(2).unwrap().set_null(&mut record).unwrap();
    record
}

#[timeout(1000)]
#[test]
fn test_write_then_read() {
    let info = sample_info();
    let mut record = filled_record(&info);
    let mut out: Vec<u8> = Vec::new();
    assert_eq!(info.write(&mut out, &mut record).unwrap(), 0);
    assert_eq!(out.len(), info.record_len(RecordData::new(&out)));
    assert_eq!(out.len(), record.len());

    let mut read_back = info.create_record().unwrap();
    let mut src: &[u8] = &out;
    info.read(&mut src, &mut read_back).unwrap();
    let data = read_back.data();
    assert_eq!(info.field(0).unwrap().get_as_int32(data).unwrap().value, 42);
    assert_eq!(
        info.field(1).unwrap().get_as_wstring(data).unwrap().value,
        "hello world"
    );
    assert!(info.field(2).unwrap().get_null(data));
    assert!(src.is_empty());
}

#[timeout(1000)]
#[test]
fn test_read_truncated_stream() {
    let info = sample_info();
    let mut record = filled_record(&info);
    let mut out: Vec<u8> = Vec::new();
    info.write(&mut out, &mut record).unwrap();
    out.truncate(out.len() - 2);

    let mut src: &[u8] = &out;
    let err = info.read(&mut src, &mut record).unwrap_err();
    assert!(matches!(err, RecordError::Io { .. }));
}

#[timeout(1000)]
#[test]
fn test_copy_helpers() {
    let info = sample_info();
    let mut record = filled_record(&info);
    let len = record.finalize().len();
    let data = record.data();

    assert!(info.has_whole_record(data.as_bytes()));
    assert!(!info.has_whole_record(&data.as_bytes()[..len - 1]));
    assert!(!info.has_whole_record(&data.as_bytes()[..3]));

    let mut small = vec![0u8; len - 1];
    assert_eq!(info.copy_to_buffer(&mut small, data), 0);
    let mut big = vec![0u8; len + 8];
    assert_eq!(info.copy_to_buffer(&mut big, data), len);
    assert_eq!(&big[..len], data.as_bytes());

    let mut dest = info.create_record().unwrap();
    info.copy_record(&mut dest, data).unwrap();
    assert_eq!(dest.data().as_bytes(), data.as_bytes());
    assert_eq!(
        info.field(1).unwrap().get_as_wstring(dest.data()).unwrap().value,
        "hello world"
    );
}

#[timeout(1000)]
#[test]
fn test_record_from_other_layout_rejected() {
    let info = sample_info();
    let mut other = RecordInfo::new(255, false, None);
    add(&mut other, "b", FieldType::Bool, 0);
    let mut record = other.create_record().unwrap();
    let mut out: Vec<u8> = Vec::new();
    assert!(matches!(
        info.write(&mut out, &mut record),
        Err(RecordError::LayoutMismatch { .. })
    ));
}

#[timeout(1000)]
#[test]
fn test_fixed_only_layout_has_no_length_word() {
    let mut info = RecordInfo::new(255, false, None);
    add(&mut info, "a", FieldType::Int64, 0);
    add(&mut info, "b", FieldType::Double, 0);
    let mut record = info.create_record().unwrap();
    info.field(1).unwrap().set_from_double(&mut record, 2.5).unwrap();
    let mut out: Vec<u8> = Vec::new();
    info.write(&mut out, &mut record).unwrap();
    assert_eq!(out.len(), 18);
    assert_eq!(info.record_len(RecordData::new(&out)), 18);
}

#[timeout(1000)]
#[test]
fn test_sink_reaches_fields_added_earlier() {
    let mut info = RecordInfo::new(255, false, None);
    add(&mut info, "n", FieldType::Int16, 0);
    let log = Arc::new(MessageLog::new(0));
    info.set_message_sink(Some(log.clone()));
    let mut record = info.create_record().unwrap();
    info.field(0).unwrap().set_from_int32(&mut record, 100_000).unwrap();
    assert_eq!(log.count(MessageType::FieldConversionError), 1);
}

#[timeout(1000)]
#[test]
fn test_with_config_naming() {
    let config = RecordConfig {
        max_field_name_len: 3,
        strict_naming: true,
        ..RecordConfig::default()
    };
    let mut info = RecordInfo::with_config(&config, None);
    add(&mut info, "a b c", FieldType::Bool, 0);
    assert_eq!(names(&info), vec!["a_b"]);
    info.reset_for_late_rename(10, false);
    info.rename_field(0, "a b c").unwrap();
    assert_eq!(names(&info), vec!["a b c"]);
}
