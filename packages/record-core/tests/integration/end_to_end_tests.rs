//! Record files: build records of every type, write them to disk, read
//! them back.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};

use tempfile::tempdir;

use record_core::{FieldType, RecordData, RecordError, RecordInfo};

use super::helpers::{set, text, ALL_TYPES_XML};

fn all_types() -> RecordInfo {
    RecordInfo::from_xml(ALL_TYPES_XML, 255, false).unwrap()
}

#[test]
fn test_every_type_round_trips_through_a_file() {
    let info = all_types();
    assert_eq!(info.num_fields(), 16);
    assert!(info.contains_var_data());

    let dir = tempdir().unwrap();
    let path = dir.path().join("records.bin");
    let long_comment = "x".repeat(300);

    {
        let mut writer = BufWriter::new(File::create(&path).unwrap());
        let mut record = info.create_record().unwrap();
        for i in 0..50 {
            record.reset();
            set(&info, &mut record, "flag", if i % 2 == 0 { "True" } else { "False" });
            set(&info, &mut record, "tiny", "7");
            set(&info, &mut record, "small", "-300");
            set(&info, &mut record, "count", &i.to_string());
            set(&info, &mut record, "big", "9007199254740993");
            set(&info, &mut record, "amount", "1234.5");
            set(&info, &mut record, "ratio", "0.25");
            set(&info, &mut record, "score", "3.14159");
            set(&info, &mut record, "code", "ABC");
            set(&info, &mut record, "label", "héllo");
            set(&info, &mut record, "comment", if i == 0 { long_comment.as_str() } else { "short one" });
            set(&info, &mut record, "title", "日本語");
            set(&info, &mut record, "day", "2024-02-29");
            set(&info, &mut record, "clock", "23:59:59");
            set(&info, &mut record, "stamp", "2024-02-29 12:00:00");
            info.field_by_name("payload")
                .unwrap()
                .set_from_blob(&mut record, &[i as u8; 5])
                .unwrap();
            assert!(!record.is_finalized());
            assert_eq!(info.write(&mut writer, &mut record).unwrap(), 0);
            assert!(record.is_finalized());
        }
        writer.flush().unwrap();
    }

    let mut reader = BufReader::new(File::open(&path).unwrap());
    let mut record = info.create_record().unwrap();
    for i in 0..50 {
        info.read(&mut reader, &mut record).unwrap();
        let value_of = |name: &str| text(&info, &record, name);
        assert_eq!(value_of("flag").as_deref(), Some(if i % 2 == 0 { "True" } else { "False" }));
        assert_eq!(value_of("tiny").as_deref(), Some("7"));
        assert_eq!(value_of("small").as_deref(), Some("-300"));
        assert_eq!(value_of("count"), Some(i.to_string()));
        assert_eq!(value_of("big").as_deref(), Some("9007199254740993"));
        assert_eq!(value_of("amount").as_deref(), Some("1234.50"));
        assert_eq!(value_of("ratio").as_deref(), Some("0.25"));
        assert_eq!(value_of("score").as_deref(), Some("3.14159"));
        assert_eq!(value_of("code").as_deref(), Some("ABC"));
        assert_eq!(value_of("label").as_deref(), Some("héllo"));
        assert_eq!(
            value_of("comment"),
            Some(if i == 0 { long_comment.clone() } else { "short one".to_string() })
        );
        assert_eq!(value_of("title").as_deref(), Some("日本語"));
        assert_eq!(value_of("day").as_deref(), Some("2024-02-29"));
        assert_eq!(value_of("clock").as_deref(), Some("23:59:59"));
        assert_eq!(value_of("stamp").as_deref(), Some("2024-02-29 12:00:00"));
        let payload = info
            .field_by_name("payload")
            .unwrap()
            .get_as_blob(record.data())
            .unwrap();
        assert_eq!(payload.value, &[i as u8; 5]);
    }

    let err = info.read(&mut reader, &mut record).unwrap_err();
    assert!(matches!(err, RecordError::Io { .. }));
}

#[test]
fn test_record_boundaries_in_a_byte_buffer() {
    let info = all_types();
    let mut bytes: Vec<u8> = Vec::new();
    let mut lengths = Vec::new();
    let mut record = info.create_record().unwrap();
    for comment in ["", "ab", "a comment long enough for the var region"] {
        record.reset();
        for field in &info {
            field.set_null(&mut record).unwrap();
        }
        set(&info, &mut record, "comment", comment);
        info.write(&mut bytes, &mut record).unwrap();
        lengths.push(record.len());
    }

    let header = info.header_len();
    // empty and inline values add nothing to the var region
    assert_eq!(&lengths[..2], &[header, header]);
    assert!(lengths[2] > header);

    let mut rest: &[u8] = &bytes;
    let mut seen = Vec::new();
    while !rest.is_empty() {
        assert!(info.has_whole_record(rest));
        let len = info.record_len(RecordData::new(rest));
        seen.push(len);
        rest = &rest[len..];
    }
    assert_eq!(seen, lengths);
}

#[test]
fn test_nulls_survive_a_round_trip() {
    let info = all_types();
    let mut record = info.create_record().unwrap();
    for field in &info {
        field.set_null(&mut record).unwrap();
    }
    let mut bytes: Vec<u8> = Vec::new();
    info.write(&mut bytes, &mut record).unwrap();

    let mut copy = info.create_record().unwrap();
    info.copy_record(&mut copy, RecordData::new(&bytes)).unwrap();
    for field in &info {
        assert!(field.get_null(copy.data()), "{} should be null", field.name());
    }
}

#[test]
fn test_conversion_errors_reach_the_sink() {
    let mut info = all_types();
    let log = super::helpers::attach_log(&mut info);
    let mut record = info.create_record().unwrap();

    set(&info, &mut record, "tiny", "300");
    set(&info, &mut record, "day", "2023-02-29");
    set(&info, &mut record, "code", "much too long");

    assert_eq!(text(&info, &record, "day"), None);
    assert_eq!(text(&info, &record, "code").as_deref(), Some("much too"));
    assert_eq!(log.count(record_core::MessageType::FieldConversionError), 3);
    assert!(info.field_num_by_type(FieldType::SpatialObj).is_err());
}
