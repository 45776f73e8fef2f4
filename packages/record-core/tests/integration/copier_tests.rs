//! Copying records between layouts.

use record_core::{FieldType, MessageType, RecordConfig, RecordCopier, RecordInfo};

use super::helpers::{attach_log, layout, set, text, ALL_TYPES_XML};

#[test]
fn test_full_copy_of_a_fixed_run_is_one_block() {
    let info = RecordInfo::from_xml(ALL_TYPES_XML, 255, false).unwrap();
    let mut copier = RecordCopier::new(&info, &info);
    for i in 0..info.num_fields() {
        copier.add(i, i);
    }
    copier.done_adding().unwrap();
    // the fixed run up to the first var field, the two text var fields,
    // the date/time run, the blob
    assert_eq!(copier.num_commands(), 5);

    let mut src = info.create_record().unwrap();
    set(&info, &mut src, "count", "17");
    set(&info, &mut src, "comment", "copied through the var region");
    set(&info, &mut src, "stamp", "1999-12-31 23:59:59");
    let src_bytes = src.finalize().as_bytes().to_vec();

    let mut dest = info.create_record().unwrap();
    copier.copy(&mut dest, src.data()).unwrap();
    assert_eq!(dest.finalize().as_bytes(), &src_bytes[..]);
}

#[test]
fn test_projection_with_renamed_and_retyped_fields() {
    let mut src_info = layout(&[
        ("id", FieldType::Int64, 0, 0),
        ("price", FieldType::Double, 0, 0),
        ("name", FieldType::V_WString, 200, 0),
        ("when", FieldType::DateTime, 0, 0),
    ]);
    let mut dest_info = layout(&[
        ("name", FieldType::String, 4, 0),
        ("price", FieldType::FixedDecimal, 8, 1),
        ("id", FieldType::Int32, 0, 0),
        ("day", FieldType::Date, 0, 0),
    ]);
    let log = attach_log(&mut dest_info);
    src_info.set_message_sink(Some(log.clone()));

    let mut copier = RecordCopier::new(&dest_info, &src_info);
    copier.add(0, 2);
    copier.add(1, 1);
    copier.add(2, 0);
    copier.add(3, 3);
    copier.done_adding().unwrap();
    assert_eq!(copier.num_commands(), 4);

    let mut src = src_info.create_record().unwrap();
    let mut dest = dest_info.create_record().unwrap();
    let rows = [("5", "2.71", "Widget", "2024-05-01 08:30:00"), ("3000000000", "0.04", "Gear", "")];
    let mut results = Vec::new();
    for (id, price, name, when) in rows {
        src.reset();
        set(&src_info, &mut src, "id", id);
        set(&src_info, &mut src, "price", price);
        set(&src_info, &mut src, "name", name);
        set(&src_info, &mut src, "when", when);

        dest.reset();
        copier.copy(&mut dest, src.data()).unwrap();
        results.push((
            text(&dest_info, &dest, "id"),
            text(&dest_info, &dest, "price"),
            text(&dest_info, &dest, "name"),
            text(&dest_info, &dest, "day"),
        ));
    }

    assert_eq!(
        results[0],
        (
            Some("5".to_string()),
            Some("2.7".to_string()),
            Some("Widg".to_string()),
            Some("2024-05-01".to_string())
        )
    );
    // out of Int32 range, and an empty DateTime is null
    assert_eq!(results[1].0, None);
    assert_eq!(results[1].1.as_deref(), Some("0.0"));
    assert_eq!(results[1].3, None);
    assert!(log.count(MessageType::FieldConversionError) >= 2);
}

#[test]
fn test_decimal_comma_from_config() {
    let config = RecordConfig::from_json(r#"{ "decimal_separator": "," }"#).unwrap();
    let src_info = layout(&[("text", FieldType::V_String, 50, 0), ("num", FieldType::Double, 0, 0)]);
    let dest_info = layout(&[("text", FieldType::Double, 0, 0), ("num", FieldType::V_String, 50, 0)]);

    let mut copier = RecordCopier::with_config(&dest_info, &src_info, &config);
    copier.add(0, 0);
    copier.add(1, 1);

    let mut src = src_info.create_record().unwrap();
    set(&src_info, &mut src, "text", "1234,5");
    src_info
        .field_by_name("num")
        .unwrap()
        .set_from_double(&mut src, -0.75)
        .unwrap();

    let mut dest = dest_info.create_record().unwrap();
    copier.copy(&mut dest, src.data()).unwrap();
    let value = dest_info
        .field_by_name("text")
        .unwrap()
        .get_as_double(dest.data())
        .unwrap();
    assert_eq!(value.value, 1234.5);
    assert_eq!(text(&dest_info, &dest, "num").as_deref(), Some("-0,75"));
}

#[test]
fn test_suppression_only_applies_to_same_type_pairs() {
    let src_info = layout(&[("a", FieldType::String, 10, 0), ("b", FieldType::String, 10, 0)]);
    let mut dest_info = layout(&[("a", FieldType::String, 2, 0), ("b", FieldType::V_String, 2, 0)]);
    let log = attach_log(&mut dest_info);

    let mut copier = RecordCopier::with_options(&dest_info, &src_info, true, '.');
    copier.add(0, 0);
    copier.add(1, 1);

    let mut src = src_info.create_record().unwrap();
    set(&src_info, &mut src, "a", "abcdef");
    set(&src_info, &mut src, "b", "abcdef");
    let mut dest = dest_info.create_record().unwrap();
    copier.copy(&mut dest, src.data()).unwrap();

    assert_eq!(text(&dest_info, &dest, "a").as_deref(), Some("ab"));
    assert_eq!(text(&dest_info, &dest, "b").as_deref(), Some("ab"));
    let messages = log.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].1.starts_with("b: "));
}

#[test]
fn test_unmatched_destination_fields_can_be_nulled() {
    let src_info = layout(&[("a", FieldType::Int32, 0, 0)]);
    let dest_info = layout(&[("a", FieldType::Int32, 0, 0), ("extra", FieldType::V_String, 10, 0)]);
    let mut copier = RecordCopier::new(&dest_info, &src_info);
    copier.add(0, 0);

    let mut src = src_info.create_record().unwrap();
    set(&src_info, &mut src, "a", "9");
    let mut dest = dest_info.create_record().unwrap();
    copier.set_dest_to_null(&mut dest).unwrap();
    copier.copy(&mut dest, src.data()).unwrap();

    assert_eq!(text(&dest_info, &dest, "a").as_deref(), Some("9"));
    assert_eq!(text(&dest_info, &dest, "extra"), None);
}
