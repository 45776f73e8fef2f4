//! Schema XML parsing, canonical output and configuration loading.

use tempfile::tempdir;

use record_core::{FieldType, RecordConfig, RecordError, RecordInfo};

const WORKFLOW_XML: &str = r#"<?xml version="1.0"?>
<Configuration>
  <MetaInfo connection="Output">
    <RecordInfo>
      <Field name="Customer ID" source="File: customers.csv" type="Int64" />
      <Field description="Net &amp; gross &lt;total&gt;" name="Amount" size="10.3" type="FixedDecimal" />
      <Field name="Name" size="60" type="V_WString" />
      <Field name="Name" size="2" type="String" />
      <Field name='Signup' type='date' />
    </RecordInfo>
  </MetaInfo>
</Configuration>
"#;

#[test]
fn test_parse_workflow_metadata() {
    let info = RecordInfo::from_xml(WORKFLOW_XML, 255, false).unwrap();
    assert_eq!(info.num_fields(), 5);

    let amount = info.field_by_name("amount").unwrap();
    assert_eq!(amount.field_type(), FieldType::FixedDecimal);
    assert_eq!((amount.size(), amount.scale()), (10, 3));
    assert_eq!(amount.schema().description(), "Net & gross <total>");

    assert_eq!(info.field(3).unwrap().name(), "Name2");
    assert_eq!(info.field(4).unwrap().field_type(), FieldType::Date);
    assert_eq!(
        info.field(0).unwrap().schema().source(),
        "File: customers.csv"
    );
}

#[test]
fn test_canonical_output() {
    let info = RecordInfo::from_xml(WORKFLOW_XML, 255, false).unwrap();
    let expected = concat!(
        "<RecordInfo>\n",
        "\t<Field name=\"Customer ID\" source=\"File: customers.csv\" type=\"Int64\"/>\n",
        "\t<Field description=\"Net &amp; gross &lt;total&gt;\" name=\"Amount\" scale=\"3\" size=\"10\" type=\"FixedDecimal\"/>\n",
        "\t<Field name=\"Name\" size=\"60\" type=\"V_WString\"/>\n",
        "\t<Field name=\"Name2\" size=\"2\" type=\"String\"/>\n",
        "\t<Field name=\"Signup\" type=\"Date\"/>\n",
        "</RecordInfo>\n",
    );
    assert_eq!(info.record_xml_metadata(true), expected);

    let reparsed = RecordInfo::from_xml(expected, 255, false).unwrap();
    assert_eq!(reparsed, info);
    assert_eq!(reparsed.hash(), info.hash());
}

#[test]
fn test_prefix_and_append() {
    let mut info = RecordInfo::new(255, false, None);
    info.init_from_xml(WORKFLOW_XML, Some("Left_"), false).unwrap();
    info.init_from_xml(WORKFLOW_XML, Some("Right_"), false).unwrap();
    assert_eq!(info.num_fields(), 10);
    assert!(info.field_num_opt("Left_Customer ID").is_some());
    assert!(info.field_num_opt("right_signup").is_some());
    assert_eq!(info.field(8).unwrap().name(), "Right_Name2");
}

#[test]
fn test_malformed_documents() {
    let cases = [
        "<RecordInfo><Field name=\"a\" type=\"Int32\"/>",
        "<RecordInfo><Field type=\"Int32\"/></RecordInfo>",
        "<RecordInfo><Field name=\"s\" type=\"String\"/></RecordInfo>",
        "<RecordInfo><Field name=\"d\" size=\"8\" type=\"FixedDecimal\"/></RecordInfo>",
    ];
    for xml in cases {
        let mut info = RecordInfo::new(255, false, None);
        assert!(info.init_from_xml(xml, None, false).is_err(), "{}", xml);
    }

    let mut info = RecordInfo::new(255, false, None);
    let err = info
        .init_from_xml("<RecordInfo><Field name=\"a\" type=\"Int32\"/>", None, false)
        .unwrap_err();
    assert!(matches!(err, RecordError::Xml { .. }));
}

#[test]
fn test_config_file_drives_naming() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("record.json");
    std::fs::write(
        &path,
        r#"{ "max_field_name_len": 8, "strict_naming": true, "conversion_error_limit": 10 }"#,
    )
    .unwrap();

    let config = RecordConfig::load(&path).unwrap();
    assert_eq!(config.conversion_error_limit, 10);
    assert_eq!(config.decimal_separator, '.');

    let mut info = RecordInfo::with_config(&config, None);
    info.init_from_xml(WORKFLOW_XML, None, false).unwrap();
    let names: Vec<&str> = info.iter().map(|f| f.name()).collect();
    assert_eq!(names, vec!["Customer", "Amount", "Name", "Name2", "Signup"]);

    assert!(RecordConfig::load(&dir.path().join("missing.json")).is_err());
    assert!(matches!(
        RecordConfig::from_json("{ \"strict_naming\": 3 }"),
        Err(RecordError::Config(_))
    ));
}

#[test]
fn test_lock_in_round_trip() {
    let mut locked = RecordInfo::new(255, false, None);
    locked.set_lock_in(true);
    locked
        .add_field_with("id", FieldType::Int32, 0, 0, "", "")
        .unwrap();
    let xml = locked.record_xml_metadata(false);
    assert!(xml.starts_with("<RecordInfo LockIn=\"True\" >\n"));

    let mut reader = RecordInfo::new(255, false, None);
    reader.set_lock_in(true);
    reader.init_from_xml(&xml, None, false).unwrap();
    assert_eq!(reader, locked);

    let mut plain = RecordInfo::new(255, false, None);
    assert!(matches!(
        plain.init_from_xml(&xml, None, false),
        Err(RecordError::LockInNotSupported)
    ));
}
