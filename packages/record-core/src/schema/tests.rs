use super::xml::{decode_entities, escape_attribute, find_element, find_elements};
use super::*;
use ntest::timeout;

fn field_tag(text: &str) -> XmlElement<'_> {
    find_element(text, "Field").unwrap().unwrap()
}

#[timeout(1000)]
#[test]
fn test_compare_ignores_name_case() {
    let a = FieldSchema::new("Amount", FieldType::Double, 8, 0);
    let b = FieldSchema::new("AMOUNT", FieldType::Double, 8, 0);
    assert!(a.compare(&b));
    assert_eq!(a, b);

    let c = FieldSchema::new("Amount", FieldType::Float, 4, 0);
    assert!(!a.compare(&c));
}

#[timeout(1000)]
#[test]
fn test_equal_type_ignores_name() {
    let a = FieldSchema::new("x", FieldType::FixedDecimal, 10, 2);
    let b = FieldSchema::new("y", FieldType::FixedDecimal, 10, 2);
    let c = FieldSchema::new("y", FieldType::FixedDecimal, 10, 3);
    assert!(a.equal_type(&b));
    assert!(!a.compare(&b));
    assert!(!a.equal_type(&c));
}

#[timeout(1000)]
#[test]
fn test_copy_with_modifications() {
    let mut base = FieldSchema::new("a", FieldType::String, 20, 0);
    base.set_description("desc");
    base.set_source_scoped("File", "input.csv");
    assert_eq!(base.source(), "File:input.csv");

    let renamed = base.renamed("b");
    assert_eq!(renamed.name(), "b");
    assert_eq!(renamed.field_type(), FieldType::String);
    assert_eq!(renamed.description(), "desc");
    assert_eq!(renamed.position(), -1);

    let resized = base.resized("c", FieldType::V_String, 100);
    assert_eq!(resized.size(), 100);
    assert_eq!(resized.source(), "File:input.csv");

    let resourced = base.resourced("d", FieldType::FixedDecimal, 8, 2, "Formula");
    assert_eq!(resourced.scale(), 2);
    assert_eq!(resourced.source(), "Formula");
}

#[timeout(1000)]
#[test]
fn test_from_xml_tag_reads_attributes() {
    let xml = r#"<Field name="Price" source="A &amp; B" size="12" type="String"/>"#;
    let schema = FieldSchema::from_xml_tag(&field_tag(xml), Some("in_")).unwrap();
    assert_eq!(schema.name(), "in_Price");
    assert_eq!(schema.field_type(), FieldType::String);
    assert_eq!(schema.size(), 12);
    assert_eq!(schema.source(), "A & B");
    assert_eq!(schema.scale(), 0);
}

#[timeout(1000)]
#[test]
fn test_from_xml_tag_fixed_decimal_scale() {
    let schema = FieldSchema::from_xml_tag(
        &field_tag(r#"<Field name="d" size="19.6" type="FixedDecimal"/>"#),
        None,
    )
    .unwrap();
    assert_eq!(schema.size(), 19);
    assert_eq!(schema.scale(), 6);

    let schema = FieldSchema::from_xml_tag(
        &field_tag(r#"<Field name="d" scale="2" size="8" type="FixedDecimal"/>"#),
        None,
    )
    .unwrap();
    assert_eq!(schema.scale(), 2);

    let err = FieldSchema::from_xml_tag(
        &field_tag(r#"<Field name="d" size="8" type="FixedDecimal"/>"#),
        None,
    );
    assert!(matches!(err, Err(RecordError::MissingAttribute { .. })));
}

#[timeout(1000)]
#[test]
fn test_from_xml_tag_errors() {
    let err = FieldSchema::from_xml_tag(&field_tag(r#"<Field name="x" type="Int128"/>"#), None)
        .unwrap_err();
    assert_eq!(err.to_string(), "Unknown field type: Int128");

    let err = FieldSchema::from_xml_tag(&field_tag(r#"<Field name="s" type="V_String"/>"#), None)
        .unwrap_err();
    assert_eq!(err.to_string(), "Field: \"s\" is 0 length.");

    let err = FieldSchema::from_xml_tag(&field_tag(r#"<Field type="Int32"/>"#), None);
    assert!(matches!(err, Err(RecordError::MissingAttribute { .. })));
}

#[timeout(1000)]
#[test]
fn test_find_elements_with_bodies() {
    let xml = "<RecordInfo LockIn='True'>\n<Field name='a' type='Int32'/>\n<Field name=\"b\" type=\"Bool\" />\n</RecordInfo>";
    let info = find_element(xml, "RecordInfo").unwrap().unwrap();
    assert_eq!(info.attribute("LockIn"), Some("True"));
    let body = info.body.unwrap();
    let fields = find_elements(body, "Field").unwrap();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[1].attribute("name"), Some("b"));
}

#[timeout(1000)]
#[test]
fn test_find_element_skips_longer_tag_names() {
    let xml = "<Fields count='1'/><Field name='x' type='Byte'/>";
    let found = find_element(xml, "Field").unwrap().unwrap();
    assert_eq!(found.attribute("name"), Some("x"));
    assert!(find_element("<Other/>", "Field").unwrap().is_none());
}

#[timeout(1000)]
#[test]
fn test_malformed_xml_is_an_error() {
    assert!(find_elements("<Field name='x' type='Int32'", "Field").is_err());
    assert!(find_elements("<Field name=x/>", "Field").is_err());
    assert!(find_elements("<RecordInfo><Field name='x' type='Int32'/>", "RecordInfo").is_err());
}

#[timeout(1000)]
#[test]
fn test_entities() {
    assert_eq!(
        decode_entities("&lt;a&gt; &quot;b&apos; &#65;&#x42;").unwrap(),
        "<a> \"b' AB"
    );
    assert!(decode_entities("&bogus;").is_err());
    assert_eq!(escape_attribute("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c'");
}

#[timeout(1000)]
#[test]
fn test_schema_serde() {
    let schema = FieldSchema::new("n", FieldType::Int16, 2, -1);
    let json = serde_json::to_string(&schema).unwrap();
    assert!(json.contains("\"type\":\"Int16\""));
    let back: FieldSchema = serde_json::from_str(&json).unwrap();
    assert_eq!(back, schema);
    assert_eq!(back.position(), -1);
}
