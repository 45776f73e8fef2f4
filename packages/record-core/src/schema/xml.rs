//! Minimal XML element scanner for record layout fragments.
//!
//! Handles exactly what a `<RecordInfo>` fragment needs: locating elements
//! by tag name, reading quoted attributes, and entity decoding. Comments,
//! processing instructions and namespaces are not interpreted.

use crate::error::RecordError;

/// One element found in a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement<'a> {
    /// Tag name as written
    pub name: &'a str,
    /// Decoded attributes in document order
    pub attributes: Vec<(String, String)>,
    /// Raw inner text, `None` for self-closing elements
    pub body: Option<&'a str>,
}

impl XmlElement<'_> {
    /// Looks up an attribute value by exact name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Looks up an attribute that must be present.
    pub fn required_attribute(&self, name: &str) -> Result<&str, RecordError> {
        self.attribute(name)
            .ok_or_else(|| RecordError::MissingAttribute {
                tag: self.name.to_string(),
                attribute: name.to_string(),
            })
    }
}

fn xml_error(message: impl Into<String>) -> RecordError {
    RecordError::Xml {
        message: message.into(),
    }
}

/// Finds the byte index of the next `<tag` that is followed by a name
/// terminator, starting at `from`.
fn find_open_tag(text: &str, tag: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut search = from;
    while let Some(rel) = text[search..].find('<') {
        let start = search + rel;
        let name_start = start + 1;
        let name_end = name_start + tag.len();
        if name_end <= text.len() && text[name_start..].starts_with(tag) {
            match bytes.get(name_end) {
                Some(b) if b.is_ascii_whitespace() || *b == b'/' || *b == b'>' => {
                    return Some(start)
                }
                None => return Some(start),
                _ => {}
            }
        }
        search = start + 1;
    }
    None
}

/// Parses the attribute list of the element starting at `start`.
///
/// Returns the attributes, whether the element self-closes, and the index
/// just past the closing `>` of the start tag.
fn parse_start_tag(
    text: &str,
    tag: &str,
    start: usize,
) -> Result<(Vec<(String, String)>, bool, usize), RecordError> {
    let bytes = text.as_bytes();
    let mut pos = start + 1 + tag.len();
    let mut attributes = Vec::new();
    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        match bytes.get(pos) {
            None => return Err(xml_error(format!("Unterminated <{}> tag", tag))),
            Some(b'>') => return Ok((attributes, false, pos + 1)),
            Some(b'/') => {
                if bytes.get(pos + 1) == Some(&b'>') {
                    return Ok((attributes, true, pos + 2));
                }
                return Err(xml_error(format!("Malformed end of <{}> tag", tag)));
            }
            Some(_) => {}
        }

        let key_start = pos;
        while pos < bytes.len()
            && !bytes[pos].is_ascii_whitespace()
            && bytes[pos] != b'='
            && bytes[pos] != b'>'
            && bytes[pos] != b'/'
        {
            pos += 1;
        }
        let key = &text[key_start..pos];
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if bytes.get(pos) != Some(&b'=') {
            return Err(xml_error(format!(
                "Attribute '{}' in <{}> has no value",
                key, tag
            )));
        }
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let quote = match bytes.get(pos) {
            Some(&q) if q == b'"' || q == b'\'' => q,
            _ => {
                return Err(xml_error(format!(
                    "Attribute '{}' in <{}> is not quoted",
                    key, tag
                )))
            }
        };
        pos += 1;
        let value_start = pos;
        while pos < bytes.len() && bytes[pos] != quote {
            pos += 1;
        }
        if pos >= bytes.len() {
            return Err(xml_error(format!(
                "Unterminated value for attribute '{}' in <{}>",
                key, tag
            )));
        }
        let value = decode_entities(&text[value_start..pos])?;
        attributes.push((key.to_string(), value));
        pos += 1;
    }
}

/// Finds every `tag` element in `text`, in document order.
///
/// Elements of the same name are not expected to nest.
pub fn find_elements<'a>(text: &'a str, tag: &'a str) -> Result<Vec<XmlElement<'a>>, RecordError> {
    let mut elements = Vec::new();
    let mut from = 0;
    while let Some(start) = find_open_tag(text, tag, from) {
        let (attributes, self_closing, after) = parse_start_tag(text, tag, start)?;
        if self_closing {
            elements.push(XmlElement {
                name: &text[start + 1..start + 1 + tag.len()],
                attributes,
                body: None,
            });
            from = after;
            continue;
        }
        let close = format!("</{}>", tag);
        let end = text[after..]
            .find(&close)
            .map(|rel| after + rel)
            .ok_or_else(|| xml_error(format!("Missing closing tag for <{}>", tag)))?;
        elements.push(XmlElement {
            name: &text[start + 1..start + 1 + tag.len()],
            attributes,
            body: Some(&text[after..end]),
        });
        from = end + close.len();
    }
    Ok(elements)
}

/// Finds the first `tag` element in `text`.
pub fn find_element<'a>(text: &'a str, tag: &'a str) -> Result<Option<XmlElement<'a>>, RecordError> {
    match find_open_tag(text, tag, 0) {
        None => Ok(None),
        Some(_) => Ok(find_elements(text, tag)?.into_iter().next()),
    }
}

/// Decodes the five predefined entities and numeric character references.
pub fn decode_entities(text: &str) -> Result<String, RecordError> {
    if !text.contains('&') {
        return Ok(text.to_string());
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let semi = after
            .find(';')
            .ok_or_else(|| xml_error(format!("Unterminated entity in '{}'", text)))?;
        let entity = &after[..semi];
        let decoded = match entity {
            "lt" => '<',
            "gt" => '>',
            "amp" => '&',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                let code = if let Some(hex) = entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32)
                    .ok_or_else(|| xml_error(format!("Unknown entity '&{};'", entity)))?
            }
        };
        out.push(decoded);
        rest = &after[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Escapes text for use inside a double-quoted attribute value.
pub fn escape_attribute(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
