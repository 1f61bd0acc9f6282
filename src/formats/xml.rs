//! Support for the Apple XML property-list format.
//!
//! Provides parsing and canonical serialization. Output matches the form
//! Xcode itself writes: PLIST 1.0 DOCTYPE, one `<key>`/value pair per
//! line, a single tab per nesting level, and is byte-stable for a given
//! value tree.

use quick_xml::{
    Reader, Writer,
    escape::partial_escape,
    events::{BytesEnd, BytesStart, BytesText, Event},
};
use std::io::{BufRead, Write};

use indoc::indoc;

use crate::{
    error::Error,
    traits::Parser,
    types::{Dictionary, Value},
};

/// The fixed two-line prologue every XML plist opens with.
const PROLOGUE: &str = indoc! {r#"
    <?xml version="1.0" encoding="UTF-8"?>
    <!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
"#};

/// Represents an XML plist document.
#[derive(Debug, Clone, PartialEq)]
pub struct Format {
    /// The value inside the `<plist>` element.
    pub root: Value,
}

impl Parser for Format {
    /// Parse from any reader.
    ///
    /// Only the allowed object kinds are accepted: `<dict>`, `<array>`,
    /// `<string>`, `<integer>`, `<real>`, and `<true/>`/`<false/>`
    /// (materialized as the strings `"1"`/`"0"`). Any other element,
    /// notably `<date>` and `<data>`, aborts the parse.
    fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut xml_reader = Reader::from_reader(reader);
        let mut buf = Vec::new();

        let root = loop {
            match xml_reader.read_event_into(&mut buf)? {
                Event::Start(ref e) if e.name().as_ref() == b"plist" => {
                    break parse_plist_body(&mut xml_reader)?;
                }
                Event::Decl(_) | Event::DocType(_) | Event::Comment(_) | Event::PI(_) => {}
                Event::Text(ref t) if is_blank(t) => {}
                Event::Eof => return Err(Error::malformed("missing <plist> element")),
                _ => return Err(Error::malformed("unexpected content before <plist>")),
            }
            buf.clear();
        };

        // Ignore trailing whitespace and comments after </plist>.
        loop {
            match xml_reader.read_event_into(&mut buf)? {
                Event::Eof => break,
                Event::Text(ref t) if is_blank(t) => {}
                Event::Comment(_) => {}
                _ => return Err(Error::malformed("unexpected content after </plist>")),
            }
            buf.clear();
        }

        Ok(Format { root })
    }

    /// Write to any writer (file, memory, etc.).
    fn to_writer<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        writer.write_all(PROLOGUE.as_bytes()).map_err(Error::Io)?;

        let mut xml_writer = Writer::new(&mut writer);
        let mut plist = BytesStart::new("plist");
        plist.push_attribute(("version", "1.0"));
        xml_writer.write_event(Event::Start(plist))?;
        line_break(&mut xml_writer, 0)?;

        write_value(&mut xml_writer, &self.root, 0)?;

        line_break(&mut xml_writer, 0)?;
        xml_writer.write_event(Event::End(BytesEnd::new("plist")))?;
        xml_writer.write_event(Event::Text(BytesText::from_escaped("\n")))?;
        Ok(())
    }
}

impl From<Dictionary> for Format {
    fn from(value: Dictionary) -> Self {
        Format {
            root: Value::Dictionary(value),
        }
    }
}

impl TryFrom<Format> for Dictionary {
    type Error = Error;

    fn try_from(value: Format) -> Result<Self, Self::Error> {
        match value.root {
            Value::Dictionary(dict) => Ok(dict),
            other => Err(Error::malformed(format!(
                "top-level plist object is a {}, expected a dictionary",
                other.kind()
            ))),
        }
    }
}

//-------------------------------------------------------------------------
// Reading
//-------------------------------------------------------------------------

/// Parses the single value inside `<plist>` and consumes `</plist>`.
fn parse_plist_body<R: BufRead>(reader: &mut Reader<R>) -> Result<Value, Error> {
    let mut buf = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                if root.is_some() {
                    return Err(Error::malformed("multiple root objects in <plist>"));
                }
                root = Some(parse_element(reader, e, false)?);
            }
            Event::Empty(ref e) => {
                if root.is_some() {
                    return Err(Error::malformed("multiple root objects in <plist>"));
                }
                root = Some(parse_element(reader, e, true)?);
            }
            Event::End(ref e) if e.name().as_ref() == b"plist" => {
                return root.ok_or_else(|| Error::malformed("empty <plist> element"));
            }
            Event::Text(ref t) if is_blank(t) => {}
            Event::Comment(_) => {}
            Event::Eof => return Err(Error::malformed("unexpected EOF inside <plist>")),
            _ => return Err(Error::malformed("unexpected content inside <plist>")),
        }
        buf.clear();
    }
}

/// Parses one element into a value. `empty` marks self-closing tags.
fn parse_element<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
    empty: bool,
) -> Result<Value, Error> {
    match start.name().as_ref() {
        b"dict" => {
            if empty {
                Ok(Value::Dictionary(Dictionary::new()))
            } else {
                parse_dict(reader)
            }
        }
        b"array" => {
            if empty {
                Ok(Value::Array(Vec::new()))
            } else {
                parse_array(reader)
            }
        }
        b"string" => {
            if empty {
                Ok(Value::String(String::new()))
            } else {
                Ok(Value::String(element_text(reader, b"string")?))
            }
        }
        b"integer" => {
            let text = consume_leaf_text(reader, b"integer", empty)?;
            text.trim()
                .parse::<i128>()
                .map(Value::Integer)
                .map_err(|_| Error::malformed(format!("invalid integer `{}`", text)))
        }
        b"real" => {
            let text = consume_leaf_text(reader, b"real", empty)?;
            text.trim()
                .parse::<f64>()
                .map(Value::Real)
                .map_err(|_| Error::malformed(format!("invalid real `{}`", text)))
        }
        // Booleans materialize as the strings "1"/"0", matching the write
        // contract, so a written boolean reads back equal.
        b"true" => {
            if !empty {
                element_text(reader, b"true")?;
            }
            Ok(Value::String("1".to_string()))
        }
        b"false" => {
            if !empty {
                element_text(reader, b"false")?;
            }
            Ok(Value::String("0".to_string()))
        }
        other => Err(Error::unsupported_type(
            String::from_utf8_lossy(other).into_owned(),
        )),
    }
}

fn parse_dict<R: BufRead>(reader: &mut Reader<R>) -> Result<Value, Error> {
    let mut dict = Dictionary::new();
    let mut buf = Vec::new();
    let mut pending_key: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) if e.name().as_ref() == b"key" => {
                if pending_key.is_some() {
                    return Err(Error::malformed("<key> not followed by a value"));
                }
                pending_key = Some(element_text(reader, b"key")?);
            }
            Event::Empty(ref e) if e.name().as_ref() == b"key" => {
                if pending_key.is_some() {
                    return Err(Error::malformed("<key> not followed by a value"));
                }
                pending_key = Some(String::new());
            }
            Event::Start(ref e) => {
                let key = pending_key
                    .take()
                    .ok_or_else(|| Error::malformed("value without a preceding <key>"))?;
                dict.insert(key, parse_element(reader, e, false)?);
            }
            Event::Empty(ref e) => {
                let key = pending_key
                    .take()
                    .ok_or_else(|| Error::malformed("value without a preceding <key>"))?;
                dict.insert(key, parse_element(reader, e, true)?);
            }
            Event::End(ref e) if e.name().as_ref() == b"dict" => {
                if pending_key.is_some() {
                    return Err(Error::malformed("<key> not followed by a value"));
                }
                return Ok(Value::Dictionary(dict));
            }
            Event::Text(ref t) if is_blank(t) => {}
            Event::Comment(_) => {}
            Event::Eof => return Err(Error::malformed("unexpected EOF inside <dict>")),
            _ => return Err(Error::malformed("unexpected content inside <dict>")),
        }
        buf.clear();
    }
}

fn parse_array<R: BufRead>(reader: &mut Reader<R>) -> Result<Value, Error> {
    let mut items = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                items.push(parse_element(reader, e, false)?);
            }
            Event::Empty(ref e) => {
                items.push(parse_element(reader, e, true)?);
            }
            Event::End(ref e) if e.name().as_ref() == b"array" => {
                return Ok(Value::Array(items));
            }
            Event::Text(ref t) if is_blank(t) => {}
            Event::Comment(_) => {}
            Event::Eof => return Err(Error::malformed("unexpected EOF inside <array>")),
            _ => return Err(Error::malformed("unexpected content inside <array>")),
        }
        buf.clear();
    }
}

/// Collects the text content of a leaf element up to its end tag.
fn element_text<R: BufRead>(reader: &mut Reader<R>, name: &[u8]) -> Result<String, Error> {
    let mut buf = Vec::new();
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(ref t) => {
                text.push_str(&t.decode().map_err(quick_xml::Error::from)?);
            }
            Event::CData(ref c) => {
                let raw = std::str::from_utf8(c)
                    .map_err(|_| Error::malformed("non-UTF-8 CDATA content"))?;
                text.push_str(raw);
            }
            Event::GeneralRef(ref e) => {
                let resolved = e
                    .resolve_char_ref()
                    .map_err(|err| Error::malformed(format!("invalid character reference: {err}")))?;
                if let Some(c) = resolved {
                    text.push(c);
                } else {
                    match e.as_ref() {
                        b"amp" => text.push('&'),
                        b"lt" => text.push('<'),
                        b"gt" => text.push('>'),
                        b"quot" => text.push('"'),
                        b"apos" => text.push('\''),
                        other => {
                            return Err(Error::malformed(format!(
                                "unknown entity reference `&{};`",
                                String::from_utf8_lossy(other)
                            )));
                        }
                    }
                }
            }
            Event::End(ref e) if e.name().as_ref() == name => return Ok(text),
            Event::Eof => {
                return Err(Error::malformed(format!(
                    "unexpected EOF inside <{}>",
                    String::from_utf8_lossy(name)
                )));
            }
            _ => {
                return Err(Error::malformed(format!(
                    "unexpected content inside <{}>",
                    String::from_utf8_lossy(name)
                )));
            }
        }
        buf.clear();
    }
}

fn consume_leaf_text<R: BufRead>(
    reader: &mut Reader<R>,
    name: &[u8],
    empty: bool,
) -> Result<String, Error> {
    if empty {
        Ok(String::new())
    } else {
        element_text(reader, name)
    }
}

fn is_blank(text: &BytesText) -> bool {
    text.iter().all(u8::is_ascii_whitespace)
}

//-------------------------------------------------------------------------
// Writing
//-------------------------------------------------------------------------

fn write_value<W: Write>(
    xml_writer: &mut Writer<W>,
    value: &Value,
    depth: usize,
) -> Result<(), Error> {
    match value {
        Value::String(s) => write_leaf(xml_writer, "string", s),
        // Never a native <true/>/<false/> token.
        Value::Boolean(b) => write_leaf(xml_writer, "string", if *b { "1" } else { "0" }),
        Value::Integer(i) => write_leaf(xml_writer, "integer", &i.to_string()),
        Value::Real(r) => write_leaf(xml_writer, "real", &r.to_string()),
        Value::Dictionary(dict) if dict.is_empty() => {
            xml_writer.write_event(Event::Empty(BytesStart::new("dict")))?;
            Ok(())
        }
        Value::Dictionary(dict) => {
            xml_writer.write_event(Event::Start(BytesStart::new("dict")))?;
            for (key, entry) in dict {
                line_break(xml_writer, depth + 1)?;
                write_leaf(xml_writer, "key", key)?;
                line_break(xml_writer, depth + 1)?;
                write_value(xml_writer, entry, depth + 1)?;
            }
            line_break(xml_writer, depth)?;
            xml_writer.write_event(Event::End(BytesEnd::new("dict")))?;
            Ok(())
        }
        Value::Array(items) if items.is_empty() => {
            xml_writer.write_event(Event::Empty(BytesStart::new("array")))?;
            Ok(())
        }
        Value::Array(items) => {
            xml_writer.write_event(Event::Start(BytesStart::new("array")))?;
            for item in items {
                line_break(xml_writer, depth + 1)?;
                write_value(xml_writer, item, depth + 1)?;
            }
            line_break(xml_writer, depth)?;
            xml_writer.write_event(Event::End(BytesEnd::new("array")))?;
            Ok(())
        }
    }
}

fn write_leaf<W: Write>(xml_writer: &mut Writer<W>, name: &str, text: &str) -> Result<(), Error> {
    xml_writer.write_event(Event::Start(BytesStart::new(name)))?;
    if !text.is_empty() {
        // Escape only `&`, `<`, `>`, the set Xcode itself escapes.
        xml_writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))?;
    }
    xml_writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn line_break<W: Write>(xml_writer: &mut Writer<W>, depth: usize) -> Result<(), Error> {
    let mut text = String::with_capacity(depth + 1);
    text.push('\n');
    for _ in 0..depth {
        text.push('\t');
    }
    xml_writer.write_event(Event::Text(BytesText::from_escaped(text)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Parser;

    fn write_to_string(format: &Format) -> String {
        let mut out = Vec::new();
        format.to_writer(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_basic_plist() {
        let content = indoc! {r#"
            <?xml version="1.0" encoding="UTF-8"?>
            <!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
            <plist version="1.0">
            <dict>
            	<key>archiveVersion</key>
            	<string>1.0</string>
            </dict>
            </plist>
        "#};
        let parsed = Format::from_str(content).unwrap();
        let dict = Dictionary::try_from(parsed).unwrap();
        assert_eq!(
            dict.get("archiveVersion"),
            Some(&Value::String("1.0".to_string()))
        );
    }

    #[test]
    fn test_parse_typed_leaves() {
        let content = indoc! {r#"
            <plist version="1.0">
            <dict>
            	<key>integer</key>
            	<integer>42</integer>
            	<key>real</key>
            	<real>0.5</real>
            	<key>yes</key>
            	<true/>
            	<key>no</key>
            	<false/>
            </dict>
            </plist>
        "#};
        let dict = Dictionary::try_from(Format::from_str(content).unwrap()).unwrap();
        assert_eq!(dict["integer"], Value::Integer(42));
        assert_eq!(dict["real"], Value::Real(0.5));
        assert_eq!(dict["yes"], Value::String("1".to_string()));
        assert_eq!(dict["no"], Value::String("0".to_string()));
    }

    #[test]
    fn test_parse_nested_containers() {
        let content = indoc! {r#"
            <plist version="1.0">
            <dict>
            	<key>array</key>
            	<array>
            		<string>string in an array</string>
            		<dict>
            			<key>a hash</key>
            			<string>in an array</string>
            		</dict>
            	</array>
            </dict>
            </plist>
        "#};
        let dict = Dictionary::try_from(Format::from_str(content).unwrap()).unwrap();
        let Value::Array(items) = &dict["array"] else {
            panic!("expected array");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], Value::String("string in an array".to_string()));
        assert_eq!(
            items[1].as_dictionary().unwrap().get("a hash"),
            Some(&Value::String("in an array".to_string()))
        );
    }

    #[test]
    fn test_date_is_rejected() {
        let content = indoc! {r#"
            <plist version="1.0">
            <dict>
            	<key>uhoh</key>
            	<date>2004-03-03T01:02:03Z</date>
            </dict>
            </plist>
        "#};
        let err = Format::from_str(content).unwrap_err();
        assert!(err.is_type_error());
        assert!(err.to_string().contains("date"));
    }

    #[test]
    fn test_date_nested_in_array_is_rejected() {
        let content = indoc! {r#"
            <plist version="1.0">
            <dict>
            	<key>uhoh</key>
            	<array>
            		<date>2004-03-03T01:02:03Z</date>
            	</array>
            </dict>
            </plist>
        "#};
        let err = Format::from_str(content).unwrap_err();
        assert!(err.is_type_error());
    }

    #[test]
    fn test_data_is_rejected() {
        let content = indoc! {r#"
            <plist version="1.0">
            <dict>
            	<key>blob</key>
            	<data>AAEC</data>
            </dict>
            </plist>
        "#};
        assert!(Format::from_str(content).unwrap_err().is_type_error());
    }

    #[test]
    fn test_golden_output() {
        let expected = indoc! {r#"
            <?xml version="1.0" encoding="UTF-8"?>
            <!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
            <plist version="1.0">
            <dict>
            	<key>archiveVersion</key>
            	<string>1.0</string>
            </dict>
            </plist>
        "#};

        let mut dict = Dictionary::new();
        dict.insert("archiveVersion".to_string(), Value::from("1.0"));
        assert_eq!(write_to_string(&Format::from(dict)), expected);
    }

    #[test]
    fn test_empty_dictionary_writes_self_closing_tag() {
        let output = write_to_string(&Format::from(Dictionary::new()));
        assert!(output.contains("<dict/>"));
        let reparsed = Dictionary::try_from(Format::from_str(&output).unwrap()).unwrap();
        assert!(reparsed.is_empty());
    }

    #[test]
    fn test_escaping_round_trip() {
        let mut dict = Dictionary::new();
        dict.insert("html".to_string(), Value::from("<b>bold & proud</b>"));
        let output = write_to_string(&Format::from(dict.clone()));
        assert!(output.contains("&lt;b&gt;bold &amp; proud&lt;/b&gt;"));

        let reparsed = Dictionary::try_from(Format::from_str(&output).unwrap()).unwrap();
        assert_eq!(reparsed, dict);
    }

    #[test]
    fn test_non_dictionary_root_is_malformed() {
        let content = indoc! {r#"
            <plist version="1.0">
            <array>
            	<string>loose</string>
            </array>
            </plist>
        "#};
        let parsed = Format::from_str(content).unwrap();
        let err = Dictionary::try_from(parsed).unwrap_err();
        assert!(err.to_string().contains("expected a dictionary"));
    }

    #[test]
    fn test_write_read_round_trip() {
        let mut inner = Dictionary::new();
        inner.insert("a hash".to_string(), Value::from("in a hash"));

        let mut dict = Dictionary::new();
        dict.insert("hash".to_string(), Value::Dictionary(inner));
        dict.insert("string".to_string(), Value::from("string"));
        dict.insert("true_bool".to_string(), Value::from("1"));
        dict.insert("false_bool".to_string(), Value::from("0"));
        dict.insert("integer".to_string(), Value::from(42i64));
        dict.insert("float".to_string(), Value::from(0.5));
        dict.insert(
            "array".to_string(),
            Value::Array(vec![Value::from("string in an array")]),
        );

        let output = write_to_string(&Format::from(dict.clone()));
        let reparsed = Dictionary::try_from(Format::from_str(&output).unwrap()).unwrap();
        assert_eq!(reparsed, dict);
    }

    #[test]
    fn test_string_whitespace_is_preserved() {
        let content = "<plist version=\"1.0\"><dict><key>k</key><string>  padded  </string></dict></plist>";
        let dict = Dictionary::try_from(Format::from_str(content).unwrap()).unwrap();
        assert_eq!(dict["k"], Value::String("  padded  ".to_string()));
    }
}
