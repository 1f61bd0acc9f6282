//! Support for the old-style ASCII property-list format.
//!
//! This is the legacy `key = value;` brace-delimited encoding used by
//! `.pbxproj` build descriptions and `.strings` tables. The format is
//! untyped: every leaf, quoted or not, materializes as a string.

use std::io::{BufRead, Write};
use std::iter::Peekable;
use std::str::Chars;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    error::Error,
    traits::Parser,
    types::{Dictionary, Value},
};

lazy_static! {
    // Tokens made of these characters may appear without quotes.
    static ref UNQUOTED_TOKEN: Regex = Regex::new(r"^[A-Za-z0-9_$/:.+-]+$").unwrap();
}

/// Represents an old-style ASCII plist document.
#[derive(Debug, Clone, PartialEq)]
pub struct Format {
    /// The root value, a dictionary for every build-description file.
    pub root: Value,
}

impl Parser for Format {
    /// Parse from any reader.
    ///
    /// Accepts both the brace-delimited form (`{ key = value; }`) and the
    /// braceless `.strings`-table form (`"key" = "value";` pairs at the
    /// top level). `<hex>` data runs are an unsupported object kind.
    fn from_reader<R: BufRead>(mut reader: R) -> Result<Self, Error> {
        let mut content = String::new();
        reader.read_to_string(&mut content).map_err(Error::Io)?;

        let mut cursor = Cursor::new(&content);
        let root = cursor.parse_root()?;
        Ok(Format { root })
    }

    fn to_writer<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        let mut content = String::from("// !$*UTF8*$!\n");
        write_value(&mut content, &self.root, 0);
        content.push('\n');
        writer.write_all(content.as_bytes()).map_err(Error::Io)
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

struct Cursor<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Cursor<'a> {
    fn new(content: &'a str) -> Self {
        Cursor {
            chars: content.chars().peekable(),
        }
    }

    fn parse_root(&mut self) -> Result<Value, Error> {
        self.skip_blank()?;
        let root = match self.chars.peek() {
            None => return Err(Error::malformed("empty plist document")),
            Some('{') | Some('(') | Some('<') => self.parse_value()?,
            _ => {
                // Either a single loose value or a braceless `.strings`
                // style run of `key = value;` pairs.
                let first = self.parse_string()?;
                self.skip_blank()?;
                if self.chars.peek() == Some(&'=') {
                    self.parse_braceless_pairs(first)?
                } else {
                    Value::String(first)
                }
            }
        };

        self.skip_blank()?;
        if let Some(c) = self.chars.peek() {
            return Err(Error::malformed(format!(
                "unexpected trailing content starting with `{c}`"
            )));
        }
        Ok(root)
    }

    fn parse_value(&mut self) -> Result<Value, Error> {
        self.skip_blank()?;
        match self.chars.peek() {
            Some('{') => self.parse_dictionary(),
            Some('(') => self.parse_array(),
            Some('<') => Err(Error::unsupported_type("data")),
            Some(_) => Ok(Value::String(self.parse_string()?)),
            None => Err(Error::malformed("unexpected end of input")),
        }
    }

    fn parse_dictionary(&mut self) -> Result<Value, Error> {
        self.expect('{')?;
        let mut dict = Dictionary::new();

        loop {
            self.skip_blank()?;
            if self.chars.peek() == Some(&'}') {
                self.chars.next();
                return Ok(Value::Dictionary(dict));
            }
            if self.chars.peek().is_none() {
                return Err(Error::malformed("unterminated dictionary"));
            }

            let key = self.parse_string()?;
            self.skip_blank()?;
            self.expect('=')?;
            let value = self.parse_value()?;
            self.skip_blank()?;
            self.expect(';')?;
            dict.insert(key, value);
        }
    }

    fn parse_braceless_pairs(&mut self, first_key: String) -> Result<Value, Error> {
        let mut dict = Dictionary::new();
        let mut key = first_key;

        loop {
            self.skip_blank()?;
            self.expect('=')?;
            let value = self.parse_value()?;
            self.skip_blank()?;
            self.expect(';')?;
            dict.insert(key, value);

            self.skip_blank()?;
            if self.chars.peek().is_none() {
                return Ok(Value::Dictionary(dict));
            }
            key = self.parse_string()?;
        }
    }

    fn parse_array(&mut self) -> Result<Value, Error> {
        self.expect('(')?;
        let mut items = Vec::new();

        loop {
            self.skip_blank()?;
            if self.chars.peek() == Some(&')') {
                self.chars.next();
                return Ok(Value::Array(items));
            }

            items.push(self.parse_value()?);
            self.skip_blank()?;
            match self.chars.peek() {
                Some(',') => {
                    self.chars.next();
                }
                Some(')') => {}
                Some(c) => {
                    return Err(Error::malformed(format!(
                        "expected `,` or `)` in array, found `{c}`"
                    )));
                }
                None => return Err(Error::malformed("unterminated array")),
            }
        }
    }

    /// A string in either quoted or unquoted-token form.
    fn parse_string(&mut self) -> Result<String, Error> {
        if self.chars.peek() == Some(&'"') {
            self.parse_quoted()
        } else {
            self.parse_unquoted()
        }
    }

    fn parse_quoted(&mut self) -> Result<String, Error> {
        self.expect('"')?;
        let mut value = String::new();

        loop {
            match self.chars.next() {
                Some('"') => return Ok(value),
                Some('\\') => value.push(self.parse_escape()?),
                Some(c) => value.push(c),
                None => return Err(Error::malformed("unterminated quoted string")),
            }
        }
    }

    fn parse_escape(&mut self) -> Result<char, Error> {
        match self.chars.next() {
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some('r') => Ok('\r'),
            Some('b') => Ok('\u{8}'),
            Some('f') => Ok('\u{c}'),
            Some('U') => {
                let mut code = 0u32;
                for _ in 0..4 {
                    let digit = self
                        .chars
                        .next()
                        .and_then(|c| c.to_digit(16))
                        .ok_or_else(|| Error::malformed("invalid \\U escape"))?;
                    code = code * 16 + digit;
                }
                char::from_u32(code).ok_or_else(|| Error::malformed("invalid \\U escape"))
            }
            Some(c @ '0'..='7') => {
                let mut code = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            self.chars.next();
                            code = code * 8 + digit;
                        }
                        None => break,
                    }
                }
                char::from_u32(code).ok_or_else(|| Error::malformed("invalid octal escape"))
            }
            Some(c) => Ok(c),
            None => Err(Error::malformed("unterminated escape sequence")),
        }
    }

    fn parse_unquoted(&mut self) -> Result<String, Error> {
        let mut token = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() || matches!(c, '_' | '$' | '/' | ':' | '.' | '+' | '-') {
                token.push(c);
                self.chars.next();
            } else {
                break;
            }
        }

        if token.is_empty() {
            match self.chars.peek() {
                Some(c) => Err(Error::malformed(format!("unexpected character `{c}`"))),
                None => Err(Error::malformed("unexpected end of input")),
            }
        } else {
            Ok(token)
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), Error> {
        match self.chars.next() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(Error::malformed(format!(
                "expected `{expected}`, found `{c}`"
            ))),
            None => Err(Error::malformed(format!(
                "expected `{expected}`, found end of input"
            ))),
        }
    }

    /// Skips whitespace and both comment styles.
    fn skip_blank(&mut self) -> Result<(), Error> {
        loop {
            while matches!(self.chars.peek(), Some(c) if c.is_whitespace()) {
                self.chars.next();
            }

            let mut ahead = self.chars.clone();
            if ahead.next() != Some('/') {
                return Ok(());
            }
            match ahead.next() {
                Some('/') => {
                    self.chars.next();
                    self.chars.next();
                    for c in self.chars.by_ref() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                Some('*') => {
                    self.chars.next();
                    self.chars.next();
                    let mut prev = '\0';
                    loop {
                        match self.chars.next() {
                            Some('/') if prev == '*' => break,
                            Some(c) => prev = c,
                            None => return Err(Error::malformed("unterminated comment")),
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }
}

//-------------------------------------------------------------------------
// Writing
//-------------------------------------------------------------------------

fn write_value(out: &mut String, value: &Value, depth: usize) {
    match value {
        Value::String(s) => out.push_str(&quote(s)),
        Value::Boolean(b) => out.push_str(if *b { "1" } else { "0" }),
        Value::Integer(i) => out.push_str(&i.to_string()),
        Value::Real(r) => out.push_str(&r.to_string()),
        Value::Dictionary(dict) if dict.is_empty() => out.push_str("{}"),
        Value::Dictionary(dict) => {
            out.push_str("{\n");
            for (key, entry) in dict {
                indent(out, depth + 1);
                out.push_str(&quote(key));
                out.push_str(" = ");
                write_value(out, entry, depth + 1);
                out.push_str(";\n");
            }
            indent(out, depth);
            out.push('}');
        }
        Value::Array(items) if items.is_empty() => out.push_str("()"),
        Value::Array(items) => {
            out.push_str("(\n");
            for item in items {
                indent(out, depth + 1);
                write_value(out, item, depth + 1);
                out.push_str(",\n");
            }
            indent(out, depth);
            out.push(')');
        }
    }
}

fn quote(s: &str) -> String {
    if !s.is_empty() && UNQUOTED_TOKEN.is_match(s) {
        return s.to_string();
    }

    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}
