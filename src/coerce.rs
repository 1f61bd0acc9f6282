//! Write-side coercion of value trees into their serializable form.
//!
//! Applied once per write, before any encoder runs, so both the native
//! and the XML encoder receive the same fully-coerced tree.

use crate::{
    error::Error,
    types::{Dictionary, Value},
};

/// Integers beyond this range have no native 64-bit representation and
/// are written as their decimal strings instead.
const INTEGER_MIN: i128 = i64::MIN as i128;
const INTEGER_MAX: i128 = i64::MAX as i128;

/// Coerces a dictionary for writing.
///
/// Booleans become the strings `"0"`/`"1"`, integers outside the signed
/// 64-bit range become decimal strings, and every string (keys included)
/// must be representable in the output text encoding.
pub fn coerce_dictionary(dict: &Dictionary) -> Result<Dictionary, Error> {
    dict.iter()
        .map(|(key, value)| {
            ensure_representable(key)?;
            Ok((key.clone(), coerce_value(value)?))
        })
        .collect()
}

fn coerce_value(value: &Value) -> Result<Value, Error> {
    match value {
        Value::String(s) => {
            ensure_representable(s)?;
            Ok(Value::String(s.clone()))
        }
        Value::Boolean(b) => Ok(Value::String(if *b { "1" } else { "0" }.to_string())),
        Value::Integer(i) if (INTEGER_MIN..=INTEGER_MAX).contains(i) => Ok(Value::Integer(*i)),
        Value::Integer(i) => Ok(Value::String(i.to_string())),
        Value::Real(r) => Ok(Value::Real(*r)),
        Value::Dictionary(dict) => Ok(Value::Dictionary(coerce_dictionary(dict)?)),
        Value::Array(items) => Ok(Value::Array(
            items.iter().map(coerce_value).collect::<Result<_, _>>()?,
        )),
    }
}

/// Rejects strings that cannot appear in an XML 1.0 document: control
/// characters other than tab, LF, and CR, and the U+FFFE/U+FFFF
/// non-characters.
fn ensure_representable(s: &str) -> Result<(), Error> {
    match s.chars().find(|c| !is_xml_char(*c)) {
        Some(c) => Err(Error::CannotRepresent(format!(
            "string contains unencodable character {:?}",
            c
        ))),
        None => Ok(()),
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict_of(entries: &[(&str, Value)]) -> Dictionary {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_booleans_become_zero_and_one() {
        let dict = dict_of(&[
            ("true_bool", Value::Boolean(true)),
            ("false_bool", Value::Boolean(false)),
        ]);
        let coerced = coerce_dictionary(&dict).unwrap();
        assert_eq!(coerced["true_bool"], Value::String("1".to_string()));
        assert_eq!(coerced["false_bool"], Value::String("0".to_string()));
    }

    #[test]
    fn test_in_range_integers_stay_numeric() {
        let dict = dict_of(&[("answer", Value::Integer(42))]);
        let coerced = coerce_dictionary(&dict).unwrap();
        assert_eq!(coerced["answer"], Value::Integer(42));
    }

    #[test]
    fn test_oversized_integers_become_decimal_strings() {
        let dict = dict_of(&[("big", Value::Integer(9_999_999_999_999_999_999_999_999))]);
        let coerced = coerce_dictionary(&dict).unwrap();
        assert_eq!(
            coerced["big"],
            Value::String("9999999999999999999999999".to_string())
        );

        // The boundary itself is representable.
        let dict = dict_of(&[("max", Value::Integer(i64::MAX as i128))]);
        let coerced = coerce_dictionary(&dict).unwrap();
        assert_eq!(coerced["max"], Value::Integer(i64::MAX as i128));

        let dict = dict_of(&[("min_minus_one", Value::Integer(i64::MIN as i128 - 1))]);
        let coerced = coerce_dictionary(&dict).unwrap();
        assert_eq!(
            coerced["min_minus_one"],
            Value::String("-9223372036854775809".to_string())
        );
    }

    #[test]
    fn test_coercion_recurses_through_containers() {
        let inner = dict_of(&[("flag", Value::Boolean(true))]);
        let dict = dict_of(&[(
            "array",
            Value::Array(vec![Value::Dictionary(inner), Value::Boolean(false)]),
        )]);

        let coerced = coerce_dictionary(&dict).unwrap();
        let Value::Array(items) = &coerced["array"] else {
            panic!("expected array");
        };
        assert_eq!(
            items[0],
            Value::Dictionary(dict_of(&[("flag", Value::String("1".to_string()))]))
        );
        assert_eq!(items[1], Value::String("0".to_string()));
    }

    #[test]
    fn test_unencodable_string_is_rejected() {
        let dict = dict_of(&[("invalid", Value::String("\u{0}".to_string()))]);
        let err = coerce_dictionary(&dict).unwrap_err();
        assert!(err.is_type_error());
        assert!(err.to_string().contains("could not convert value"));
    }

    #[test]
    fn test_unencodable_key_is_rejected() {
        let dict = dict_of(&[("bad\u{1}key", Value::String("fine".to_string()))]);
        assert!(coerce_dictionary(&dict).is_err());
    }

    #[test]
    fn test_whitespace_controls_are_allowed() {
        let dict = dict_of(&[("text", Value::String("line\nbreak\tand\rreturn".to_string()))]);
        assert!(coerce_dictionary(&dict).is_ok());
    }
}
