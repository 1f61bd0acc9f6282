use plistcodec::formats::AsciiFormat;
use plistcodec::traits::Parser;
use plistcodec::{
    Backend, Dictionary, Value as PlistValue, read_from_path, write_to_path, write_to_path_with,
};
use proptest::prelude::*;

fn key_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z][a-zA-Z0-9_. -]{0,15}").expect("valid key regex")
}

fn string_value_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z0-9 _\\-\\.,!\\?<>&'\"]{0,30}")
        .expect("valid value regex")
}

fn value_strategy() -> impl Strategy<Value = PlistValue> {
    let leaf = prop_oneof![
        string_value_strategy().prop_map(PlistValue::String),
        any::<i64>().prop_map(|i| PlistValue::Integer(i as i128)),
        (-1.0e12..1.0e12f64).prop_map(PlistValue::Real),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(PlistValue::Array),
            prop::collection::btree_map(key_strategy(), inner, 0..4)
                .prop_map(PlistValue::Dictionary),
        ]
    })
}

fn dictionary_strategy() -> impl Strategy<Value = Dictionary> {
    prop::collection::btree_map(key_strategy(), value_strategy(), 1..6)
}

fn string_tree_strategy() -> impl Strategy<Value = Dictionary> {
    let leaf = string_value_strategy().prop_map(PlistValue::String);
    let value = leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(PlistValue::Array),
            prop::collection::btree_map(key_strategy(), inner, 0..4)
                .prop_map(PlistValue::Dictionary),
        ]
    });
    prop::collection::btree_map(key_strategy(), value, 1..6)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn xml_write_read_roundtrip_preserves_trees(dict in dictionary_strategy()) {
        let tmp = tempfile::tempdir().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let path = tmp.path().join("roundtrip.plist");

        write_to_path_with(&dict, &path, &Backend::Unusable)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let result = read_from_path(&path).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(result, dict);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn default_backend_write_read_roundtrip_preserves_trees(dict in dictionary_strategy()) {
        let tmp = tempfile::tempdir().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let path = tmp.path().join("roundtrip.plist");

        write_to_path(&dict, &path).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let result = read_from_path(&path).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(result, dict);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn ascii_write_read_roundtrip_preserves_string_trees(dict in string_tree_strategy()) {
        let tmp = tempfile::tempdir().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let path = tmp.path().join("roundtrip.pbxproj");

        AsciiFormat::from(dict.clone())
            .write_to(&path)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let result = Dictionary::try_from(
            AsciiFormat::read_from(&path).map_err(|e| TestCaseError::fail(e.to_string()))?,
        )
        .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(result, dict);
    }
}
