//! Untyped values held by the defaults store.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// A string-keyed mapping of values, as stored in a single domain.
pub type Dictionary = BTreeMap<String, Value>;

/// A value stored under a key.
///
/// The store does not enforce that a key always holds the same variant. Typed reads on
/// [`SettingsStore`](crate::SettingsStore) coerce whatever is stored into the requested shape.
/// Absence is modelled as `Option::None`, never as a variant.
///
/// The serialized form is externally tagged so the exact variant survives persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Signed integer number.
    Integer(i64),
    /// Floating-point number. Non-finite values are stored as `"NaN"`, `"inf"` or `"-inf"`.
    Float(#[serde(with = "float")] f64),
    /// Boolean, treated as a number by coercions.
    Bool(bool),
    /// UTF-8 string.
    String(String),
    /// Raw byte sequence.
    Data(#[serde(with = "serde_bytes")] Vec<u8>),
    /// Ordered sequence of values.
    Array(Vec<Value>),
    /// String-keyed mapping of values.
    Dictionary(Dictionary),
}

mod float {
    use serde::{de, Deserialize, Deserializer, Serializer};

    const NAN: &str = "NaN";
    const INFINITY: &str = "inf";
    const NEG_INFINITY: &str = "-inf";

    pub(super) fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_str(NAN)
        } else if *value == f64::INFINITY {
            serializer.serialize_str(INFINITY)
        } else if *value == f64::NEG_INFINITY {
            serializer.serialize_str(NEG_INFINITY)
        } else {
            serializer.serialize_f64(*value)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(value),
            Repr::Text(text) => match text.as_str() {
                NAN => Ok(f64::NAN),
                INFINITY => Ok(f64::INFINITY),
                NEG_INFINITY => Ok(f64::NEG_INFINITY),
                _ => Err(de::Error::invalid_value(
                    de::Unexpected::Str(&text),
                    &"a number, \"NaN\", \"inf\" or \"-inf\"",
                )),
            },
        }
    }
}

impl Value {
    /// Wrap raw bytes as a [`Value::Data`].
    pub fn data(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Data(bytes.into())
    }

    /// Convert a JSON value into a store value.
    ///
    /// `null` has no representation and yields `None`. Null members of objects are dropped;
    /// an array containing `null` cannot be represented and yields `None` as a whole.
    pub fn from_json(json: serde_json::Value) -> Option<Self> {
        match json {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(b) => Some(Value::Bool(b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Value::Integer(i)),
                None => n.as_f64().map(Value::Float),
            },
            serde_json::Value::String(s) => Some(Value::String(s)),
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(Value::from_json)
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
            serde_json::Value::Object(members) => Some(Value::Dictionary(
                members
                    .into_iter()
                    .filter_map(|(key, value)| Some((key, Value::from_json(value)?)))
                    .collect(),
            )),
        }
    }

    /// Convert this value into JSON.
    ///
    /// Byte sequences become arrays of numbers and non-finite floats become `null`, matching
    /// how `serde_json` represents those types.
    pub fn into_json(self) -> serde_json::Value {
        match self {
            Value::Integer(i) => i.into(),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Bool(b) => b.into(),
            Value::String(s) => s.into(),
            Value::Data(bytes) => bytes.into(),
            Value::Array(items) => items.into_iter().map(Value::into_json).collect(),
            Value::Dictionary(members) => serde_json::Value::Object(
                members
                    .into_iter()
                    .map(|(key, value)| (key, value.into_json()))
                    .collect(),
            ),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value.into())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(value: [T; N]) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(value: BTreeMap<String, T>) -> Self {
        Value::Dictionary(value.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Value>> From<HashMap<String, T>> for Value {
    fn from(value: HashMap<String, T>) -> Self {
        Value::Dictionary(value.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Value>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Value::Array(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn from_json_keeps_integer_and_float_apart() {
        assert_eq!(Value::from_json(json!(3)), Some(Value::Integer(3)));
        assert_eq!(Value::from_json(json!(3.5)), Some(Value::Float(3.5)));
        assert_eq!(Value::from_json(json!(u64::MAX)), Some(Value::Float(u64::MAX as f64)));
    }

    #[test]
    fn from_json_handles_null() {
        assert_eq!(Value::from_json(json!(null)), None);
        assert_eq!(Value::from_json(json!([1, null])), None);
        assert_eq!(
            Value::from_json(json!({ "kept": 1, "dropped": null })),
            Some(Value::from(BTreeMap::from([("kept".to_owned(), 1)])))
        );
    }

    #[test]
    fn nested_json_converts_both_ways() {
        let json = json!({ "theme": "dark", "sizes": [1, 2.5, true] });

        let value = Value::from_json(json.clone()).expect("object is representable");

        assert_eq!(value.into_json(), json);
    }

    #[test]
    fn serialized_form_preserves_variant() {
        let values = [
            Value::Integer(1),
            Value::Float(1.0),
            Value::Bool(true),
            Value::data(vec![1, 2, 3]),
            Value::from(["a", "b"]),
        ];

        for value in values {
            let text = serde_json::to_string(&value).expect("serializes");
            let decoded: Value = serde_json::from_str(&text).expect("deserializes");
            assert_eq!(decoded, value, "{text}");
        }
    }

    #[test]
    fn non_finite_floats_survive_serialization() {
        for float in [f64::INFINITY, f64::NEG_INFINITY] {
            let text = serde_json::to_string(&Value::Float(float)).expect("serializes");
            let decoded: Value = serde_json::from_str(&text).expect("deserializes");
            assert_eq!(decoded, Value::Float(float), "{text}");
        }

        let text = serde_json::to_string(&Value::Float(f64::NAN)).expect("serializes");
        assert_eq!(text, r#"{"Float":"NaN"}"#);
        let decoded: Value = serde_json::from_str(&text).expect("deserializes");
        assert!(matches!(decoded, Value::Float(f) if f.is_nan()));

        serde_json::from_str::<Value>(r#"{"Float":"lots"}"#).expect_err("not a float");
    }
}
