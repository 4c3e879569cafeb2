use std::fmt;

use serde::de::{Deserialize, Deserializer, Visitor};
use serde::ser::{Serialize, Serializer};

/// A scalar attribute value.
///
/// Attributes only carry scalars. Nested arrays and objects are not representable and are dropped
/// during validation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// An explicit null.
    Null,
    /// A boolean value.
    Bool(bool),
    /// A signed integer value.
    I64(i64),
    /// An unsigned integer value that does not fit into `i64`.
    U64(u64),
    /// A floating point value.
    F64(f64),
    /// A string value.
    String(String),
}

impl Value {
    /// Returns the string if this value is a string, otherwise `None`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(string) => Some(string.as_str()),
            _ => None,
        }
    }

    /// Constructs a `Value` from a `serde_json::Value`.
    ///
    /// Returns `None` for arrays and objects, which cannot be stored as attributes.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        Some(match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(value) => Value::Bool(value),
            serde_json::Value::Number(num) => {
                if let Some(val) = num.as_i64() {
                    Value::I64(val)
                } else if let Some(val) = num.as_u64() {
                    Value::U64(val)
                } else {
                    // NB: Without the "arbitrary_precision" feature, serde_json's number will
                    // always be one of these.
                    Value::F64(num.as_f64()?)
                }
            }
            serde_json::Value::String(val) => Value::String(val),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => return None,
        })
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match *self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(val) => serializer.serialize_bool(val),
            Value::I64(val) => serializer.serialize_i64(val),
            Value::U64(val) => serializer.serialize_u64(val),
            Value::F64(val) => serializer.serialize_f64(val),
            Value::String(ref val) => serializer.serialize_str(val),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ValueVisitor;

        impl Visitor<'_> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a scalar JSON value")
            }

            #[inline]
            fn visit_bool<E>(self, value: bool) -> Result<Value, E> {
                Ok(Value::Bool(value))
            }

            #[inline]
            fn visit_i64<E>(self, value: i64) -> Result<Value, E> {
                Ok(Value::I64(value))
            }

            #[inline]
            fn visit_u64<E>(self, value: u64) -> Result<Value, E> {
                Ok(match i64::try_from(value) {
                    Ok(signed) => Value::I64(signed),
                    Err(_) => Value::U64(value),
                })
            }

            #[inline]
            fn visit_f64<E>(self, value: f64) -> Result<Value, E> {
                Ok(Value::F64(value))
            }

            #[inline]
            fn visit_str<E>(self, value: &str) -> Result<Value, E> {
                Ok(Value::String(value.to_owned()))
            }

            #[inline]
            fn visit_string<E>(self, value: String) -> Result<Value, E> {
                Ok(Value::String(value))
            }

            #[inline]
            fn visit_none<E>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            #[inline]
            fn visit_unit<E>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::I64(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(signed) => Value::I64(signed),
            Err(_) => Value::U64(value),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(Value::from_json(serde_json::json!(null)), Some(Value::Null));
        assert_eq!(Value::from_json(serde_json::json!(true)), Some(Value::Bool(true)));
        assert_eq!(Value::from_json(serde_json::json!(-3)), Some(Value::I64(-3)));
        assert_eq!(
            Value::from_json(serde_json::json!(u64::MAX)),
            Some(Value::U64(u64::MAX))
        );
        assert_eq!(Value::from_json(serde_json::json!(1.5)), Some(Value::F64(1.5)));
        assert_eq!(
            Value::from_json(serde_json::json!("abc")),
            Some(Value::String("abc".to_owned()))
        );
    }

    #[test]
    fn test_from_json_nested_rejected() {
        assert_eq!(Value::from_json(serde_json::json!([1, 2])), None);
        assert_eq!(Value::from_json(serde_json::json!({"a": 1})), None);
    }

    #[test]
    fn test_deserialize_rejects_nested() {
        assert!(serde_json::from_str::<Value>("[1]").is_err());
        assert!(serde_json::from_str::<Value>(r#"{"a":1}"#).is_err());
        assert_eq!(serde_json::from_str::<Value>("null").unwrap(), Value::Null);
        assert_eq!(serde_json::from_str::<Value>("7").unwrap(), Value::I64(7));
    }

    #[test]
    fn test_from_u64_prefers_signed() {
        assert_eq!(Value::from(5u64), Value::I64(5));
        assert_eq!(Value::from(u64::MAX), Value::U64(u64::MAX));
    }
}
