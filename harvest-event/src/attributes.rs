use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::{Deserialize, Serialize};

use crate::Value;

/// Maximum length of an attribute key in bytes.
pub const MAX_KEY_LENGTH: usize = 255;

/// Maximum length of a string attribute value in bytes. Longer values are truncated.
pub const MAX_STRING_VALUE_LENGTH: usize = 255;

/// Maximum number of user attributes attached to a single event.
pub const MAX_USER_ATTRIBUTES: usize = 64;

/// A string-keyed map of scalar attribute values.
///
/// Iteration order is the lexical order of the keys. Ordering within a group is not part of the
/// wire contract, but a stable order keeps serialized records directly comparable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, Value>);

impl Attributes {
    /// Creates an empty attribute map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an attribute, replacing and returning a previous value with the same key.
    ///
    /// This does not validate the key or value. Use [`validate_user_attributes`] for untrusted
    /// input.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Returns the value for the given key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the number of attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over all attributes in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Reasons for dropping a single attribute during validation.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum InvalidAttribute {
    /// The key is empty.
    #[error("attribute key is empty")]
    EmptyKey,
    /// The key exceeds [`MAX_KEY_LENGTH`].
    #[error("attribute key is {len} bytes long, at most {max} are allowed")]
    KeyTooLong {
        /// Length of the rejected key in bytes.
        len: usize,
        /// The maximum allowed length.
        max: usize,
    },
    /// The value is an array or object.
    #[error("attribute value must be a scalar")]
    NotScalar,
    /// The value is a NaN or infinite float.
    #[error("attribute value is not a finite number")]
    NonFinite,
}

/// Truncates a string to at most `max` bytes without splitting a character.
fn truncate_string(mut value: String, max: usize) -> String {
    if value.len() > max {
        let mut end = max;
        while !value.is_char_boundary(end) {
            end -= 1;
        }
        value.truncate(end);
    }
    value
}

/// Validates an attribute key.
pub fn validate_key(key: &str) -> Result<(), InvalidAttribute> {
    if key.is_empty() {
        return Err(InvalidAttribute::EmptyKey);
    }

    if key.len() > MAX_KEY_LENGTH {
        return Err(InvalidAttribute::KeyTooLong {
            len: key.len(),
            max: MAX_KEY_LENGTH,
        });
    }

    Ok(())
}

/// Validates an attribute value, truncating overlong strings.
pub fn validate_value(value: Value) -> Result<Value, InvalidAttribute> {
    match value {
        Value::String(s) => Ok(Value::String(truncate_string(s, MAX_STRING_VALUE_LENGTH))),
        Value::F64(f) if !f.is_finite() => Err(InvalidAttribute::NonFinite),
        other => Ok(other),
    }
}

/// Validates a single key-value pair from untrusted JSON input.
pub fn validate_attribute(
    key: &str,
    value: serde_json::Value,
) -> Result<Value, InvalidAttribute> {
    validate_key(key)?;
    let value = Value::from_json(value).ok_or(InvalidAttribute::NotScalar)?;
    validate_value(value)
}

/// Validates user-supplied fields into an attribute group.
///
/// Invalid entries are dropped individually and never fail the whole group. At most
/// [`MAX_USER_ATTRIBUTES`] entries are kept, in key order.
///
/// # Example
///
/// ```
/// use harvest_event::validate_user_attributes;
///
/// let fields = serde_json::json!({"sku": "abc", "items": [1, 2], "price": 9.99});
/// let serde_json::Value::Object(fields) = fields else { unreachable!() };
///
/// let attributes = validate_user_attributes(fields);
/// assert_eq!(attributes.len(), 2);
/// assert!(attributes.get("items").is_none());
/// ```
pub fn validate_user_attributes(fields: serde_json::Map<String, serde_json::Value>) -> Attributes {
    let mut attributes = Attributes::new();

    for (key, value) in fields {
        if attributes.len() >= MAX_USER_ATTRIBUTES {
            harvest_log::debug!(
                max = MAX_USER_ATTRIBUTES,
                "dropping user attributes over limit"
            );
            break;
        }

        match validate_attribute(&key, value) {
            Ok(value) => {
                attributes.insert(key, value);
            }
            Err(error) => {
                harvest_log::debug!(key = %key, %error, "dropping invalid user attribute");
            }
        }
    }

    attributes
}
