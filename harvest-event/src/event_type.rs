use once_cell::sync::Lazy;
use regex::Regex;

use crate::MAX_KEY_LENGTH;

/// Matches any character that is not allowed in a custom event type.
static INVALID_CHAR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9:_ ]").unwrap());

/// Raised if a custom event type is rejected.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum InvalidEventType {
    /// The event type is empty.
    #[error("event type is empty")]
    Empty,
    /// The event type is longer than [`MAX_KEY_LENGTH`].
    #[error("event type is {len} bytes long, at most {max} are allowed")]
    TooLong {
        /// Length of the rejected type in bytes.
        len: usize,
        /// The maximum allowed length.
        max: usize,
    },
    /// The event type contains a character outside of `[A-Za-z0-9:_ ]`.
    #[error("event type contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// Validates the type name of a custom event.
///
/// Valid types are non-empty, at most [`MAX_KEY_LENGTH`] bytes long, and consist only of ASCII
/// letters, digits, colons, underscores and spaces.
///
/// # Example
///
/// ```
/// use harvest_event::{validate_event_type, InvalidEventType};
///
/// assert!(validate_event_type("valid_Type 1").is_ok());
/// assert_eq!(
///     validate_event_type("alpha!"),
///     Err(InvalidEventType::InvalidCharacter('!'))
/// );
/// ```
pub fn validate_event_type(type_name: &str) -> Result<(), InvalidEventType> {
    if type_name.is_empty() {
        return Err(InvalidEventType::Empty);
    }

    if type_name.len() > MAX_KEY_LENGTH {
        return Err(InvalidEventType::TooLong {
            len: type_name.len(),
            max: MAX_KEY_LENGTH,
        });
    }

    let invalid = INVALID_CHAR_REGEX
        .find(type_name)
        .and_then(|m| m.as_str().chars().next());

    if let Some(c) = invalid {
        return Err(InvalidEventType::InvalidCharacter(c));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn test_valid_types() {
        for ty in ["valid_Type 1", "Purchase", "ns:Event", "a", " ", "___"] {
            assert_eq!(validate_event_type(ty), Ok(()), "{ty:?}");
        }
    }

    #[test]
    fn test_invalid_characters() {
        let cases = [
            ("alpha!", '!'),
            ("a-b", '-'),
            ("a.b", '.'),
            ("tab\there", '\t'),
            ("ünïcode", 'ü'),
            ("line\n", '\n'),
            ("two!?", '!'),
        ];

        for (ty, c) in cases {
            assert_eq!(
                validate_event_type(ty),
                Err(InvalidEventType::InvalidCharacter(c)),
                "{ty:?}"
            );
        }
    }

    #[test]
    fn test_invalid_character_message() {
        let error = validate_event_type("alpha!").unwrap_err();
        assert_eq!(error.to_string(), "event type contains invalid character '!'");
    }

    #[test]
    fn test_empty() {
        assert_eq!(validate_event_type(""), Err(InvalidEventType::Empty));
    }

    #[test]
    fn test_length_limit() {
        assert_eq!(validate_event_type(&"a".repeat(MAX_KEY_LENGTH)), Ok(()));
        assert_eq!(
            validate_event_type(&"a".repeat(MAX_KEY_LENGTH + 1)),
            Err(InvalidEventType::TooLong { len: 256, max: 255 })
        );
    }
}
