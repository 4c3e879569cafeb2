use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Attributes;

/// An immutable event payload built from three ordered attribute groups.
///
/// Serializes to `[intrinsics, user_attributes, agent_attributes]`. Absent groups are empty
/// objects, so the array always has exactly three elements.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventRecord {
    intrinsics: Attributes,
    user_attributes: Attributes,
    agent_attributes: Attributes,
}

impl EventRecord {
    /// Creates a record from its three attribute groups.
    pub fn new(
        intrinsics: Attributes,
        user_attributes: Attributes,
        agent_attributes: Attributes,
    ) -> Self {
        Self {
            intrinsics,
            user_attributes,
            agent_attributes,
        }
    }

    /// Built-in fields such as `type` and `timestamp`.
    pub fn intrinsics(&self) -> &Attributes {
        &self.intrinsics
    }

    /// Attributes supplied by the instrumented application.
    pub fn user_attributes(&self) -> &Attributes {
        &self.user_attributes
    }

    /// Attributes derived by the agent.
    pub fn agent_attributes(&self) -> &Attributes {
        &self.agent_attributes
    }

    /// Serializes the record into its JSON wire form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses a record from its JSON wire form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Serialize for EventRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (
            &self.intrinsics,
            &self.user_attributes,
            &self.agent_attributes,
        )
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EventRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (intrinsics, user_attributes, agent_attributes) =
            <(Attributes, Attributes, Attributes)>::deserialize(deserializer)?;

        Ok(Self {
            intrinsics,
            user_attributes,
            agent_attributes,
        })
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_json_snapshot;
    use similar_asserts::assert_eq;

    use super::*;
    use crate::Value;

    fn custom_event() -> EventRecord {
        let mut intrinsics = Attributes::new();
        intrinsics.insert("type", "Purchase");
        intrinsics.insert("timestamp", 1.5);

        let mut user = Attributes::new();
        user.insert("sku", "abc");
        user.insert("quantity", 3i64);

        EventRecord::new(intrinsics, user, Attributes::new())
    }

    #[test]
    fn test_serialize_group_order() {
        assert_eq!(
            custom_event().to_json().unwrap(),
            r#"[{"timestamp":1.5,"type":"Purchase"},{"quantity":3,"sku":"abc"},{}]"#
        );
    }

    #[test]
    fn test_empty_record_has_three_groups() {
        assert_eq!(EventRecord::default().to_json().unwrap(), "[{},{},{}]");
    }

    #[test]
    fn test_snapshot() {
        let mut agent = Attributes::new();
        agent.insert("host", "web-1");
        let event = EventRecord::new(
            custom_event().intrinsics().clone(),
            custom_event().user_attributes().clone(),
            agent,
        );

        assert_json_snapshot!(event, @r###"
        [
          {
            "timestamp": 1.5,
            "type": "Purchase"
          },
          {
            "quantity": 3,
            "sku": "abc"
          },
          {
            "host": "web-1"
          }
        ]
        "###);
    }

    #[test]
    fn test_parse() {
        let record =
            EventRecord::from_json(r#"[{"type":"A"},{"x":null},{"host":"web-1"}]"#).unwrap();
        assert_eq!(record.intrinsics().get("type"), Some(&Value::from("A")));
        assert_eq!(record.user_attributes().get("x"), Some(&Value::Null));
        assert_eq!(
            record.agent_attributes().get("host").and_then(Value::as_str),
            Some("web-1")
        );
    }

    #[test]
    fn test_parse_wrong_shape() {
        assert!(EventRecord::from_json("[{},{}]").is_err());
        assert!(EventRecord::from_json(r#"{"type":"A"}"#).is_err());
        assert!(EventRecord::from_json(r#"[{"a":[1]},{},{}]"#).is_err());
    }
}
