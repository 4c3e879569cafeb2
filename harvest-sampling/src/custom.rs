//! Custom events recorded through the public agent API.

use harvest_common::Timestamp;
use harvest_event::{
    Attributes, EventRecord, InvalidEventType, validate_event_type, validate_user_attributes,
};
use harvest_log::LogError;

use crate::config::CustomEventsConfig;
use crate::{Admission, EventReservoir, RandomSource, ReservoirError};

/// Raised if a custom event is rejected before it reaches the reservoir.
#[derive(Debug, thiserror::Error)]
pub enum CustomEventError {
    /// No attribute map was passed.
    #[error("custom event has no attributes")]
    MissingAttributes,
    /// The event type failed validation.
    #[error("invalid custom event type")]
    InvalidType(#[from] InvalidEventType),
    /// Custom events are disabled by configuration.
    #[error("custom events are disabled")]
    Disabled,
}

/// Builds a custom event and adds it to the reservoir.
///
/// The record carries the intrinsics `type` and `timestamp` (fractional seconds), the validated
/// user attributes, and no agent attributes. Invalid attributes are dropped individually. A
/// missing attribute map or an invalid type rejects the event without touching the reservoir.
///
/// # Example
///
/// ```
/// use harvest_common::Timestamp;
/// use harvest_sampling::{build_custom_event, seeded_rng, EventReservoir};
///
/// let mut reservoir = EventReservoir::new(10).unwrap();
/// let mut rng = seeded_rng(0);
///
/// let fields = serde_json::json!({"sku": "abc"}).as_object().cloned();
/// let now = Timestamp::from_micros(1_500_000);
/// build_custom_event(&mut reservoir, "Purchase", fields, now, &mut rng).unwrap();
///
/// assert_eq!(
///     reservoir.to_json().unwrap(),
///     r#"[[{"timestamp":1.5,"type":"Purchase"},{"sku":"abc"},{}]]"#
/// );
/// ```
pub fn build_custom_event<R>(
    reservoir: &mut EventReservoir,
    type_name: &str,
    fields: Option<serde_json::Map<String, serde_json::Value>>,
    now: Timestamp,
    rng: &mut R,
) -> Result<Admission, CustomEventError>
where
    R: RandomSource + ?Sized,
{
    let fields = fields.ok_or(CustomEventError::MissingAttributes)?;
    validate_event_type(type_name)?;

    let user_attributes = validate_user_attributes(fields);

    let mut intrinsics = Attributes::new();
    intrinsics.insert("type", type_name);
    intrinsics.insert("timestamp", now.as_secs_f64());

    let record = EventRecord::new(intrinsics, user_attributes, Attributes::new());
    Ok(reservoir.add(record, rng))
}

/// Collects custom events for one harvest cycle.
#[derive(Debug)]
pub struct CustomEvents {
    enabled: bool,
    reservoir: EventReservoir,
}

impl CustomEvents {
    /// Creates the collector from configuration.
    pub fn new(config: &CustomEventsConfig) -> Result<Self, ReservoirError> {
        Ok(Self {
            enabled: config.enabled,
            reservoir: EventReservoir::new(config.max_samples_stored)?,
        })
    }

    /// Records a custom event, logging and swallowing any rejection.
    ///
    /// Returns `true` if the event is stored in the reservoir.
    pub fn record<R>(
        &mut self,
        type_name: &str,
        fields: Option<serde_json::Map<String, serde_json::Value>>,
        now: Timestamp,
        rng: &mut R,
    ) -> bool
    where
        R: RandomSource + ?Sized,
    {
        self.try_record(type_name, fields, now, rng)
            .inspect_err(|error| {
                harvest_log::debug!("dropping custom event: {}", LogError(error));
            })
            .is_ok_and(Admission::is_stored)
    }

    /// Records a custom event and reports the outcome.
    pub fn try_record<R>(
        &mut self,
        type_name: &str,
        fields: Option<serde_json::Map<String, serde_json::Value>>,
        now: Timestamp,
        rng: &mut R,
    ) -> Result<Admission, CustomEventError>
    where
        R: RandomSource + ?Sized,
    {
        if !self.enabled {
            return Err(CustomEventError::Disabled);
        }

        build_custom_event(&mut self.reservoir, type_name, fields, now, rng)
    }

    /// The reservoir of the current harvest cycle.
    pub fn reservoir(&self) -> &EventReservoir {
        &self.reservoir
    }

    /// Takes the events of the finished cycle and starts a new, empty reservoir.
    pub fn harvest(&mut self) -> EventReservoir {
        self.reservoir.take()
    }
}
