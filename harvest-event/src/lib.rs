//! Event records and attributes for the harvest sampling crates.
//!
//! An [`EventRecord`] is assembled from three ordered groups of attributes:
//!
//!  1. intrinsics, the built-in fields such as `type` and `timestamp`,
//!  2. user attributes, supplied by the instrumented application,
//!  3. agent attributes, derived by the agent itself.
//!
//! Each group is an [`Attributes`] map of scalar [`Value`]s. A record serializes to a JSON array
//! with exactly three objects in this order, which is the shape expected by the collector:
//!
//! ```json
//! [{"type":"Purchase","timestamp":1.5},{"sku":"abc"},{}]
//! ```
//!
//! User supplied data passes through [`validate_user_attributes`] before it becomes part of a
//! record, and custom event types are checked with [`validate_event_type`].

#![warn(missing_docs)]

mod attributes;
mod event_type;
mod record;
mod value;

pub use self::attributes::*;
pub use self::event_type::*;
pub use self::record::*;
pub use self::value::*;
