//! Sampling of units of work and events within harvest cycles.
//!
//! An application monitoring agent must bound the telemetry it sends per reporting interval (the
//! *harvest cycle*) without skewing the statistics derived from it. This crate implements the two
//! mechanisms that do this:
//!
//! - [`HarvestState`] decides once per unit of work (e.g. a transaction) whether it should be
//!   fully captured, aiming for a target number of samples per cycle.
//! - [`EventReservoir`] stores captured event records up to a fixed capacity, and replaces stored
//!   records at random once full, so that every event seen during the cycle has the same chance
//!   of being reported.
//!
//! The two share no state and are composed by the caller:
//!
//! ```
//! use harvest_common::{TimeDelta, Timestamp};
//! use harvest_event::{Attributes, EventRecord};
//! use harvest_sampling::{seeded_rng, EventReservoir, HarvestState};
//!
//! let connected = Timestamp::from_secs(0);
//! let mut state = HarvestState::new(connected, TimeDelta::from_secs(60), 10, connected);
//! let mut reservoir = EventReservoir::new(100).unwrap();
//! let mut rng = seeded_rng(0);
//!
//! let now = Timestamp::from_secs(1);
//! if state.should_sample(&mut rng, now) {
//!     let mut intrinsics = Attributes::new();
//!     intrinsics.insert("type", "Transaction");
//!     intrinsics.insert("timestamp", now.as_secs_f64());
//!
//!     let record = EventRecord::new(intrinsics, Attributes::new(), Attributes::new());
//!     reservoir.add(record, &mut rng);
//! }
//!
//! assert_eq!(reservoir.saved_count(), 1);
//! ```
//!
//! # Randomness and Time
//!
//! Neither component reads global state. Random draws go through an injected [`RandomSource`],
//! which is implemented for every [`rand::Rng`]. Use [`seeded_rng`] for reproducible decisions.
//! The current time is passed explicitly as a [`Timestamp`](harvest_common::Timestamp) in
//! microseconds.
//!
//! # Concurrency
//!
//! All operations are synchronous and run in bounded time. Neither type synchronizes internally.
//! Callers on multiple threads must guard each instance, for example with a mutex, or keep one
//! instance per worker.
#![warn(missing_docs)]

mod config;
mod custom;
mod harvest;
mod reservoir;
mod rng;

pub use self::config::*;
pub use self::custom::*;
pub use self::harvest::*;
pub use self::reservoir::*;
pub use self::rng::*;
