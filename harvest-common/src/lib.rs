//! Common functionality for the harvest sampling crates.
#![warn(missing_docs)]

mod time;

pub use crate::time::*;
