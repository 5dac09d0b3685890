//! Contract metadata registry.
//!
//! Holds the minimum price increment for each futures contract, with an
//! instrument-level fallback for contracts the venue has not listed
//! individually.

pub mod error;
pub mod tick_cache;

pub use error::{RegistryError, RegistryResult};
pub use tick_cache::{TickSizeCache, TickSizeEntry, TickSizeSpec};
