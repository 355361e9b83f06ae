//! cf-core: shared types, IDs, errors, configuration, and time-range parsing.
//!
//! This crate is the foundational dependency for all other cf-* crates,
//! providing the unified error type, application configuration, typed job
//! identifiers, and the parser that turns `mm:ss-mm:ss` lists into
//! [`RangeList`]s.

pub mod config;
pub mod error;
pub mod ids;
pub mod range;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use ids::JobId;
pub use range::{RangeError, RangeList, TimeRange};
