//! overhead-core: Pure identity-resolution library for nearby-aircraft lookup.
//!
//! No async, no network — shared types, the type/manufacturer lookup table,
//! geodistance filtering, and configuration. This crate is the core used by
//! both `overhead-resolver` (remote resolution) and `overhead-cli`.

pub mod config;
pub mod geo;
pub mod lookup;
pub mod types;

// Re-export commonly used types at crate root
pub use geo::{distance_km, BoundingBox, Coordinate, SearchRadius};
pub use lookup::TypeDescriptionIndex;
pub use types::*;
