//! df-core: stable foundation for ductflow.
//!
//! Contains:
//! - units (uom SI types + constructors, air properties)
//! - numeric (Real + tolerances + rounding helpers)
//! - ids (stable compact IDs for graph objects)
//! - geometry (points, grid keys, axes)
//! - section (duct cross-sections)
//! - error (shared error types)

pub mod error;
pub mod geometry;
pub mod ids;
pub mod numeric;
pub mod section;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use geometry::{Axis, GridKey, Point, angle_between_deg, axis_straight, passes_straight};
pub use ids::*;
pub use numeric::*;
pub use section::CrossSection;
pub use units::*;
