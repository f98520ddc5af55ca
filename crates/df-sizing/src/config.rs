//! Sizing configuration.

use df_core::units::{Length, Velocity, mps};

/// Default design air velocity in ducts, m/s.
pub const DEFAULT_TARGET_VELOCITY_MPS: f64 = 3.0;

/// Which catalog a section is chosen from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DuctShape {
    Round,
    Rectangular,
    /// Round where it fits, rectangular otherwise.
    #[default]
    Optimal,
}

impl DuctShape {
    pub fn as_str(self) -> &'static str {
        match self {
            DuctShape::Round => "round",
            DuctShape::Rectangular => "rectangular",
            DuctShape::Optimal => "optimal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingConfig {
    pub target_velocity: Velocity,
    pub shape: DuctShape,
    /// Vertical installation space; `None` leaves sections unbounded.
    pub clearance: Option<Length>,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            target_velocity: mps(DEFAULT_TARGET_VELOCITY_MPS),
            shape: DuctShape::default(),
            clearance: None,
        }
    }
}
