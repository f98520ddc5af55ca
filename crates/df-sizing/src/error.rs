//! Error types for duct sizing.

use df_core::{CoreError, EdgeId};
use thiserror::Error;

/// Errors that can occur while sizing a network.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SizingError {
    #[error(
        "Installation space too low on edge {edge}: need {required_m2:.4} m² within {clearance_mm:.0} mm clearance"
    )]
    NoFit {
        edge: EdgeId,
        required_m2: f64,
        clearance_mm: f64,
    },

    #[error("Empty catalog: {what}")]
    EmptyCatalog { what: &'static str },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Non-physical flow on edge {edge}: {value} m³/s")]
    NonPhysicalFlow { edge: EdgeId, value: f64 },
}

pub type SizingResult<T> = Result<T, SizingError>;

impl From<SizingError> for CoreError {
    fn from(e: SizingError) -> Self {
        match e {
            SizingError::NoFit { .. } => CoreError::InvalidArg {
                what: "installation space too low",
            },
            SizingError::EmptyCatalog { what } => CoreError::InvalidArg { what },
            SizingError::InvalidArg { what } => CoreError::InvalidArg { what },
            SizingError::NonPhysicalFlow { value, .. } => CoreError::NonFinite {
                what: "edge flow",
                value,
            },
        }
    }
}
