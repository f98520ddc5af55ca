//! Error types for the hydraulic model and solver.

use df_core::{CoreError, EdgeId};
use df_graph::GraphError;
use thiserror::Error;

/// Errors that can occur while building or solving the hydraulic model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HydraulicError {
    #[error("Hydraulic solve did not converge after {iterations} iterations (residual = {residual:e})")]
    HydraulicSolve { iterations: usize, residual: f64 },

    #[error("Edge {edge} has no cross-section; size the network first")]
    NotSized { edge: EdgeId },

    #[error("Numeric error: {what}")]
    Numeric { what: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
}

pub type HydraulicResult<T> = Result<T, HydraulicError>;

impl From<HydraulicError> for CoreError {
    fn from(e: HydraulicError) -> Self {
        match e {
            HydraulicError::HydraulicSolve { .. } => CoreError::InvalidArg {
                what: "convergence",
            },
            HydraulicError::NotSized { .. } => CoreError::InvalidArg {
                what: "unsized edge",
            },
            HydraulicError::Numeric { .. } => CoreError::InvalidArg { what: "numeric" },
            HydraulicError::InvalidArg { what } => CoreError::InvalidArg { what },
            HydraulicError::Graph(_) => CoreError::InvalidArg { what: "graph" },
        }
    }
}
