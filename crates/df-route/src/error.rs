//! Error types for routing (stages 1-4).

use df_core::Point;
use df_graph::GraphError;
use thiserror::Error;

/// Errors raised while deriving terminals and synthesising the duct tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouteError {
    #[error("Invalid terminal '{room}': {reason}")]
    InvalidTerminal { room: String, reason: String },

    #[error("Terminal '{room}' at {position} lies outside the envelope of level z={elevation}")]
    EnvelopeViolation {
        room: String,
        position: Point,
        elevation: f64,
    },

    #[error(
        "Level z={elevation}: {unreachable} required node(s) unreachable from the trunk (first at {first}) after {iterations} repair iterations"
    )]
    Topology {
        elevation: f64,
        unreachable: usize,
        first: Point,
        iterations: usize,
    },

    #[error("Connecting {a} to {b} would close a cycle")]
    DuplicateConnection { a: Point, b: Point },

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
}

pub type RouteResult<T> = Result<T, RouteError>;
