//! df-route: duct routing for ductflow.
//!
//! Turns raw room demand points into one source-oriented duct tree:
//! - terminal derivation (grid snapping and row/column merging)
//! - per-level candidate graphs filtered through a building [`Envelope`]
//! - approximate Steiner trees with de-diagonalisation, kink elimination
//!   and artifact-leaf pruning
//! - composition of all levels, the vertical riser and the source
//!
//! Levels are routed in parallel with rayon; composition is sequential.

pub mod candidate;
pub mod compose;
pub mod config;
pub mod envelope;
pub mod error;
pub mod refine;
pub mod steiner;
pub mod terminal;

pub use candidate::{CandidateGraph, Trunk, build_candidate_graph};
pub use compose::compose;
pub use config::{DEFAULT_MAX_REPAIR_ITERATIONS, DeriverConfig, RouteConfig};
pub use envelope::{Envelope, Rect, RectEnvelope, Unbounded};
pub use error::{RouteError, RouteResult};
pub use refine::synthesize_level;
pub use steiner::steiner_tree;
pub use terminal::{LevelTerminals, RawTerminal, Terminal, derive_terminals, merge_coordinates, split_levels};

use df_core::Point;
use df_graph::{FlowDirection, LevelTree, Network};
use rayon::prelude::*;
use tracing::info;

/// Route every level independently (in parallel), lowest level first.
pub fn route_levels(
    levels: &[LevelTerminals],
    trunk: Trunk,
    envelope: &dyn Envelope,
    config: &RouteConfig,
) -> RouteResult<Vec<LevelTree>> {
    levels
        .par_iter()
        .map(|level| {
            let candidate = build_candidate_graph(level, trunk, envelope, config.max_repair_iterations)?;
            let tree = synthesize_level(&candidate)?;
            info!(
                elevation = level.elevation,
                terminals = level.terminals.len(),
                nodes = tree.graph.nodes().len(),
                length_m = tree.total_length().value,
                "level routed"
            );
            Ok(tree)
        })
        .collect()
}

/// Inputs of the whole routing stage.
#[derive(Debug, Clone)]
pub struct RouteRequest<'a> {
    pub terminals: &'a [RawTerminal],
    pub trunk: Trunk,
    pub source: Point,
    pub direction: FlowDirection,
}

/// Terminal derivation through composition in one call.
pub fn route_network(
    request: &RouteRequest<'_>,
    envelope: &dyn Envelope,
    config: &RouteConfig,
) -> RouteResult<Network> {
    let terminals = derive_terminals(request.terminals, &config.deriver)?;
    let levels = split_levels(&terminals);
    let trees = route_levels(&levels, request.trunk, envelope, config)?;
    compose(&trees, request.source, request.direction)
}
