//! Routing configuration.

use df_core::COORD_DECIMALS;

/// Default cap on edge reinstatement attempts when envelope filtering
/// disconnects a level.
pub const DEFAULT_MAX_REPAIR_ITERATIONS: usize = 200;

/// Terminal grid-snapping parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeriverConfig {
    /// Decimals coordinates are rounded to.
    pub decimals: u32,
    /// Coordinates closer than this (metres) on one axis are averaged together.
    pub merge_threshold: f64,
}

impl Default for DeriverConfig {
    fn default() -> Self {
        Self {
            decimals: COORD_DECIMALS,
            merge_threshold: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteConfig {
    pub deriver: DeriverConfig,
    /// Bound on the topology repair loop (see [`DEFAULT_MAX_REPAIR_ITERATIONS`]).
    pub max_repair_iterations: usize,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            deriver: DeriverConfig::default(),
            max_repair_iterations: DEFAULT_MAX_REPAIR_ITERATIONS,
        }
    }
}
