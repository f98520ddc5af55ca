//! End-to-end design pipeline: route, size, balance.

use std::time::Instant;

use df_core::units::in_m3ph;
use df_graph::{LevelTree, Network};
use df_hydraulics::{BalanceResult, balance_network};
use df_project::schema::Design;
use df_route::{Envelope, Unbounded, compose, derive_terminals, route_levels, split_levels};
use df_sizing::{SizingSummary, size_network};
use tracing::info;

use crate::design_compile::{DesignInputs, compile_design};
use crate::error::AppResult;
use crate::progress::{DesignProgressEvent, DesignStage};

/// One routed level, for listings.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelSummary {
    pub elevation: f64,
    pub terminals: usize,
    pub nodes: usize,
    pub edges: usize,
    pub length_m: f64,
    pub demand_m3ph: f64,
}

impl LevelSummary {
    fn of(tree: &LevelTree) -> Self {
        let demand = tree
            .graph
            .terminals()
            .filter_map(|n| n.demand.as_ref())
            .map(|d| in_m3ph(d.flow))
            .sum();
        Self {
            elevation: tree.elevation,
            terminals: tree.terminal_count(),
            nodes: tree.graph.nodes().len(),
            edges: tree.graph.edges().len(),
            length_m: tree.total_length().value,
            demand_m3ph: demand,
        }
    }
}

/// Result of a full design run.
#[derive(Debug, Clone)]
pub struct DesignOutcome {
    pub name: String,
    pub network: Network,
    pub levels: Vec<LevelSummary>,
    pub sizing: SizingSummary,
    pub balance: BalanceResult,
}

fn envelope_of(inputs: &DesignInputs) -> &dyn Envelope {
    match &inputs.envelope {
        Some(envelope) => envelope,
        None => &Unbounded,
    }
}

fn route_trees(inputs: &DesignInputs) -> AppResult<Vec<LevelTree>> {
    let terminals = derive_terminals(&inputs.terminals, &inputs.route.deriver)?;
    let levels = split_levels(&terminals);
    Ok(route_levels(&levels, inputs.trunk, envelope_of(inputs), &inputs.route)?)
}

/// Route every level without composing the building network.
pub fn route_design_levels(design: &Design) -> AppResult<Vec<LevelSummary>> {
    let inputs = compile_design(design);
    let trees = route_trees(&inputs)?;
    Ok(trees.iter().map(LevelSummary::of).collect())
}

pub fn run_design(design: &Design) -> AppResult<DesignOutcome> {
    run_design_with_progress(design, None)
}

pub fn run_design_with_progress(
    design: &Design,
    mut progress_cb: Option<&mut dyn FnMut(DesignProgressEvent)>,
) -> AppResult<DesignOutcome> {
    let started = Instant::now();
    let mut emit = |stage: DesignStage, message: Option<String>| {
        if let Some(cb) = progress_cb.as_mut() {
            cb(DesignProgressEvent {
                stage,
                elapsed_wall_s: started.elapsed().as_secs_f64(),
                message,
            });
        }
    };

    emit(DesignStage::Compiling, Some(format!("Compiling '{}'", design.name)));
    let inputs = compile_design(design);

    emit(
        DesignStage::Routing,
        Some(format!("Routing {} terminals", inputs.terminals.len())),
    );
    let trees = route_trees(&inputs)?;
    let levels: Vec<LevelSummary> = trees.iter().map(LevelSummary::of).collect();
    let mut network = compose(&trees, inputs.source, inputs.direction)?;

    emit(DesignStage::Sizing, None);
    let sizing = size_network(&mut network, &inputs.catalog, &inputs.sizing)?;

    emit(DesignStage::Balancing, None);
    let balance = balance_network(&mut network, &inputs.balance)?;

    info!(
        design = %inputs.name,
        levels = levels.len(),
        nodes = network.graph().nodes().len(),
        total_flow_m3ph = in_m3ph(sizing.total_flow),
        total_loss = balance.reported_total(),
        unit = balance.unit.as_str(),
        "design completed"
    );
    emit(
        DesignStage::Completed,
        Some(format!(
            "Total pressure loss {:.1} {}",
            balance.reported_total(),
            balance.unit
        )),
    );

    Ok(DesignOutcome {
        name: inputs.name,
        network,
        levels,
        sizing,
        balance,
    })
}
