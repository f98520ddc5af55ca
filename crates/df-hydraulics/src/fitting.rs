//! Junction fitting classification.
//!
//! Every node except the source is a fitting between its parent edge (towards
//! the source) and its child edges. The loss coefficient of a fitting is
//! stored on the child edge it feeds and is referenced to that edge's velocity.

use df_core::{CrossSection, EdgeId, NodeId, angle_between_deg, passes_straight};
use df_graph::{Capabilities, FlowDirection, Network, NodeRole};
use tracing::debug;

use crate::error::{HydraulicError, HydraulicResult};
use crate::loss;

/// What a node is, seen as a duct fitting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FittingKind {
    /// The air-handling unit connection.
    Source,
    /// A room outlet at the end of a run.
    TerminalEnd,
    /// A pass-through node with no change of direction or size.
    Straight,
    Bend { angle_deg: f64 },
    Contraction,
    Expansion,
    /// Junction whose child continues straight on from the parent.
    Tee,
    /// Junction where no child continues straight on.
    Splitter,
}

impl FittingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FittingKind::Source => "source",
            FittingKind::TerminalEnd => "terminal",
            FittingKind::Straight => "straight",
            FittingKind::Bend { .. } => "bend",
            FittingKind::Contraction => "contraction",
            FittingKind::Expansion => "expansion",
            FittingKind::Tee => "tee",
            FittingKind::Splitter => "splitter",
        }
    }

    fn capabilities(&self) -> Capabilities {
        match self {
            FittingKind::Source => Capabilities::REFERENCE,
            FittingKind::TerminalEnd => Capabilities::DEMAND,
            FittingKind::Straight => Capabilities::NONE,
            FittingKind::Bend { .. } | FittingKind::Contraction | FittingKind::Expansion => {
                Capabilities::LOSS_FITTING
            }
            FittingKind::Tee | FittingKind::Splitter => Capabilities::JUNCTION | Capabilities::LOSS_FITTING,
        }
    }
}

/// Classification result for one node.
#[derive(Debug, Clone, PartialEq)]
pub struct Fitting {
    pub node: NodeId,
    pub kind: FittingKind,
}

fn section(network: &Network, edge: EdgeId) -> HydraulicResult<CrossSection> {
    network
        .annotation(edge)
        .section
        .ok_or(HydraulicError::NotSized { edge })
}

/// Mean velocity magnitude on a sized edge.
fn velocity(network: &Network, edge: EdgeId) -> HydraulicResult<f64> {
    let area = section(network, edge)?.area().value;
    Ok(network.annotation(edge).flow.value.abs() / area)
}

/// Classify every node and store the loss coefficients on the child edges.
///
/// Requires flows and sections (run sizing first). Node capabilities are
/// set as a side effect.
pub fn classify_fittings(network: &mut Network) -> HydraulicResult<Vec<Fitting>> {
    let direction = network.direction();
    let mut fittings = Vec::with_capacity(network.graph().nodes().len());
    let mut coefficients: Vec<(EdgeId, f64)> = Vec::new();

    for node in network.graph().nodes() {
        let id = node.id;
        let children = network.child_edges(id);
        let kind = match network.parent_edge(id) {
            None => {
                for &c in &children {
                    coefficients.push((c, 0.0));
                }
                FittingKind::Source
            }
            Some(_) if children.is_empty() => FittingKind::TerminalEnd,
            Some(parent) => {
                let (kind, zetas) = classify_junction(network, direction, id, parent, &children)?;
                coefficients.extend(zetas);
                kind
            }
        };
        if node.role == NodeRole::Terminal && kind != FittingKind::TerminalEnd {
            debug!(node = %id, kind = kind.as_str(), "terminal inside a run");
        }
        fittings.push(Fitting { node: id, kind });
    }

    for (edge, zeta) in coefficients {
        network.annotation_mut(edge).loss_coefficient = Some(zeta.max(0.0));
    }
    for fitting in &fittings {
        let mut caps = fitting.kind.capabilities();
        if network.graph().node(fitting.node).is_some_and(|n| n.demand.is_some()) {
            caps.insert(Capabilities::DEMAND);
        }
        network.set_capabilities(fitting.node, caps);
    }
    Ok(fittings)
}

fn classify_junction(
    network: &Network,
    direction: FlowDirection,
    node: NodeId,
    parent: EdgeId,
    children: &[EdgeId],
) -> HydraulicResult<(FittingKind, Vec<(EdgeId, f64)>)> {
    let g = network.graph();
    let here = g.position(node).unwrap_or_default();
    let upstream = g.position(network.upstream_node(parent)).unwrap_or_default();
    let incoming = upstream.direction_to(&here);

    let parent_section = section(network, parent)?;
    let v_parent = velocity(network, parent)?;
    let q_parent = network.annotation(parent).flow.value.abs();

    if let [child] = children {
        let child = *child;
        let downstream = g.position(network.downstream_node(child)).unwrap_or_default();
        let child_section = section(network, child)?;
        let v_child = velocity(network, child)?;

        if !passes_straight(&upstream, &here, &downstream) {
            let angle = angle_between_deg(incoming, here.direction_to(&downstream));
            let zeta = match child_section {
                CrossSection::Round { .. } => loss::round_bend(angle),
                CrossSection::Rectangular { width, height } => {
                    loss::rectangular_bend(angle, height.value / width.value)
                }
            };
            return Ok((FittingKind::Bend { angle_deg: angle }, vec![(child, zeta)]));
        }

        let (a_parent, a_child) = (parent_section.area().value, child_section.area().value);
        if (a_parent - a_child).abs() <= 1e-9 * a_parent.max(a_child) {
            return Ok((FittingKind::Straight, vec![(child, 0.0)]));
        }
        // Flow-wise upstream and downstream areas
        let (a_up, a_down, v_up, v_down) = match direction {
            FlowDirection::Supply => (a_parent, a_child, v_parent, v_child),
            FlowDirection::Exhaust => (a_child, a_parent, v_child, v_parent),
        };
        let (kind, zeta) = if a_down < a_up {
            (
                FittingKind::Contraction,
                loss::rereference(loss::contraction(a_up, a_down), v_down, v_child),
            )
        } else {
            (
                FittingKind::Expansion,
                loss::rereference(loss::expansion(a_up, a_down), v_up, v_child),
            )
        };
        return Ok((kind, vec![(child, zeta)]));
    }

    let mut zetas = Vec::with_capacity(children.len());
    let mut any_straight = false;
    for &child in children {
        let downstream = g.position(network.downstream_node(child)).unwrap_or_default();
        let straight = passes_straight(&upstream, &here, &downstream);
        any_straight |= straight;
        let angle = angle_between_deg(incoming, here.direction_to(&downstream));

        let v_child = velocity(network, child)?;
        let ratio = if v_parent > 0.0 { v_child / v_parent } else { 0.0 };
        let q_child = network.annotation(child).flow.value.abs();
        let zeta_combined = match (direction, straight) {
            (FlowDirection::Supply, true) => loss::diverging_straight(ratio),
            (FlowDirection::Supply, false) => loss::diverging_branch(ratio, angle),
            (FlowDirection::Exhaust, true) => {
                let side_share = if q_parent > 0.0 { 1.0 - q_child / q_parent } else { 0.0 };
                loss::converging_straight(side_share)
            }
            (FlowDirection::Exhaust, false) => {
                let share = if q_parent > 0.0 { q_child / q_parent } else { 0.0 };
                loss::converging_branch(ratio, share)
            }
        };
        zetas.push((child, loss::rereference(zeta_combined.max(0.0), v_parent, v_child)));
    }

    let kind = if any_straight { FittingKind::Tee } else { FittingKind::Splitter };
    Ok((kind, zetas))
}
