//! df-sizing: flow aggregation and duct sizing for ductflow.
//!
//! Every edge of a composed network receives the flow of the terminals
//! behind it and the smallest catalog section carrying that flow at the
//! target velocity within the installation clearance.

pub mod catalog;
pub mod config;
pub mod error;
pub mod flow;
pub mod select;

pub use catalog::{DuctCatalog, EN1506_ROUND_MM, RECTANGULAR_SIDES_MM};
pub use config::{DEFAULT_TARGET_VELOCITY_MPS, DuctShape, SizingConfig};
pub use error::{SizingError, SizingResult};
pub use flow::aggregate_flows;
pub use select::{required_area, select_section};

use df_core::units::{Area, Length, VolumeRate, in_mm};
use df_graph::Network;
use tracing::{debug, info};

/// Totals of a sizing run.
#[derive(Debug, Clone, PartialEq)]
pub struct SizingSummary {
    pub total_flow: VolumeRate,
    pub total_length: Length,
    pub total_surface: Area,
    pub round_edges: usize,
    pub rectangular_edges: usize,
}

/// Aggregate flows and annotate every edge with its section and geometry.
pub fn size_network(
    network: &mut Network,
    catalog: &DuctCatalog,
    config: &SizingConfig,
) -> SizingResult<SizingSummary> {
    catalog.validate()?;
    let total_flow = aggregate_flows(network)?;

    let mut summary = SizingSummary {
        total_flow,
        total_length: Length::default(),
        total_surface: Area::default(),
        round_edges: 0,
        rectangular_edges: 0,
    };

    let edges: Vec<_> = network.graph().edges().iter().map(|e| (e.id, e.length)).collect();
    for (edge, length) in edges {
        let flow = network.annotation(edge).flow;
        let required = required_area(flow, config)?;
        let section = select_section(required, catalog, config).ok_or(SizingError::NoFit {
            edge,
            required_m2: required.value,
            clearance_mm: config.clearance.map_or(f64::INFINITY, in_mm),
        })?;
        debug!(edge = %edge, section = %section, required_m2 = required.value, "edge sized");

        let perimeter = section.wetted_perimeter();
        let surface = perimeter * length;
        let annotation = network.annotation_mut(edge);
        annotation.section = Some(section);
        annotation.equivalent_diameter = Some(section.equivalent_diameter());
        annotation.wetted_perimeter = Some(perimeter);
        annotation.surface_area = Some(surface);

        summary.total_length += length;
        summary.total_surface += surface;
        if section.is_round() {
            summary.round_edges += 1;
        } else {
            summary.rectangular_edges += 1;
        }
    }

    info!(
        edges = summary.round_edges + summary.rectangular_edges,
        round = summary.round_edges,
        rectangular = summary.rectangular_edges,
        surface_m2 = summary.total_surface.value,
        shape = config.shape.as_str(),
        "network sized"
    );
    Ok(summary)
}
