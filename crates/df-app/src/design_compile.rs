//! Compilation of a design document into engine inputs.

use df_core::Point;
use df_core::units::{m, m3ph, mm, mps, pa};
use df_graph::FlowDirection;
use df_hydraulics::{BalanceConfig, PressureUnit};
use df_project::schema::{Design, DirectionDef, DuctShapeDef, PressureUnitDef};
use df_route::{DeriverConfig, RawTerminal, Rect, RectEnvelope, RouteConfig, Trunk};
use df_sizing::{DuctCatalog, DuctShape, EN1506_ROUND_MM, SizingConfig};

/// Everything the pipeline needs, in engine types.
#[derive(Debug, Clone)]
pub struct DesignInputs {
    pub name: String,
    pub terminals: Vec<RawTerminal>,
    pub trunk: Trunk,
    pub source: Point,
    pub direction: FlowDirection,
    pub route: RouteConfig,
    pub sizing: SizingConfig,
    pub catalog: DuctCatalog,
    pub balance: BalanceConfig,
    /// `None` leaves every level unconstrained.
    pub envelope: Option<RectEnvelope>,
}

pub fn compile_design(design: &Design) -> DesignInputs {
    let params = &design.design;

    let terminals = design
        .terminals
        .iter()
        .map(|t| RawTerminal {
            room: t.room.clone(),
            position: Point::new(t.x, t.y, t.z),
            flow: m3ph(t.flow_m3ph),
            usage: t.usage.clone(),
        })
        .collect();

    let direction = match design.direction {
        DirectionDef::Supply => FlowDirection::Supply,
        DirectionDef::Exhaust => FlowDirection::Exhaust,
    };

    let route = RouteConfig {
        deriver: DeriverConfig {
            decimals: params.decimals,
            merge_threshold: params.merge_threshold_m,
        },
        max_repair_iterations: params.max_repair_iterations,
    };

    let sizing = SizingConfig {
        target_velocity: mps(params.target_velocity_mps),
        shape: match params.duct_shape {
            DuctShapeDef::Round => DuctShape::Round,
            DuctShapeDef::Rectangular => DuctShape::Rectangular,
            DuctShapeDef::Optimal => DuctShape::Optimal,
        },
        clearance: params.clearance_m.map(m),
    };

    let balance = BalanceConfig {
        safety_margin: pa(params.safety_margin_pa),
        correction_passes: params.correction_passes,
        unit: match params.pressure_unit {
            PressureUnitDef::Pascal => PressureUnit::Pascal,
            PressureUnitDef::Hectopascal => PressureUnit::Hectopascal,
            PressureUnitDef::Millibar => PressureUnit::Millibar,
        },
        ..BalanceConfig::default()
    };

    DesignInputs {
        name: design.name.clone(),
        terminals,
        trunk: Trunk::new(design.trunk.x, design.trunk.y),
        source: Point::new(design.source.x, design.source.y, design.source.z),
        direction,
        route,
        sizing,
        catalog: compile_catalog(design),
        balance,
        envelope: compile_envelope(design),
    }
}

fn compile_catalog(design: &Design) -> DuctCatalog {
    let Some(overrides) = &design.catalog else {
        return DuctCatalog::default();
    };
    let defaults = DuctCatalog::default();
    let round = match &overrides.round_mm {
        Some(list) => list.iter().map(|&d| mm(d)).collect(),
        None => EN1506_ROUND_MM.iter().map(|&d| mm(d)).collect(),
    };
    let rectangular = match &overrides.rectangular_mm {
        Some(list) => list.iter().map(|&[w, h]| (mm(w), mm(h))).collect(),
        None => defaults
            .rectangular()
            .iter()
            .filter_map(|s| match *s {
                df_core::CrossSection::Rectangular { width, height } => Some((width, height)),
                df_core::CrossSection::Round { .. } => None,
            })
            .collect(),
    };
    DuctCatalog::from_parts(round, rectangular)
}

fn compile_envelope(design: &Design) -> Option<RectEnvelope> {
    if design.envelope.is_empty() {
        return None;
    }
    let mut envelope = RectEnvelope::new();
    for level in &design.envelope {
        for r in &level.rects {
            envelope.add_rect(level.elevation, Rect::new(r.min_x, r.min_y, r.max_x, r.max_y));
        }
    }
    Some(envelope)
}
