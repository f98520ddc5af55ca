//! Catalog section selection.

use df_core::units::{Area, VolumeRate};
use df_core::{CrossSection, Tolerances, at_least};

use crate::catalog::DuctCatalog;
use crate::config::{DuctShape, SizingConfig};
use crate::error::{SizingError, SizingResult};

/// Free area needed to carry `flow` at the target velocity.
pub fn required_area(flow: VolumeRate, config: &SizingConfig) -> SizingResult<Area> {
    let v = config.target_velocity.value;
    if !v.is_finite() || v <= 0.0 {
        return Err(SizingError::InvalidArg {
            what: "target velocity must be positive",
        });
    }
    Ok(flow.abs() / config.target_velocity)
}

/// Smallest section of `sections` whose area covers `required` (boundary
/// inclusive) and whose height fits the clearance.
fn smallest_fit(sections: &[CrossSection], required: Area, config: &SizingConfig) -> Option<CrossSection> {
    let tol = Tolerances::default();
    sections
        .iter()
        .copied()
        .filter(|s| {
            config
                .clearance
                .is_none_or(|c| at_least(c.value, s.height().value, tol))
        })
        .find(|s| at_least(s.area().value, required.value, tol))
}

/// Pick the section for a required area; `None` when nothing fits.
pub fn select_section(
    required: Area,
    catalog: &DuctCatalog,
    config: &SizingConfig,
) -> Option<CrossSection> {
    match config.shape {
        DuctShape::Round => smallest_fit(catalog.round(), required, config),
        DuctShape::Rectangular => smallest_fit(catalog.rectangular(), required, config),
        DuctShape::Optimal => smallest_fit(catalog.round(), required, config)
            .or_else(|| smallest_fit(catalog.rectangular(), required, config)),
    }
}
