//! Design document validation.
//!
//! Every problem is collected so a user can fix a document in one pass.

use std::collections::HashSet;

use df_core::COORD_DECIMALS;

use crate::schema::{CatalogDef, Design, DesignParamsDef, LevelEnvelopeDef, TerminalDef};

pub const LATEST_VERSION: u32 = 1;

/// Largest rounding precision accepted for coordinates; node identity is
/// keyed on this grid.
pub const MAX_DECIMALS: u32 = COORD_DECIMALS;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },

    #[error("{} validation issues:\n{}", .0.len(), list_issues(.0))]
    Issues(Vec<ValidationError>),
}

fn list_issues(issues: &[ValidationError]) -> String {
    issues
        .iter()
        .map(|i| format!("  - {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// All problems found in `design`, in document order.
pub fn collect_issues(design: &Design) -> Vec<ValidationError> {
    if design.version > LATEST_VERSION {
        return vec![ValidationError::UnsupportedVersion {
            version: design.version,
        }];
    }

    let mut issues = Vec::new();
    if design.name.trim().is_empty() {
        issues.push(invalid("name", "\"\"", "must not be empty"));
    }
    for (field, v) in [("trunk.x", design.trunk.x), ("trunk.y", design.trunk.y)] {
        if !v.is_finite() {
            issues.push(invalid(field, v, "must be finite"));
        }
    }
    for (field, v) in [
        ("source.x", design.source.x),
        ("source.y", design.source.y),
        ("source.z", design.source.z),
    ] {
        if !v.is_finite() {
            issues.push(invalid(field, v, "must be finite"));
        }
    }

    check_terminals(&design.terminals, &mut issues);
    check_params(&design.design, &mut issues);
    if let Some(catalog) = &design.catalog {
        check_catalog(catalog, &mut issues);
    }
    check_envelope(&design.envelope, &mut issues);
    issues
}

/// Fail with every issue, or a single one when only one was found.
pub fn validate_design(design: &Design) -> Result<(), ValidationError> {
    let mut issues = collect_issues(design);
    match issues.len() {
        0 => Ok(()),
        1 => Err(issues.remove(0)),
        _ => Err(ValidationError::Issues(issues)),
    }
}

fn check_terminals(terminals: &[TerminalDef], issues: &mut Vec<ValidationError>) {
    if terminals.is_empty() {
        issues.push(invalid("terminals", "[]", "at least one terminal is required"));
    }
    let mut rooms = HashSet::new();
    for (i, t) in terminals.iter().enumerate() {
        if t.room.trim().is_empty() {
            issues.push(invalid(format!("terminals[{i}].room"), "\"\"", "must not be empty"));
        }
        for (axis, v) in [("x", t.x), ("y", t.y), ("z", t.z)] {
            if !v.is_finite() {
                issues.push(invalid(format!("terminals[{i}].{axis}"), v, "must be finite"));
            }
        }
        if !t.flow_m3ph.is_finite() || t.flow_m3ph < 0.0 {
            issues.push(invalid(
                format!("terminals[{i}].flow_m3ph"),
                t.flow_m3ph,
                "must be finite and non-negative",
            ));
        }
        // One terminal per room and level
        if t.z.is_finite() && !rooms.insert((t.room.as_str(), t.z.to_bits())) {
            issues.push(ValidationError::DuplicateId {
                id: t.room.clone(),
                context: format!("terminals at z = {}", t.z),
            });
        }
    }
}

fn check_params(params: &DesignParamsDef, issues: &mut Vec<ValidationError>) {
    if !params.target_velocity_mps.is_finite() || params.target_velocity_mps <= 0.0 {
        issues.push(invalid(
            "design.target_velocity_mps",
            params.target_velocity_mps,
            "must be positive",
        ));
    }
    if let Some(c) = params.clearance_m.filter(|c| !c.is_finite() || *c <= 0.0) {
        issues.push(invalid("design.clearance_m", c, "must be positive"));
    }
    if !params.safety_margin_pa.is_finite() || params.safety_margin_pa < 0.0 {
        issues.push(invalid(
            "design.safety_margin_pa",
            params.safety_margin_pa,
            "must be finite and non-negative",
        ));
    }
    if !params.merge_threshold_m.is_finite() || params.merge_threshold_m < 0.0 {
        issues.push(invalid(
            "design.merge_threshold_m",
            params.merge_threshold_m,
            "must be finite and non-negative",
        ));
    }
    if params.decimals > MAX_DECIMALS {
        issues.push(invalid(
            "design.decimals",
            params.decimals,
            &format!("at most {MAX_DECIMALS} decimals"),
        ));
    }
}

fn check_catalog(catalog: &CatalogDef, issues: &mut Vec<ValidationError>) {
    if let Some(round) = &catalog.round_mm {
        for (i, &d) in round.iter().enumerate() {
            if !d.is_finite() || d <= 0.0 {
                issues.push(invalid(format!("catalog.round_mm[{i}]"), d, "must be positive"));
            }
        }
    }
    if let Some(rect) = &catalog.rectangular_mm {
        for (i, &[w, h]) in rect.iter().enumerate() {
            if !w.is_finite() || !h.is_finite() || w <= 0.0 || h <= 0.0 {
                issues.push(invalid(
                    format!("catalog.rectangular_mm[{i}]"),
                    format!("[{w}, {h}]"),
                    "sides must be positive",
                ));
            }
        }
    }
    let round_empty = catalog.round_mm.as_ref().is_some_and(Vec::is_empty);
    let rect_empty = catalog.rectangular_mm.as_ref().is_some_and(Vec::is_empty);
    if round_empty && rect_empty {
        issues.push(invalid("catalog", "{}", "no duct sections left"));
    }
}

fn check_envelope(levels: &[LevelEnvelopeDef], issues: &mut Vec<ValidationError>) {
    let mut elevations = HashSet::new();
    for (i, level) in levels.iter().enumerate() {
        if !level.elevation.is_finite() {
            issues.push(invalid(format!("envelope[{i}].elevation"), level.elevation, "must be finite"));
        } else if !elevations.insert(level.elevation.to_bits()) {
            issues.push(ValidationError::DuplicateId {
                id: level.elevation.to_string(),
                context: "envelope levels".to_string(),
            });
        }
        for (j, r) in level.rects.iter().enumerate() {
            let finite = [r.min_x, r.min_y, r.max_x, r.max_y].iter().all(|v| v.is_finite());
            if !finite || r.min_x > r.max_x || r.min_y > r.max_y {
                issues.push(invalid(
                    format!("envelope[{i}].rects[{j}]"),
                    format!("({}, {})-({}, {})", r.min_x, r.min_y, r.max_x, r.max_y),
                    "must be finite with min <= max",
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DirectionDef, PointDef, TrunkDef};

    fn design() -> Design {
        Design {
            version: 1,
            name: "Test".to_string(),
            direction: DirectionDef::Supply,
            trunk: TrunkDef { x: 0.0, y: 0.0 },
            source: PointDef { x: 0.0, y: 0.0, z: -3.0 },
            terminals: vec![TerminalDef {
                room: "1.01".to_string(),
                x: 3.0,
                y: 0.0,
                z: 0.0,
                flow_m3ph: 120.0,
                usage: "office".to_string(),
            }],
            design: DesignParamsDef::default(),
            catalog: None,
            envelope: vec![],
        }
    }

    #[test]
    fn valid_design_passes() {
        validate_design(&design()).unwrap();
    }

    #[test]
    fn single_issue_is_returned_as_is() {
        let mut d = design();
        d.terminals[0].flow_m3ph = -1.0;
        assert!(matches!(
            validate_design(&d),
            Err(ValidationError::InvalidValue { field, .. }) if field == "terminals[0].flow_m3ph"
        ));
    }

    #[test]
    fn all_issues_are_collected() {
        let mut d = design();
        d.name = " ".to_string();
        d.design.target_velocity_mps = 0.0;
        d.terminals.push(d.terminals[0].clone());
        let issues = collect_issues(&d);
        assert_eq!(issues.len(), 3);
        let err = validate_design(&d).unwrap_err();
        assert!(err.to_string().starts_with("3 validation issues"));
    }

    #[test]
    fn same_room_on_two_levels_is_fine() {
        let mut d = design();
        let mut upper = d.terminals[0].clone();
        upper.z = 3.0;
        d.terminals.push(upper);
        validate_design(&d).unwrap();
    }

    #[test]
    fn decimals_finer_than_node_grid_are_rejected() {
        let mut d = design();
        d.design.decimals = MAX_DECIMALS;
        validate_design(&d).unwrap();
        d.design.decimals = MAX_DECIMALS + 1;
        assert!(matches!(
            validate_design(&d),
            Err(ValidationError::InvalidValue { field, .. }) if field == "design.decimals"
        ));
    }

    #[test]
    fn newer_version_is_rejected() {
        let mut d = design();
        d.version = LATEST_VERSION + 1;
        assert_eq!(
            validate_design(&d),
            Err(ValidationError::UnsupportedVersion {
                version: LATEST_VERSION + 1
            })
        );
    }
}
