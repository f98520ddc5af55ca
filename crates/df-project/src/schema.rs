//! Design document schema.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Design {
    pub version: u32,
    pub name: String,
    pub direction: DirectionDef,
    pub trunk: TrunkDef,
    pub source: PointDef,
    #[serde(default)]
    pub terminals: Vec<TerminalDef>,
    #[serde(default)]
    pub design: DesignParamsDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<CatalogDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub envelope: Vec<LevelEnvelopeDef>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DirectionDef {
    Supply,
    Exhaust,
}

impl DirectionDef {
    pub fn as_str(&self) -> &'static str {
        match self {
            DirectionDef::Supply => "supply",
            DirectionDef::Exhaust => "exhaust",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TrunkDef {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PointDef {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TerminalDef {
    pub room: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub flow_m3ph: f64,
    #[serde(default = "default_usage")]
    pub usage: String,
}

fn default_usage() -> String {
    "unspecified".to_string()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DuctShapeDef {
    Round,
    Rectangular,
    #[default]
    Optimal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PressureUnitDef {
    #[default]
    #[serde(rename = "Pa")]
    Pascal,
    #[serde(rename = "hPa")]
    Hectopascal,
    #[serde(rename = "mbar")]
    Millibar,
}

/// Tunable design parameters; every field has a default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DesignParamsDef {
    #[serde(default = "default_target_velocity")]
    pub target_velocity_mps: f64,
    #[serde(default)]
    pub duct_shape: DuctShapeDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clearance_m: Option<f64>,
    #[serde(default = "default_safety_margin")]
    pub safety_margin_pa: f64,
    #[serde(default = "default_merge_threshold")]
    pub merge_threshold_m: f64,
    #[serde(default = "default_decimals")]
    pub decimals: u32,
    #[serde(default = "default_max_repair_iterations")]
    pub max_repair_iterations: usize,
    #[serde(default = "default_correction_passes")]
    pub correction_passes: usize,
    #[serde(default)]
    pub pressure_unit: PressureUnitDef,
}

fn default_target_velocity() -> f64 {
    3.0
}

fn default_safety_margin() -> f64 {
    100.0
}

fn default_merge_threshold() -> f64 {
    0.3
}

fn default_decimals() -> u32 {
    3
}

fn default_max_repair_iterations() -> usize {
    200
}

fn default_correction_passes() -> usize {
    2
}

impl Default for DesignParamsDef {
    fn default() -> Self {
        Self {
            target_velocity_mps: default_target_velocity(),
            duct_shape: DuctShapeDef::default(),
            clearance_m: None,
            safety_margin_pa: default_safety_margin(),
            merge_threshold_m: default_merge_threshold(),
            decimals: default_decimals(),
            max_repair_iterations: default_max_repair_iterations(),
            correction_passes: default_correction_passes(),
            pressure_unit: PressureUnitDef::default(),
        }
    }
}

/// Catalog overrides; an omitted list keeps the built-in one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CatalogDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_mm: Option<Vec<f64>>,
    /// `[width, height]` pairs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rectangular_mm: Option<Vec<[f64; 2]>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LevelEnvelopeDef {
    pub elevation: f64,
    #[serde(default)]
    pub rects: Vec<RectDef>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RectDef {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}
