//! Node-link JSON export of a designed network.
//!
//! Output goes through a [`ScopedWriter`], so concurrent exports to one target
//! never interleave and tests can capture documents in memory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use df_core::units::{in_m3ph, in_mm};
use df_core::{Axis, CrossSection, Point};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::design_service::DesignOutcome;
use crate::error::{AppError, AppResult};

/// Destination for named output documents.
pub trait ScopedWriter: Send + Sync {
    /// Write `bytes` as the document `name`, replacing any earlier version.
    fn write_scoped(&self, name: &str, bytes: &[u8]) -> AppResult<()>;
}

/// Writes documents as files under one directory, one write at a time.
#[derive(Debug)]
pub struct SharedFileWriter {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl SharedFileWriter {
    pub fn new(dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(Self {
            dir,
            lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ScopedWriter for SharedFileWriter {
    fn write_scoped(&self, name: &str, bytes: &[u8]) -> AppResult<()> {
        let path = self.dir.join(name);
        let _guard = self.lock.lock();
        std::fs::write(&path, bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), "document written");
        Ok(())
    }
}

/// Keeps documents in memory.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.files.lock().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.files.lock().keys().cloned().collect()
    }
}

impl ScopedWriter for MemoryWriter {
    fn write_scoped(&self, name: &str, bytes: &[u8]) -> AppResult<()> {
        self.files.lock().insert(name.to_string(), bytes.to_vec());
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct NodeLinkDocument {
    pub directed: bool,
    pub name: String,
    pub direction: &'static str,
    pub source: usize,
    pub pressure: PressureRecord,
    pub nodes: Vec<NodeRecord>,
    pub links: Vec<LinkRecord>,
}

#[derive(Debug, Serialize)]
pub struct PressureRecord {
    pub unit: &'static str,
    /// Total loss in `unit`
    pub total: f64,
    pub total_pa: f64,
    pub critical_path_pa: f64,
    pub source_pa: f64,
    pub min_pressure_pa: f64,
    pub critical_node: usize,
}

#[derive(Debug, Serialize)]
pub struct DemandRecord {
    pub room: String,
    pub flow_m3ph: f64,
    pub usage: String,
}

#[derive(Debug, Serialize)]
pub struct NodeRecord {
    pub id: usize,
    pub position: Point,
    pub role: &'static str,
    pub level: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demand: Option<DemandRecord>,
    pub capabilities: u8,
    pub pressure_pa: f64,
}

#[derive(Debug, Serialize)]
pub struct LinkRecord {
    /// Flow-wise upstream node
    pub source: usize,
    pub target: usize,
    pub length_m: f64,
    pub axis: Option<Axis>,
    pub flow_m3ph: f64,
    pub section: Option<CrossSection>,
    pub equivalent_diameter_mm: Option<f64>,
    pub perimeter_mm: Option<f64>,
    pub surface_area_m2: Option<f64>,
    pub loss_coefficient: Option<f64>,
    pub friction_loss_pa: Option<f64>,
    pub fitting_loss_pa: Option<f64>,
}

pub fn node_link_document(outcome: &DesignOutcome) -> NodeLinkDocument {
    let net = &outcome.network;
    let balance = &outcome.balance;
    let graph = net.graph();

    let nodes = graph
        .nodes()
        .iter()
        .map(|n| NodeRecord {
            id: n.id.idx(),
            position: n.position,
            role: n.role.as_str(),
            level: n.position.z,
            demand: n.demand.as_ref().map(|d| DemandRecord {
                room: d.room.clone(),
                flow_m3ph: in_m3ph(d.flow),
                usage: d.usage.clone(),
            }),
            capabilities: net.capabilities(n.id).bits(),
            pressure_pa: balance
                .node_pressures
                .get(n.id.idx())
                .map_or(0.0, |p| p.value),
        })
        .collect();

    let links = graph
        .edges()
        .iter()
        .map(|e| {
            let (from, to) = net.flow_endpoints(e.id);
            let ann = net.annotation(e.id);
            LinkRecord {
                source: from.idx(),
                target: to.idx(),
                length_m: e.length.value,
                axis: e.axis,
                flow_m3ph: in_m3ph(ann.flow),
                section: ann.section,
                equivalent_diameter_mm: ann.equivalent_diameter.map(in_mm),
                perimeter_mm: ann.wetted_perimeter.map(in_mm),
                surface_area_m2: ann.surface_area.map(|a| a.value),
                loss_coefficient: ann.loss_coefficient,
                friction_loss_pa: ann.friction_loss.map(|p| p.value),
                fitting_loss_pa: ann.fitting_loss.map(|p| p.value),
            }
        })
        .collect();

    NodeLinkDocument {
        directed: true,
        name: outcome.name.clone(),
        direction: net.direction().as_str(),
        source: net.source().idx(),
        pressure: PressureRecord {
            unit: balance.unit.as_str(),
            total: balance.reported_total(),
            total_pa: balance.total_pressure_loss.value,
            critical_path_pa: balance.critical_path_loss.value,
            source_pa: balance.source_pressure.value,
            min_pressure_pa: balance.min_pressure.value,
            critical_node: balance.critical_node.idx(),
        },
        nodes,
        links,
    }
}

/// Serialize the outcome and hand it to `writer` as `name`.
pub fn export_node_link(outcome: &DesignOutcome, writer: &dyn ScopedWriter, name: &str) -> AppResult<()> {
    if name.is_empty() || name.contains(['/', '\\']) {
        return Err(AppError::Export {
            message: format!("invalid document name '{name}'"),
        });
    }
    let json = serde_json::to_vec_pretty(&node_link_document(outcome))?;
    writer.write_scoped(name, &json)
}
