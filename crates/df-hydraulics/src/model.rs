//! Pipe-network model of a sized duct tree.
//!
//! Unknowns are the edge flows followed by the pressures of every node except
//! the source, which is the external reference. Residuals are
//! `p_from - p_to - Δp(q)` per edge (oriented along the flow) followed by the
//! mass balance of every free node.

use df_core::NodeId;
use df_graph::{FlowDirection, Network};
use nalgebra::DVector;
use tracing::debug;

use crate::error::{HydraulicError, HydraulicResult};
use crate::jacobian::finite_difference_jacobian;
use crate::newton::{SolverConfig, newton_solve};
use crate::segment::{AirProperties, DuctSegment};

/// Solvable network derived from a sized, classified `Network`.
#[derive(Debug, Clone)]
pub struct HydraulicModel {
    air: AirProperties,
    segments: Vec<DuctSegment>,
    /// Per edge: (from, to) node index along the flow.
    endpoints: Vec<(usize, usize)>,
    /// Per node: external inflow in m³/s (negative for withdrawals).
    injection: Vec<f64>,
    /// Per node: position of its pressure in the unknown vector.
    slot: Vec<Option<usize>>,
    source: usize,
    initial_flows: Vec<f64>,
}

/// Converged state of one solve.
#[derive(Debug, Clone, PartialEq)]
pub struct HydraulicSolution {
    /// Physical static pressure per node (Pa), source included.
    pub node_pressures: Vec<f64>,
    /// Flow per edge along its flow orientation (m³/s).
    pub flows: Vec<f64>,
    pub iterations: usize,
    pub residual_norm: f64,
}

impl HydraulicSolution {
    pub fn pressure(&self, node: NodeId) -> f64 {
        self.node_pressures[node.idx()]
    }
}

impl HydraulicModel {
    pub fn from_network(network: &Network, air: AirProperties) -> HydraulicResult<Self> {
        let graph = network.graph();
        let n = graph.nodes().len();
        let source = network.source().idx();

        let mut segments = Vec::with_capacity(graph.edges().len());
        let mut endpoints = Vec::with_capacity(graph.edges().len());
        let mut initial_flows = Vec::with_capacity(graph.edges().len());
        for edge in graph.edges() {
            segments.push(DuctSegment::from_network(network, edge.id)?);
            let (from, to) = network.flow_endpoints(edge.id);
            endpoints.push((from.idx(), to.idx()));
            initial_flows.push(network.annotation(edge.id).flow.value.abs());
        }

        let sign = match network.direction() {
            FlowDirection::Supply => -1.0,
            FlowDirection::Exhaust => 1.0,
        };
        let mut injection = vec![0.0; n];
        for node in graph.nodes() {
            if let Some(d) = &node.demand {
                if !d.flow.value.is_finite() || d.flow.value < 0.0 {
                    return Err(HydraulicError::InvalidArg {
                        what: "terminal demand must be finite and non-negative",
                    });
                }
                injection[node.id.idx()] = sign * d.flow.value;
            }
        }

        let mut slot = vec![None; n];
        let mut next = segments.len();
        for (i, s) in slot.iter_mut().enumerate() {
            if i != source {
                *s = Some(next);
                next += 1;
            }
        }

        Ok(Self {
            air,
            segments,
            endpoints,
            injection,
            slot,
            source,
            initial_flows,
        })
    }

    pub fn unknowns(&self) -> usize {
        self.segments.len() + self.slot.len() - 1
    }

    pub fn segments(&self) -> &[DuctSegment] {
        &self.segments
    }

    pub fn air(&self) -> &AirProperties {
        &self.air
    }

    fn pressure_at(&self, x: &DVector<f64>, node: usize, source_pressure: f64) -> f64 {
        match self.slot[node] {
            Some(k) => x[k],
            None => source_pressure,
        }
    }

    /// Residual vector for a given source reference pressure.
    pub fn residual(&self, x: &DVector<f64>, source_pressure: f64) -> HydraulicResult<DVector<f64>> {
        let mut balance = self.injection.clone();
        for (e, &(from, to)) in self.endpoints.iter().enumerate() {
            balance[from] -= x[e];
            balance[to] += x[e];
        }

        let mut r = DVector::zeros(self.unknowns());
        for (e, (segment, &(from, to))) in self.segments.iter().zip(&self.endpoints).enumerate() {
            let p_from = self.pressure_at(x, from, source_pressure);
            let p_to = self.pressure_at(x, to, source_pressure);
            r[e] = p_from - p_to - segment.pressure_drop(&self.air, x[e])?;
        }
        for (node, b) in balance.into_iter().enumerate() {
            if let Some(k) = self.slot[node] {
                // Mass rows sit after the edge rows, in node order
                r[k] = b;
            }
        }
        Ok(r)
    }

    /// Solve with the source held at `source_pressure` (physical, Pa).
    pub fn solve(&self, source_pressure: f64, config: &SolverConfig) -> HydraulicResult<HydraulicSolution> {
        if !source_pressure.is_finite() {
            return Err(HydraulicError::InvalidArg {
                what: "source pressure must be finite",
            });
        }
        let m = self.segments.len();
        let mut x0 = DVector::zeros(self.unknowns());
        for (e, &q) in self.initial_flows.iter().enumerate() {
            x0[e] = q;
        }
        for k in m..self.unknowns() {
            x0[k] = source_pressure;
        }

        let residual = |x: &DVector<f64>| self.residual(x, source_pressure);
        let jacobian = |x: &DVector<f64>| finite_difference_jacobian(x, &residual, config.fd_epsilon);
        let result = newton_solve(x0, &residual, jacobian, config)?;
        debug!(
            iterations = result.iterations,
            residual = result.residual_norm,
            source_pressure,
            "network solved"
        );

        let node_pressures = (0..self.slot.len())
            .map(|node| self.pressure_at(&result.x, node, source_pressure))
            .collect();
        let flows = result.x.rows(0, m).iter().copied().collect();
        Ok(HydraulicSolution {
            node_pressures,
            flows,
            iterations: result.iterations,
            residual_norm: result.residual_norm,
        })
    }

    /// Index of the reference node.
    pub fn source(&self) -> usize {
        self.source
    }
}
