//! Source-pressure balancing.
//!
//! The network is solved with the source at zero, then the source is shifted
//! until the weakest node keeps the safety margin. Pressures are compared in
//! the driving sense: physical pressure for supply, its negation for exhaust.

use std::fmt;
use std::str::FromStr;

use df_core::NodeId;
use df_core::units::{Pressure, pa};
use df_graph::Network;
use tracing::{debug, info};

use crate::error::{HydraulicError, HydraulicResult};
use crate::fitting::{Fitting, classify_fittings};
use crate::model::{HydraulicModel, HydraulicSolution};
use crate::newton::SolverConfig;
use crate::segment::AirProperties;

pub const DEFAULT_SAFETY_MARGIN_PA: f64 = 100.0;
pub const DEFAULT_CORRECTION_PASSES: usize = 2;

/// Unit the total pressure loss is reported in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PressureUnit {
    #[default]
    Pascal,
    Hectopascal,
    Millibar,
}

impl PressureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            PressureUnit::Pascal => "Pa",
            PressureUnit::Hectopascal => "hPa",
            PressureUnit::Millibar => "mbar",
        }
    }

    /// `p` expressed in this unit.
    pub fn express(&self, p: Pressure) -> f64 {
        use uom::si::pressure::{hectopascal, millibar, pascal};
        match self {
            PressureUnit::Pascal => p.get::<pascal>(),
            PressureUnit::Hectopascal => p.get::<hectopascal>(),
            PressureUnit::Millibar => p.get::<millibar>(),
        }
    }
}

impl fmt::Display for PressureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PressureUnit {
    type Err = HydraulicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pa" | "pascal" => Ok(PressureUnit::Pascal),
            "hpa" | "hectopascal" => Ok(PressureUnit::Hectopascal),
            "mbar" | "millibar" => Ok(PressureUnit::Millibar),
            _ => Err(HydraulicError::InvalidArg {
                what: "pressure unit must be Pa, hPa or mbar",
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceConfig {
    /// Pressure kept at the weakest node for unmodelled losses.
    pub safety_margin: Pressure,
    /// Source corrections after the trial solve; the first reaches zero,
    /// every later one re-targets the margin.
    pub correction_passes: usize,
    pub unit: PressureUnit,
    pub solver: SolverConfig,
    pub air: AirProperties,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            safety_margin: pa(DEFAULT_SAFETY_MARGIN_PA),
            correction_passes: DEFAULT_CORRECTION_PASSES,
            unit: PressureUnit::default(),
            solver: SolverConfig::default(),
            air: AirProperties::default(),
        }
    }
}

/// Outcome of balancing one network.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceResult {
    /// Physical pressure at the source after the last correction.
    pub source_pressure: Pressure,
    /// Physical pressure per node, indexed by node id.
    pub node_pressures: Vec<Pressure>,
    /// Node with the lowest driving pressure.
    pub critical_node: NodeId,
    /// Loss along the critical path (negated worst trial pressure).
    pub critical_path_loss: Pressure,
    /// Driving pressure the source must provide.
    pub total_pressure_loss: Pressure,
    /// Lowest driving pressure over all non-source nodes.
    pub min_pressure: Pressure,
    pub fittings: Vec<Fitting>,
    /// Newton iterations summed over all solves.
    pub iterations: usize,
    pub unit: PressureUnit,
}

impl BalanceResult {
    /// Total pressure loss in the reporting unit.
    pub fn reported_total(&self) -> f64 {
        self.unit.express(self.total_pressure_loss)
    }
}

/// Weakest non-source node in the driving sense; ties go to the lower id.
fn weakest(network: &Network, solution: &HydraulicSolution, sign: f64) -> (NodeId, f64) {
    let source = network.source();
    network
        .graph()
        .nodes()
        .iter()
        .filter(|n| n.id != source)
        .map(|n| (n.id, sign * solution.pressure(n.id)))
        .fold((source, 0.0), |best, (id, p)| {
            if best.0 == source || p < best.1 {
                (id, p)
            } else {
                best
            }
        })
}

/// Classify fittings, solve the network and shift the source pressure until
/// the weakest node holds the safety margin.
///
/// Friction and fitting losses of the final solve are written to the edge
/// annotations.
pub fn balance_network(network: &mut Network, config: &BalanceConfig) -> HydraulicResult<BalanceResult> {
    let margin = config.safety_margin.value;
    if !margin.is_finite() || margin < 0.0 {
        return Err(HydraulicError::InvalidArg {
            what: "safety margin must be finite and non-negative",
        });
    }

    let fittings = classify_fittings(network)?;
    let model = HydraulicModel::from_network(network, config.air)?;
    let sign = network.direction().sign();

    let mut driving = 0.0;
    let mut solution = model.solve(sign * driving, &config.solver)?;
    let mut iterations = solution.iterations;
    let (critical, worst) = weakest(network, &solution, sign);
    let critical_path_loss = -worst;
    let mut min_driving = worst;
    debug!(critical = %critical, worst, "trial solve");

    for pass in 1..=config.correction_passes {
        let shift = match pass {
            1 => -min_driving,
            2 => margin,
            _ => margin - min_driving,
        };
        driving += shift;
        solution = model.solve(sign * driving, &config.solver)?;
        iterations += solution.iterations;
        min_driving = weakest(network, &solution, sign).1;
        debug!(pass, shift, driving, min_driving, "source corrected");
    }

    for (segment, &flow) in model.segments().iter().zip(&solution.flows) {
        let (friction, fitting) = segment.losses(model.air(), flow)?;
        let ann = network.annotation_mut(segment.edge);
        ann.friction_loss = Some(friction);
        ann.fitting_loss = Some(fitting);
    }

    let result = BalanceResult {
        source_pressure: pa(sign * driving),
        node_pressures: solution.node_pressures.iter().map(|&p| pa(p)).collect(),
        critical_node: critical,
        critical_path_loss: pa(critical_path_loss),
        total_pressure_loss: pa(driving),
        min_pressure: pa(min_driving),
        fittings,
        iterations,
        unit: config.unit,
    };
    info!(
        direction = network.direction().as_str(),
        critical = %critical,
        critical_path_pa = critical_path_loss,
        total = result.reported_total(),
        unit = config.unit.as_str(),
        iterations,
        "network balanced"
    );
    Ok(result)
}
