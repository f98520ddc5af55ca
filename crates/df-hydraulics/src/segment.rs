//! Duct segment with Darcy–Weisbach friction and a lumped fitting loss.

use df_core::units::{Density, DynVisc, Length, Pressure, constants, pa};
use df_core::{CrossSection, EdgeId};
use df_graph::Network;

use crate::error::{HydraulicError, HydraulicResult};

/// Flows below this magnitude (m³/s) are treated as stagnant.
const EPSILON_FLOW: f64 = 1e-12;

/// Reynolds number below which the flow is laminar.
pub const LAMINAR_REYNOLDS: f64 = 2300.0;

/// Air properties used for every segment of one solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AirProperties {
    pub density: Density,
    pub viscosity: DynVisc,
}

impl Default for AirProperties {
    fn default() -> Self {
        Self {
            density: constants::air_density(),
            viscosity: constants::air_viscosity(),
        }
    }
}

/// One sized duct edge, ready for the network solve.
#[derive(Debug, Clone, PartialEq)]
pub struct DuctSegment {
    pub edge: EdgeId,
    pub length: Length,
    /// Hydraulic (equivalent) diameter
    pub diameter: Length,
    /// Flow area of the actual section
    pub area: f64,
    /// Surface roughness (absolute)
    pub roughness: Length,
    /// Local loss coefficient referenced to this segment's velocity
    pub zeta: f64,
}

impl DuctSegment {
    pub fn new(edge: EdgeId, length: Length, section: &CrossSection, zeta: f64) -> Self {
        Self {
            edge,
            length,
            diameter: section.equivalent_diameter(),
            area: section.area().value,
            roughness: constants::duct_roughness(),
            zeta,
        }
    }

    /// Segment for `edge` of a sized network.
    pub fn from_network(network: &Network, edge: EdgeId) -> HydraulicResult<Self> {
        let ann = network.annotation(edge);
        let section = ann.section.ok_or(HydraulicError::NotSized { edge })?;
        let length = network
            .graph()
            .edge(edge)
            .map(|e| e.length)
            .ok_or(HydraulicError::NotSized { edge })?;
        Ok(Self::new(edge, length, &section, ann.loss_coefficient.unwrap_or(0.0)))
    }

    /// Friction factor: laminar below Re 2300, Swamee–Jain above.
    fn friction_factor(&self, reynolds: f64) -> f64 {
        if reynolds < LAMINAR_REYNOLDS {
            64.0 / reynolds
        } else {
            let e_d = self.roughness.value / self.diameter.value;
            let a = e_d / 3.7;
            let b = 5.74 / reynolds.powf(0.9);
            let f = 0.25 / (a + b).log10().powi(2);
            f.max(0.0001)
        }
    }

    fn velocity(&self, flow: f64) -> f64 {
        flow / self.area
    }

    fn dynamic_pressure(&self, air: &AirProperties, flow: f64) -> f64 {
        let v = self.velocity(flow);
        0.5 * air.density.value * v * v.abs()
    }

    /// Signed friction loss (Pa) for a signed volumetric flow (m³/s).
    pub fn friction_drop(&self, air: &AirProperties, flow: f64) -> HydraulicResult<f64> {
        if flow.abs() < EPSILON_FLOW {
            return Ok(0.0);
        }
        let v = self.velocity(flow).abs();
        let reynolds = air.density.value * v * self.diameter.value / air.viscosity.value;
        check_finite(reynolds, "Reynolds number")?;
        let lambda = self.friction_factor(reynolds);
        let dp = lambda * self.length.value / self.diameter.value * self.dynamic_pressure(air, flow);
        check_finite(dp, "friction loss")?;
        Ok(dp)
    }

    /// Signed fitting loss (Pa) for a signed volumetric flow (m³/s).
    pub fn fitting_drop(&self, air: &AirProperties, flow: f64) -> f64 {
        self.zeta * self.dynamic_pressure(air, flow)
    }

    /// Total signed pressure drop `Δp(q)` along the flow orientation.
    pub fn pressure_drop(&self, air: &AirProperties, flow: f64) -> HydraulicResult<f64> {
        Ok(self.friction_drop(air, flow)? + self.fitting_drop(air, flow))
    }

    /// Friction and fitting loss as quantities, for reporting.
    pub fn losses(&self, air: &AirProperties, flow: f64) -> HydraulicResult<(Pressure, Pressure)> {
        Ok((pa(self.friction_drop(air, flow)?), pa(self.fitting_drop(air, flow))))
    }
}

fn check_finite(value: f64, what: &str) -> HydraulicResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(HydraulicError::Numeric {
            what: format!("{what} is not finite ({value})"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use df_core::units::mm;

    fn segment(zeta: f64) -> DuctSegment {
        DuctSegment::new(
            EdgeId::from_index(0),
            df_core::units::m(10.0),
            &CrossSection::Round { diameter: mm(200.0) },
            zeta,
        )
    }

    #[test]
    fn zero_flow_no_loss() {
        let s = segment(0.5);
        assert_eq!(s.pressure_drop(&AirProperties::default(), 0.0).unwrap(), 0.0);
    }

    #[test]
    fn drop_is_odd_in_flow() {
        let s = segment(0.3);
        let air = AirProperties::default();
        let fwd = s.pressure_drop(&air, 0.1).unwrap();
        let rev = s.pressure_drop(&air, -0.1).unwrap();
        assert!(fwd > 0.0);
        assert!((fwd + rev).abs() < 1e-12);
    }

    #[test]
    fn turbulent_friction_in_expected_range() {
        // 0.1 m³/s in DN200: v ≈ 3.18 m/s, about 0.6-0.8 Pa/m for galvanised steel
        let s = segment(0.0);
        let dp = s.friction_drop(&AirProperties::default(), 0.1).unwrap();
        let per_metre = dp / 10.0;
        assert!(per_metre > 0.5 && per_metre < 0.9, "got {per_metre} Pa/m");
    }

    #[test]
    fn laminar_drop_is_linear() {
        let s = segment(0.0);
        let air = AirProperties::default();
        let q = 1e-5;
        let a = s.friction_drop(&air, q).unwrap();
        let b = s.friction_drop(&air, 2.0 * q).unwrap();
        assert!((b / a - 2.0).abs() < 1e-9);
    }

    #[test]
    fn fitting_loss_is_velocity_head() {
        let s = segment(1.0);
        let air = AirProperties::default();
        let v = 0.1 / s.area;
        let expected = 0.5 * air.density.value * v * v;
        assert!((s.fitting_drop(&air, 0.1) - expected).abs() < 1e-9);
    }
}
