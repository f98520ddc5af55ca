//! Duct cross-sections.

use core::fmt;

use crate::units::{Area, Length, in_mm};

/// Physical cross-section of a duct segment.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "shape", rename_all = "lowercase"))]
pub enum CrossSection {
    Round { diameter: Length },
    Rectangular { width: Length, height: Length },
}

impl CrossSection {
    pub fn area(&self) -> Area {
        match *self {
            CrossSection::Round { diameter } => diameter * diameter * std::f64::consts::PI / 4.0,
            CrossSection::Rectangular { width, height } => width * height,
        }
    }

    /// Hydraulic equivalent diameter: the diameter itself for round ducts,
    /// `2wh/(w+h)` for rectangular ones.
    pub fn equivalent_diameter(&self) -> Length {
        match *self {
            CrossSection::Round { diameter } => diameter,
            CrossSection::Rectangular { width, height } => {
                let w = width.value;
                let h = height.value;
                Length::new::<uom::si::length::meter>(2.0 * w * h / (w + h))
            }
        }
    }

    pub fn wetted_perimeter(&self) -> Length {
        match *self {
            CrossSection::Round { diameter } => diameter * std::f64::consts::PI,
            CrossSection::Rectangular { width, height } => (width + height) * 2.0,
        }
    }

    /// Vertical extent, checked against the installation clearance.
    pub fn height(&self) -> Length {
        match *self {
            CrossSection::Round { diameter } => diameter,
            CrossSection::Rectangular { height, .. } => height,
        }
    }

    pub fn is_round(&self) -> bool {
        matches!(self, CrossSection::Round { .. })
    }
}

impl fmt::Display for CrossSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            CrossSection::Round { diameter } => write!(f, "DN{:.0}", in_mm(diameter)),
            CrossSection::Rectangular { width, height } => {
                write!(f, "{:.0}x{:.0}", in_mm(width), in_mm(height))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::mm;

    #[test]
    fn round_geometry() {
        let s = CrossSection::Round { diameter: mm(200.0) };
        assert!((s.area().value - 0.031_415_926).abs() < 1e-8);
        assert_eq!(s.equivalent_diameter(), mm(200.0));
        assert!((s.wetted_perimeter().value - 0.628_318_53).abs() < 1e-8);
        assert_eq!(s.to_string(), "DN200");
    }

    #[test]
    fn rectangular_equivalent_diameter() {
        let s = CrossSection::Rectangular {
            width: mm(400.0),
            height: mm(200.0),
        };
        // 2*0.4*0.2/0.6
        assert!((s.equivalent_diameter().value - 0.266_666_667).abs() < 1e-8);
        assert!((s.wetted_perimeter().value - 1.2).abs() < 1e-12);
        assert!((s.area().value - 0.08).abs() < 1e-12);
        assert_eq!(s.height(), mm(200.0));
        assert_eq!(s.to_string(), "400x200");
    }
}
