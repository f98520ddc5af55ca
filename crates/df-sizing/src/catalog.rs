//! Duct dimension catalogs.

use df_core::units::{Length, mm};
use df_core::CrossSection;

use crate::error::{SizingError, SizingResult};

/// Nominal round duct diameters after EN 1506, in millimetres.
pub const EN1506_ROUND_MM: [f64; 25] = [
    80.0, 100.0, 125.0, 150.0, 160.0, 180.0, 200.0, 224.0, 250.0, 280.0, 300.0, 315.0, 355.0,
    400.0, 450.0, 500.0, 560.0, 600.0, 630.0, 710.0, 800.0, 900.0, 1000.0, 1120.0, 1250.0,
];

/// Rectangular side lengths in millimetres, combined pairwise.
pub const RECTANGULAR_SIDES_MM: [f64; 15] = [
    100.0, 150.0, 200.0, 250.0, 300.0, 400.0, 500.0, 600.0, 800.0, 1000.0, 1200.0, 1400.0,
    1600.0, 1800.0, 2000.0,
];

/// Widest width-to-height ratio generated for the default rectangular list.
pub const MAX_ASPECT_RATIO: f64 = 4.0;

/// Available cross-sections, each list ascending by area.
#[derive(Debug, Clone, PartialEq)]
pub struct DuctCatalog {
    round: Vec<CrossSection>,
    rectangular: Vec<CrossSection>,
}

impl Default for DuctCatalog {
    fn default() -> Self {
        let round = EN1506_ROUND_MM.iter().map(|&d| mm(d)).collect::<Vec<_>>();
        let mut rectangular = Vec::new();
        for &w in &RECTANGULAR_SIDES_MM {
            for &h in RECTANGULAR_SIDES_MM.iter().filter(|&&h| h <= w && w / h <= MAX_ASPECT_RATIO) {
                rectangular.push((mm(w), mm(h)));
            }
        }
        Self::from_parts(round, rectangular)
    }
}

impl DuctCatalog {
    /// Catalog from explicit diameters and `(width, height)` pairs.
    ///
    /// Entries are sorted ascending by area; equal areas put the squarer
    /// section first.
    pub fn from_parts(diameters: Vec<Length>, rectangles: Vec<(Length, Length)>) -> Self {
        let mut round: Vec<CrossSection> = diameters
            .into_iter()
            .map(|diameter| CrossSection::Round { diameter })
            .collect();
        let mut rectangular: Vec<CrossSection> = rectangles
            .into_iter()
            .map(|(width, height)| CrossSection::Rectangular { width, height })
            .collect();
        sort_by_area(&mut round);
        sort_by_area(&mut rectangular);
        round.dedup();
        rectangular.dedup();
        Self { round, rectangular }
    }

    /// Reject catalogs with missing or non-physical entries.
    pub fn validate(&self) -> SizingResult<()> {
        if self.round.is_empty() && self.rectangular.is_empty() {
            return Err(SizingError::EmptyCatalog {
                what: "no round or rectangular sections",
            });
        }
        let valid = |s: &CrossSection| match *s {
            CrossSection::Round { diameter } => diameter.value.is_finite() && diameter.value > 0.0,
            CrossSection::Rectangular { width, height } => {
                width.value.is_finite() && height.value.is_finite() && width.value > 0.0 && height.value > 0.0
            }
        };
        if !self.round.iter().chain(&self.rectangular).all(valid) {
            return Err(SizingError::InvalidArg {
                what: "catalog dimensions must be positive",
            });
        }
        Ok(())
    }

    pub fn round(&self) -> &[CrossSection] {
        &self.round
    }

    pub fn rectangular(&self) -> &[CrossSection] {
        &self.rectangular
    }
}

fn sort_by_area(sections: &mut [CrossSection]) {
    sections.sort_by(|a, b| {
        a.area()
            .value
            .total_cmp(&b.area().value)
            .then(aspect(a).total_cmp(&aspect(b)))
            .then(a.height().value.total_cmp(&b.height().value))
    });
}

fn aspect(section: &CrossSection) -> f64 {
    match *section {
        CrossSection::Round { .. } => 1.0,
        CrossSection::Rectangular { width, height } => {
            width.value.max(height.value) / width.value.min(height.value)
        }
    }
}
