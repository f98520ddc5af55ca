//! Points, grid keys and axis helpers.
//!
//! Coordinates are plain metres. A point's identity inside a graph is its
//! [`GridKey`], the position rounded to [`COORD_DECIMALS`].

use core::fmt;

use crate::numeric::{COORD_DECIMALS, grid_step, round_to};

/// Angle below which two directions count as collinear.
pub const COLLINEAR_TOLERANCE_DEG: f64 = 1.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Rounded integer position, used for node identity and stable ordering.
///
/// Ordering is ascending x, then y, then z.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridKey {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

/// Principal axis a duct segment runs along.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Axis {
    X,
    Y,
    Z,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
            Axis::Z => write!(f, "z"),
        }
    }
}

impl Point {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Position rounded to the coordinate grid.
    pub fn snapped(&self) -> Self {
        Self {
            x: round_to(self.x, COORD_DECIMALS),
            y: round_to(self.y, COORD_DECIMALS),
            z: round_to(self.z, COORD_DECIMALS),
        }
    }

    pub fn key(&self) -> GridKey {
        GridKey {
            x: grid_step(self.x, COORD_DECIMALS),
            y: grid_step(self.y, COORD_DECIMALS),
            z: grid_step(self.z, COORD_DECIMALS),
        }
    }

    pub fn with_z(&self, z: f64) -> Self {
        Self { z, ..*self }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Axis connecting `self` and `other` when they differ in exactly one coordinate.
    pub fn axis_to(&self, other: &Point) -> Option<Axis> {
        let a = self.key();
        let b = other.key();
        match (a.x != b.x, a.y != b.y, a.z != b.z) {
            (true, false, false) => Some(Axis::X),
            (false, true, false) => Some(Axis::Y),
            (false, false, true) => Some(Axis::Z),
            _ => None,
        }
    }

    /// Unit vector from `self` towards `other` (zero vector for coincident points).
    pub fn direction_to(&self, other: &Point) -> [f64; 3] {
        let d = self.distance(other);
        if d == 0.0 {
            return [0.0; 3];
        }
        [
            (other.x - self.x) / d,
            (other.y - self.y) / d,
            (other.z - self.z) / d,
        ]
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

/// Angle in degrees between two direction vectors.
pub fn angle_between_deg(u: [f64; 3], v: [f64; 3]) -> f64 {
    let dot = u[0] * v[0] + u[1] * v[1] + u[2] * v[2];
    dot.clamp(-1.0, 1.0).acos().to_degrees()
}

/// Whether travelling `a → b → c` keeps going straight through `b`.
pub fn passes_straight(a: &Point, b: &Point, c: &Point) -> bool {
    angle_between_deg(a.direction_to(b), b.direction_to(c)) < COLLINEAR_TOLERANCE_DEG
}

/// Whether all points share one x or one y coordinate (on the grid).
pub fn axis_straight(points: &[Point]) -> bool {
    let Some(first) = points.first() else {
        return true;
    };
    let k = first.key();
    let same_x = points.iter().all(|p| p.key().x == k.x);
    let same_y = points.iter().all(|p| p.key().y == k.y);
    same_x || same_y
}
