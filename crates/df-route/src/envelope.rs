//! Building envelope capability.
//!
//! The router only asks two questions of the building: is this point inside
//! the usable volume of a level, and does this straight segment stay inside.

use std::collections::BTreeMap;

use df_core::{Axis, Point, grid_step};

/// Injected spatial-containment capability.
pub trait Envelope: Sync {
    fn is_point_inside_level(&self, elevation: f64, point: &Point) -> bool;
    fn is_edge_inside_level(&self, elevation: f64, a: &Point, b: &Point) -> bool;
}

/// No constraints: every point and segment is inside.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl Envelope for Unbounded {
    fn is_point_inside_level(&self, _elevation: f64, _point: &Point) -> bool {
        true
    }

    fn is_edge_inside_level(&self, _elevation: f64, _a: &Point, _b: &Point) -> bool {
        true
    }
}

/// Axis-aligned plan rectangle, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            min_x: x0.min(x1),
            min_y: y0.min(y1),
            max_x: x0.max(x1),
            max_y: y0.max(y1),
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        const EPS: f64 = 1e-9;
        x >= self.min_x - EPS && x <= self.max_x + EPS && y >= self.min_y - EPS && y <= self.max_y + EPS
    }
}

/// Envelope made of per-level unions of plan rectangles.
///
/// Levels without rectangles are unconstrained.
#[derive(Debug, Clone, Default)]
pub struct RectEnvelope {
    levels: BTreeMap<i64, Vec<Rect>>,
}

const OBLIQUE_SAMPLES: usize = 64;

impl RectEnvelope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rect(&mut self, elevation: f64, rect: Rect) {
        self.levels.entry(level_key(elevation)).or_default().push(rect);
    }

    pub fn with_rect(mut self, elevation: f64, rect: Rect) -> Self {
        self.add_rect(elevation, rect);
        self
    }

    fn rects(&self, elevation: f64) -> Option<&[Rect]> {
        self.levels.get(&level_key(elevation)).map(Vec::as_slice)
    }

    /// Coverage of `[lo, hi]` along one axis at a fixed cross coordinate.
    fn covers_interval(rects: &[Rect], axis: Axis, cross: f64, lo: f64, hi: f64) -> bool {
        let mut spans: Vec<(f64, f64)> = rects
            .iter()
            .filter_map(|r| match axis {
                Axis::X if r.contains(r.min_x, cross) => Some((r.min_x, r.max_x)),
                Axis::Y if r.contains(cross, r.min_y) => Some((r.min_y, r.max_y)),
                _ => None,
            })
            .collect();
        spans.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut reach = lo;
        for (start, end) in spans {
            if start > reach + 1e-9 {
                break;
            }
            reach = reach.max(end);
            if reach >= hi - 1e-9 {
                return true;
            }
        }
        reach >= hi - 1e-9
    }
}

fn level_key(elevation: f64) -> i64 {
    grid_step(elevation, df_core::COORD_DECIMALS)
}

impl Envelope for RectEnvelope {
    fn is_point_inside_level(&self, elevation: f64, point: &Point) -> bool {
        match self.rects(elevation) {
            None => true,
            Some(rects) => rects.iter().any(|r| r.contains(point.x, point.y)),
        }
    }

    fn is_edge_inside_level(&self, elevation: f64, a: &Point, b: &Point) -> bool {
        let Some(rects) = self.rects(elevation) else {
            return true;
        };
        match a.axis_to(b) {
            Some(Axis::X) => Self::covers_interval(rects, Axis::X, a.y, a.x.min(b.x), a.x.max(b.x)),
            Some(Axis::Y) => Self::covers_interval(rects, Axis::Y, a.x, a.y.min(b.y), a.y.max(b.y)),
            Some(Axis::Z) => self.is_point_inside_level(elevation, a),
            None => (0..=OBLIQUE_SAMPLES).all(|i| {
                let t = i as f64 / OBLIQUE_SAMPLES as f64;
                let x = a.x + (b.x - a.x) * t;
                let y = a.y + (b.y - a.y) * t;
                rects.iter().any(|r| r.contains(x, y))
            }),
        }
    }
}
