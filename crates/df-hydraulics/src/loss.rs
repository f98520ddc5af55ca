//! Local loss coefficient correlations.
//!
//! Each function returns ζ referenced to the velocity named in its docs.
//! Callers convert to the velocity of the edge that carries the fitting and
//! clamp negative values to zero.

use df_core::interpolate;

/// Angle factor K_θ for bends, relative to a 90° bend.
const BEND_ANGLE_FACTOR: [(f64, f64); 11] = [
    (0.0, 0.0),
    (20.0, 0.31),
    (30.0, 0.45),
    (45.0, 0.60),
    (60.0, 0.78),
    (75.0, 0.90),
    (90.0, 1.00),
    (110.0, 1.13),
    (130.0, 1.20),
    (150.0, 1.28),
    (180.0, 1.40),
];

/// 90° smooth round bend, ζ over radius-to-diameter ratio.
const ROUND_BEND_90: [(f64, f64); 5] = [(0.5, 0.71), (0.75, 0.33), (1.0, 0.22), (1.5, 0.15), (2.0, 0.13)];

/// 90° rectangular radius bend (r/W = 1), ζ over height-to-width ratio.
const RECT_BEND_90: [(f64, f64); 9] = [
    (0.25, 0.21),
    (0.5, 0.19),
    (0.75, 0.18),
    (1.0, 0.18),
    (1.5, 0.17),
    (2.0, 0.17),
    (4.0, 0.17),
    (6.0, 0.19),
    (8.0, 0.21),
];

/// Bend radius assumed for fabricated round bends, as a multiple of diameter.
pub const ROUND_BEND_RADIUS_RATIO: f64 = 1.0;

/// Round bend deflecting the flow by `angle_deg`; referenced to the bend velocity.
pub fn round_bend(angle_deg: f64) -> f64 {
    interpolate(&ROUND_BEND_90, ROUND_BEND_RADIUS_RATIO) * interpolate(&BEND_ANGLE_FACTOR, angle_deg)
}

/// Rectangular bend with height/width `aspect`; referenced to the bend velocity.
pub fn rectangular_bend(angle_deg: f64, aspect: f64) -> f64 {
    interpolate(&RECT_BEND_90, aspect) * interpolate(&BEND_ANGLE_FACTOR, angle_deg)
}

/// Sudden contraction from `a_up` to `a_down`; referenced to the downstream velocity.
pub fn contraction(a_up: f64, a_down: f64) -> f64 {
    0.5 * (1.0 - a_down / a_up).max(0.0).powf(0.75)
}

/// Sudden expansion (Borda–Carnot); referenced to the upstream velocity.
pub fn expansion(a_up: f64, a_down: f64) -> f64 {
    (1.0 - a_up / a_down).max(0.0).powi(2)
}

/// Diverging straight passage; referenced to the combined (upstream) velocity.
///
/// `ratio` is straight-leg velocity over combined velocity.
pub fn diverging_straight(ratio: f64) -> f64 {
    0.4 * (1.0 - ratio).powi(2)
}

/// Diverging branch leaving at `angle_deg`; referenced to the combined velocity.
///
/// `ratio` is branch velocity over combined velocity.
pub fn diverging_branch(ratio: f64, angle_deg: f64) -> f64 {
    let a = if ratio <= 0.8 { 1.0 } else { 0.9 };
    a * (1.0 + ratio * ratio - 2.0 * ratio * angle_deg.to_radians().cos())
}

/// Converging straight passage; referenced to the combined (downstream) velocity.
///
/// `flow_share` is the side-branch flow over the combined flow.
pub fn converging_straight(flow_share: f64) -> f64 {
    1.55 * flow_share - flow_share * flow_share
}

/// Converging branch joining the main; referenced to the combined velocity.
///
/// `ratio` is branch velocity over combined velocity, `flow_share` the branch
/// flow over the combined flow.
pub fn converging_branch(ratio: f64, flow_share: f64) -> f64 {
    1.0 + ratio * ratio - 2.0 * (1.0 - flow_share).powi(2)
}

/// Re-reference a coefficient from velocity `v_from` to `v_to` (equal losses).
pub fn rereference(zeta: f64, v_from: f64, v_to: f64) -> f64 {
    if v_to.abs() < f64::EPSILON {
        return 0.0;
    }
    zeta * (v_from / v_to).powi(2)
}
