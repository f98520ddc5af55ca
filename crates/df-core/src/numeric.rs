use crate::CoreError;

/// Floating point type used throughout the engine
pub type Real = f64;

/// Number of decimals coordinates are rounded to before they become node identities.
pub const COORD_DECIMALS: u32 = 3;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

/// `a >= b`, accepting `a` that falls short of `b` by no more than the tolerance.
pub fn at_least(a: Real, b: Real, tol: Tolerances) -> bool {
    a >= b || nearly_equal(a, b, tol)
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Scale factor for `decimals` digits after the point.
pub fn decimal_scale(decimals: u32) -> Real {
    10f64.powi(decimals as i32)
}

/// Round `v` to `decimals` digits after the point.
pub fn round_to(v: Real, decimals: u32) -> Real {
    let scale = decimal_scale(decimals);
    let r = (v * scale).round() / scale;
    // normalise -0.0 so equal coordinates compare and print alike
    if r == 0.0 { 0.0 } else { r }
}

/// Integer grid step of `v` at `decimals` resolution.
pub fn grid_step(v: Real, decimals: u32) -> i64 {
    (v * decimal_scale(decimals)).round() as i64
}

/// Linear interpolation in a table sorted by `x`, clamped at both ends.
pub fn interpolate(table: &[(Real, Real)], x: Real) -> Real {
    match table {
        [] => 0.0,
        [(_, y)] => *y,
        _ => {
            let (x0, y0) = table[0];
            if x <= x0 {
                return y0;
            }
            for w in table.windows(2) {
                let (xa, ya) = w[0];
                let (xb, yb) = w[1];
                if x <= xb {
                    let t = (x - xa) / (xb - xa);
                    return ya + t * (yb - ya);
                }
            }
            table[table.len() - 1].1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn at_least_is_inclusive() {
        let tol = Tolerances::default();
        assert!(at_least(0.02, 0.02, tol));
        assert!(at_least(0.02 - 1e-15, 0.02, tol));
        assert!(!at_least(0.019, 0.02, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn rounding_helpers() {
        assert_eq!(round_to(1.23456, 3), 1.235);
        assert_eq!(round_to(-0.0001, 3), 0.0);
        assert_eq!(grid_step(2.5004, 3), 2500);
        assert_eq!(grid_step(-1.0, 2), -100);
    }

    #[test]
    fn interpolation_clamps() {
        let table = [(0.0, 0.0), (1.0, 10.0), (2.0, 12.0)];
        assert_eq!(interpolate(&table, -1.0), 0.0);
        assert_eq!(interpolate(&table, 0.5), 5.0);
        assert_eq!(interpolate(&table, 1.5), 11.0);
        assert_eq!(interpolate(&table, 9.0), 12.0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn rounding_is_idempotent(v in -1.0e4_f64..1.0e4, decimals in 0_u32..=COORD_DECIMALS) {
            let once = round_to(v, decimals);
            prop_assert_eq!(round_to(once, decimals), once);
            prop_assert_eq!(grid_step(once, decimals), grid_step(v, decimals));
        }

        #[test]
        fn interpolation_stays_within_table(x in -5.0_f64..15.0) {
            let table = [(0.0, 1.0), (5.0, 0.4), (10.0, 0.2)];
            let y = interpolate(&table, x);
            prop_assert!((0.2..=1.0).contains(&y));
        }
    }
}
