//! Finite difference Jacobian of the network residual.

use crate::error::HydraulicResult;
use nalgebra::{DMatrix, DVector};

/// Forward-difference Jacobian.
///
/// Column `j` is `(f(x + h e_j) - f(x)) / h` with `h = epsilon * max(|x_j|, 1)`.
pub fn finite_difference_jacobian<F>(
    x: &DVector<f64>,
    f: F,
    epsilon: f64,
) -> HydraulicResult<DMatrix<f64>>
where
    F: Fn(&DVector<f64>) -> HydraulicResult<DVector<f64>>,
{
    let n = x.len();
    let f_x = f(x)?;
    let mut jac = DMatrix::zeros(f_x.len(), n);

    for j in 0..n {
        let mut x_perturbed = x.clone();
        let dx = epsilon * x[j].abs().max(1.0);
        x_perturbed[j] += dx;

        let df = (f(&x_perturbed)? - &f_x) / dx;
        jac.set_column(j, &df);
    }

    Ok(jac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jacobian_linear() {
        let f = |x: &DVector<f64>| -> HydraulicResult<DVector<f64>> {
            Ok(DVector::from_vec(vec![2.0 * x[0] - x[1], x[1]]))
        };
        let x = DVector::from_vec(vec![3.0, 1.0]);
        let jac = finite_difference_jacobian(&x, f, 1e-7).unwrap();
        assert!((jac[(0, 0)] - 2.0).abs() < 1e-5);
        assert!((jac[(0, 1)] + 1.0).abs() < 1e-5);
        assert!(jac[(1, 0)].abs() < 1e-9);
    }

    #[test]
    fn jacobian_signed_square() {
        // Velocity-head shape: f(q) = q|q|, f'(q) = 2|q|
        let f = |x: &DVector<f64>| -> HydraulicResult<DVector<f64>> {
            Ok(DVector::from_element(1, x[0] * x[0].abs()))
        };
        let x = DVector::from_element(1, -3.0);
        let jac = finite_difference_jacobian(&x, f, 1e-7).unwrap();
        assert!((jac[(0, 0)] - 6.0).abs() < 1e-4);
    }
}
