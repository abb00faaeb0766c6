//! Dense linear solver, generic over real and complex scalars.

use nalgebra::{DMatrix, DVector};
use voltaic_core::Scalar;

use crate::error::{Error, Result};

/// Solve `Ax = b` by Gaussian elimination with partial pivoting.
///
/// The same implementation serves the real analyses (DC, transient) and the
/// complex one (AC); pivot selection and singularity detection use the
/// scalar's `magnitude`, so behaviour is identical across modes. The caller's
/// matrix and vector are untouched; elimination runs on copies.
///
/// Fails with [`Error::Singular`] when the best available pivot in a column
/// falls below the near-zero tolerance, which is also how a complex division
/// by zero is reported.
pub fn solve_dense<T: Scalar>(a: &DMatrix<T>, b: &DVector<T>) -> Result<DVector<T>> {
    if a.nrows() != a.ncols() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: a.ncols(),
        });
    }
    if a.nrows() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: b.len(),
        });
    }
    let n = a.nrows();
    if n == 0 {
        return Err(Error::DimensionMismatch {
            expected: 1,
            actual: 0,
        });
    }

    let mut a = a.clone_owned();
    let mut b = b.clone_owned();

    // Forward elimination
    for k in 0..n {
        // Pick the row with the largest magnitude in column k
        let mut pivot = k;
        for i in (k + 1)..n {
            if a[(i, k)].magnitude() > a[(pivot, k)].magnitude() {
                pivot = i;
            }
        }
        if a[(pivot, k)].is_negligible() {
            return Err(Error::Singular);
        }
        if pivot != k {
            a.swap_rows(k, pivot);
            b.swap_rows(k, pivot);
        }

        for i in (k + 1)..n {
            let factor = a[(i, k)] / a[(k, k)];
            for j in k..n {
                let akj = a[(k, j)];
                a[(i, j)] -= factor * akj;
            }
            let bk = b[k];
            b[i] -= factor * bk;
        }
    }

    // Back substitution
    let mut x = DVector::from_element(n, T::zero());
    for i in (0..n).rev() {
        let mut sum = T::zero();
        for j in (i + 1)..n {
            sum += a[(i, j)] * x[j];
        }
        x[i] = (b[i] - sum) / a[(i, i)];
    }

    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{dmatrix, dvector};
    use num_complex::Complex;

    #[test]
    fn test_solve_simple() {
        // 2x + y = 5
        // x + 3y = 6
        // Solution: x = 1.8, y = 1.4
        let a = dmatrix![2.0, 1.0; 1.0, 3.0];
        let b = dvector![5.0, 6.0];

        let x = solve_dense(&a, &b).unwrap();

        assert!((x[0] - 1.8).abs() < 1e-10);
        assert!((x[1] - 1.4).abs() < 1e-10);
    }

    #[test]
    fn test_inputs_preserved() {
        let a = dmatrix![4.0, 1.0; 2.0, 3.0];
        let b = dvector![1.0, 2.0];

        let _ = solve_dense(&a, &b).unwrap();

        assert_eq!(a, dmatrix![4.0, 1.0; 2.0, 3.0]);
        assert_eq!(b, dvector![1.0, 2.0]);
    }

    #[test]
    fn test_pivoting_handles_zero_diagonal() {
        // Leading zero forces a row swap
        let a = dmatrix![0.0, 1.0; 1.0, 0.0];
        let b = dvector![2.0, 3.0];

        let x = solve_dense(&a, &b).unwrap();
        assert!((x[0] - 3.0).abs() < 1e-12);
        assert!((x[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_singular_matrix() {
        let a = dmatrix![1.0, 2.0; 2.0, 4.0]; // row 2 = 2 * row 1
        let b = dvector![1.0, 2.0];

        assert!(matches!(solve_dense(&a, &b), Err(Error::Singular)));
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = dmatrix![1.0, 2.0; 3.0, 4.0];
        let b = dvector![1.0, 2.0, 3.0];

        assert!(matches!(
            solve_dense(&a, &b),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_system_rejected() {
        let a: DMatrix<f64> = DMatrix::zeros(0, 0);
        let b: DVector<f64> = DVector::zeros(0);

        assert!(matches!(
            solve_dense(&a, &b),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_complex_solve() {
        // (1 + j) * x = 2, so x = 1 - j
        let one_j = Complex::new(1.0, 1.0);
        let a = DMatrix::from_element(1, 1, one_j);
        let b = DVector::from_element(1, Complex::new(2.0, 0.0));

        let x = solve_dense(&a, &b).unwrap();
        assert!((x[0] - Complex::new(1.0, -1.0)).norm() < 1e-12);
    }

    #[test]
    fn test_complex_singular_reported_not_infinite() {
        let a = DMatrix::from_element(2, 2, Complex::new(0.0, 0.0));
        let b = DVector::from_element(2, Complex::new(1.0, 0.0));

        assert!(matches!(solve_dense(&a, &b), Err(Error::Singular)));
    }

    #[test]
    fn test_larger_system_against_known_product() {
        // Build x, compute b = A * x, then recover x
        let a = DMatrix::from_fn(6, 6, |i, j| {
            if i == j {
                10.0
            } else {
                1.0 / ((i as f64 - j as f64).abs() + 1.0)
            }
        });
        let x_true = DVector::from_fn(6, |i, _| (i as f64) - 2.5);
        let b = &a * &x_true;

        let x = solve_dense(&a, &b).unwrap();
        for i in 0..6 {
            assert!(
                (x[i] - x_true[i]).abs() < 1e-10,
                "x[{}] = {} (expected {})",
                i,
                x[i],
                x_true[i]
            );
        }
    }
}
