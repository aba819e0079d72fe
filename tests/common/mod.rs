//! Shared test-matrix generators
//!
//! SPD matrices are built from a prescribed spectrum conjugated by random
//! Givens rotations, so the condition number is exact rather than sampled.

use ndarray::{Array1, Array2};
use rand::Rng;

/// Symmetric positive-definite matrix with condition number exactly `cond`.
///
/// Eigenvalues are spread geometrically in `[1, cond]`, then the diagonal
/// matrix is conjugated by `3 * n` random plane rotations. Rotations are
/// orthogonal so the spectrum is preserved exactly.
pub fn spd_matrix(n: usize, cond: f64) -> Array2<f64> {
    assert!(n >= 2);
    assert!(cond >= 1.0);

    let mut rng = rand::rng();

    let mut a = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        let t = i as f64 / (n - 1) as f64;
        a[[i, i]] = cond.powf(t);
    }

    for _ in 0..3 * n {
        let i = rng.random_range(0..n);
        let mut j = rng.random_range(0..n - 1);
        if j >= i {
            j += 1;
        }
        let theta: f64 = rng.random_range(0.0..std::f64::consts::PI);
        rotate_symmetric(&mut a, i, j, theta);
    }

    a
}

/// Applies the similarity transform `G A G^T` for a Givens rotation in the
/// `(i, j)` plane. Keeps `A` symmetric and its eigenvalues unchanged.
fn rotate_symmetric(a: &mut Array2<f64>, i: usize, j: usize, theta: f64) {
    let (c, s) = (theta.cos(), theta.sin());
    let n = a.nrows();

    // Rows i and j
    for k in 0..n {
        let (ai, aj) = (a[[i, k]], a[[j, k]]);
        a[[i, k]] = c * ai - s * aj;
        a[[j, k]] = s * ai + c * aj;
    }
    // Columns i and j
    for k in 0..n {
        let (ai, aj) = (a[[k, i]], a[[k, j]]);
        a[[k, i]] = c * ai - s * aj;
        a[[k, j]] = s * ai + c * aj;
    }
}

/// Strictly diagonally dominant symmetric matrix, safe for Jacobi splitting.
pub fn diagonally_dominant_matrix(n: usize) -> Array2<f64> {
    let mut rng = rand::rng();
    let mut a = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in (i + 1)..n {
            let v: f64 = rng.random_range(-1.0..1.0);
            a[[i, j]] = v;
            a[[j, i]] = v;
        }
    }
    for i in 0..n {
        let off_sum: f64 = (0..n).filter(|&j| j != i).map(|j| a[[i, j]].abs()).sum();
        a[[i, i]] = off_sum + 1.0;
    }

    a
}

/// Non-symmetric matrix with a dominant diagonal, well away from singular.
pub fn nonsymmetric_matrix(n: usize) -> Array2<f64> {
    let mut rng = rand::rng();
    let mut a = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..n {
            a[[i, j]] = rng.random_range(-1.0..1.0);
        }
        a[[i, i]] += n as f64;
    }

    a
}

/// Random right-hand side with entries in `[-1, 1]`.
pub fn random_rhs(n: usize) -> Array1<f64> {
    let mut rng = rand::rng();
    Array1::from_shape_fn(n, |_| rng.random_range(-1.0..1.0))
}

/// Dense matrix-vector product, independent of the crate under test.
pub fn matvec(a: &Array2<f64>, x: &Array1<f64>) -> Array1<f64> {
    let n = a.nrows();
    Array1::from_shape_fn(n, |i| (0..a.ncols()).map(|j| a[[i, j]] * x[j]).sum())
}

/// Euclidean norm of `b - Ax`, computed independently of the solvers.
pub fn residual_norm(a: &Array2<f64>, b: &Array1<f64>, x: &Array1<f64>) -> f64 {
    let ax = matvec(a, x);
    b.iter()
        .zip(ax.iter())
        .map(|(&bi, &axi)| (bi - axi) * (bi - axi))
        .sum::<f64>()
        .sqrt()
}
