//! Conjugate Gradient solvers
//!
//! [`conjugate_gradient`] is the classical Hestenes-Stiefel recurrence for
//! symmetric positive-definite systems: search directions are mutually
//! A-conjugate, giving exact convergence in at most `n` iterations in exact
//! arithmetic.
//!
//! [`conjugate_gradient_normal`] extends this to general (non-symmetric,
//! possibly rectangular) systems by solving the normal equations
//! `A'A x = A'b` through a matrix-free [`NormalEquations`] wrapper. The
//! squared condition number `cond(A'A) ~ cond(A)^2` is the inherent price of
//! that generality, not a defect.
//!
//! [`conjugate_gram_schmidt`] is a building-block routine producing mutually
//! A-conjugate vectors from a linearly independent set; it is used for
//! verification, not on the solve hot path.

use crate::blas_helpers::{inner_product, residual, vector_norm};
use crate::convergence::{Recorder, ResidualTest, SolverResult};
use crate::error::SolverError;
use crate::traits::{check_guess, check_square_system, LinearOperator, RealScalar};
use ndarray::{Array1, Array2};
use num_traits::ToPrimitive;
use std::marker::PhantomData;

/// Conjugate Gradient configuration
#[derive(Debug, Clone)]
pub struct CgConfig<T> {
    /// Absolute residual-norm stopping threshold
    pub tolerance: T,
    /// Hard iteration cap
    pub max_iterations: usize,
    /// Populate the per-iteration diagnostic history
    pub record_history: bool,
    /// Additionally store every iterate (implies history)
    pub record_iterates: bool,
    /// Log progress every N iterations (0 = silent)
    pub print_interval: usize,
}

impl Default for CgConfig<f64> {
    fn default() -> Self {
        Self {
            tolerance: 1e-5,
            max_iterations: 500,
            record_history: false,
            record_iterates: false,
            print_interval: 0,
        }
    }
}

/// Solve Ax = b using the Conjugate Gradient method
///
/// Only correct for symmetric positive-definite matrices; for general
/// systems use [`conjugate_gradient_normal`]. Starts from the zero vector.
pub fn conjugate_gradient<T, A>(
    operator: &A,
    b: &Array1<T>,
    config: &CgConfig<T>,
) -> Result<SolverResult<T>, SolverError>
where
    T: RealScalar,
    A: LinearOperator<T>,
{
    let n = check_square_system(operator, b)?;
    let x0 = Array1::from_elem(n, T::zero());
    conjugate_gradient_with_guess(operator, b, &x0, config)
}

/// Conjugate Gradient from an explicit initial guess
pub fn conjugate_gradient_with_guess<T, A>(
    operator: &A,
    b: &Array1<T>,
    x0: &Array1<T>,
    config: &CgConfig<T>,
) -> Result<SolverResult<T>, SolverError>
where
    T: RealScalar,
    A: LinearOperator<T>,
{
    let n = check_square_system(operator, b)?;
    check_guess(n, x0)?;

    let test = ResidualTest::new(config.tolerance);
    let mut recorder = Recorder::new(
        config.record_history,
        config.record_iterates,
        config.max_iterations,
    );
    let mut x = x0.clone();

    // d(0) = r(0) = b - Ax(0)
    let mut r = residual(operator, b, &x);
    let mut d = r.clone();
    let mut rr = inner_product(&r, &r);

    for k in 0..config.max_iterations {
        let r_norm = rr.sqrt();
        recorder.record(k, r_norm, &x);

        if config.print_interval > 0 && k % config.print_interval == 0 {
            log::debug!(
                "CG iteration {}: residual = {:.6e}",
                k,
                r_norm.to_f64().unwrap_or(0.0)
            );
        }

        if test.is_met(r_norm) {
            // The recurrence residual drifts over long runs; only a freshly
            // computed residual may declare success.
            let r_true = residual(operator, b, &x);
            let true_norm = vector_norm(&r_true);
            if test.is_met(true_norm) {
                return Ok(SolverResult {
                    x,
                    iterations: k,
                    residual_norm: true_norm,
                    converged: true,
                    history: recorder.finish(),
                });
            }
            // Restart from the true residual.
            r = r_true;
            d = r.clone();
            rr = inner_product(&r, &r);
        }

        let ad = operator.apply(&d);
        let dad = inner_product(&d, &ad);
        if dad.abs() < T::degeneracy_threshold() {
            return Err(SolverError::DegenerateDirection {
                iteration: k,
                quantity: "d'Ad",
                value: dad.to_f64().unwrap_or(0.0),
            });
        }

        let a = rr / dad;
        crate::blas_helpers::axpy(a, &d, &mut x);
        // New residual, A-orthogonal to all previous directions except d
        crate::blas_helpers::axpy(-a, &ad, &mut r);

        let rr_new = inner_product(&r, &r);
        if rr.abs() < T::degeneracy_threshold() {
            return Err(SolverError::DegenerateDirection {
                iteration: k,
                quantity: "r'r",
                value: rr.to_f64().unwrap_or(0.0),
            });
        }

        let beta = rr_new / rr;
        rr = rr_new;

        // d = r + beta * d
        for (di, ri) in d.iter_mut().zip(r.iter()) {
            *di = *ri + beta * *di;
        }
    }

    let r_norm = vector_norm(&residual(operator, b, &x));
    recorder.record(config.max_iterations, r_norm, &x);
    Ok(SolverResult {
        x,
        iterations: config.max_iterations,
        residual_norm: r_norm,
        converged: test.is_met(r_norm),
        history: recorder.finish(),
    })
}

/// Matrix-free normal-equations operator `x -> A'(Ax)`
///
/// Square (`n x n` for an `m x n` inner operator), symmetric and positive
/// semi-definite by construction. Deliberately does not implement
/// [`crate::DiagonalAccess`]: the diagonal of `A'A` is not available without
/// forming it.
pub struct NormalEquations<'a, T, A> {
    inner: &'a A,
    _scalar: PhantomData<T>,
}

impl<'a, T, A> NormalEquations<'a, T, A>
where
    T: RealScalar,
    A: LinearOperator<T>,
{
    /// Wrap an operator as its normal-equations form `A'A`
    pub fn new(inner: &'a A) -> Self {
        Self {
            inner,
            _scalar: PhantomData,
        }
    }

    /// The transformed right-hand side `A'b`
    pub fn transform_rhs(&self, b: &Array1<T>) -> Array1<T> {
        self.inner.apply_transpose(b)
    }
}

impl<T, A> LinearOperator<T> for NormalEquations<'_, T, A>
where
    T: RealScalar,
    A: LinearOperator<T>,
{
    fn num_rows(&self) -> usize {
        self.inner.num_cols()
    }

    fn num_cols(&self) -> usize {
        self.inner.num_cols()
    }

    fn apply(&self, x: &Array1<T>) -> Array1<T> {
        self.inner.apply_transpose(&self.inner.apply(x))
    }

    fn apply_transpose(&self, x: &Array1<T>) -> Array1<T> {
        // A'A is symmetric
        self.apply(x)
    }
}

/// Solve a general system Ax = b via the normal equations `A'A x = A'b`
///
/// Accepts non-symmetric and rectangular `A` (least-squares sense for
/// overdetermined systems). Convergence is judged on the transformed
/// residual `||A'b - A'Ax||` against `config.tolerance`.
pub fn conjugate_gradient_normal<T, A>(
    operator: &A,
    b: &Array1<T>,
    config: &CgConfig<T>,
) -> Result<SolverResult<T>, SolverError>
where
    T: RealScalar,
    A: LinearOperator<T>,
{
    let x0 = Array1::from_elem(operator.num_cols(), T::zero());
    conjugate_gradient_normal_with_guess(operator, b, &x0, config)
}

/// Normal-equations CG from an explicit initial guess
pub fn conjugate_gradient_normal_with_guess<T, A>(
    operator: &A,
    b: &Array1<T>,
    x0: &Array1<T>,
    config: &CgConfig<T>,
) -> Result<SolverResult<T>, SolverError>
where
    T: RealScalar,
    A: LinearOperator<T>,
{
    if b.len() != operator.num_rows() {
        return Err(SolverError::DimensionMismatch {
            expected: operator.num_rows(),
            got: b.len(),
        });
    }

    let normal = NormalEquations::new(operator);
    let bt = normal.transform_rhs(b);
    conjugate_gradient_with_guess(&normal, &bt, x0, config)
}

/// Conjugate Gram-Schmidt process
///
/// Sequentially A-orthogonalizes the columns of `u` (which must be linearly
/// independent), returning a set of mutually A-conjugate vectors:
/// `d_i' A d_j = 0` for `i != j`.
///
/// # Errors
///
/// [`SolverError::DegenerateDirection`] if some `d_j' A d_j` is numerically
/// zero (columns not independent, or `A` singular along a direction).
pub fn conjugate_gram_schmidt<T, A>(
    operator: &A,
    u: &Array2<T>,
) -> Result<Array2<T>, SolverError>
where
    T: RealScalar,
    A: LinearOperator<T>,
{
    if u.nrows() != operator.num_cols() {
        return Err(SolverError::DimensionMismatch {
            expected: operator.num_cols(),
            got: u.nrows(),
        });
    }

    let mut d = u.clone();

    for i in 1..u.ncols() {
        for j in 0..i {
            let dj = d.column(j).to_owned();
            let adj = operator.apply(&dj);

            let denom = inner_product(&dj, &adj);
            if denom.abs() < T::degeneracy_threshold() {
                return Err(SolverError::DegenerateDirection {
                    iteration: j,
                    quantity: "d'Ad",
                    value: denom.to_f64().unwrap_or(0.0),
                });
            }

            let ui = u.column(i);
            let mut uadj = T::zero();
            for (uv, av) in ui.iter().zip(adj.iter()) {
                uadj += *uv * *av;
            }
            let beta = -uadj / denom;

            let mut di = d.column_mut(i);
            for (dv, jv) in di.iter_mut().zip(dj.iter()) {
                *dv += beta * *jv;
            }
        }
    }

    Ok(d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::CsrMatrix;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_cg_reference_system_two_iterations() {
        // A = [[4,1],[1,3]], b = [1,2]: dimension 2, so CG must converge
        // in at most 2 iterations to x = [1/11, 7/11].
        let a = array![[4.0_f64, 1.0], [1.0, 3.0]];
        let b = array![1.0_f64, 2.0];

        let config = CgConfig {
            tolerance: 1e-10,
            ..CgConfig::default()
        };

        let result = conjugate_gradient(&a, &b, &config).unwrap();
        assert!(result.converged);
        assert!(result.iterations <= 2);
        assert_relative_eq!(result.x[0], 1.0 / 11.0, epsilon = 1e-6);
        assert_relative_eq!(result.x[1], 7.0 / 11.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cg_sparse_identity() {
        let n = 5;
        let id: CsrMatrix<f64> = CsrMatrix::identity(n);
        let b = Array1::from_iter((1..=n).map(|i| i as f64));

        let config = CgConfig {
            tolerance: 1e-12,
            max_iterations: 10,
            ..CgConfig::default()
        };

        let result = conjugate_gradient(&id, &b, &config).unwrap();
        assert!(result.converged);
        assert!(result.iterations <= 2);
        for i in 0..n {
            assert_relative_eq!(result.x[i], b[i], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_cg_degenerate_direction() {
        let a = array![[0.0_f64, 0.0], [0.0, 0.0]];
        let b = array![1.0_f64, 2.0];

        let err = conjugate_gradient(&a, &b, &CgConfig::default()).unwrap_err();
        assert!(matches!(err, SolverError::DegenerateDirection { .. }));
    }

    #[test]
    fn test_normal_equations_nonsymmetric() {
        // Non-symmetric but invertible; b built from a known solution.
        let a = array![[3.0_f64, 1.0, 0.0], [0.0, 2.0, 1.0], [1.0, 0.0, 4.0]];
        let x_true = array![1.0_f64, -2.0, 0.5];
        let b = a.apply(&x_true);

        let config = CgConfig {
            tolerance: 1e-10,
            max_iterations: 100,
            ..CgConfig::default()
        };

        let result = conjugate_gradient_normal(&a, &b, &config).unwrap();
        assert!(result.converged);
        for i in 0..3 {
            assert_relative_eq!(result.x[i], x_true[i], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_normal_equations_operator_is_symmetric() {
        let a = array![[3.0_f64, 1.0], [0.0, 2.0], [1.0, 1.0]];
        let normal = NormalEquations::new(&a);

        assert_eq!(normal.num_rows(), 2);
        assert_eq!(normal.num_cols(), 2);

        // x' (A'A) y == y' (A'A) x
        let x = array![1.0_f64, 2.0];
        let y = array![-1.0_f64, 0.5];
        let xay = inner_product(&x, &normal.apply(&y));
        let yax = inner_product(&y, &normal.apply(&x));
        assert_relative_eq!(xay, yax, epsilon = 1e-12);
    }

    #[test]
    fn test_conjugate_gram_schmidt_mutual_conjugacy() {
        let a = array![[4.0_f64, 1.0, 0.0], [1.0, 3.0, 0.5], [0.0, 0.5, 2.0]];
        // Standard basis is linearly independent
        let u = Array2::<f64>::eye(3);

        let d = conjugate_gram_schmidt(&a, &u).unwrap();

        for i in 0..3 {
            for j in 0..3 {
                if i != j {
                    let di = d.column(i).to_owned();
                    let dj = d.column(j).to_owned();
                    let dad = inner_product(&di, &a.apply(&dj));
                    assert_relative_eq!(dad, 0.0, epsilon = 1e-10);
                }
            }
        }
    }

    #[test]
    fn test_conjugate_gram_schmidt_degenerate() {
        let a = array![[0.0_f64, 0.0], [0.0, 0.0]];
        let u = Array2::<f64>::eye(2);

        let err = conjugate_gram_schmidt(&a, &u).unwrap_err();
        assert!(matches!(err, SolverError::DegenerateDirection { .. }));
    }
}
