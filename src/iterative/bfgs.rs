//! BFGS quasi-Newton solver
//!
//! Solves the quadratic `min f(x) = (1/2) x'Ax - b'x` (equivalently `Ax = b`
//! for symmetric `A`) by maintaining an inverse-Hessian approximation `H`
//! refined every iteration from gradient and step information alone; the
//! true Hessian `A` is never factored or inverted.
//!
//! Because the objective is quadratic, the step along `p = -H*g` has the
//! closed form `a = (b'p - x'Ap)/(p'Ap)` and no line search is needed; for
//! the general case the pluggable policies in [`crate::stepsize`]
//! (backtracking, Wolfe acceptance) apply.
//!
//! The rank-2 secant update (Nocedal & Wright eq. 6.17, in the expanded
//! form using `Hy`):
//!
//! ```text
//! rho = 1 / (y's)
//! H <- H - rho*(Hy*s' + s*(Hy)') + (rho^2 * y'Hy + rho) * s*s'
//! ```
//!
//! keeps `H` symmetric, and positive-definite as long as the curvature
//! condition `y's > 0` holds each step.

use crate::blas_helpers::{inner_product, vector_norm};
use crate::convergence::{Recorder, ResidualTest, SolverResult};
use crate::error::SolverError;
use crate::stepsize::exact_quadratic_step;
use crate::traits::{check_guess, check_square_system, LinearOperator, RealScalar};
use ndarray::{Array1, Array2};
use num_traits::ToPrimitive;

/// BFGS configuration
#[derive(Debug, Clone)]
pub struct BfgsConfig<T> {
    /// Absolute gradient-norm stopping threshold
    /// (the gradient `Ax - b` is the negated residual, so this matches the
    /// shared residual-norm convention)
    pub tolerance: T,
    /// Hard iteration cap
    pub max_iterations: usize,
    /// Scale `B` of the initial inverse-Hessian approximation `H0 = B*I`
    pub initial_scale: T,
    /// Populate the per-iteration diagnostic history
    pub record_history: bool,
    /// Additionally store every iterate (implies history)
    pub record_iterates: bool,
    /// Log progress every N iterations (0 = silent)
    pub print_interval: usize,
}

impl Default for BfgsConfig<f64> {
    fn default() -> Self {
        Self {
            tolerance: 1e-5,
            max_iterations: 500,
            initial_scale: 1.0,
            record_history: false,
            record_iterates: false,
            print_interval: 0,
        }
    }
}

/// Solve Ax = b by BFGS starting from the zero vector and `H0 = B*I`
pub fn bfgs<T, A>(
    operator: &A,
    b: &Array1<T>,
    config: &BfgsConfig<T>,
) -> Result<SolverResult<T>, SolverError>
where
    T: RealScalar,
    A: LinearOperator<T>,
{
    let n = check_square_system(operator, b)?;
    let x0 = Array1::from_elem(n, T::zero());
    bfgs_with_guess(operator, b, &x0, config)
}

/// BFGS from an explicit initial guess, `H0 = B*I`
pub fn bfgs_with_guess<T, A>(
    operator: &A,
    b: &Array1<T>,
    x0: &Array1<T>,
    config: &BfgsConfig<T>,
) -> Result<SolverResult<T>, SolverError>
where
    T: RealScalar,
    A: LinearOperator<T>,
{
    let n = check_square_system(operator, b)?;
    let mut h0 = Array2::from_elem((n, n), T::zero());
    for i in 0..n {
        h0[[i, i]] = config.initial_scale;
    }
    bfgs_with_hessian(operator, b, x0, h0, config)
}

/// BFGS from an explicit initial guess and an explicit initial
/// inverse-Hessian approximation
///
/// `h0` should be symmetric positive-definite; the update preserves
/// symmetry, and positive-definiteness as long as `y's > 0` every step.
pub fn bfgs_with_hessian<T, A>(
    operator: &A,
    b: &Array1<T>,
    x0: &Array1<T>,
    mut h: Array2<T>,
    config: &BfgsConfig<T>,
) -> Result<SolverResult<T>, SolverError>
where
    T: RealScalar,
    A: LinearOperator<T>,
{
    let n = check_square_system(operator, b)?;
    check_guess(n, x0)?;
    if h.nrows() != n || h.ncols() != n {
        return Err(SolverError::DimensionMismatch {
            expected: n,
            got: h.nrows().max(h.ncols()),
        });
    }

    let test = ResidualTest::new(config.tolerance);
    let mut recorder = Recorder::new(
        config.record_history,
        config.record_iterates,
        config.max_iterations,
    );

    let mut x = x0.clone();
    // gradient of the quadratic: g = Ax - b
    let mut g = {
        let mut ax = operator.apply(&x);
        for (gi, bi) in ax.iter_mut().zip(b.iter()) {
            *gi -= *bi;
        }
        ax
    };
    let mut g_norm = vector_norm(&g);
    // search direction p = -H*g
    let mut p = neg_matvec(&h, &g);

    for k in 0..config.max_iterations {
        recorder.record(k, g_norm, &x);

        if config.print_interval > 0 && k % config.print_interval == 0 {
            log::debug!(
                "BFGS iteration {}: gradient norm = {:.6e}",
                k,
                g_norm.to_f64().unwrap_or(0.0)
            );
        }

        if test.is_met(g_norm) {
            return Ok(SolverResult {
                x,
                iterations: k,
                residual_norm: g_norm,
                converged: true,
                history: recorder.finish(),
            });
        }

        // Exact step for the quadratic along p (general BFGS would run a
        // line search here)
        let a = exact_quadratic_step(operator, b, &x, &p, k)?;

        // x_{k+1} and its gradient
        let mut x_new = x.clone();
        crate::blas_helpers::axpy(a, &p, &mut x_new);
        let g_new = {
            let mut ax = operator.apply(&x_new);
            for (gi, bi) in ax.iter_mut().zip(b.iter()) {
                *gi -= *bi;
            }
            ax
        };

        // Step and gradient change
        let s = &x_new - &x;
        let y = &g_new - &g;

        let ys = inner_product(&y, &s);
        if ys.abs() < T::degeneracy_threshold() {
            return Err(SolverError::CurvatureBreakdown {
                iteration: k,
                ys: ys.to_f64().unwrap_or(0.0),
            });
        }
        let rho = T::one() / ys;

        apply_rank2_update(&mut h, &s, &y, rho);

        p = neg_matvec(&h, &g_new);
        x = x_new;
        g = g_new;
        g_norm = vector_norm(&g);
    }

    recorder.record(config.max_iterations, g_norm, &x);
    Ok(SolverResult {
        converged: test.is_met(g_norm),
        x,
        iterations: config.max_iterations,
        residual_norm: g_norm,
        history: recorder.finish(),
    })
}

/// Compute -M*v for a dense square matrix
fn neg_matvec<T: RealScalar>(m: &Array2<T>, v: &Array1<T>) -> Array1<T> {
    let n = m.nrows();
    let mut out = Array1::from_elem(n, T::zero());
    for i in 0..n {
        let mut sum = T::zero();
        for j in 0..n {
            sum += m[[i, j]] * v[j];
        }
        out[i] = -sum;
    }
    out
}

/// The symmetric rank-2 BFGS update of the inverse-Hessian approximation:
/// `H <- H - rho*(Hy*s' + s*(Hy)') + (rho^2 * y'Hy + rho) * s*s'`
fn apply_rank2_update<T: RealScalar>(h: &mut Array2<T>, s: &Array1<T>, y: &Array1<T>, rho: T) {
    let n = h.nrows();

    let hy = {
        let mut hy = Array1::from_elem(n, T::zero());
        for i in 0..n {
            let mut sum = T::zero();
            for j in 0..n {
                sum += h[[i, j]] * y[j];
            }
            hy[i] = sum;
        }
        hy
    };
    let yhy = inner_product(y, &hy);
    let ss_coef = rho * rho * yhy + rho;

    for i in 0..n {
        for j in 0..n {
            h[[i, j]] += ss_coef * s[i] * s[j] - rho * (hy[i] * s[j] + s[i] * hy[j]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_bfgs_reference_system() {
        let a = array![[4.0_f64, 1.0], [1.0, 3.0]];
        let b = array![1.0_f64, 2.0];

        let config = BfgsConfig {
            tolerance: 1e-8,
            ..BfgsConfig::default()
        };

        let result = bfgs(&a, &b, &config).unwrap();
        assert!(result.converged);
        assert_relative_eq!(result.x[0], 1.0 / 11.0, epsilon = 1e-6);
        assert_relative_eq!(result.x[1], 7.0 / 11.0, epsilon = 1e-6);
    }

    #[test]
    fn test_bfgs_initial_scale() {
        let a = array![[4.0_f64, 1.0], [1.0, 3.0]];
        let b = array![1.0_f64, 2.0];

        let config = BfgsConfig {
            tolerance: 1e-8,
            initial_scale: 2.0,
            ..BfgsConfig::default()
        };

        let result = bfgs(&a, &b, &config).unwrap();
        assert!(result.converged);
        assert_relative_eq!(result.x[0], 1.0 / 11.0, epsilon = 1e-6);
        assert_relative_eq!(result.x[1], 7.0 / 11.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rank2_update_preserves_symmetry() {
        // Several updates with y's > 0: H must stay symmetric throughout.
        let mut h = array![[1.0_f64, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

        let steps = [
            (array![1.0_f64, 0.5, -0.25], array![0.8_f64, 0.1, -0.3]),
            (array![-0.2_f64, 0.7, 0.1], array![-0.1_f64, 0.9, 0.05]),
            (array![0.3_f64, -0.4, 0.6], array![0.2_f64, -0.5, 0.7]),
        ];

        for (s, y) in steps {
            let ys = inner_product(&y, &s);
            assert!(ys > 0.0, "test steps must satisfy the curvature condition");
            apply_rank2_update(&mut h, &s, &y, 1.0 / ys);

            for i in 0..3 {
                for j in 0..3 {
                    assert_relative_eq!(h[[i, j]], h[[j, i]], epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_bfgs_curvature_breakdown() {
        // With H0 = diag(1, -1) and g = [-1, -1], the exact step along
        // p = -H0*g is zero, so s = y = 0 and rho is undefined.
        let a = array![[1.0_f64, 0.0], [0.0, 1.0]];
        let b = array![1.0_f64, 1.0];
        let x0 = array![0.0_f64, 0.0];
        let h0 = array![[1.0_f64, 0.0], [0.0, -1.0]];

        let err = bfgs_with_hessian(&a, &b, &x0, h0, &BfgsConfig::default()).unwrap_err();
        assert!(matches!(err, SolverError::CurvatureBreakdown { .. }));
    }

    #[test]
    fn test_bfgs_nonconvergence_is_ok() {
        let a = array![[1.0_f64, 0.0], [0.0, 1e4]];
        let b = array![1.0_f64, 1.0];

        let config = BfgsConfig {
            tolerance: 1e-14,
            max_iterations: 1,
            ..BfgsConfig::default()
        };

        let result = bfgs(&a, &b, &config).unwrap();
        assert!(!result.converged);
        assert_eq!(result.iterations, 1);
    }

    #[test]
    fn test_bfgs_history_gradient_norms_decrease_overall() {
        let a = array![[4.0_f64, 1.0], [1.0, 3.0]];
        let b = array![1.0_f64, 2.0];

        let config = BfgsConfig {
            tolerance: 1e-10,
            record_history: true,
            ..BfgsConfig::default()
        };

        let result = bfgs(&a, &b, &config).unwrap();
        let norms: Vec<f64> = result.history.unwrap().residual_norms().collect();
        assert!(norms.len() >= 2);
        assert!(*norms.last().unwrap() < norms[0]);
    }
}
