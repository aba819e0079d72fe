//! Gradient descent for symmetric positive-definite systems
//!
//! Minimizes the quadratic `f(x) = (1/2) x'Ax - b'x`, whose gradient is
//! `Ax - b`, so the steepest-descent direction is the residual `r = b - Ax`.
//! The exact step along that direction is `a = (r'r)/(r'Ar)`.
//!
//! Two variants:
//! - [`gradient_descent`]: recomputes `r = b - Ax` every iteration.
//!   Two matrix-vector products per iteration, numerically accurate.
//! - [`gradient_descent_fused`]: maintains `r` by the recurrence
//!   `r <- r - a*Ar`, costing one product per iteration but accumulating
//!   round-off; the `recalc` cadence bounds the drift by periodically
//!   recomputing the true residual.

use crate::blas_helpers::{inner_product, residual, vector_norm};
use crate::convergence::{Recorder, ResidualTest, SolverResult};
use crate::error::SolverError;
use crate::traits::{check_guess, check_square_system, LinearOperator, RealScalar};
use ndarray::Array1;
use num_traits::ToPrimitive;

/// Gradient descent configuration
#[derive(Debug, Clone)]
pub struct GdConfig<T> {
    /// Absolute residual-norm stopping threshold
    pub tolerance: T,
    /// Hard iteration cap
    pub max_iterations: usize,
    /// Residual recomputation cadence for the fused variant: every `recalc`
    /// iterations the true residual `b - Ax` replaces the recurrence value.
    /// Smaller values cost more matvecs but bound round-off drift sooner.
    /// 0 disables periodic recomputation. Ignored by [`gradient_descent`].
    pub recalc: usize,
    /// Populate the per-iteration diagnostic history
    pub record_history: bool,
    /// Additionally store every iterate (implies history)
    pub record_iterates: bool,
    /// Log progress every N iterations (0 = silent)
    pub print_interval: usize,
}

impl Default for GdConfig<f64> {
    fn default() -> Self {
        Self {
            tolerance: 1e-5,
            max_iterations: 500,
            recalc: 50,
            record_history: false,
            record_iterates: false,
            print_interval: 0,
        }
    }
}

/// Solve Ax = b by steepest descent with a fresh residual every iteration
///
/// Requires symmetric positive-definite `A`. Starts from the zero vector.
pub fn gradient_descent<T, A>(
    operator: &A,
    b: &Array1<T>,
    config: &GdConfig<T>,
) -> Result<SolverResult<T>, SolverError>
where
    T: RealScalar,
    A: LinearOperator<T>,
{
    let n = check_square_system(operator, b)?;
    let x0 = Array1::from_elem(n, T::zero());
    gradient_descent_with_guess(operator, b, &x0, config)
}

/// Steepest descent from an explicit initial guess
pub fn gradient_descent_with_guess<T, A>(
    operator: &A,
    b: &Array1<T>,
    x0: &Array1<T>,
    config: &GdConfig<T>,
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

    for k in 0..config.max_iterations {
        let r = residual(operator, b, &x);
        let r_norm = vector_norm(&r);
        recorder.record(k, r_norm, &x);

        if config.print_interval > 0 && k % config.print_interval == 0 {
            log::debug!(
                "GD iteration {}: residual = {:.6e}",
                k,
                r_norm.to_f64().unwrap_or(0.0)
            );
        }

        if test.is_met(r_norm) {
            return Ok(SolverResult {
                x,
                iterations: k,
                residual_norm: r_norm,
                converged: true,
                history: recorder.finish(),
            });
        }

        let ar = operator.apply(&r);
        let rar = inner_product(&r, &ar);
        if rar.abs() < T::degeneracy_threshold() {
            return Err(SolverError::DegenerateDirection {
                iteration: k,
                quantity: "r'Ar",
                value: rar.to_f64().unwrap_or(0.0),
            });
        }

        let a = inner_product(&r, &r) / rar;
        crate::blas_helpers::axpy(a, &r, &mut x);
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

/// Solve Ax = b by steepest descent with one matrix-vector product per iteration
///
/// Maintains the residual by the recurrence `r <- r - a*Ar`, recomputing the
/// true residual every [`GdConfig::recalc`] iterations to bound accumulated
/// round-off. Convergence is always confirmed against a freshly computed
/// residual, so a drifted recurrence cannot produce a false success.
pub fn gradient_descent_fused<T, A>(
    operator: &A,
    b: &Array1<T>,
    config: &GdConfig<T>,
) -> Result<SolverResult<T>, SolverError>
where
    T: RealScalar,
    A: LinearOperator<T>,
{
    let n = check_square_system(operator, b)?;
    let x0 = Array1::from_elem(n, T::zero());
    gradient_descent_fused_with_guess(operator, b, &x0, config)
}

/// Fused-residual steepest descent from an explicit initial guess
pub fn gradient_descent_fused_with_guess<T, A>(
    operator: &A,
    b: &Array1<T>,
    x0: &Array1<T>,
    config: &GdConfig<T>,
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
    let mut r = residual(operator, b, &x);

    for k in 0..config.max_iterations {
        // Periodically replace the recurrence residual with the true one.
        if config.recalc > 0 && k > 0 && k % config.recalc == 0 {
            r = residual(operator, b, &x);
        }

        let r_norm = vector_norm(&r);
        recorder.record(k, r_norm, &x);

        if config.print_interval > 0 && k % config.print_interval == 0 {
            log::debug!(
                "fused GD iteration {}: residual = {:.6e}",
                k,
                r_norm.to_f64().unwrap_or(0.0)
            );
        }

        if test.is_met(r_norm) {
            // Accept only if the true residual agrees with the recurrence.
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
            r = r_true;
        }

        let ar = operator.apply(&r);
        let rar = inner_product(&r, &ar);
        if rar.abs() < T::degeneracy_threshold() {
            return Err(SolverError::DegenerateDirection {
                iteration: k,
                quantity: "r'Ar",
                value: rar.to_f64().unwrap_or(0.0),
            });
        }

        let a = inner_product(&r, &r) / rar;
        crate::blas_helpers::axpy(a, &r, &mut x);
        // r <- r - a*Ar keeps the residual without a second matvec
        crate::blas_helpers::axpy(-a, &ar, &mut r);
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
