//! Iterative refinement
//!
//! Polishes an approximate solution beyond the accuracy of a single solve:
//! repeatedly compute the residual `r = b - Ax`, solve the correction
//! system `Ad = r` approximately with a pluggable inner solver, and update
//! `x <- x + d`. Compensates for round-off accumulated inside the inner
//! solver.
//!
//! The inner solve is any routine mapping `(A, r) -> d`. A hard inner
//! failure aborts the refinement as [`SolverError::InnerSolveFailed`]; an
//! inner solver that merely hits its own iteration cap may still hand back
//! its best-effort correction, which [`iterative_refinement_cg`] does.

use crate::blas_helpers::{residual, vector_norm};
use crate::convergence::{Recorder, ResidualTest, SolverResult};
use crate::error::SolverError;
use crate::iterative::cg::{conjugate_gradient, CgConfig};
use crate::traits::{check_guess, check_square_system, LinearOperator, RealScalar};
use ndarray::Array1;
use num_traits::ToPrimitive;

/// Iterative-refinement configuration
#[derive(Debug, Clone)]
pub struct RefinementConfig<T> {
    /// Absolute residual-norm stopping threshold
    pub tolerance: T,
    /// Hard cap on refinement steps
    pub max_iterations: usize,
    /// Populate the per-iteration diagnostic history
    pub record_history: bool,
    /// Additionally store every iterate (implies history)
    pub record_iterates: bool,
    /// Log progress every N steps (0 = silent)
    pub print_interval: usize,
}

impl Default for RefinementConfig<f64> {
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

/// Refine a solution of Ax = b with a pluggable inner solver, starting
/// from the zero vector
///
/// `inner` approximately solves the correction system `Ad = r`, returning
/// `d`. Its hard errors surface as [`SolverError::InnerSolveFailed`] with
/// the refinement step attached.
pub fn iterative_refinement<T, A, S>(
    operator: &A,
    b: &Array1<T>,
    inner: S,
    config: &RefinementConfig<T>,
) -> Result<SolverResult<T>, SolverError>
where
    T: RealScalar,
    A: LinearOperator<T>,
    S: FnMut(&A, &Array1<T>) -> Result<Array1<T>, SolverError>,
{
    let n = check_square_system(operator, b)?;
    let x0 = Array1::from_elem(n, T::zero());
    iterative_refinement_with_guess(operator, b, &x0, inner, config)
}

/// Iterative refinement from an explicit initial guess
///
/// The usual use: `x0` is the output of a previous (round-off-limited)
/// solve, and refinement drives the residual further down.
pub fn iterative_refinement_with_guess<T, A, S>(
    operator: &A,
    b: &Array1<T>,
    x0: &Array1<T>,
    mut inner: S,
    config: &RefinementConfig<T>,
) -> Result<SolverResult<T>, SolverError>
where
    T: RealScalar,
    A: LinearOperator<T>,
    S: FnMut(&A, &Array1<T>) -> Result<Array1<T>, SolverError>,
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
                "refinement step {}: residual = {:.6e}",
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

        // Solve the correction system Ad = r
        let d = inner(operator, &r).map_err(|e| SolverError::InnerSolveFailed {
            iteration: k,
            source: Box::new(e),
        })?;
        if d.len() != n {
            return Err(SolverError::DimensionMismatch {
                expected: n,
                got: d.len(),
            });
        }

        for (xi, di) in x.iter_mut().zip(d.iter()) {
            *xi += *di;
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

/// Iterative refinement with Conjugate Gradient as the inner solver
///
/// Each correction system `Ad = r` runs direct CG under `inner_config`;
/// the correction is applied even when the inner run only reached its
/// iteration cap (best-effort), since a partial correction still reduces
/// the residual. Hard CG failures (degenerate directions) abort the
/// refinement.
pub fn iterative_refinement_cg<T, A>(
    operator: &A,
    b: &Array1<T>,
    x0: &Array1<T>,
    inner_config: &CgConfig<T>,
    config: &RefinementConfig<T>,
) -> Result<SolverResult<T>, SolverError>
where
    T: RealScalar,
    A: LinearOperator<T>,
{
    iterative_refinement_with_guess(
        operator,
        b,
        x0,
        |op, r| conjugate_gradient(op, r, inner_config).map(|result| result.x),
        config,
    )
}
