//! Jacobi splitting iteration
//!
//! Splits `A = D - E` (`D` the diagonal, `E` the off-diagonal remainder)
//! and iterates `x <- B*x + z` with `B = -D^{-1}E = I - D^{-1}A` and
//! `z = D^{-1}b`. In the implementation the update is applied in the
//! equivalent fused form `x <- x + D^{-1}(b - Ax)`, which yields the
//! residual (and its norm) for free each iteration.
//!
//! Convergence requires the spectral radius of `B` to be below one. The
//! solver estimates the largest singular value squared of `B` by power
//! iteration on `B'B` before iterating, and refuses to run when the
//! estimate is `>= 1` rather than burning `max_iterations` and returning
//! garbage.

use crate::blas_helpers::{inner_product, vector_norm};
use crate::convergence::{Recorder, ResidualTest, SolverResult};
use crate::error::SolverError;
use crate::traits::{
    check_guess, check_square_system, DiagonalAccess, LinearOperator, RealScalar,
};
use ndarray::Array1;
use num_traits::ToPrimitive;

/// Number of power-iteration steps used for the spectral-radius estimate
const POWER_ITERATION_STEPS: usize = 10;

/// Jacobi solver configuration
#[derive(Debug, Clone)]
pub struct JacobiConfig<T> {
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

impl Default for JacobiConfig<f64> {
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

/// Estimate the spectral radius of the Jacobi iteration matrix
/// `B = I - D^{-1}A` as its largest singular value squared
///
/// Runs [`POWER_ITERATION_STEPS`] steps of the power method on `B'B`
/// (matrix-free; `B` and `B'` are applied through the operator) and returns
/// the Rayleigh-quotient estimate of the dominant eigenvalue, i.e.
/// `sigma_max(B)^2`. Values `>= 1` mean the splitting iteration is not
/// guaranteed to converge.
pub fn estimate_spectral_radius<T, A>(operator: &A, inv_diag: &Array1<T>) -> T
where
    T: RealScalar,
    A: LinearOperator<T>,
{
    let n = inv_diag.len();
    if n == 0 {
        return T::zero();
    }

    // B v = v - D^{-1}(A v)
    let apply_b = |v: &Array1<T>| -> Array1<T> {
        let av = operator.apply(v);
        let mut out = v.clone();
        for ((oi, avi), di) in out.iter_mut().zip(av.iter()).zip(inv_diag.iter()) {
            *oi -= *di * *avi;
        }
        out
    };
    // B' u = u - A'(D^{-1} u)
    let apply_bt = |u: &Array1<T>| -> Array1<T> {
        let scaled = Array1::from_iter(u.iter().zip(inv_diag.iter()).map(|(ui, di)| *ui * *di));
        let at = operator.apply_transpose(&scaled);
        let mut out = u.clone();
        for (oi, ati) in out.iter_mut().zip(at.iter()) {
            *oi -= *ati;
        }
        out
    };

    // Deterministic pseudo-random start vector, normalized
    let mut v = Array1::from_iter(
        (0..n).map(|i| T::from_usize((i.wrapping_mul(31).wrapping_add(17)) % 101).unwrap()),
    );
    let norm = vector_norm(&v);
    if norm > T::degeneracy_threshold() {
        v.mapv_inplace(|vi| vi / norm);
    }

    let mut estimate = T::zero();
    for _ in 0..POWER_ITERATION_STEPS {
        let w = apply_bt(&apply_b(&v));

        // Rayleigh quotient (v is unit length)
        estimate = inner_product(&v, &w);

        let w_norm = vector_norm(&w);
        if w_norm < T::degeneracy_threshold() {
            break;
        }
        v = w.mapv(|wi| wi / w_norm);
    }

    estimate.abs()
}

/// Solve Ax = b by Jacobi iteration, starting from the zero vector
///
/// # Errors
///
/// - [`SolverError::DegenerateDirection`] for a zero diagonal entry
///   (the splitting `D^{-1}` does not exist).
/// - [`SolverError::DivergentSplitting`] when the estimated spectral
///   radius of the iteration matrix is `>= 1`.
pub fn jacobi<T, A>(
    operator: &A,
    b: &Array1<T>,
    config: &JacobiConfig<T>,
) -> Result<SolverResult<T>, SolverError>
where
    T: RealScalar,
    A: LinearOperator<T> + DiagonalAccess<T>,
{
    let n = check_square_system(operator, b)?;
    let x0 = Array1::from_elem(n, T::zero());
    jacobi_with_guess(operator, b, &x0, config)
}

/// Jacobi iteration from an explicit initial guess
pub fn jacobi_with_guess<T, A>(
    operator: &A,
    b: &Array1<T>,
    x0: &Array1<T>,
    config: &JacobiConfig<T>,
) -> Result<SolverResult<T>, SolverError>
where
    T: RealScalar,
    A: LinearOperator<T> + DiagonalAccess<T>,
{
    let n = check_square_system(operator, b)?;
    check_guess(n, x0)?;

    // D^{-1}, refusing the splitting on a zero diagonal
    let diag = operator.diagonal();
    let mut inv_diag = Array1::from_elem(n, T::zero());
    for (i, di) in diag.iter().enumerate() {
        if di.abs() < T::degeneracy_threshold() {
            return Err(SolverError::DegenerateDirection {
                iteration: i,
                quantity: "diag(A)",
                value: di.to_f64().unwrap_or(0.0),
            });
        }
        inv_diag[i] = T::one() / *di;
    }

    // Precondition check: refuse to iterate when divergence is guaranteed
    let rho = estimate_spectral_radius(operator, &inv_diag);
    let rho_f64 = rho.to_f64().unwrap_or(f64::INFINITY);
    if rho_f64 >= 1.0 {
        log::warn!("Jacobi iteration matrix has spectral radius {rho_f64:.4} >= 1, refusing");
        return Err(SolverError::DivergentSplitting {
            spectral_radius: rho_f64,
        });
    }
    log::debug!("Jacobi spectral radius estimate: {rho_f64:.4}");

    let test = ResidualTest::new(config.tolerance);
    let mut recorder = Recorder::new(
        config.record_history,
        config.record_iterates,
        config.max_iterations,
    );
    let mut x = x0.clone();

    for k in 0..config.max_iterations {
        let r = crate::blas_helpers::residual(operator, b, &x);
        let r_norm = vector_norm(&r);
        recorder.record(k, r_norm, &x);

        if config.print_interval > 0 && k % config.print_interval == 0 {
            log::debug!(
                "Jacobi iteration {}: residual = {:.6e}",
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

        // x <- x + D^{-1} r, the fused form of x <- B*x + z
        for ((xi, ri), di) in x.iter_mut().zip(r.iter()).zip(inv_diag.iter()) {
            *xi += *di * *ri;
        }
    }

    let r_norm = vector_norm(&crate::blas_helpers::residual(operator, b, &x));
    recorder.record(config.max_iterations, r_norm, &x);
    Ok(SolverResult {
        x,
        iterations: config.max_iterations,
        residual_norm: r_norm,
        converged: test.is_met(r_norm),
        history: recorder.finish(),
    })
}
