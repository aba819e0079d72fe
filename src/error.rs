//! Error taxonomy shared by every solver
//!
//! Numerical degeneracies are detected locally and surfaced as typed
//! failures. Reaching the iteration cap without meeting the tolerance is
//! NOT an error: solvers return their best-effort iterate with
//! `converged = false` and let the caller decide.

use thiserror::Error;

/// Errors that can occur while setting up or running a solver
#[derive(Error, Debug)]
pub enum SolverError {
    /// Matrix not square, or its dimension disagrees with `b`/`x0`.
    /// Checked before iterating.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// A denominator in a step-size or update formula is numerically zero.
    #[error("degenerate direction at iteration {iteration}: {quantity} = {value:e}")]
    DegenerateDirection {
        iteration: usize,
        quantity: &'static str,
        value: f64,
    },

    /// BFGS curvature condition violated: `y's` is numerically zero, so the
    /// rank-2 update factor `rho = 1/(y's)` is undefined.
    #[error("curvature breakdown at iteration {iteration}: y's = {ys:e}")]
    CurvatureBreakdown { iteration: usize, ys: f64 },

    /// Jacobi precondition failure: the iteration matrix has spectral
    /// radius >= 1, so the splitting iteration would diverge.
    #[error("splitting iteration would diverge: spectral radius {spectral_radius} >= 1")]
    DivergentSplitting { spectral_radius: f64 },

    /// The inner solve of an iterative-refinement step raised a hard error.
    #[error("inner solve failed at refinement step {iteration}: {source}")]
    InnerSolveFailed {
        iteration: usize,
        #[source]
        source: Box<SolverError>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SolverError::DimensionMismatch {
            expected: 3,
            got: 2,
        };
        assert_eq!(err.to_string(), "dimension mismatch: expected 3, got 2");

        let err = SolverError::DivergentSplitting {
            spectral_radius: 1.5,
        };
        assert!(err.to_string().contains("1.5"));
    }

    #[test]
    fn test_inner_failure_chains_source() {
        let inner = SolverError::DegenerateDirection {
            iteration: 4,
            quantity: "d'Ad",
            value: 0.0,
        };
        let err = SolverError::InnerSolveFailed {
            iteration: 1,
            source: Box::new(inner),
        };
        assert!(err.to_string().contains("refinement step 1"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
