//! Iterative solvers for symmetric linear systems
//!
//! This crate provides a family of iterative solvers for `Ax = b` with
//! large, possibly sparse, symmetric (often positive-definite) `A`,
//! sharing a common convergence protocol and diagnostic history.
//!
//! # Solvers
//!
//! - **Conjugate Gradient**: the method of choice for SPD systems
//!   ([`conjugate_gradient`]), plus a normal-equations form for general
//!   systems ([`conjugate_gradient_normal`])
//! - **Gradient Descent**: steepest descent with exact quadratic steps,
//!   in accurate ([`gradient_descent`]) and single-matvec
//!   ([`gradient_descent_fused`]) variants
//! - **BFGS**: quasi-Newton iteration on an inverse-Hessian
//!   approximation ([`bfgs`])
//! - **Jacobi**: diagonal splitting with a spectral-radius divergence
//!   pre-check ([`jacobi`])
//! - **Iterative Refinement**: residual-correction polishing with a
//!   pluggable inner solver ([`iterative_refinement`])
//!
//! All solvers stop when the absolute residual 2-norm drops below the
//! configured tolerance; hitting the iteration cap returns the best-effort
//! iterate with `converged = false` rather than an error, while numerical
//! degeneracies (zero step-size denominators, curvature breakdown,
//! divergent splittings) surface as typed [`SolverError`]s.
//!
//! # Example
//!
//! ```
//! use math_linear_solvers::{conjugate_gradient, CgConfig, CsrMatrix};
//! use ndarray::array;
//!
//! let dense = array![[4.0_f64, 1.0], [1.0, 3.0]];
//! let matrix = CsrMatrix::from_dense(&dense, 1e-15);
//! let b = array![1.0_f64, 2.0];
//!
//! let result = conjugate_gradient(&matrix, &b, &CgConfig::default()).unwrap();
//! assert!(result.converged);
//! ```

pub mod blas_helpers;
pub mod convergence;
pub mod error;
pub mod iterative;
pub mod method;
pub mod sparse;
pub mod stepsize;
pub mod traits;

// Re-export main types
pub use convergence::{History, HistoryEntry, ResidualTest, SolverResult};
pub use error::SolverError;
pub use sparse::CsrMatrix;
pub use traits::{DiagonalAccess, LinearOperator, RealScalar};

// Re-export solvers
pub use iterative::{
    bfgs, bfgs_with_guess, bfgs_with_hessian, conjugate_gradient, conjugate_gradient_normal,
    conjugate_gradient_normal_with_guess, conjugate_gradient_with_guess, conjugate_gram_schmidt,
    estimate_spectral_radius, gradient_descent, gradient_descent_fused,
    gradient_descent_fused_with_guess, gradient_descent_with_guess, iterative_refinement,
    iterative_refinement_cg, iterative_refinement_with_guess, jacobi, jacobi_with_guess,
    BfgsConfig, CgConfig, GdConfig, JacobiConfig, NormalEquations, RefinementConfig,
};

// Re-export step-size strategies
pub use stepsize::{
    backtracking_line_search, exact_quadratic_step, objective, wolfe_conditions,
    BacktrackingConfig, WolfeConfig,
};

// Re-export the unified façade
pub use method::{path, solve, solve_with_guess, LinearSystem, Method};
