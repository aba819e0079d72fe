//! Iterative solvers for linear systems
//!
//! This module provides the solver family sharing the crate's convergence
//! protocol:
//! - [`conjugate_gradient`]: for symmetric positive-definite systems
//! - [`conjugate_gradient_normal`]: general systems via the normal equations
//! - [`gradient_descent`] / [`gradient_descent_fused`]: steepest descent
//! - [`bfgs`]: quasi-Newton with an inverse-Hessian approximation
//! - [`jacobi`]: diagonal splitting iteration with a divergence pre-check
//! - [`iterative_refinement`]: residual-correction polishing loop

mod bfgs;
mod cg;
mod gradient_descent;
mod jacobi;
mod refinement;

pub use bfgs::{bfgs, bfgs_with_guess, bfgs_with_hessian, BfgsConfig};
pub use cg::{
    conjugate_gradient, conjugate_gradient_normal, conjugate_gradient_normal_with_guess,
    conjugate_gradient_with_guess, conjugate_gram_schmidt, CgConfig, NormalEquations,
};
pub use gradient_descent::{
    gradient_descent, gradient_descent_fused, gradient_descent_fused_with_guess,
    gradient_descent_with_guess, GdConfig,
};
pub use jacobi::{estimate_spectral_radius, jacobi, jacobi_with_guess, JacobiConfig};
pub use refinement::{
    iterative_refinement, iterative_refinement_cg, iterative_refinement_with_guess,
    RefinementConfig,
};
