//! Unified solver façade
//!
//! The set of algorithms is fixed and known, so selection is an explicit
//! [`Method`] tag carrying the per-solver configuration, rather than
//! open-ended trait objects. [`solve`] runs the chosen algorithm on a
//! validated [`LinearSystem`]; [`path`] additionally returns the sequence
//! of iterates for convergence plotting.

use crate::convergence::SolverResult;
use crate::error::SolverError;
use crate::iterative::{
    bfgs_with_guess, conjugate_gradient_normal_with_guess, conjugate_gradient_with_guess,
    gradient_descent_fused_with_guess, gradient_descent_with_guess, iterative_refinement_cg,
    jacobi_with_guess, BfgsConfig, CgConfig, GdConfig, JacobiConfig, RefinementConfig,
};
use crate::traits::{check_square_system, DiagonalAccess, LinearOperator, RealScalar};
use ndarray::Array1;

/// A validated `(A, b)` pair
///
/// Construction fails fast on dimension problems, so every solver run on
/// the system can assume `A` is square and matches `b`. The operator is
/// read-only once constructed and may be shared freely across threads.
#[derive(Debug, Clone)]
pub struct LinearSystem<T: RealScalar, A> {
    operator: A,
    b: Array1<T>,
}

impl<T, A> LinearSystem<T, A>
where
    T: RealScalar,
    A: LinearOperator<T>,
{
    /// Create a system, validating that `A` is square and sized like `b`
    pub fn new(operator: A, b: Array1<T>) -> Result<Self, SolverError> {
        check_square_system(&operator, &b)?;
        Ok(Self { operator, b })
    }

    /// The coefficient operator `A`
    pub fn operator(&self) -> &A {
        &self.operator
    }

    /// The right-hand side `b`
    pub fn rhs(&self) -> &Array1<T> {
        &self.b
    }

    /// System dimension `n`
    pub fn dimension(&self) -> usize {
        self.b.len()
    }
}

/// Algorithm selection for the [`solve`] and [`path`] façades
///
/// A closed set of variants: the full algorithm family is known, so a tag
/// plus configuration replaces subclass dispatch.
#[derive(Debug, Clone)]
pub enum Method<T> {
    /// Steepest descent, fresh residual every iteration
    GradientDescent(GdConfig<T>),
    /// Steepest descent, one matvec per iteration with periodic
    /// residual recomputation
    FusedGradientDescent(GdConfig<T>),
    /// Direct Conjugate Gradient (requires SPD `A`)
    ConjugateGradient(CgConfig<T>),
    /// Conjugate Gradient on the normal equations `A'A x = A'b`
    NormalEquationsCg(CgConfig<T>),
    /// Quasi-Newton BFGS with `H0 = B*I`
    Bfgs(BfgsConfig<T>),
    /// Jacobi splitting iteration
    Jacobi(JacobiConfig<T>),
    /// Iterative refinement with Conjugate Gradient inner solves
    CgRefinement {
        /// Configuration of each inner correction solve
        inner: CgConfig<T>,
        /// Configuration of the outer refinement loop
        outer: RefinementConfig<T>,
    },
}

/// Solve a system with the chosen method, starting from the zero vector
pub fn solve<T, A>(
    system: &LinearSystem<T, A>,
    method: &Method<T>,
) -> Result<SolverResult<T>, SolverError>
where
    T: RealScalar,
    A: LinearOperator<T> + DiagonalAccess<T>,
{
    let x0 = Array1::from_elem(system.dimension(), T::zero());
    solve_with_guess(system, method, &x0)
}

/// Solve a system with the chosen method from an explicit initial guess
pub fn solve_with_guess<T, A>(
    system: &LinearSystem<T, A>,
    method: &Method<T>,
    x0: &Array1<T>,
) -> Result<SolverResult<T>, SolverError>
where
    T: RealScalar,
    A: LinearOperator<T> + DiagonalAccess<T>,
{
    let a = system.operator();
    let b = system.rhs();
    match method {
        Method::GradientDescent(config) => gradient_descent_with_guess(a, b, x0, config),
        Method::FusedGradientDescent(config) => {
            gradient_descent_fused_with_guess(a, b, x0, config)
        }
        Method::ConjugateGradient(config) => conjugate_gradient_with_guess(a, b, x0, config),
        Method::NormalEquationsCg(config) => {
            conjugate_gradient_normal_with_guess(a, b, x0, config)
        }
        Method::Bfgs(config) => bfgs_with_guess(a, b, x0, config),
        Method::Jacobi(config) => jacobi_with_guess(a, b, x0, config),
        Method::CgRefinement { inner, outer } => {
            iterative_refinement_cg(a, b, x0, inner, outer)
        }
    }
}

/// Run the chosen method and return its sequence of iterates
///
/// Forces iterate recording regardless of the configuration flags, then
/// hands back the recorded path, starting at the initial guess and ending
/// at the iterate the solver returned (the best-effort endpoint is included
/// even when the iteration cap was hit). Consumed by plotting/diagnostic
/// collaborators.
pub fn path<T, A>(
    system: &LinearSystem<T, A>,
    method: &Method<T>,
) -> Result<Vec<Array1<T>>, SolverError>
where
    T: RealScalar,
    A: LinearOperator<T> + DiagonalAccess<T>,
{
    let mut method = method.clone();
    match &mut method {
        Method::GradientDescent(c) | Method::FusedGradientDescent(c) => {
            c.record_iterates = true;
        }
        Method::ConjugateGradient(c) | Method::NormalEquationsCg(c) => {
            c.record_iterates = true;
        }
        Method::Bfgs(c) => c.record_iterates = true,
        Method::Jacobi(c) => c.record_iterates = true,
        Method::CgRefinement { outer, .. } => outer.record_iterates = true,
    }

    let result = solve(system, &method)?;
    let history = result
        .history
        .expect("iterate recording was forced on, history must exist");
    Ok(history.iterates)
}
