//! Step-size strategies for descent-type solvers
//!
//! The quadratic objective `f(x) = (1/2) x'Ax - b'x` admits a closed-form
//! optimal step along any search direction; [`exact_quadratic_step`] is what
//! the gradient-descent and BFGS loops use. For the general (non-quadratic)
//! case two pluggable policies are provided: a backtracking line search and
//! a Wolfe-condition acceptance test.

use crate::blas_helpers::{inner_product, vector_norm};
use crate::error::SolverError;
use crate::traits::{LinearOperator, RealScalar};
use ndarray::Array1;
use num_traits::ToPrimitive;

/// Evaluate the quadratic objective f(x) = (1/2) x'Ax - b'x
///
/// Minimizing f over x is equivalent to solving Ax = b for symmetric
/// positive-definite A.
pub fn objective<T, A>(operator: &A, b: &Array1<T>, x: &Array1<T>) -> T
where
    T: RealScalar,
    A: LinearOperator<T>,
{
    let ax = operator.apply(x);
    let half = T::from_f64(0.5).unwrap();
    half * inner_product(x, &ax) - inner_product(b, x)
}

/// Closed-form optimal step along direction `p` for the quadratic objective:
/// `a = (b'p - x'Ap) / (p'Ap)`
///
/// For symmetric `A` the numerator equals `p'r` with `r = b - Ax`, so the
/// steepest-descent step `a = (r'r)/(r'Ar)` is the special case `p = r`.
///
/// # Errors
///
/// [`SolverError::DegenerateDirection`] when `p'Ap` is numerically zero;
/// the step is undefined and must not be divided through silently.
pub fn exact_quadratic_step<T, A>(
    operator: &A,
    b: &Array1<T>,
    x: &Array1<T>,
    p: &Array1<T>,
    iteration: usize,
) -> Result<T, SolverError>
where
    T: RealScalar,
    A: LinearOperator<T>,
{
    let ap = operator.apply(p);
    let pap = inner_product(p, &ap);
    if pap.abs() < T::degeneracy_threshold() {
        return Err(SolverError::DegenerateDirection {
            iteration,
            quantity: "p'Ap",
            value: pap.to_f64().unwrap_or(0.0),
        });
    }
    Ok((inner_product(b, p) - inner_product(x, &ap)) / pap)
}

/// Backtracking line-search configuration
#[derive(Debug, Clone)]
pub struct BacktrackingConfig<T> {
    /// Initial trial step size
    pub alpha: T,
    /// Geometric decrement factor in (0, 1)
    pub shrink: T,
    /// Sufficient-decrease factor in (0, 1)
    pub c: T,
}

impl Default for BacktrackingConfig<f64> {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            shrink: 0.1,
            c: 0.9,
        }
    }
}

/// Backtracking line search along direction `p` from `x`
///
/// Shrinks the trial step geometrically until the Armijo-style decrease
/// condition `f(x + a*p) <= f(x) + c * a * (g'p)` holds, where `g` is the
/// gradient at `x`. Takes small, conservative steps; it does not guarantee
/// the curvature half of the Wolfe conditions.
///
/// If the step shrinks to machine precision without satisfying the
/// condition, the last trial step is returned and a warning is logged.
pub fn backtracking_line_search<T, A>(
    operator: &A,
    b: &Array1<T>,
    x: &Array1<T>,
    p: &Array1<T>,
    g: &Array1<T>,
    config: &BacktrackingConfig<T>,
) -> T
where
    T: RealScalar,
    A: LinearOperator<T>,
{
    let f_curr = objective(operator, b, x);
    let gp = inner_product(g, p);
    let floor = T::from_f64(1e-16).unwrap();

    let mut alpha = config.alpha;
    loop {
        let mut x_trial = x.clone();
        crate::blas_helpers::axpy(alpha, p, &mut x_trial);

        let f_trial = objective(operator, b, &x_trial);
        if f_trial <= f_curr + config.c * alpha * gp {
            return alpha;
        }

        alpha *= config.shrink;
        if alpha < floor {
            log::warn!("backtracking line search reached machine precision");
            return alpha;
        }
    }
}

/// Wolfe-condition acceptance parameters
#[derive(Debug, Clone)]
pub struct WolfeConfig<T> {
    /// Sufficient-decrease constant, in (0, 1)
    pub c1: T,
    /// Curvature constant, in (c1, 1)
    pub c2: T,
}

impl Default for WolfeConfig<f64> {
    fn default() -> Self {
        Self { c1: 1e-4, c2: 0.9 }
    }
}

/// Check whether step size `a` from `x` to `x_new` satisfies the (weak)
/// Wolfe conditions
///
/// Two-part test used to validate a candidate step rather than to search
/// for one:
/// 1. sufficient decrease of the residual norm:
///    `||b - A x_new|| <= ||b - A x|| + c1 * a * (p'g)`
/// 2. curvature: `-p'g_new <= -c2 * (p'g)`
///
/// `g` and `g_new` are the gradients `Ax - b` at `x` and `x_new`.
pub fn wolfe_conditions<T, A>(
    operator: &A,
    b: &Array1<T>,
    a: T,
    x: &Array1<T>,
    x_new: &Array1<T>,
    p: &Array1<T>,
    g: &Array1<T>,
    g_new: &Array1<T>,
    config: &WolfeConfig<T>,
) -> bool
where
    T: RealScalar,
    A: LinearOperator<T>,
{
    let gp = inner_product(p, g);

    // Sufficient decrease on the residual norm
    let lhs = vector_norm(&crate::blas_helpers::residual(operator, b, x_new));
    let rhs = vector_norm(&crate::blas_helpers::residual(operator, b, x)) + config.c1 * a * gp;
    if lhs > rhs {
        return false;
    }

    // Curvature condition on the directional derivatives
    -inner_product(p, g_new) <= -config.c2 * gp
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn system() -> (ndarray::Array2<f64>, Array1<f64>) {
        (array![[4.0_f64, 1.0], [1.0, 3.0]], array![1.0_f64, 2.0])
    }

    #[test]
    fn test_objective_at_minimizer() {
        let (a, b) = system();
        // Exact solution of Ax = b
        let x_star = array![1.0 / 11.0, 7.0 / 11.0];

        let f_star = objective(&a, &b, &x_star);
        // Any perturbation must increase f
        let f_perturbed = objective(&a, &b, &array![0.2_f64, 0.7]);
        assert!(f_perturbed > f_star);
    }

    #[test]
    fn test_exact_step_is_steepest_descent_step() {
        let (a, b) = system();
        let x = array![0.0_f64, 0.0];
        let r = array![1.0_f64, 2.0]; // b - Ax at x = 0

        let step = exact_quadratic_step(&a, &b, &x, &r, 0).unwrap();

        // a = (r'r)/(r'Ar): r'r = 5, Ar = [6, 7], r'Ar = 20
        assert_relative_eq!(step, 5.0 / 20.0, epsilon = 1e-12);
    }

    #[test]
    fn test_exact_step_degenerate() {
        let a = array![[0.0_f64, 0.0], [0.0, 0.0]];
        let b = array![1.0_f64, 2.0];
        let x = array![0.0_f64, 0.0];
        let p = array![1.0_f64, 0.0];

        let err = exact_quadratic_step(&a, &b, &x, &p, 3).unwrap_err();
        match err {
            SolverError::DegenerateDirection { iteration, .. } => assert_eq!(iteration, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_backtracking_accepts_descent_step() {
        let (a, b) = system();
        let x = array![0.0_f64, 0.0];
        let g = array![-1.0_f64, -2.0]; // Ax - b
        let p = array![1.0_f64, 2.0]; // steepest descent

        let alpha = backtracking_line_search(&a, &b, &x, &p, &g, &BacktrackingConfig::default());
        assert!(alpha > 0.0);

        // The accepted step must decrease the objective
        let mut x_new = x.clone();
        crate::blas_helpers::axpy(alpha, &p, &mut x_new);
        assert!(objective(&a, &b, &x_new) < objective(&a, &b, &x));
    }

    #[test]
    fn test_wolfe_accepts_exact_step() {
        let (a, b) = system();
        let x = array![0.0_f64, 0.0];
        let g = array![-1.0_f64, -2.0];
        let p = array![1.0_f64, 2.0];

        let step = exact_quadratic_step(&a, &b, &x, &p, 0).unwrap();
        let mut x_new = x.clone();
        crate::blas_helpers::axpy(step, &p, &mut x_new);
        let g_new = {
            let ax = a.apply(&x_new);
            &ax - &b
        };

        assert!(wolfe_conditions(
            &a,
            &b,
            step,
            &x,
            &x_new,
            &p,
            &g,
            &g_new,
            &WolfeConfig::default()
        ));
    }

    #[test]
    fn test_wolfe_rejects_tiny_step() {
        let (a, b) = system();
        let x = array![0.0_f64, 0.0];
        let g = array![-1.0_f64, -2.0];
        let p = array![1.0_f64, 2.0];

        // A microscopic step leaves the directional derivative essentially
        // unchanged, violating the curvature condition.
        let step = 1e-12;
        let mut x_new = x.clone();
        crate::blas_helpers::axpy(step, &p, &mut x_new);
        let g_new = {
            let ax = a.apply(&x_new);
            &ax - &b
        };

        assert!(!wolfe_conditions(
            &a,
            &b,
            step,
            &x,
            &x_new,
            &p,
            &g,
            &g_new,
            &WolfeConfig::default()
        ));
    }
}
