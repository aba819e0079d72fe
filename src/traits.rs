//! Core traits for linear algebra operations
//!
//! This module defines the fundamental abstractions used throughout the solver library:
//! - [`RealScalar`]: Trait for real scalar types (`f32`, `f64`)
//! - [`LinearOperator`]: Trait for matrix-like objects that can perform matrix-vector products
//! - [`DiagonalAccess`]: Trait for operators that expose their main diagonal

use crate::error::SolverError;
use ndarray::{Array1, Array2};
use num_traits::{Float, FromPrimitive, NumAssign, ToPrimitive};
use std::fmt::Debug;
use std::iter::Sum;

/// Trait for real scalar types usable in the solvers.
///
/// The solvers in this crate target real symmetric (often positive-definite)
/// systems, so the scalar abstraction is a plain floating-point field rather
/// than a complex one.
///
/// # Implementations
///
/// Provided for:
/// - `f64` (default for most problems)
/// - `f32` (for memory-constrained problems)
pub trait RealScalar:
    Float + NumAssign + FromPrimitive + ToPrimitive + Sum + Send + Sync + Debug + 'static
{
    /// Threshold below which a denominator is treated as numerically zero.
    ///
    /// Used by the degeneracy checks (`r'Ar`, `d'Ad`, `p'Ap`, `y's`).
    fn degeneracy_threshold() -> Self;
}

impl RealScalar for f64 {
    #[inline]
    fn degeneracy_threshold() -> Self {
        1e-30
    }
}

impl RealScalar for f32 {
    #[inline]
    fn degeneracy_threshold() -> Self {
        1e-20
    }
}

/// Trait for linear operators (matrices) that can perform matrix-vector products.
///
/// This abstraction allows solvers to work with dense matrices, sparse matrices,
/// and composed operators (e.g. the normal-equations wrapper) interchangeably.
pub trait LinearOperator<T: RealScalar>: Send + Sync {
    /// Number of rows in the operator
    fn num_rows(&self) -> usize;

    /// Number of columns in the operator
    fn num_cols(&self) -> usize;

    /// Apply the operator: y = A * x
    fn apply(&self, x: &Array1<T>) -> Array1<T>;

    /// Apply the transpose: y = A^T * x
    fn apply_transpose(&self, x: &Array1<T>) -> Array1<T>;

    /// Check if the operator is square
    fn is_square(&self) -> bool {
        self.num_rows() == self.num_cols()
    }
}

/// Trait for operators that can expose their main diagonal.
///
/// The Jacobi solver needs the splitting `A = D - E` and therefore requires
/// direct access to `D`. Composed operators (such as [`crate::NormalEquations`])
/// deliberately do not implement this.
pub trait DiagonalAccess<T: RealScalar> {
    /// Main diagonal of the operator as a vector
    fn diagonal(&self) -> Array1<T>;
}

impl<T: RealScalar> LinearOperator<T> for Array2<T> {
    fn num_rows(&self) -> usize {
        self.nrows()
    }

    fn num_cols(&self) -> usize {
        self.ncols()
    }

    fn apply(&self, x: &Array1<T>) -> Array1<T> {
        assert_eq!(x.len(), self.ncols(), "Input vector size mismatch");
        let mut y = Array1::from_elem(self.nrows(), T::zero());
        for i in 0..self.nrows() {
            let mut sum = T::zero();
            for j in 0..self.ncols() {
                sum += self[[i, j]] * x[j];
            }
            y[i] = sum;
        }
        y
    }

    fn apply_transpose(&self, x: &Array1<T>) -> Array1<T> {
        assert_eq!(x.len(), self.nrows(), "Input vector size mismatch");
        let mut y = Array1::from_elem(self.ncols(), T::zero());
        for i in 0..self.nrows() {
            let xi = x[i];
            for j in 0..self.ncols() {
                y[j] += self[[i, j]] * xi;
            }
        }
        y
    }
}

impl<T: RealScalar> DiagonalAccess<T> for Array2<T> {
    fn diagonal(&self) -> Array1<T> {
        let n = self.nrows().min(self.ncols());
        Array1::from_iter((0..n).map(|i| self[[i, i]]))
    }
}

/// Validate that `operator` is square and compatible with `b`.
///
/// Every solver entry point calls this before iterating, so dimension
/// problems surface immediately rather than as index panics mid-loop.
pub(crate) fn check_square_system<T, A>(
    operator: &A,
    b: &Array1<T>,
) -> Result<usize, SolverError>
where
    T: RealScalar,
    A: LinearOperator<T>,
{
    if !operator.is_square() {
        return Err(SolverError::DimensionMismatch {
            expected: operator.num_rows(),
            got: operator.num_cols(),
        });
    }
    if b.len() != operator.num_rows() {
        return Err(SolverError::DimensionMismatch {
            expected: operator.num_rows(),
            got: b.len(),
        });
    }
    Ok(b.len())
}

/// Validate an explicit initial guess against the system dimension.
pub(crate) fn check_guess<T: RealScalar>(
    n: usize,
    x0: &Array1<T>,
) -> Result<(), SolverError> {
    if x0.len() != n {
        return Err(SolverError::DimensionMismatch {
            expected: n,
            got: x0.len(),
        });
    }
    Ok(())
}
