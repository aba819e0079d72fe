//! Vector-level linear algebra helpers
//!
//! Inner products, norms and scaled additions shared by every solver.
//! Kept as free functions so the iteration loops read close to the
//! textbook recurrences.

use crate::traits::{LinearOperator, RealScalar};
use ndarray::Array1;

/// Compute inner product (x, y) = sum x_i * y_i
#[inline]
pub fn inner_product<T: RealScalar>(x: &Array1<T>, y: &Array1<T>) -> T {
    assert_eq!(
        x.len(),
        y.len(),
        "Vector lengths must match for inner product"
    );
    let mut sum = T::zero();
    for (xi, yi) in x.iter().zip(y.iter()) {
        sum += *xi * *yi;
    }
    sum
}

/// Compute vector 2-norm: ||x||_2 = sqrt(sum x_i^2)
#[inline]
pub fn vector_norm<T: RealScalar>(x: &Array1<T>) -> T {
    vector_norm_sqr(x).sqrt()
}

/// Compute vector norm squared: ||x||_2^2 = sum x_i^2
///
/// More efficient than computing the norm and squaring when the square root
/// isn't needed.
#[inline]
pub fn vector_norm_sqr<T: RealScalar>(x: &Array1<T>) -> T {
    let mut sum = T::zero();
    for xi in x.iter() {
        sum += *xi * *xi;
    }
    sum
}

/// Compute the A-weighted inner product (x, y)_A = x' * (A * y)
///
/// Used by the conjugate Gram-Schmidt routine and the exact step-size
/// formulas. Costs one matrix-vector product.
#[inline]
pub fn a_inner_product<T, A>(operator: &A, x: &Array1<T>, y: &Array1<T>) -> T
where
    T: RealScalar,
    A: LinearOperator<T>,
{
    inner_product(x, &operator.apply(y))
}

/// Compute axpy: y = alpha * x + y
#[inline]
pub fn axpy<T: RealScalar>(alpha: T, x: &Array1<T>, y: &mut Array1<T>) {
    for (xi, yi) in x.iter().zip(y.iter_mut()) {
        *yi += alpha * *xi;
    }
}

/// Compute the residual r = b - A*x
///
/// One matrix-vector product.
#[inline]
pub fn residual<T, A>(operator: &A, b: &Array1<T>, x: &Array1<T>) -> Array1<T>
where
    T: RealScalar,
    A: LinearOperator<T>,
{
    let ax = operator.apply(x);
    let mut r = b.clone();
    for (ri, axi) in r.iter_mut().zip(ax.iter()) {
        *ri -= *axi;
    }
    r
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_inner_product() {
        let x = array![1.0_f64, 2.0, 3.0];
        let y = array![4.0_f64, 5.0, 6.0];

        assert_relative_eq!(inner_product(&x, &y), 32.0, epsilon = 1e-12);
    }

    #[test]
    fn test_vector_norm() {
        let x = array![3.0_f64, 4.0];

        assert_relative_eq!(vector_norm(&x), 5.0, epsilon = 1e-12);
        assert_relative_eq!(vector_norm_sqr(&x), 25.0, epsilon = 1e-12);
    }

    #[test]
    fn test_a_inner_product() {
        let a = array![[4.0_f64, 1.0], [1.0, 3.0]];
        let x = array![1.0_f64, 0.0];
        let y = array![0.0_f64, 1.0];

        // x' A y = A[0][1]
        assert_relative_eq!(a_inner_product(&a, &x, &y), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_axpy() {
        let x = array![1.0_f64, 2.0, 3.0];
        let mut y = array![1.0_f64, 1.0, 1.0];

        axpy(2.0, &x, &mut y);

        assert_relative_eq!(y[0], 3.0, epsilon = 1e-12);
        assert_relative_eq!(y[1], 5.0, epsilon = 1e-12);
        assert_relative_eq!(y[2], 7.0, epsilon = 1e-12);
    }

    #[test]
    fn test_residual() {
        let a = array![[4.0_f64, 1.0], [1.0, 3.0]];
        let b = array![1.0_f64, 2.0];
        let x = array![0.0_f64, 0.0];

        let r = residual(&a, &b, &x);
        assert_relative_eq!(r[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(r[1], 2.0, epsilon = 1e-12);
    }
}
