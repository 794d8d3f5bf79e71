//! Vector kernels used by the cycle and the Krylov drivers
//!
//! Vectors are plain `ndarray::Array1<T>`; these helpers provide the few
//! BLAS-1 style operations the solvers need without extra allocation.

use crate::traits::ComplexField;
use ndarray::Array1;
use num_traits::{Float, Zero};

/// Compute inner product (x, y) = Σ conj(x_i) * y_i
#[inline]
pub fn inner_product<T: ComplexField>(x: &Array1<T>, y: &Array1<T>) -> T {
    assert_eq!(
        x.len(),
        y.len(),
        "Vector lengths must match for inner product"
    );
    let mut sum = T::zero();
    for (xi, yi) in x.iter().zip(y.iter()) {
        sum += xi.conj() * *yi;
    }
    sum
}

/// Compute vector 2-norm: ||x||_2 = sqrt(Σ |x_i|^2)
#[inline]
pub fn vector_norm<T: ComplexField>(x: &Array1<T>) -> T::Real {
    Float::sqrt(vector_norm_sqr(x))
}

/// Compute vector norm squared: ||x||_2^2 = Σ |x_i|^2
#[inline]
pub fn vector_norm_sqr<T: ComplexField>(x: &Array1<T>) -> T::Real {
    let mut sum = T::Real::zero();
    for xi in x.iter() {
        sum += xi.norm_sqr();
    }
    sum
}

/// Compute axpy: y = α * x + y
#[inline]
pub fn axpy<T: ComplexField>(alpha: T, x: &Array1<T>, y: &mut Array1<T>) {
    assert_eq!(x.len(), y.len(), "Vector lengths must match for axpy");
    for (xi, yi) in x.iter().zip(y.iter_mut()) {
        *yi += alpha * *xi;
    }
}

/// Overwrite every entry with zero, keeping the allocation
#[inline]
pub fn fill_zero<T: ComplexField>(x: &mut Array1<T>) {
    x.fill(T::zero());
}
