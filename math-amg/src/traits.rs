//! Core traits for the multigrid kernel
//!
//! This module defines the abstractions the AMG hierarchy is written against:
//! - [`ComplexField`]: scalar types (complex and real numbers)
//! - [`LinearOperator`]: matrix-like objects that can perform matrix-vector products
//! - [`Preconditioner`]: approximate inverses used by Krylov solvers
//! - [`Smoother`]: per-level relaxation, bound to one level's matrix
//! - [`CoarseSolver`]: direct solver for the coarsest level

use crate::error::Result;
use crate::preconditioners::AmgConfig;
use crate::sparse::CsrMatrix;
use ndarray::Array1;
use num_complex::{Complex32, Complex64};
use num_traits::{Float, FromPrimitive, NumAssign, One, ToPrimitive, Zero};
use std::fmt::Debug;
use std::ops::Neg;

/// Trait for scalar types that can be used as matrix entries.
///
/// Provided for `Complex64`, `Complex32`, `f64` and `f32`.
pub trait ComplexField:
    NumAssign + Clone + Copy + Send + Sync + Debug + Zero + One + Neg<Output = Self> + 'static
{
    /// The real number type underlying this field
    type Real: Float + NumAssign + FromPrimitive + ToPrimitive + Send + Sync + Debug + 'static;

    /// Whether values carry an imaginary part
    const IS_COMPLEX: bool = false;

    /// Complex conjugate
    fn conj(&self) -> Self;

    /// Squared magnitude |z|²
    fn norm_sqr(&self) -> Self::Real;

    /// Magnitude |z|
    fn norm(&self) -> Self::Real {
        self.norm_sqr().sqrt()
    }

    /// Largest absolute component, max(|re|, |im|)
    fn max_component_norm(&self) -> Self::Real {
        self.re().abs().max(self.im().abs())
    }

    /// Create from a real value
    fn from_real(r: Self::Real) -> Self;

    /// Real constant from an `f64` (NaN if not representable)
    fn real_from_f64(v: f64) -> Self::Real {
        Self::Real::from_f64(v).unwrap_or_else(Self::Real::nan)
    }

    /// Real part
    fn re(&self) -> Self::Real;

    /// Imaginary part
    fn im(&self) -> Self::Real;

    /// Check if this is approximately zero
    fn is_zero_approx(&self, tol: Self::Real) -> bool {
        self.norm_sqr() < tol * tol
    }

    /// Multiplicative inverse (1/z)
    fn inv(&self) -> Self;
}

impl ComplexField for Complex64 {
    type Real = f64;
    const IS_COMPLEX: bool = true;

    #[inline]
    fn conj(&self) -> Self {
        Complex64::conj(self)
    }

    #[inline]
    fn norm_sqr(&self) -> f64 {
        self.re * self.re + self.im * self.im
    }

    #[inline]
    fn from_real(r: f64) -> Self {
        Complex64::new(r, 0.0)
    }

    #[inline]
    fn re(&self) -> f64 {
        self.re
    }

    #[inline]
    fn im(&self) -> f64 {
        self.im
    }

    #[inline]
    fn inv(&self) -> Self {
        let denom = self.norm_sqr();
        Complex64::new(self.re / denom, -self.im / denom)
    }
}

impl ComplexField for Complex32 {
    type Real = f32;
    const IS_COMPLEX: bool = true;

    #[inline]
    fn conj(&self) -> Self {
        Complex32::conj(self)
    }

    #[inline]
    fn norm_sqr(&self) -> f32 {
        self.re * self.re + self.im * self.im
    }

    #[inline]
    fn from_real(r: f32) -> Self {
        Complex32::new(r, 0.0)
    }

    #[inline]
    fn re(&self) -> f32 {
        self.re
    }

    #[inline]
    fn im(&self) -> f32 {
        self.im
    }

    #[inline]
    fn inv(&self) -> Self {
        let denom = self.norm_sqr();
        Complex32::new(self.re / denom, -self.im / denom)
    }
}

impl ComplexField for f64 {
    type Real = f64;

    #[inline]
    fn conj(&self) -> Self {
        *self
    }

    #[inline]
    fn norm_sqr(&self) -> f64 {
        *self * *self
    }

    #[inline]
    fn norm(&self) -> f64 {
        self.abs()
    }

    #[inline]
    fn from_real(r: f64) -> Self {
        r
    }

    #[inline]
    fn re(&self) -> f64 {
        *self
    }

    #[inline]
    fn im(&self) -> f64 {
        0.0
    }

    #[inline]
    fn inv(&self) -> Self {
        1.0 / *self
    }
}

impl ComplexField for f32 {
    type Real = f32;

    #[inline]
    fn conj(&self) -> Self {
        *self
    }

    #[inline]
    fn norm_sqr(&self) -> f32 {
        *self * *self
    }

    #[inline]
    fn norm(&self) -> f32 {
        self.abs()
    }

    #[inline]
    fn from_real(r: f32) -> Self {
        r
    }

    #[inline]
    fn re(&self) -> f32 {
        *self
    }

    #[inline]
    fn im(&self) -> f32 {
        0.0
    }

    #[inline]
    fn inv(&self) -> Self {
        1.0 / *self
    }
}

/// Trait for linear operators (matrices) that can perform matrix-vector products.
pub trait LinearOperator<T: ComplexField>: Send + Sync {
    /// Number of rows in the operator
    fn num_rows(&self) -> usize;

    /// Number of columns in the operator
    fn num_cols(&self) -> usize;

    /// Apply the operator: y = A * x
    fn apply(&self, x: &Array1<T>) -> Array1<T>;

    /// Check if the operator is square
    fn is_square(&self) -> bool {
        self.num_rows() == self.num_cols()
    }
}

/// Trait for preconditioners used in iterative solvers.
///
/// A preconditioner M approximates A^(-1), so that M*A is better conditioned
/// than A alone.
pub trait Preconditioner<T: ComplexField>: Send + Sync {
    /// Apply the preconditioner: y = M * r
    fn apply(&self, r: &Array1<T>) -> Array1<T>;
}

/// Identity preconditioner (no preconditioning)
#[derive(Clone, Debug, Default)]
pub struct IdentityPreconditioner;

impl<T: ComplexField> Preconditioner<T> for IdentityPreconditioner {
    fn apply(&self, r: &Array1<T>) -> Array1<T> {
        r.clone()
    }
}

/// Relaxation method attached to one level of a multigrid hierarchy.
///
/// A smoother is created once per level from that level's matrix and keeps
/// only derived data; the matrix itself is passed back on every call.
pub trait Smoother<T: ComplexField>: Send + Sync + Sized {
    /// Prepare the smoother for `matrix`
    fn init(matrix: &CsrMatrix<T>, config: &AmgConfig) -> Result<Self>;

    /// Run `sweeps` relaxation sweeps on `A x = b` in place and return ‖b - A x‖₂
    ///
    /// `residual` is caller-owned workspace of length `x.len()`; on return it
    /// holds `b - A x`.
    fn smooth(
        &self,
        matrix: &CsrMatrix<T>,
        x: &mut Array1<T>,
        b: &Array1<T>,
        sweeps: usize,
        residual: &mut Array1<T>,
    ) -> T::Real;
}

/// Direct solver used on the coarsest level.
pub trait CoarseSolver<T: ComplexField>: Send + Sync + Sized {
    /// Factorize the coarsest operator
    fn factorize(matrix: &CsrMatrix<T>) -> Result<Self>;

    /// Solve `A x = b` with the stored factorization
    fn solve(&self, b: &Array1<T>, x: &mut Array1<T>) -> Result<()>;
}
