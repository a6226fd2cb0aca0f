//! # Tensor Value Capability (`value`)
//!
//! The autograd engine never inspects how tensor values are stored or protected. Everything it
//! needs from the arithmetic backend (plaintext, secret-shared, or otherwise) is expressed by the
//! [`TensorValue`] trait. Backend failures are reported as [`ShareGradError::Arithmetic`] and are
//! wrapped with node context by the engine before reaching the caller.
//!
//! [`dense::DenseTensor`] is a plaintext reference backend used by the tests and by
//! [`grad_check`](crate::autograd::grad_check).

use crate::error::{Result, ShareGradError};
use std::fmt::Debug;

pub mod dense;

pub use dense::DenseTensor;

/// Arithmetic capabilities the engine requires from an underlying tensor value.
///
/// Implementations must be cheap to reason about as *values*: `clone()` yields an independent
/// copy, so mutating one clone never affects another.
pub trait TensorValue: Clone + Debug + Send + Sync + 'static {
    /// Dimensions of the value. A scalar has an empty shape.
    fn shape(&self) -> Vec<usize>;

    /// Element-wise sum. Operands must have identical shapes.
    fn add(&self, other: &Self) -> Result<Self>;

    /// Element-wise difference. Operands must have identical shapes.
    fn sub(&self, other: &Self) -> Result<Self>;

    /// Element-wise product. Operands must have identical shapes.
    fn mul(&self, other: &Self) -> Result<Self>;

    /// Element-wise negation.
    fn neg(&self) -> Result<Self>;

    /// Matrix transpose (identity for rank < 2).
    fn transpose(&self) -> Result<Self>;

    /// Sum of all elements, as a scalar value.
    fn sum(&self) -> Result<Self>;

    /// Element-wise logistic function.
    fn sigmoid(&self) -> Result<Self>;

    /// Broadcasts a single-element value to `shape`.
    fn expand(&self, shape: &[usize]) -> Result<Self>;

    /// A value of the given shape filled with ones.
    fn ones(shape: &[usize]) -> Result<Self>;

    /// A value of the given shape filled with zeros.
    fn zeros(shape: &[usize]) -> Result<Self>;

    /// Number of elements.
    fn numel(&self) -> usize {
        self.shape().iter().product()
    }

    fn same_shape(&self, other: &Self) -> bool {
        self.shape() == other.shape()
    }
}

/// Shape precondition shared by the element-wise binary operations.
pub(crate) fn check_same_shape<V: TensorValue>(operation: &str, x: &V, y: &V) -> Result<()> {
    if x.same_shape(y) {
        Ok(())
    } else {
        Err(ShareGradError::ShapeMismatch {
            expected: x.shape(),
            actual: y.shape(),
            operation: operation.to_string(),
        })
    }
}
