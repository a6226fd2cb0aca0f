//! # Differentiable Operations (`ops`)
//!
//! Every differentiable primitive implements the [`Function`] contract: a `forward` that computes
//! the output value and caches what it needs in an [`OpContext`], and a `backward` that turns the
//! output gradient into one gradient per input, positionally aligned with the inputs.
//!
//! ## Structure:
//!
//! - **[`OpKind`]:** the closed set of built-in operations. Each variant dispatches to the
//!   `forward`/`backward` pair in its submodule, so adding a variant forces every match to be
//!   updated.
//! - **Submodules:** [`arithmetic`] (add, sub, mul), [`view`] (transpose), [`reduction`] (sum),
//!   [`activation`] (sigmoid).
//! - **[`registry`]:** name-based lookup of the built-ins.
//! - **User functions:** any type implementing [`Function`] can be recorded into the graph through
//!   [`Tensor::call`](crate::tensor::Tensor::call).

use crate::error::{Result, ShareGradError};
use crate::tensor::Tensor;
use crate::value::TensorValue;
use std::fmt::Debug;

pub mod activation;
pub mod arithmetic;
pub mod context;
pub mod reduction;
pub mod registry;
pub mod view;

pub use context::OpContext;

/// Contract implemented by every differentiable operation.
///
/// Implementations are stateless descriptors: everything a particular call needs for its
/// backward pass goes into the `ctx` passed to `forward`.
pub trait Function<V: TensorValue>: Debug + Send + Sync {
    /// Name used in logs and error context.
    fn name(&self) -> &str;

    /// Number of inputs, including the tensor the operation is invoked on.
    fn arity(&self) -> usize;

    /// Computes the output value. Must validate structural preconditions (returning
    /// `ShapeMismatch`) and may only produce side effects into `ctx`.
    ///
    /// Runs with grad mode disabled, so tensor operations invoked here are not recorded.
    fn forward(&self, ctx: &mut OpContext<V>, inputs: &[Operand<V>]) -> Result<V>;

    /// Computes one gradient per input, in input order, from the cached `ctx` and the gradient
    /// flowing into the output.
    fn backward(&self, ctx: &OpContext<V>, grad_output: &V) -> Result<Vec<V>>;
}

/// An argument to an operation.
#[derive(Debug, Clone)]
pub enum Operand<V: TensorValue> {
    /// A differentiable tensor; becomes a parent of the result.
    Tensor(Tensor<V>),
    /// A plain value; never a parent, never receives a gradient.
    Constant(V),
}

impl<V: TensorValue> Operand<V> {
    pub fn constant(value: V) -> Self {
        Operand::Constant(value)
    }

    /// The underlying value (cloned).
    pub fn value(&self) -> V {
        match self {
            Operand::Tensor(tensor) => tensor.value(),
            Operand::Constant(value) => value.clone(),
        }
    }

    pub fn as_tensor(&self) -> Option<&Tensor<V>> {
        match self {
            Operand::Tensor(tensor) => Some(tensor),
            Operand::Constant(_) => None,
        }
    }
}

impl<V: TensorValue> From<Tensor<V>> for Operand<V> {
    fn from(tensor: Tensor<V>) -> Self {
        Operand::Tensor(tensor)
    }
}

impl<V: TensorValue> From<&Tensor<V>> for Operand<V> {
    fn from(tensor: &Tensor<V>) -> Self {
        Operand::Tensor(tensor.clone())
    }
}

/// Extracts exactly `N` input values, failing with `TypeMismatch` on an arity violation.
pub(crate) fn input_values<V: TensorValue, const N: usize>(
    operation: &str,
    inputs: &[Operand<V>],
) -> Result<[V; N]> {
    let values: Vec<V> = inputs.iter().map(Operand::value).collect();
    let got = values.len();
    values.try_into().map_err(|_| ShareGradError::TypeMismatch {
        operation: operation.to_string(),
        message: format!("expected {} operand(s), got {}", N, got),
    })
}

/// The built-in differentiable operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Transpose,
    Add,
    Sub,
    Mul,
    Sum,
    Sigmoid,
}

impl OpKind {
    pub const ALL: [OpKind; 6] = [
        OpKind::Transpose,
        OpKind::Add,
        OpKind::Sub,
        OpKind::Mul,
        OpKind::Sum,
        OpKind::Sigmoid,
    ];

    /// Registry name of the operation.
    pub fn name(self) -> &'static str {
        match self {
            OpKind::Transpose => "t",
            OpKind::Add => "add",
            OpKind::Sub => "sub",
            OpKind::Mul => "mul",
            OpKind::Sum => "sum",
            OpKind::Sigmoid => "sigmoid",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            OpKind::Transpose | OpKind::Sum | OpKind::Sigmoid => 1,
            OpKind::Add | OpKind::Sub | OpKind::Mul => 2,
        }
    }
}

impl<V: TensorValue> Function<V> for OpKind {
    fn name(&self) -> &str {
        OpKind::name(*self)
    }

    fn arity(&self) -> usize {
        OpKind::arity(*self)
    }

    fn forward(&self, ctx: &mut OpContext<V>, inputs: &[Operand<V>]) -> Result<V> {
        match self {
            OpKind::Transpose => view::transpose::forward(ctx, inputs),
            OpKind::Add => arithmetic::add::forward(ctx, inputs),
            OpKind::Sub => arithmetic::sub::forward(ctx, inputs),
            OpKind::Mul => arithmetic::mul::forward(ctx, inputs),
            OpKind::Sum => reduction::sum::forward(ctx, inputs),
            OpKind::Sigmoid => activation::sigmoid::forward(ctx, inputs),
        }
    }

    fn backward(&self, ctx: &OpContext<V>, grad_output: &V) -> Result<Vec<V>> {
        match self {
            OpKind::Transpose => view::transpose::backward(ctx, grad_output),
            OpKind::Add => arithmetic::add::backward(ctx, grad_output),
            OpKind::Sub => arithmetic::sub::backward(ctx, grad_output),
            OpKind::Mul => arithmetic::mul::backward(ctx, grad_output),
            OpKind::Sum => reduction::sum::backward(ctx, grad_output),
            OpKind::Sigmoid => activation::sigmoid::backward(ctx, grad_output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::DenseTensor;

    #[test]
    fn test_input_values_arity_mismatch() {
        let x = DenseTensor::<f64>::scalar(1.0);
        let inputs = vec![Operand::constant(x)];
        let err = input_values::<_, 2>("add", &inputs).unwrap_err();
        assert!(matches!(err, ShareGradError::TypeMismatch { ref operation, .. } if operation == "add"));
    }

    #[test]
    fn test_kind_names_are_unique() {
        let mut names: Vec<_> = OpKind::ALL.iter().map(|&k| OpKind::name(k)).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), OpKind::ALL.len());
    }
}
