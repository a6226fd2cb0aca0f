use crate::autograd::forward;
use crate::autograd::grad_mode::is_grad_enabled;
use crate::error::Result;
use crate::ops::{registry, Function, OpKind, Operand};
use crate::tensor::Tensor;
use crate::value::TensorValue;
use std::sync::Arc;

impl<V: TensorValue> Tensor<V> {
    /// Invokes `grad_fn` with this tensor as the first input.
    ///
    /// When grad mode is enabled the call is recorded into the graph; otherwise only the forward
    /// rule runs and the result is an untracked leaf.
    pub fn call(&self, grad_fn: Arc<dyn Function<V>>, args: &[Operand<V>]) -> Result<Tensor<V>> {
        if is_grad_enabled() {
            forward::apply(self, grad_fn, args)
        } else {
            forward::evaluate(self, grad_fn.as_ref(), args)
        }
    }

    /// Invokes a built-in operation looked up by name, e.g. `"mul"`.
    ///
    /// # Errors
    /// `UnknownOperation` if no built-in has that name.
    pub fn apply(&self, name: &str, args: &[Operand<V>]) -> Result<Tensor<V>> {
        let op = registry::get(name)?;
        self.call(Arc::new(op), args)
    }

    fn call_builtin(&self, op: OpKind, args: &[Operand<V>]) -> Result<Tensor<V>> {
        self.call(Arc::new(op), args)
    }

    /// Matrix transpose.
    pub fn t(&self) -> Result<Tensor<V>> {
        self.call_builtin(OpKind::Transpose, &[])
    }

    pub fn add(&self, other: impl Into<Operand<V>>) -> Result<Tensor<V>> {
        self.call_builtin(OpKind::Add, &[other.into()])
    }

    pub fn sub(&self, other: impl Into<Operand<V>>) -> Result<Tensor<V>> {
        self.call_builtin(OpKind::Sub, &[other.into()])
    }

    /// Element-wise product.
    pub fn mul(&self, other: impl Into<Operand<V>>) -> Result<Tensor<V>> {
        self.call_builtin(OpKind::Mul, &[other.into()])
    }

    /// Sum of all elements, as a scalar.
    pub fn sum(&self) -> Result<Tensor<V>> {
        self.call_builtin(OpKind::Sum, &[])
    }

    pub fn sigmoid(&self) -> Result<Tensor<V>> {
        self.call_builtin(OpKind::Sigmoid, &[])
    }
}
