use crate::autograd::backward::{self, BackwardOptions};
use crate::error::{Result, ShareGradError};
use crate::tensor::Tensor;
use crate::tensor_data::TensorData;
use crate::value::TensorValue;

impl<V: TensorValue> Tensor<V> {
    /// Sets the `requires_grad` flag of a leaf tensor.
    ///
    /// # Errors
    /// `RequiresGradOnNonLeaf` if the tensor was produced by a recorded operation; its flag is
    /// derived from its parents.
    pub fn requires_grad_(&self, requires_grad: bool) -> Result<()> {
        let mut guard = self.write_data();
        if !guard.is_leaf() {
            return Err(ShareGradError::RequiresGradOnNonLeaf);
        }
        guard.requires_grad = requires_grad;
        Ok(())
    }

    /// A new untracked leaf holding a copy of this tensor's value.
    pub fn detach(&self) -> Tensor<V> {
        Tensor::new(self.value())
    }

    /// Clears the accumulated gradient.
    pub fn zero_grad(&self) {
        self.write_data().grad = None;
    }

    /// Performs the backward pass starting from this tensor, retaining the graph.
    ///
    /// # Arguments
    /// * `seed`: gradient of the final objective with respect to this tensor. Defaults to ones in
    ///   this tensor's shape.
    ///
    /// See [`backward::run`] for the error cases.
    pub fn backward(&self, seed: Option<V>) -> Result<()> {
        backward::run(self, seed, &BackwardOptions::default())
    }

    /// [`Tensor::backward`] with explicit options.
    pub fn backward_with(&self, seed: Option<V>, options: &BackwardOptions) -> Result<()> {
        backward::run(self, seed, options)
    }

    /// Adds `grad_to_add` into the `grad` field (sets it if absent).
    ///
    /// The stored gradient is replaced only once the sum has been computed, so a failure leaves
    /// it untouched.
    pub fn accumulate_grad(&self, grad_to_add: &V) -> Result<()> {
        let mut guard = self.write_data();
        let updated = summed_grad(&guard, grad_to_add)?;
        guard.grad = Some(updated);
        Ok(())
    }

    /// The current gradient plus `grad_to_add`, without storing it.
    pub(crate) fn grad_plus(&self, grad_to_add: &V) -> Result<V> {
        summed_grad(&self.read_data(), grad_to_add)
    }
}

/// Backend failures are reported as `NodeFailure` naming the producing operation, or
/// `accumulate_grad` for leaves.
fn summed_grad<V: TensorValue>(data: &TensorData<V>, grad_to_add: &V) -> Result<V> {
    let expected = data.value.shape();
    if grad_to_add.shape() != expected {
        return Err(ShareGradError::ShapeMismatch {
            expected,
            actual: grad_to_add.shape(),
            operation: "accumulate_grad".to_string(),
        });
    }

    match data.grad.as_ref() {
        Some(existing) => existing.add(grad_to_add).map_err(|e| {
            let operation = data.grad_fn.as_ref().map_or("accumulate_grad", |f| f.name());
            e.in_node(operation, None)
        }),
        None => Ok(grad_to_add.clone()),
    }
}

#[cfg(test)]
#[path = "autograd_methods_test.rs"]
mod tests;
