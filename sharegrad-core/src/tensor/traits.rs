use crate::tensor::Tensor;
use crate::value::TensorValue;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

impl<V: TensorValue> Clone for Tensor<V> {
    /// Shallow clone: the new handle refers to the same graph node.
    fn clone(&self) -> Self {
        Tensor {
            data: Arc::clone(&self.data),
        }
    }
}

/// Node identity, not value equality.
impl<V: TensorValue> PartialEq for Tensor<V> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl<V: TensorValue> Eq for Tensor<V> {}

impl<V: TensorValue> Hash for Tensor<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}
