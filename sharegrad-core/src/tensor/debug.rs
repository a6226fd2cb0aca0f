use crate::tensor::Tensor;
use crate::value::TensorValue;
use std::fmt;

// Parents are shown by id only; printing them recursively would walk the whole graph.
impl<V: TensorValue> fmt::Debug for Tensor<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.data.try_read() {
            Ok(guard) => {
                let parent_ids: Vec<u64> = guard
                    .parents
                    .iter()
                    .map(|p| p.data.try_read().map(|d| d.id).unwrap_or(u64::MAX))
                    .collect();
                f.debug_struct("Tensor")
                    .field("id", &guard.id)
                    .field("shape", &guard.value.shape())
                    .field("requires_grad", &guard.requires_grad)
                    .field("has_grad", &guard.grad.is_some())
                    .field("grad_fn", &guard.grad_fn.as_ref().map(|g| g.name().to_string()))
                    .field("parents", &parent_ids)
                    .field("nr_out_edges", &guard.nr_out_edges)
                    .finish()
            }
            Err(_) => write!(f, "Tensor(<locked>)"),
        }
    }
}
