use crate::ops::{Function, OpContext};
use crate::tensor::Tensor;
use crate::value::TensorValue;
use std::sync::Arc;

/// Internal state of a graph node.
///
/// Wrapped in `Arc<RwLock<TensorData>>` by [`Tensor`], so the autograd metadata (`grad`,
/// `nr_out_edges`, cached context) can be updated through shared handles.
#[derive(Debug)]
pub struct TensorData<V: TensorValue> {
    /// Process-wide unique, monotonically increasing creation number.
    pub(crate) id: u64,
    /// The (possibly secret-shared) value carried by this node.
    pub(crate) value: V,

    // --- Autograd Metadata ---
    /// Whether gradients flow into this node.
    pub(crate) requires_grad: bool,
    /// Accumulated gradient, same shape as `value`. `None` until a backward pass reaches it.
    pub(crate) grad: Option<V>,
    /// Operation that produced this node. Leaves have `None`.
    pub(crate) grad_fn: Option<Arc<dyn Function<V>>>,
    /// Whatever `grad_fn.forward` cached for the backward pass.
    pub(crate) ctx: OpContext<V>,
    /// Tensor inputs of `grad_fn`, in call order. Constants are not recorded.
    pub(crate) parents: Vec<Tensor<V>>,
    /// For each parent, its position among the operation's inputs. Indexes the output of
    /// `grad_fn.backward`.
    pub(crate) parent_slots: Vec<usize>,
    /// Number of recorded operations that consumed this node as a parent, counted per occurrence.
    pub(crate) nr_out_edges: usize,
}

impl<V: TensorValue> TensorData<V> {
    /// A fresh leaf holding `value`.
    pub(crate) fn leaf(id: u64, value: V, requires_grad: bool) -> Self {
        TensorData {
            id,
            value,
            requires_grad,
            grad: None,
            grad_fn: None,
            ctx: OpContext::Empty,
            parents: Vec::new(),
            parent_slots: Vec::new(),
            nr_out_edges: 0,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.grad_fn.is_none()
    }
}

/// Tears the ancestry down with an explicit worklist.
///
/// Each node owns its parents, so the derived drop would recurse once per node of a chain and
/// overflow the stack on long graphs. Parents whose last handle is held here are unwrapped and
/// their own parents moved onto the worklist before they are dropped.
impl<V: TensorValue> Drop for TensorData<V> {
    fn drop(&mut self) {
        let mut worklist = std::mem::take(&mut self.parents);
        while let Some(parent) = worklist.pop() {
            if let Ok(lock) = Arc::try_unwrap(parent.data) {
                let mut data = lock.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
                worklist.append(&mut data.parents);
            }
        }
    }
}
