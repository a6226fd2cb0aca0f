use crate::ops::{Function, OpContext};
use crate::tensor_data::TensorData;
use crate::value::TensorValue;
use log::warn;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

mod autograd_methods;
mod debug;
mod ops_methods;
mod traits;

static NEXT_TENSOR_ID: AtomicU64 = AtomicU64::new(0);

fn next_id() -> u64 {
    NEXT_TENSOR_ID.fetch_add(1, Ordering::Relaxed)
}

/// A node of the computational graph.
///
/// `Tensor` uses `Arc<RwLock<TensorData>>` internally to allow for:
/// 1.  **Shared Ownership:** the graph and user code hold cheap handles to the same node.
/// 2.  **Interior Mutability:** autograd metadata (`grad`, `nr_out_edges`, ...) is updated through
///     shared handles, guarded by the `RwLock`.
///
/// The carried value is any [`TensorValue`]; the graph never looks inside it.
pub struct Tensor<V: TensorValue> {
    pub(crate) data: Arc<RwLock<TensorData<V>>>,
}

impl<V: TensorValue> Tensor<V> {
    /// Creates a leaf that does not require grad.
    pub fn new(value: V) -> Self {
        Self::from_data(TensorData::leaf(next_id(), value, false))
    }

    /// Creates a leaf that requires grad.
    pub fn new_with_grad(value: V) -> Self {
        Self::from_data(TensorData::leaf(next_id(), value, true))
    }

    /// Creates the result node of a recorded operation.
    pub(crate) fn from_op(
        value: V,
        requires_grad: bool,
        grad_fn: Arc<dyn Function<V>>,
        ctx: OpContext<V>,
        parents: Vec<Tensor<V>>,
        parent_slots: Vec<usize>,
    ) -> Self {
        let mut data = TensorData::leaf(next_id(), value, requires_grad);
        data.grad_fn = Some(grad_fn);
        data.ctx = ctx;
        data.parents = parents;
        data.parent_slots = parent_slots;
        Self::from_data(data)
    }

    fn from_data(data: TensorData<V>) -> Self {
        Tensor {
            data: Arc::new(RwLock::new(data)),
        }
    }

    /// Acquires a read lock on the node's data. A poisoned lock is recovered.
    pub fn read_data(&self) -> RwLockReadGuard<'_, TensorData<V>> {
        self.data.read().unwrap_or_else(|poisoned| {
            warn!("Tensor lock poisoned; recovering");
            poisoned.into_inner()
        })
    }

    /// Acquires a write lock on the node's data. A poisoned lock is recovered.
    pub fn write_data(&self) -> RwLockWriteGuard<'_, TensorData<V>> {
        self.data.write().unwrap_or_else(|poisoned| {
            warn!("Tensor lock poisoned; recovering");
            poisoned.into_inner()
        })
    }

    /// Creation number; later tensors have larger ids.
    pub fn id(&self) -> u64 {
        self.read_data().id
    }

    /// A copy of the carried value.
    pub fn value(&self) -> V {
        self.read_data().value.clone()
    }

    pub fn shape(&self) -> Vec<usize> {
        self.read_data().value.shape()
    }

    pub fn requires_grad(&self) -> bool {
        self.read_data().requires_grad
    }

    /// A copy of the accumulated gradient, if any.
    pub fn grad(&self) -> Option<V> {
        self.read_data().grad.clone()
    }

    pub fn grad_fn(&self) -> Option<Arc<dyn Function<V>>> {
        self.read_data().grad_fn.clone()
    }

    /// Name of the operation that produced this tensor.
    pub fn grad_fn_name(&self) -> Option<String> {
        self.read_data()
            .grad_fn
            .as_ref()
            .map(|f| f.name().to_string())
    }

    pub fn is_leaf(&self) -> bool {
        self.read_data().is_leaf()
    }

    /// Handles to the tensor inputs of the producing operation.
    pub fn parents(&self) -> Vec<Tensor<V>> {
        self.read_data().parents.clone()
    }

    /// How many recorded operations consumed this tensor.
    pub fn nr_out_edges(&self) -> usize {
        self.read_data().nr_out_edges
    }

    /// A copy of the context cached by the producing operation.
    pub fn ctx(&self) -> OpContext<V> {
        self.read_data().ctx.clone()
    }
}
