use crate::autograd::graph::{GraphArena, NodeIndex, NodeState};
use crate::error::{Result, ShareGradError};
use crate::ops::OpContext;
use crate::tensor::Tensor;
use crate::value::TensorValue;
use log::{debug, trace};
use std::collections::BinaryHeap;

/// Options controlling a backward pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackwardOptions {
    /// Keep `grad_fn`, `ctx` and parents of every traversed non-leaf node after the pass, so the
    /// graph can be differentiated again. When `false`, those are released and a later backward
    /// through the same nodes fails with `BackwardOnNonDifferentiable`.
    pub retain_graph: bool,
}

impl Default for BackwardOptions {
    fn default() -> Self {
        BackwardOptions { retain_graph: true }
    }
}

/// Computes gradients of `root` with respect to every grad-requiring tensor it depends on.
///
/// The gradient reaching each traversed tensor during this pass is *added* to its `grad` field,
/// so repeated passes accumulate. `seed` defaults to ones in the root's shape.
///
/// Stored gradients are written only after every node has fired and every sum has been
/// computed. A pass that fails leaves all `grad` fields as they were, so it can be retried.
///
/// Among nodes that are ready at the same time, the most recently created one fires first.
///
/// # Errors
/// * `BackwardOnNonDifferentiable` if `root` does not require grad or has no `grad_fn`.
/// * `ShapeMismatch` if the seed, or a gradient produced by a backward rule, does not match the
///   shape of the tensor it is meant for.
/// * `GradientCountMismatch` if a backward rule returns the wrong number of gradients.
/// * `CycleDetected` if some node never receives all of its expected contributions.
/// * Backend failures, wrapped in `NodeFailure` with the operation name and parent index.
pub fn run<V: TensorValue>(
    root: &Tensor<V>,
    seed: Option<V>,
    options: &BackwardOptions,
) -> Result<()> {
    {
        let guard = root.read_data();
        if !guard.requires_grad || guard.grad_fn.is_none() {
            return Err(ShareGradError::BackwardOnNonDifferentiable);
        }
    }

    let root_shape = root.shape();
    let seed = match seed {
        Some(seed) => {
            if seed.shape() != root_shape {
                return Err(ShareGradError::ShapeMismatch {
                    expected: root_shape,
                    actual: seed.shape(),
                    operation: "backward".to_string(),
                });
            }
            seed
        }
        None => V::ones(&root_shape)?,
    };

    let mut arena = GraphArena::build(root)?;
    debug!(
        "Backward pass from node {} over {} node(s)",
        root.id(),
        arena.len()
    );

    arena.node_mut(0).grad = Some(seed);
    let mut ready = BinaryHeap::new();
    for idx in 0..arena.len() {
        let node = arena.node_mut(idx);
        if node.pending == 0 {
            node.state = NodeState::Ready;
            ready.push((node.tensor.id(), idx));
        }
    }

    while let Some((_, idx)) = ready.pop() {
        fire(&mut arena, idx, &mut ready)?;
    }

    let unresolved = arena
        .nodes()
        .filter(|node| node.state != NodeState::Fired)
        .count();
    if unresolved > 0 {
        return Err(ShareGradError::CycleDetected { unresolved });
    }

    commit(&arena)?;
    if !options.retain_graph {
        release(&arena);
    }
    Ok(())
}

/// Adds each node's pass gradient into its stored `grad`, all or nothing.
fn commit<V: TensorValue>(arena: &GraphArena<V>) -> Result<()> {
    let mut updates = Vec::with_capacity(arena.len());
    for node in arena.nodes() {
        let pass_grad = node.grad.as_ref().ok_or_else(|| {
            ShareGradError::Internal(format!("node {} fired without a gradient", node.tensor.id()))
        })?;
        updates.push((&node.tensor, node.tensor.grad_plus(pass_grad)?));
    }
    for (tensor, grad) in updates {
        tensor.write_data().grad = Some(grad);
    }
    Ok(())
}

fn fire<V: TensorValue>(
    arena: &mut GraphArena<V>,
    idx: NodeIndex,
    ready: &mut BinaryHeap<(u64, NodeIndex)>,
) -> Result<()> {
    let tensor = arena.node(idx).tensor.clone();
    let grad = arena.node(idx).grad.clone().ok_or_else(|| {
        ShareGradError::Internal(format!("node {} became ready without a gradient", tensor.id()))
    })?;

    let (name, input_grads) = {
        let guard = tensor.read_data();
        match guard.grad_fn.as_ref() {
            Some(grad_fn) => {
                let name = grad_fn.name().to_string();
                let grads = grad_fn
                    .backward(&guard.ctx, &grad)
                    .map_err(|e| e.in_node(&name, None))?;
                if grads.len() != grad_fn.arity() {
                    return Err(ShareGradError::GradientCountMismatch {
                        operation: name,
                        expected: grad_fn.arity(),
                        actual: grads.len(),
                    });
                }
                (name, grads)
            }
            None => {
                trace!("Node {} is a leaf, nothing to propagate", tensor.id());
                arena.node_mut(idx).state = NodeState::Fired;
                return Ok(());
            }
        }
    };
    debug!("Fired node {} ({})", tensor.id(), name);

    let edges = arena.node(idx).edges.clone();
    for edge in edges {
        let incoming = &input_grads[edge.slot];
        let parent = arena.node_mut(edge.parent);

        let expected = parent.tensor.shape();
        if incoming.shape() != expected {
            return Err(ShareGradError::ShapeMismatch {
                expected,
                actual: incoming.shape(),
                operation: format!("{} backward (parent {})", name, edge.parent_position),
            });
        }

        let summed = match parent.grad.as_ref() {
            Some(existing) => existing
                .add(incoming)
                .map_err(|e| e.in_node(&name, Some(edge.parent_position)))?,
            None => incoming.clone(),
        };
        parent.grad = Some(summed);
        parent.pending -= 1;
        trace!(
            "Routed gradient from node {} to node {} ({} pending)",
            tensor.id(),
            parent.tensor.id(),
            parent.pending
        );

        if parent.pending == 0 {
            parent.state = NodeState::Ready;
            ready.push((parent.tensor.id(), edge.parent));
        } else {
            parent.state = NodeState::Accumulating;
        }
    }

    arena.node_mut(idx).state = NodeState::Fired;
    Ok(())
}

/// Drops the cached state of every traversed non-leaf node.
fn release<V: TensorValue>(arena: &GraphArena<V>) {
    for node in arena.nodes() {
        let mut guard = node.tensor.write_data();
        if guard.grad_fn.is_some() {
            guard.grad_fn = None;
            guard.ctx = OpContext::Empty;
            guard.parents.clear();
            guard.parent_slots.clear();
        }
    }
}

#[cfg(test)]
#[path = "backward_test.rs"]
mod tests;
