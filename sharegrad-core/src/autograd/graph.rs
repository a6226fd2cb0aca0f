use crate::error::{Result, ShareGradError};
use crate::tensor::Tensor;
use crate::value::TensorValue;
use std::collections::HashMap;

/// Index of a node inside a [`GraphArena`].
pub(crate) type NodeIndex = usize;

/// Lifecycle of a node during one backward pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeState {
    /// No gradient contribution received yet.
    Pending,
    /// Some, but not all, expected contributions received.
    Accumulating,
    /// Every contribution received; may fire.
    Ready,
    /// Backward rule has run and gradients were routed to the parents.
    Fired,
}

/// Link from a consumer node to one of its parents.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Edge {
    /// Arena index of the parent.
    pub(crate) parent: NodeIndex,
    /// Position of the parent among the consumer's inputs (indexes the backward output).
    pub(crate) slot: usize,
    /// Position of the parent in the consumer's `parents` list.
    pub(crate) parent_position: usize,
}

#[derive(Debug)]
pub(crate) struct GraphNode<V: TensorValue> {
    pub(crate) tensor: Tensor<V>,
    pub(crate) edges: Vec<Edge>,
    /// Contributions still expected before the node becomes ready.
    pub(crate) pending: usize,
    /// Gradient received during this pass only; added to the tensor once the pass succeeds.
    pub(crate) grad: Option<V>,
    pub(crate) state: NodeState,
}

/// All nodes taking part in one backward pass, addressed by index.
///
/// Only tensors that require grad are admitted. Pending counters are local to the arena and
/// count consumer edges *inside* it, so consumers that are unreachable from the root are never
/// waited for and the same graph can be traversed again later. The whole arena is dropped once
/// the pass completes.
#[derive(Debug)]
pub(crate) struct GraphArena<V: TensorValue> {
    nodes: Vec<GraphNode<V>>,
    index: HashMap<u64, NodeIndex>,
}

impl<V: TensorValue> GraphArena<V> {
    /// Discovers every grad-requiring ancestor of `root`. The root always has index 0.
    pub(crate) fn build(root: &Tensor<V>) -> Result<Self> {
        let mut arena = GraphArena {
            nodes: Vec::new(),
            index: HashMap::new(),
        };
        arena.insert(root);

        let mut cursor = 0;
        while cursor < arena.nodes.len() {
            let (parents, slots) = {
                let guard = arena.nodes[cursor].tensor.read_data();
                (guard.parents.clone(), guard.parent_slots.clone())
            };
            for (parent_position, (parent, slot)) in parents.iter().zip(slots).enumerate() {
                if !parent.requires_grad() {
                    continue;
                }
                let parent_idx = arena.insert(parent);
                arena.nodes[parent_idx].pending += 1;
                arena.nodes[cursor].edges.push(Edge {
                    parent: parent_idx,
                    slot,
                    parent_position,
                });
            }
            cursor += 1;
        }

        for node in &arena.nodes {
            let recorded = node.tensor.nr_out_edges();
            if node.pending > recorded {
                return Err(ShareGradError::Internal(format!(
                    "node {} has {} consumers in the graph but only {} recorded out-edges",
                    node.tensor.id(),
                    node.pending,
                    recorded
                )));
            }
        }
        Ok(arena)
    }

    fn insert(&mut self, tensor: &Tensor<V>) -> NodeIndex {
        if let Some(&idx) = self.index.get(&tensor.id()) {
            return idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(GraphNode {
            tensor: tensor.clone(),
            edges: Vec::new(),
            pending: 0,
            grad: None,
            state: NodeState::Pending,
        });
        self.index.insert(tensor.id(), idx);
        idx
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn node(&self, idx: NodeIndex) -> &GraphNode<V> {
        &self.nodes[idx]
    }

    pub(crate) fn node_mut(&mut self, idx: NodeIndex) -> &mut GraphNode<V> {
        &mut self.nodes[idx]
    }

    pub(crate) fn nodes(&self) -> impl Iterator<Item = &GraphNode<V>> {
        self.nodes.iter()
    }

    /// Arena index of `tensor`, if it takes part in this pass.
    #[cfg(test)]
    pub(crate) fn index_of(&self, tensor: &Tensor<V>) -> Option<NodeIndex> {
        self.index.get(&tensor.id()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::{create_test_tensor, create_test_tensor_with_grad};

    #[test]
    fn test_build_counts_edges_within_reachable_graph() -> Result<()> {
        let a = create_test_tensor_with_grad(vec![1.0, 2.0], vec![2]);
        let b = create_test_tensor_with_grad(vec![3.0, 4.0], vec![2]);
        let c = a.mul(&b)?;
        let d = c.add(&a)?;
        // Consumer of `a` that is not reachable from `d`.
        let _unrelated = a.sigmoid()?;
        let root = d.sum()?;

        let arena = GraphArena::build(&root)?;
        assert_eq!(arena.len(), 5);
        assert_eq!(arena.index_of(&root), Some(0));

        let a_idx = arena.index_of(&a).expect("a in arena");
        assert_eq!(arena.node(a_idx).pending, 2);
        assert_eq!(a.nr_out_edges(), 3);

        let c_idx = arena.index_of(&c).expect("c in arena");
        assert_eq!(arena.node(c_idx).pending, 1);
        assert_eq!(arena.node(c_idx).edges.len(), 2);
        assert_eq!(arena.node(0).pending, 0);
        assert!(arena.nodes().all(|n| n.state == NodeState::Pending));
        Ok(())
    }

    #[test]
    fn test_build_skips_non_differentiable_parents() -> Result<()> {
        let a = create_test_tensor_with_grad(vec![1.0], vec![1]);
        let b = create_test_tensor(vec![2.0], vec![1]);
        let c = a.mul(&b)?;

        let arena = GraphArena::build(&c)?;
        assert_eq!(arena.len(), 2);
        assert!(arena.index_of(&b).is_none());
        let edges = &arena.node(0).edges;
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].slot, 0);
        assert_eq!(edges[0].parent_position, 0);
        Ok(())
    }

    #[test]
    fn test_build_rejects_inconsistent_edge_counts() -> Result<()> {
        let a = create_test_tensor_with_grad(vec![1.0], vec![1]);
        let c = a.sigmoid()?;
        a.write_data().nr_out_edges = 0;
        assert!(matches!(
            GraphArena::build(&c),
            Err(ShareGradError::Internal(_))
        ));
        Ok(())
    }
}
