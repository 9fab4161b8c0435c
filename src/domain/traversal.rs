use tracing::instrument;

use crate::domain::arena::{NodeId, Slot, TreeArena, TreeNode};

/// Depth-first pre-order walk over a subtree, first child before second.
pub struct PreOrderIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<NodeId>,
}

impl<'a> PreOrderIterator<'a> {
    #[instrument(level = "trace", skip(arena))]
    pub(crate) fn new(arena: &'a TreeArena, start: NodeId) -> Self {
        Self {
            arena,
            stack: vec![start],
        }
    }
}

impl<'a> Iterator for PreOrderIterator<'a> {
    type Item = (NodeId, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Ok(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for first-to-second traversal
                for slot in Slot::BOTH.into_iter().rev() {
                    if let Some(child) = node.child(slot) {
                        self.stack.push(child);
                    }
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

/// Depth-first post-order walk: every node is yielded after its children.
pub struct PostOrderIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<(NodeId, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    #[instrument(level = "trace", skip(arena))]
    pub(crate) fn new(arena: &'a TreeArena, start: NodeId) -> Self {
        Self {
            arena,
            stack: vec![(start, false)],
        }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (NodeId, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Ok(node) = self.arena.get_node(current_idx) {
                if visited {
                    return Some((current_idx, node));
                }
                self.stack.push((current_idx, true));
                for slot in Slot::BOTH.into_iter().rev() {
                    if let Some(child) = node.child(slot) {
                        self.stack.push((child, false));
                    }
                }
            }
        }
        None
    }
}
