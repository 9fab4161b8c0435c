//! Arena-backed binary tree storage.
//!
//! Every node of every tree lives in one generational arena. Links between
//! nodes are handles, never references: a child does not own its parent and a
//! handle to a released node never resolves again, even after its slot in the
//! arena has been reused.

use std::fmt;

use generational_arena::{Arena, Index};
use tracing::{debug, instrument};

use crate::domain::traversal::{PostOrderIterator, PreOrderIterator};
use crate::errors::{TreeError, TreeResult};

/// Opaque handle to a node stored in a [`TreeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Index);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (idx, generation) = self.0.into_raw_parts();
        write!(f, "#{}.{}", idx, generation)
    }
}

/// Child position of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    First,
    Second,
}

impl Slot {
    /// Both slots, in traversal order.
    pub const BOTH: [Slot; 2] = [Slot::First, Slot::Second];
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::First => write!(f, "first"),
            Slot::Second => write!(f, "second"),
        }
    }
}

/// Tree node in the arena. Fields are only changed through [`TreeArena`] so
/// parent and child links always agree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    value: i32,
    /// Index of parent node in the arena, None for root nodes
    parent: Option<NodeId>,
    first: Option<NodeId>,
    second: Option<NodeId>,
}

impl TreeNode {
    fn new(value: i32, parent: Option<NodeId>) -> Self {
        Self {
            value,
            parent,
            first: None,
            second: None,
        }
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn child(&self, slot: Slot) -> Option<NodeId> {
        match slot {
            Slot::First => self.first,
            Slot::Second => self.second,
        }
    }

    pub fn first_child(&self) -> Option<NodeId> {
        self.first
    }

    pub fn second_child(&self) -> Option<NodeId> {
        self.second
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.first.is_none() && self.second.is_none()
    }

    fn child_mut(&mut self, slot: Slot) -> &mut Option<NodeId> {
        match slot {
            Slot::First => &mut self.first,
            Slot::Second => &mut self.second,
        }
    }

    fn slot_of(&self, child: NodeId) -> Option<Slot> {
        Slot::BOTH
            .into_iter()
            .find(|&slot| self.child(slot) == Some(child))
    }
}

/// Owner of all nodes of any number of independent trees.
///
/// Any node can be treated as the root of its own subtree: every query takes
/// the node to start from. Mutations check all their preconditions before
/// touching the arena, so a failed call leaves every tree as it was.
#[derive(Debug, Default)]
pub struct TreeArena {
    arena: Arena<TreeNode>,
}

impl TreeArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
        }
    }

    /// Number of live nodes across all trees.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn is_live(&self, node: NodeId) -> bool {
        self.arena.contains(node.0)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn get_node(&self, node: NodeId) -> TreeResult<&TreeNode> {
        self.arena
            .get(node.0)
            .ok_or(TreeError::UseAfterDestroy(node))
    }

    fn get_node_mut(&mut self, node: NodeId) -> TreeResult<&mut TreeNode> {
        self.arena
            .get_mut(node.0)
            .ok_or(TreeError::UseAfterDestroy(node))
    }

    /// Allocates a childless node that is the root of a new tree.
    #[instrument(level = "debug", skip(self))]
    pub fn create(&mut self, value: i32) -> NodeId {
        NodeId(self.arena.insert(TreeNode::new(value, None)))
    }

    pub fn value(&self, node: NodeId) -> TreeResult<i32> {
        Ok(self.get_node(node)?.value)
    }

    /// Overwrites the value of a non-root node.
    ///
    /// Roots keep the value they were created with; this fails with
    /// [`TreeError::ImmutableRoot`] for any node without a parent.
    #[instrument(level = "debug", skip(self))]
    pub fn set_value(&mut self, node: NodeId, value: i32) -> TreeResult<()> {
        let target = self.get_node_mut(node)?;
        if target.is_root() {
            return Err(TreeError::ImmutableRoot(node));
        }
        target.value = value;
        Ok(())
    }

    pub fn parent(&self, node: NodeId) -> TreeResult<Option<NodeId>> {
        Ok(self.get_node(node)?.parent)
    }

    pub fn is_root(&self, node: NodeId) -> TreeResult<bool> {
        Ok(self.get_node(node)?.is_root())
    }

    /// Follows parent links up to the root of the tree containing `node`.
    #[instrument(level = "trace", skip(self))]
    pub fn root_of(&self, node: NodeId) -> TreeResult<NodeId> {
        let mut current = node;
        while let Some(parent) = self.get_node(current)?.parent {
            current = parent;
        }
        Ok(current)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn child(&self, node: NodeId, slot: Slot) -> TreeResult<Option<NodeId>> {
        Ok(self.get_node(node)?.child(slot))
    }

    pub fn first_child(&self, node: NodeId) -> TreeResult<Option<NodeId>> {
        self.child(node, Slot::First)
    }

    pub fn second_child(&self, node: NodeId) -> TreeResult<Option<NodeId>> {
        self.child(node, Slot::Second)
    }

    /// Allocates a new node with `value` in the given slot of `node`.
    ///
    /// An occupied slot is never replaced: remove or detach the existing child
    /// first.
    #[instrument(level = "debug", skip(self))]
    pub fn create_child(&mut self, node: NodeId, slot: Slot, value: i32) -> TreeResult<NodeId> {
        if self.get_node(node)?.child(slot).is_some() {
            return Err(TreeError::SlotOccupied { node, slot });
        }
        let child = NodeId(self.arena.insert(TreeNode::new(value, Some(node))));
        *self.get_node_mut(node)?.child_mut(slot) = Some(child);
        Ok(child)
    }

    pub fn set_first_child(&mut self, node: NodeId, value: i32) -> TreeResult<NodeId> {
        self.create_child(node, Slot::First, value)
    }

    pub fn set_second_child(&mut self, node: NodeId, value: i32) -> TreeResult<NodeId> {
        self.create_child(node, Slot::Second, value)
    }

    /// Detaches the child in `slot` and releases its whole subtree.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_child(&mut self, node: NodeId, slot: Slot) -> TreeResult<()> {
        let child = self.detach(node, slot)?;
        let released = self.release(child);
        debug!("Removed {} child of {}: {} nodes released", slot, node, released);
        Ok(())
    }

    pub fn remove_first_child(&mut self, node: NodeId) -> TreeResult<()> {
        self.remove_child(node, Slot::First)
    }

    pub fn remove_second_child(&mut self, node: NodeId) -> TreeResult<()> {
        self.remove_child(node, Slot::Second)
    }

    /// Cuts the child in `slot` loose from `node` without releasing it.
    ///
    /// The returned node is the root of its own tree from now on.
    #[instrument(level = "debug", skip(self))]
    pub fn detach(&mut self, node: NodeId, slot: Slot) -> TreeResult<NodeId> {
        let child = self
            .get_node(node)?
            .child(slot)
            .ok_or(TreeError::NoSuchChild { node, slot })?;
        self.get_node_mut(child)?.parent = None;
        *self.get_node_mut(node)?.child_mut(slot) = None;
        Ok(child)
    }

    /// Grafts the root `child` into the empty `slot` of `parent`.
    #[instrument(level = "debug", skip(self))]
    pub fn attach(&mut self, parent: NodeId, slot: Slot, child: NodeId) -> TreeResult<()> {
        if self.get_node(parent)?.child(slot).is_some() {
            return Err(TreeError::SlotOccupied { node: parent, slot });
        }
        if !self.get_node(child)?.is_root() {
            return Err(TreeError::AlreadyAttached(child));
        }
        // child is a root, so it is an ancestor of parent exactly when it is
        // parent's root
        if self.root_of(parent)? == child {
            return Err(TreeError::WouldCycle { parent, child });
        }
        self.get_node_mut(child)?.parent = Some(parent);
        *self.get_node_mut(parent)?.child_mut(slot) = Some(child);
        Ok(())
    }

    /// Releases `node` and everything below it.
    ///
    /// A non-root node is unlinked from its parent first. Every handle into the
    /// released subtree fails with [`TreeError::UseAfterDestroy`] afterwards.
    #[instrument(level = "debug", skip(self))]
    pub fn destroy(&mut self, node: NodeId) -> TreeResult<()> {
        let parent = self.get_node(node)?.parent;
        if let Some(parent) = parent {
            let owner = self.get_node_mut(parent)?;
            if let Some(slot) = owner.slot_of(node) {
                *owner.child_mut(slot) = None;
            }
        }
        let released = self.release(node);
        debug!("Destroyed {}: {} nodes released", node, released);
        Ok(())
    }

    fn release(&mut self, node: NodeId) -> usize {
        let doomed: Vec<NodeId> = PostOrderIterator::new(self, node)
            .map(|(id, _)| id)
            .collect();
        for id in &doomed {
            self.arena.remove(id.0);
        }
        doomed.len()
    }

    /// Number of levels in the subtree: 1 for a single node.
    #[instrument(level = "trace", skip(self))]
    pub fn height(&self, node: NodeId) -> TreeResult<usize> {
        let mut max_depth = 0;
        let mut stack = vec![(node, 1)];

        while let Some((current, depth)) = stack.pop() {
            let current = self.get_node(current)?;
            max_depth = max_depth.max(depth);
            for child in Slot::BOTH.into_iter().filter_map(|slot| current.child(slot)) {
                stack.push((child, depth + 1));
            }
        }

        Ok(max_depth)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn node_count(&self, node: NodeId) -> TreeResult<usize> {
        Ok(self.iter_preorder(node)?.count())
    }

    #[instrument(level = "trace", skip(self))]
    pub fn leaf_count(&self, node: NodeId) -> TreeResult<usize> {
        Ok(self
            .iter_preorder(node)?
            .filter(|(_, n)| n.is_leaf())
            .count())
    }

    /// True when `node` or any of its descendants holds `value`.
    #[instrument(level = "trace", skip(self))]
    pub fn contains(&self, node: NodeId, value: i32) -> TreeResult<bool> {
        Ok(self.iter_preorder(node)?.any(|(_, n)| n.value == value))
    }

    pub fn iter_preorder(&self, node: NodeId) -> TreeResult<PreOrderIterator<'_>> {
        self.get_node(node)?;
        Ok(PreOrderIterator::new(self, node))
    }

    pub fn iter_postorder(&self, node: NodeId) -> TreeResult<PostOrderIterator<'_>> {
        self.get_node(node)?;
        Ok(PostOrderIterator::new(self, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    //      1
    //     / \
    //    3   4
    //   /
    //  5
    fn sample() -> (TreeArena, NodeId) {
        let mut arena = TreeArena::new();
        let root = arena.create(1);
        let first = arena.set_first_child(root, 3).unwrap();
        arena.set_second_child(root, 4).unwrap();
        arena.set_first_child(first, 5).unwrap();
        (arena, root)
    }

    #[test]
    fn given_sample_tree_when_querying_then_counts_match() {
        let (arena, root) = sample();
        assert_eq!(arena.height(root).unwrap(), 3);
        assert_eq!(arena.node_count(root).unwrap(), 4);
        assert_eq!(arena.leaf_count(root).unwrap(), 2);
        assert!(arena.contains(root, 5).unwrap());
        assert!(!arena.contains(root, 2).unwrap());
    }

    #[test]
    fn given_child_when_destroyed_then_parent_slot_is_cleared() {
        let (mut arena, root) = sample();
        let first = arena.first_child(root).unwrap().unwrap();
        let grandchild = arena.first_child(first).unwrap().unwrap();

        arena.destroy(first).unwrap();

        assert_eq!(arena.first_child(root).unwrap(), None);
        assert_eq!(arena.node_count(root).unwrap(), 2);
        assert_eq!(arena.len(), 2);
        assert!(matches!(
            arena.value(grandchild),
            Err(TreeError::UseAfterDestroy(id)) if id == grandchild
        ));
    }

    #[test]
    fn given_released_slot_when_reused_then_stale_handle_stays_invalid() {
        let mut arena = TreeArena::new();
        let stale = arena.create(1);
        arena.destroy(stale).unwrap();
        let fresh = arena.create(2);

        assert_ne!(stale, fresh);
        assert!(!arena.is_live(stale));
        assert_eq!(arena.value(fresh).unwrap(), 2);
    }

    #[test]
    fn given_slot_when_displayed_then_uses_lowercase_name() {
        assert_eq!(Slot::First.to_string(), "first");
        assert_eq!(Slot::Second.to_string(), "second");
    }
}
