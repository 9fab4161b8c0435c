use termtree::Tree;
use tracing::instrument;

use crate::domain::{NodeId, Slot, TreeArena};
use crate::errors::TreeResult;

/// Levels shown by [`TreeNodeConvert::to_tree_string`].
pub const DEFAULT_RENDER_DEPTH: usize = 64;

/// Label standing in for everything below the depth cut.
pub const ELIDED: &str = "…";

pub trait TreeNodeConvert {
    /// Renders at most `max_depth` levels; deeper levels collapse into a
    /// single [`ELIDED`] line.
    fn to_tree_string_with_depth(&self, node: NodeId, max_depth: usize)
        -> TreeResult<Tree<String>>;

    fn to_tree_string(&self, node: NodeId) -> TreeResult<Tree<String>> {
        self.to_tree_string_with_depth(node, DEFAULT_RENDER_DEPTH)
    }
}

enum Step {
    Enter { node: NodeId, label: String, depth: usize },
    Leave { label: String, children: usize },
}

fn children_of(arena: &TreeArena, node: NodeId) -> TreeResult<Vec<(Slot, NodeId)>> {
    let node = arena.get_node(node)?;
    Ok(Slot::BOTH
        .into_iter()
        .filter_map(|slot| node.child(slot).map(|child| (slot, child)))
        .collect())
}

fn elided(label: String) -> Tree<String> {
    let mut tree = Tree::new(label);
    tree.push(Tree::new(ELIDED.to_string()));
    tree
}

impl TreeNodeConvert for TreeArena {
    /// Renders the subtree under `node`. Children are labelled with their slot
    /// so a lone second child is not mistaken for a first one.
    ///
    /// Built with an explicit stack; `termtree` formats and drops recursively,
    /// so the depth cap also bounds its recursion.
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string_with_depth(
        &self,
        node: NodeId,
        max_depth: usize,
    ) -> TreeResult<Tree<String>> {
        let max_depth = max_depth.max(1);
        let label = self.value(node)?.to_string();
        let root_children = children_of(self, node)?;
        if max_depth == 1 && !root_children.is_empty() {
            return Ok(elided(label));
        }

        let mut stack: Vec<Step> = Vec::new();
        for &(slot, child) in root_children.iter().rev() {
            stack.push(Step::Enter {
                node: child,
                label: format!("{}: {}", slot, self.value(child)?),
                depth: 2,
            });
        }

        // finished subtrees, in pre-order of their roots
        let mut built: Vec<Tree<String>> = Vec::new();
        while let Some(step) = stack.pop() {
            match step {
                Step::Enter { node, label, depth } => {
                    let children = children_of(self, node)?;
                    if children.is_empty() {
                        built.push(Tree::new(label));
                    } else if depth >= max_depth {
                        built.push(elided(label));
                    } else {
                        stack.push(Step::Leave {
                            label,
                            children: children.len(),
                        });
                        for &(slot, child) in children.iter().rev() {
                            stack.push(Step::Enter {
                                node: child,
                                label: format!("{}: {}", slot, self.value(child)?),
                                depth: depth + 1,
                            });
                        }
                    }
                }
                Step::Leave { label, children } => {
                    let mut tree = Tree::new(label);
                    for child in built.split_off(built.len() - children) {
                        tree.push(child);
                    }
                    built.push(tree);
                }
            }
        }

        let mut tree = Tree::new(label);
        for child in built {
            tree.push(child);
        }
        Ok(tree)
    }
}
