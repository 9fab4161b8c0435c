//! Domain layer: tree storage and structural algorithms
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod traversal;

pub use arena::{NodeId, Slot, TreeArena, TreeNode};
pub use traversal::{PostOrderIterator, PreOrderIterator};
