//! Arena-backed binary trees.
//!
//! Nodes hold an `i32` and up to two children in named slots. All nodes live
//! in a [`TreeArena`] and are addressed through [`NodeId`] handles; any node
//! can be queried as the root of its own subtree. Trees persist through the
//! compact pre-order format in [`codec`].

pub mod cli;
pub mod codec;
pub mod config;
pub mod domain;
pub mod errors;
pub mod exitcode;
pub mod tree_traits;
pub mod util;

pub use codec::TreeCodec;
pub use domain::{NodeId, Slot, TreeArena, TreeNode};
pub use errors::{TreeError, TreeResult};
