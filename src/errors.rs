use thiserror::Error;

use crate::domain::{NodeId, Slot};

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("{slot} child of node {node} already exists")]
    SlotOccupied { node: NodeId, slot: Slot },

    #[error("node {node} has no {slot} child")]
    NoSuchChild { node: NodeId, slot: Slot },

    #[error("cannot change the value of root node {0}")]
    ImmutableRoot(NodeId),

    #[error("node {0} has been destroyed")]
    UseAfterDestroy(NodeId),

    #[error("node {0} already has a parent")]
    AlreadyAttached(NodeId),

    #[error("attaching node {child} under node {parent} would create a cycle")]
    WouldCycle { parent: NodeId, child: NodeId },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt tree data at byte {offset}: {reason}")]
    CorruptData { offset: u64, reason: String },
}

impl TreeError {
    pub(crate) fn corrupt(offset: u64, reason: impl Into<String>) -> Self {
        Self::CorruptData {
            offset,
            reason: reason.into(),
        }
    }
}

pub type TreeResult<T> = Result<T, TreeError>;
