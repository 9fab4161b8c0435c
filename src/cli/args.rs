//! CLI argument definitions using clap

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand, ValueEnum, ValueHint};

use crate::domain::{NodeId, Slot, TreeArena};
use crate::errors::{TreeError, TreeResult};

/// Build, inspect and edit binary tree files
#[derive(Parser, Debug)]
#[command(name = "bintree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity on stderr: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Additional config file (overrides the global one)
    #[arg(short = 'c', long = "config", global = true, value_hint = ValueHint::FilePath)]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a tree consisting of a single root node
    New {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(allow_negative_numbers = true)]
        value: i32,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Create a child under the node at PATH
    Add {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Node path from the root: digits 1 (first) and 2 (second), "." for the root
        path: NodePath,
        #[arg(value_enum)]
        slot: SlotArg,
        #[arg(allow_negative_numbers = true)]
        value: i32,
    },

    /// Remove a child subtree of the node at PATH
    Remove {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Node path from the root: digits 1 (first) and 2 (second), "." for the root
        path: NodePath,
        #[arg(value_enum)]
        slot: SlotArg,
    },

    /// Change the value of a non-root node
    Set {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Node path from the root: digits 1 (first) and 2 (second)
        path: NodePath,
        #[arg(allow_negative_numbers = true)]
        value: i32,
    },

    /// Show value, height, node count and leaf count
    Info {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Node path from the root (default: the root)
        #[arg(default_value = ".")]
        path: NodePath,
    },

    /// Check whether a value occurs anywhere in the tree (exit 1 if not)
    Contains {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(allow_negative_numbers = true)]
        value: i32,
    },

    /// Print the tree
    Tree {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Print config template
    Template,

    /// Show config paths
    Path,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotArg {
    First,
    Second,
}

impl From<SlotArg> for Slot {
    fn from(arg: SlotArg) -> Self {
        match arg {
            SlotArg::First => Slot::First,
            SlotArg::Second => Slot::Second,
        }
    }
}

/// Sequence of slots leading from a root to one of its descendants.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodePath(Vec<Slot>);

impl NodePath {
    pub fn slots(&self) -> &[Slot] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Walks from `root` along the path.
    pub fn resolve(&self, arena: &TreeArena, root: NodeId) -> TreeResult<NodeId> {
        self.0.iter().try_fold(root, |node, &slot| {
            arena
                .child(node, slot)?
                .ok_or(TreeError::NoSuchChild { node, slot })
        })
    }
}

impl FromStr for NodePath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "." {
            return Ok(Self::default());
        }
        s.chars()
            .map(|c| match c {
                '1' => Ok(Slot::First),
                '2' => Ok(Slot::Second),
                other => Err(format!(
                    "invalid path step '{}': use 1 (first) or 2 (second)",
                    other
                )),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(NodePath)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, ".");
        }
        for slot in &self.0 {
            match slot {
                Slot::First => write!(f, "1")?,
                Slot::Second => write!(f, "2")?,
            }
        }
        Ok(())
    }
}
