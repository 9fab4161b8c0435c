//! Command dispatch: each subcommand loads a tree file, runs one operation and
//! writes the file back when the tree changed.

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands, NodePath, SlotArg};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::codec::TreeCodec;
use crate::config::{global_config_path, Settings};
use crate::domain::{NodeId, Slot, TreeArena};
use crate::exitcode;
use crate::tree_traits::TreeNodeConvert;

/// Runs the selected subcommand and returns the process exit code.
pub fn execute_command(cli: &Cli, settings: &Settings) -> CliResult<i32> {
    let codec = TreeCodec::from_settings(&settings.codec);
    match &cli.command {
        Commands::New { file, value, force } => _new(&codec, file, *value, *force),
        Commands::Add {
            file,
            path,
            slot,
            value,
        } => _add(&codec, file, path, *slot, *value),
        Commands::Remove { file, path, slot } => _remove(&codec, file, path, *slot),
        Commands::Set { file, path, value } => _set(&codec, file, path, *value),
        Commands::Info { file, path } => _info(&codec, file, path),
        Commands::Contains { file, value } => _contains(&codec, file, *value),
        Commands::Tree { file } => _tree(&codec, file, settings.render.max_depth),
        Commands::Config { command } => _config(command, settings),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(exitcode::OK)
        }
    }
}

fn open(codec: &TreeCodec, file: &Path) -> CliResult<(TreeArena, NodeId)> {
    let mut arena = TreeArena::new();
    let root = codec.load_file(&mut arena, file)?;
    debug!("Opened {} ({} nodes)", file.display(), arena.len());
    Ok((arena, root))
}

#[instrument(skip(codec))]
fn _new(codec: &TreeCodec, file: &Path, value: i32, force: bool) -> CliResult<i32> {
    if file.exists() && !force {
        return Err(CliError::Usage(format!(
            "{} already exists (use --force to overwrite)",
            file.display()
        )));
    }
    let mut arena = TreeArena::new();
    let root = arena.create(value);
    codec.save_file(&arena, root, file)?;
    output::success(&format!("Created {} with root {}", file.display(), value));
    Ok(exitcode::OK)
}

#[instrument(skip(codec))]
fn _add(codec: &TreeCodec, file: &Path, path: &NodePath, slot: SlotArg, value: i32) -> CliResult<i32> {
    let (mut arena, root) = open(codec, file)?;
    let node = path.resolve(&arena, root)?;
    let slot = Slot::from(slot);
    arena.create_child(node, slot, value)?;
    codec.save_file(&arena, root, file)?;
    output::success(&format!("Added {} child {} under {}", slot, value, path));
    Ok(exitcode::OK)
}

#[instrument(skip(codec))]
fn _remove(codec: &TreeCodec, file: &Path, path: &NodePath, slot: SlotArg) -> CliResult<i32> {
    let (mut arena, root) = open(codec, file)?;
    let node = path.resolve(&arena, root)?;
    let slot = Slot::from(slot);
    let before = arena.node_count(root)?;
    arena.remove_child(node, slot)?;
    codec.save_file(&arena, root, file)?;
    output::success(&format!(
        "Removed {} child of {} ({} nodes)",
        slot,
        path,
        before - arena.node_count(root)?
    ));
    Ok(exitcode::OK)
}

#[instrument(skip(codec))]
fn _set(codec: &TreeCodec, file: &Path, path: &NodePath, value: i32) -> CliResult<i32> {
    let (mut arena, root) = open(codec, file)?;
    let node = path.resolve(&arena, root)?;
    arena.set_value(node, value)?;
    codec.save_file(&arena, root, file)?;
    output::success(&format!("Set {} to {}", path, value));
    Ok(exitcode::OK)
}

#[instrument(skip(codec))]
fn _info(codec: &TreeCodec, file: &Path, path: &NodePath) -> CliResult<i32> {
    let (arena, root) = open(codec, file)?;
    let node = path.resolve(&arena, root)?;
    output::header(&format!("{} [{}]", file.display(), path));
    output::field("value", &arena.value(node)?);
    output::field("height", &arena.height(node)?);
    output::field("nodes", &arena.node_count(node)?);
    output::field("leaves", &arena.leaf_count(node)?);
    Ok(exitcode::OK)
}

#[instrument(skip(codec))]
fn _contains(codec: &TreeCodec, file: &Path, value: i32) -> CliResult<i32> {
    let (arena, root) = open(codec, file)?;
    if arena.contains(root, value)? {
        output::success(&format!("{} is in the tree", value));
        Ok(exitcode::OK)
    } else {
        output::failure(&format!("{} is not in the tree", value));
        Ok(exitcode::NOT_FOUND)
    }
}

#[instrument(skip(codec))]
fn _tree(codec: &TreeCodec, file: &Path, max_depth: usize) -> CliResult<i32> {
    let (arena, root) = open(codec, file)?;
    output::info(&arena.to_tree_string_with_depth(root, max_depth)?);
    Ok(exitcode::OK)
}

fn _config(command: &ConfigCommands, settings: &Settings) -> CliResult<i32> {
    match command {
        ConfigCommands::Show => output::info(&settings.to_toml()?),
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => match global_config_path() {
            Some(path) => output::field("global", &path.display()),
            None => output::field("global", "(no config directory on this platform)"),
        },
    }
    Ok(exitcode::OK)
}
