//! Binary persistence for trees.
//!
//! A tree is stored as the pre-order sequence of its nodes, five bytes each:
//! the value as a little-endian `i32`, then a flag byte whose bit 0 marks a
//! first child and bit 1 a second child. A node's first subtree follows it
//! immediately, then its second subtree. There is no header, version or length
//! prefix, so a stream must be consumed exactly: running short or leaving
//! bytes behind is corrupt data.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use crate::config::CodecSettings;
use crate::domain::{NodeId, Slot, TreeArena};
use crate::errors::{TreeError, TreeResult};

pub const VALUE_WIDTH: usize = 4;
pub const RECORD_WIDTH: usize = VALUE_WIDTH + 1;

const HAS_FIRST: u8 = 0b01;
const HAS_SECOND: u8 = 0b10;

fn slot_bit(slot: Slot) -> u8 {
    match slot {
        Slot::First => HAS_FIRST,
        Slot::Second => HAS_SECOND,
    }
}

/// One decoded node, before it is placed in an arena.
#[derive(Debug, Clone, Copy)]
struct Record {
    value: i32,
    flags: u8,
}

impl Record {
    fn has(&self, slot: Slot) -> bool {
        self.flags & slot_bit(slot) != 0
    }

    fn child_count(&self) -> usize {
        Slot::BOTH.into_iter().filter(|&slot| self.has(slot)).count()
    }
}

/// Encoder/decoder for the tree file format.
///
/// The default codec accepts streams of any size; `max_nodes` bounds how many
/// nodes a single load may describe.
#[derive(Debug, Clone, Default)]
pub struct TreeCodec {
    max_nodes: Option<usize>,
}

impl TreeCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = Some(max_nodes);
        self
    }

    pub fn from_settings(settings: &CodecSettings) -> Self {
        Self {
            max_nodes: settings.max_nodes,
        }
    }

    pub fn max_nodes(&self) -> Option<usize> {
        self.max_nodes
    }

    /// Writes the subtree rooted at `node` to `sink` and flushes it.
    #[instrument(level = "debug", skip(self, arena, sink))]
    pub fn save<W: Write>(&self, arena: &TreeArena, node: NodeId, mut sink: W) -> TreeResult<()> {
        let mut written = 0usize;
        for (_, current) in arena.iter_preorder(node)? {
            let flags = Slot::BOTH
                .into_iter()
                .filter(|&slot| current.child(slot).is_some())
                .fold(0, |acc, slot| acc | slot_bit(slot));
            sink.write_all(&current.value().to_le_bytes())?;
            sink.write_all(&[flags])?;
            written += 1;
        }
        sink.flush()?;
        debug!("Saved {} nodes ({} bytes)", written, written * RECORD_WIDTH);
        Ok(())
    }

    pub fn encode(&self, arena: &TreeArena, node: NodeId) -> TreeResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(arena.node_count(node)? * RECORD_WIDTH);
        self.save(arena, node, &mut buf)?;
        Ok(buf)
    }

    /// Rebuilds a tree from `source` as a new root in `arena`.
    ///
    /// The whole stream is read and validated before the first node is
    /// allocated: on error the arena is left untouched.
    #[instrument(level = "debug", skip(self, arena, source))]
    pub fn load<R: Read>(&self, arena: &mut TreeArena, source: R) -> TreeResult<NodeId> {
        let records = self.read_records(source)?;
        let root = materialize(arena, &records)?;
        debug!(
            "Loaded {} nodes ({} bytes) as {}",
            records.len(),
            records.len() * RECORD_WIDTH,
            root
        );
        Ok(root)
    }

    pub fn decode(&self, arena: &mut TreeArena, bytes: &[u8]) -> TreeResult<NodeId> {
        self.load(arena, bytes)
    }

    /// Saves into a temporary file next to `path` and renames it into place,
    /// so `path` never holds a partially written tree.
    #[instrument(level = "debug", skip(self, arena))]
    pub fn save_file(&self, arena: &TreeArena, node: NodeId, path: &Path) -> TreeResult<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(dir)?;
        self.save(arena, node, BufWriter::new(staged.as_file_mut()))?;
        staged.as_file().sync_all()?;
        staged.persist(path).map_err(|e| TreeError::Io(e.error))?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self, arena))]
    pub fn load_file(&self, arena: &mut TreeArena, path: &Path) -> TreeResult<NodeId> {
        let file = File::open(path)?;
        self.load(arena, BufReader::new(file))
    }

    fn read_records<R: Read>(&self, mut source: R) -> TreeResult<Vec<Record>> {
        let mut records = Vec::new();
        let mut offset: u64 = 0;
        // nodes announced by flag bits but not read yet, the root included
        let mut pending: usize = 1;

        while pending > 0 {
            if let Some(max) = self.max_nodes {
                if records.len() >= max {
                    return Err(TreeError::corrupt(
                        offset,
                        format!("tree has more than {} nodes", max),
                    ));
                }
            }
            let record = read_record(&mut source, offset)?;
            offset += RECORD_WIDTH as u64;
            pending = pending - 1 + record.child_count();
            records.push(record);
        }

        expect_end(&mut source, offset)?;
        Ok(records)
    }
}

fn read_record<R: Read>(source: &mut R, offset: u64) -> TreeResult<Record> {
    let mut value = [0u8; VALUE_WIDTH];
    read_field(source, &mut value, offset, "value field")?;
    let mut flags = [0u8; 1];
    read_field(source, &mut flags, offset + VALUE_WIDTH as u64, "flag byte")?;
    Ok(Record {
        value: i32::from_le_bytes(value),
        // upper bits are reserved
        flags: flags[0] & (HAS_FIRST | HAS_SECOND),
    })
}

fn read_field<R: Read>(source: &mut R, buf: &mut [u8], offset: u64, field: &str) -> TreeResult<()> {
    source.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => TreeError::corrupt(offset, format!("stream ended inside {}", field)),
        _ => TreeError::Io(e),
    })
}

fn expect_end<R: Read>(source: &mut R, offset: u64) -> TreeResult<()> {
    let mut probe = [0u8; 1];
    loop {
        match source.read(&mut probe) {
            Ok(0) => return Ok(()),
            Ok(_) => return Err(TreeError::corrupt(offset, "trailing bytes after root subtree")),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(TreeError::Io(e)),
        }
    }
}

/// Places validated pre-order records into `arena`, returning the new root.
fn materialize(arena: &mut TreeArena, records: &[Record]) -> TreeResult<NodeId> {
    let (head, rest) = records
        .split_first()
        .ok_or_else(|| TreeError::corrupt(0, "empty stream"))?;
    let root = arena.create(head.value);
    // slots still waiting for a subtree; the top is the next one in pre-order
    let mut open_slots = Vec::new();
    push_open_slots(&mut open_slots, root, head);

    // read_records left exactly one open slot for every remaining record
    for record in rest {
        let Some((parent, slot)) = open_slots.pop() else {
            break;
        };
        let child = arena.create_child(parent, slot, record.value)?;
        push_open_slots(&mut open_slots, child, record);
    }

    Ok(root)
}

fn push_open_slots(open_slots: &mut Vec<(NodeId, Slot)>, node: NodeId, record: &Record) {
    for slot in Slot::BOTH.into_iter().rev() {
        if record.has(slot) {
            open_slots.push((node, slot));
        }
    }
}

pub fn save<W: Write>(arena: &TreeArena, node: NodeId, sink: W) -> TreeResult<()> {
    TreeCodec::default().save(arena, node, sink)
}

pub fn load<R: Read>(arena: &mut TreeArena, source: R) -> TreeResult<NodeId> {
    TreeCodec::default().load(arena, source)
}

pub fn encode(arena: &TreeArena, node: NodeId) -> TreeResult<Vec<u8>> {
    TreeCodec::default().encode(arena, node)
}

pub fn decode(arena: &mut TreeArena, bytes: &[u8]) -> TreeResult<NodeId> {
    TreeCodec::default().decode(arena, bytes)
}

pub fn save_file(arena: &TreeArena, node: NodeId, path: &Path) -> TreeResult<()> {
    TreeCodec::default().save_file(arena, node, path)
}

pub fn load_file(arena: &mut TreeArena, path: &Path) -> TreeResult<NodeId> {
    TreeCodec::default().load_file(arena, path)
}
