//! Bounded command-name trie.
//!
//! A radix-style tree keyed by the bytes of a command name, used for exact
//! lookup at execution time. Nodes live in a flat pool indexed by small
//! integers rather than a pointer-chasing structure, which keeps memory
//! bounded and makes exhaustion an explicit, testable condition. Node 0 is
//! the root. Fan-out per node is tiny in practice, so child lists are
//! scanned linearly.

use heapless::Vec;

use crate::error::Error;

/// Capacity of the node pool. Raise this if loading a command table reports
/// [`Error::TrieOverflow`].
pub const MAX_NODES: usize = 128;

/// Fixed child slots per node.
pub const MAX_CHILDREN: usize = 16;

#[derive(Debug)]
struct Node {
    /// (key byte, child node index) pairs, unsorted.
    children: Vec<(u8, u16), MAX_CHILDREN>,
    /// Index into the caller's command table, if this node terminates a name.
    command: Option<u16>,
}

impl Node {
    fn new() -> Self {
        Self {
            children: Vec::new(),
            command: None,
        }
    }
}

/// Pool-allocated trie mapping command names to command-table indices.
///
/// Built once when a table is loaded and read-only afterwards except for a
/// full rebuild. Insertion failure (pool or child-list exhaustion) sets a
/// sticky overflow flag; the caller must raise [`MAX_NODES`] rather than
/// retry.
#[derive(Debug)]
pub struct CommandTrie {
    nodes: Vec<Node, MAX_NODES>,
    high_water: usize,
    overflow: bool,
}

impl CommandTrie {
    /// Create a trie holding only the root node.
    pub fn new() -> Self {
        let mut nodes = Vec::new();
        let _ = nodes.push(Node::new());
        Self {
            nodes,
            high_water: 1,
            overflow: false,
        }
    }

    /// Drop every entry and reset to the freshly-initialized state,
    /// including the overflow flag and high-water mark.
    pub fn clear(&mut self) {
        self.nodes.clear();
        let _ = self.nodes.push(Node::new());
        self.high_water = 1;
        self.overflow = false;
    }

    /// Insert `name`, recording `index` at its terminal node.
    ///
    /// Cost is O(name length). Fails with [`Error::TrieOverflow`] (and sets
    /// the sticky overflow flag) when the node pool or a child list is
    /// exhausted.
    pub fn insert(&mut self, name: &str, index: u16) -> Result<(), Error> {
        let mut current = 0usize;
        for &byte in name.as_bytes() {
            current = match self.find_child(current, byte) {
                Some(child) => child,
                None => self.add_child(current, byte)?,
            };
        }
        self.nodes[current].command = Some(index);
        Ok(())
    }

    /// Walk `name` byte-by-byte; a missing child at any step is a miss.
    ///
    /// A strict prefix of a longer name that is not itself a command also
    /// misses, because only terminal nodes carry a command index.
    pub fn lookup(&self, name: &str) -> Option<usize> {
        let mut current = 0usize;
        for &byte in name.as_bytes() {
            current = self.find_child(current, byte)?;
        }
        self.nodes[current].command.map(usize::from)
    }

    /// Peak number of pool nodes used since the last [`clear`](Self::clear).
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    /// `true` once any insertion has failed for lack of capacity.
    pub fn overflowed(&self) -> bool {
        self.overflow
    }

    fn find_child(&self, node: usize, byte: u8) -> Option<usize> {
        self.nodes[node]
            .children
            .iter()
            .find(|&&(key, _)| key == byte)
            .map(|&(_, child)| usize::from(child))
    }

    fn add_child(&mut self, node: usize, byte: u8) -> Result<usize, Error> {
        if self.nodes.is_full() || self.nodes[node].children.is_full() {
            self.overflow = true;
            return Err(Error::TrieOverflow);
        }
        let child = self.nodes.len();
        let _ = self.nodes.push(Node::new());
        if self.nodes.len() > self.high_water {
            self.high_water = self.nodes.len();
        }
        let _ = self.nodes[node].children.push((byte, child as u16));
        Ok(child)
    }
}

impl Default for CommandTrie {
    fn default() -> Self {
        Self::new()
    }
}
