//! Least-recently-used cache of decoded corpus blocks.
//!
//! Every access stamps the entry with a fresh epoch; when the cache is full the
//! entry with the oldest epoch is evicted before a new block is inserted.

use std::collections::HashMap;

use tracing::trace;

/// Characters between two entries of a block's offset index.
const INDEX_STRIDE: usize = 64;

/// One decoded block, kept as UTF-8.
///
/// Pure-ASCII blocks are indexed directly. Otherwise `index[i]` is the byte offset of
/// character `i * INDEX_STRIDE`, so a lookup walks at most `INDEX_STRIDE - 1` characters.
pub(crate) struct Block {
    text: String,
    index: Vec<usize>,
    chars: usize,
}

impl Block {
    pub(crate) fn new(text: String) -> Self {
        if text.is_ascii() {
            let chars = text.len();
            return Self {
                text,
                index: Vec::new(),
                chars,
            };
        }
        let mut index = Vec::new();
        let mut chars = 0;
        for (i, (byte, _)) in text.char_indices().enumerate() {
            if i % INDEX_STRIDE == 0 {
                index.push(byte);
            }
            chars = i + 1;
        }
        Self { text, index, chars }
    }

    pub(crate) fn len(&self) -> usize {
        self.chars
    }

    /// Byte offset of character `i`; `i == len()` maps to the end of the text.
    pub(crate) fn byte_offset(&self, i: usize) -> Option<usize> {
        if i > self.chars {
            return None;
        }
        if i == self.chars {
            return Some(self.text.len());
        }
        if self.index.is_empty() {
            return Some(i);
        }
        let start = self.index[i / INDEX_STRIDE];
        let skip = i % INDEX_STRIDE;
        self.text[start..]
            .char_indices()
            .nth(skip)
            .map(|(byte, _)| start + byte)
    }

    pub(crate) fn char_at(&self, i: usize) -> Option<char> {
        let byte = self.byte_offset(i)?;
        self.text[byte..].chars().next()
    }
}

struct Entry {
    epoch: u64,
    block: Block,
}

pub(crate) struct BlockCache {
    entries: HashMap<usize, Entry>,
    epoch: u64,
    capacity: usize,
}

impl BlockCache {
    /// `capacity` is clamped to at least one block.
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: HashMap::new(),
            epoch: 0,
            capacity,
        }
    }

    /// Returns the block stored under `key`, loading it with `load` on a miss.
    ///
    /// The returned block is always the most recently used one afterwards.
    pub(crate) fn get_or_load<E>(
        &mut self,
        key: usize,
        load: impl FnOnce() -> Result<Block, E>,
    ) -> Result<&Block, E> {
        self.epoch += 1;
        let epoch = self.epoch;

        let loaded = if self.entries.contains_key(&key) {
            None
        } else {
            let block = load()?;
            if self.entries.len() >= self.capacity {
                self.evict_oldest();
            }
            trace!(block = key, chars = block.len(), bytes = block.text.len(), "block loaded");
            Some(block)
        };

        let entry = self.entries.entry(key).or_insert_with(|| Entry {
            epoch,
            block: loaded.unwrap_or_else(|| Block::new(String::new())),
        });
        entry.epoch = epoch;
        Ok(&entry.block)
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.epoch)
            .map(|(key, _)| *key);
        if let Some(key) = oldest {
            trace!(block = key, "block evicted");
            self.entries.remove(&key);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn contains(&self, key: usize) -> bool {
        self.entries.contains_key(&key)
    }
}
