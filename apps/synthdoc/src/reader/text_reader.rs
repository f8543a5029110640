//! Random-access character reader over a large UTF-8 corpus.
//!
//! The corpus is indexed once at open time into fixed-size blocks of
//! `block_size` characters. Only the byte offset of each block start is kept;
//! block contents are decoded on demand and held in a bounded LRU cache.
//!
//! # Cursor contract
//! The reader owns a single character cursor. `advance` and `retreat` wrap
//! modulo the corpus length without signalling it, so callers that need
//! "end of corpus" must use `read_line`, which reports whether the line was
//! closed by a terminator or by wrapping back to index 0.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use rand::{Rng, RngCore};
use tracing::info;

use crate::config::ReaderConfig;
use crate::errors::{Result, SynthError};
use crate::reader::block_cache::{Block, BlockCache};

/// Bytes read per step while scanning backward for a line start.
const SCAN_CHUNK: usize = 256;

/// One line consumed from the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedLine {
    pub text: String,
    /// False when the line ran into the end of the corpus without `\r`/`\n`.
    pub terminated: bool,
}

pub struct BlockCachedTextReader {
    path: PathBuf,
    file: File,
    file_len: u64,
    length: usize,
    block_size: usize,
    /// `offsets[i]` is the byte offset of the first character of block `i`.
    offsets: Vec<u64>,
    cache: BlockCache,
    cursor: usize,
}

impl BlockCachedTextReader {
    /// Opens and indexes the corpus at `path`.
    ///
    /// The whole file is streamed once to count characters and record block offsets.
    /// At most `max(1, cache_size / block_size)` blocks are held in memory afterwards.
    pub fn open(path: impl AsRef<Path>, cache_size: usize, block_size: usize) -> Result<Self> {
        let path = path.as_ref();
        if block_size == 0 {
            return Err(SynthError::InvalidConfig(
                "block_size must be greater than 0".to_string(),
            ));
        }

        let file = File::open(path).map_err(|e| SynthError::io(path, e))?;
        let (length, offsets, file_len) =
            index_blocks(&file, block_size).map_err(|e| SynthError::io(path, e))?;
        if length == 0 {
            return Err(SynthError::EmptyCorpus(path.to_path_buf()));
        }

        let cache = BlockCache::new(cache_size / block_size);
        info!(
            path = %path.display(),
            chars = length,
            blocks = offsets.len(),
            bucket_capacity = cache.capacity(),
            "corpus indexed"
        );

        Ok(Self {
            path: path.to_path_buf(),
            file,
            file_len,
            length,
            block_size,
            offsets,
            cache,
            cursor: 0,
        })
    }

    pub fn from_config(config: &ReaderConfig) -> Result<Self> {
        Self::open(&config.path, config.cache_size, config.block_size)
    }

    /// Total number of characters in the corpus.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Always false: empty corpora are rejected by `open`.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Moves the cursor to `index`, wrapped into the corpus.
    pub fn seek(&mut self, index: usize) {
        self.cursor = index % self.length;
    }

    pub fn advance(&mut self) {
        self.cursor = (self.cursor + 1) % self.length;
    }

    pub fn retreat(&mut self) {
        self.cursor = (self.cursor + self.length - 1) % self.length;
    }

    /// Returns the character under the cursor without moving it.
    pub fn get(&mut self) -> Result<char> {
        let key = self.cursor / self.block_size;
        let within = self.cursor % self.block_size;
        let ch = self.block(key)?.char_at(within);
        ch.ok_or_else(|| self.short_block(key))
    }

    /// Moves the cursor to the start of the line containing a uniformly random character.
    ///
    /// The backward scan reads the file directly rather than through the block cache,
    /// so it costs O(line length) bytes of I/O.
    pub fn seek_random_line_start(&mut self, rng: &mut dyn RngCore) -> Result<()> {
        let target = rng.random_range(0..self.length);
        let byte_pos = self.byte_offset_of(target)?;
        let back = scan_back_to_line_start(&self.file, byte_pos)
            .map_err(|e| SynthError::io(self.path.clone(), e))?;
        self.cursor = target - back;
        Ok(())
    }

    /// Consumes characters up to and including the next line terminator.
    ///
    /// `\r\n` is consumed as a single terminator. Reaching the end of the corpus also
    /// ends the line (with `terminated = false`), leaving the cursor at index 0.
    pub fn read_line(&mut self) -> Result<ScannedLine> {
        let mut text = String::new();
        loop {
            let ch = self.get()?;
            self.advance();
            if ch == '\r' || ch == '\n' {
                if ch == '\r' && self.cursor != 0 && self.get()? == '\n' {
                    self.advance();
                }
                return Ok(ScannedLine {
                    text,
                    terminated: true,
                });
            }
            text.push(ch);
            if self.cursor == 0 {
                return Ok(ScannedLine {
                    text,
                    terminated: false,
                });
            }
        }
    }

    pub fn bucket_capacity(&self) -> usize {
        self.cache.capacity()
    }

    pub fn cached_blocks(&self) -> usize {
        self.cache.len()
    }

    pub(crate) fn is_block_cached(&self, key: usize) -> bool {
        self.cache.contains(key)
    }

    fn block(&mut self, key: usize) -> Result<&Block> {
        let start = self.offsets[key];
        let end = self.offsets.get(key + 1).copied().unwrap_or(self.file_len);
        let file = &self.file;
        let path = &self.path;
        self.cache.get_or_load(key, || {
            load_block(file, start, end).map_err(|e| SynthError::io(path.clone(), e))
        })
    }

    fn byte_offset_of(&mut self, index: usize) -> Result<u64> {
        let key = index / self.block_size;
        let within = index % self.block_size;
        let start = self.offsets[key];
        let prefix = self.block(key)?.byte_offset(within);
        let prefix = prefix.ok_or_else(|| self.short_block(key))?;
        Ok(start + prefix as u64)
    }

    fn short_block(&self, key: usize) -> SynthError {
        SynthError::io(
            self.path.clone(),
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("block {key} is shorter than expected; was the corpus modified?"),
            ),
        )
    }
}

impl Iterator for BlockCachedTextReader {
    type Item = Result<char>;

    /// Never returns `None`; the cursor wraps at the end of the corpus.
    fn next(&mut self) -> Option<Self::Item> {
        let ch = self.get();
        self.advance();
        Some(ch)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// File helpers
// ────────────────────────────────────────────────────────────────────────────

/// Streams the file once. Returns `(char_count, block_offsets, byte_len)`.
fn index_blocks(file: &File, block_size: usize) -> io::Result<(usize, Vec<u64>, u64)> {
    let mut reader = BufReader::new(file);
    reader.seek(SeekFrom::Start(0))?;

    let mut length = 0usize;
    let mut offsets = Vec::new();
    let mut byte_pos = 0u64;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf)?;
        if n == 0 {
            break;
        }
        let line = std::str::from_utf8(&buf)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        for (i, _) in line.char_indices() {
            if length % block_size == 0 {
                offsets.push(byte_pos + i as u64);
            }
            length += 1;
        }
        byte_pos += n as u64;
    }

    Ok((length, offsets, byte_pos))
}

fn load_block(mut file: &File, start: u64, end: u64) -> io::Result<Block> {
    let mut bytes = vec![0u8; (end - start) as usize];
    file.seek(SeekFrom::Start(start))?;
    file.read_exact(&mut bytes)?;
    let text = String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(Block::new(text))
}

/// Scans backward from `byte_pos` to the byte after the previous `\n` (or 0).
/// Returns the number of characters skipped.
fn scan_back_to_line_start(mut file: &File, byte_pos: u64) -> io::Result<usize> {
    let mut buf = [0u8; SCAN_CHUNK];
    let mut pos = byte_pos;
    let mut chars = 0usize;

    while pos > 0 {
        let start = pos.saturating_sub(SCAN_CHUNK as u64);
        let len = (pos - start) as usize;
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(&mut buf[..len])?;
        for &b in buf[..len].iter().rev() {
            if b == b'\n' {
                return Ok(chars);
            }
            // UTF-8 continuation bytes (10xxxxxx) do not start a character.
            if b & 0xC0 != 0x80 {
                chars += 1;
            }
        }
        pos = start;
    }
    Ok(chars)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
