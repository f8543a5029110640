// Corpus access: block-indexed UTF-8 reader with an LRU block cache.

mod block_cache;
pub mod text_reader;

pub use text_reader::{BlockCachedTextReader, ScannedLine};
