//! Synthetic document text layout.
//!
//! Samples JSON-lines records from a large corpus, fits their display text into
//! placement boxes one glyph at a time, and hands the resulting layers to an
//! external rendering pipeline through the traits in [`render`].

pub mod config;
pub mod document;
pub mod errors;
pub mod layout;
pub mod reader;
pub mod record;
pub mod render;
pub mod sampling;

pub use config::Config;
pub use document::{Document, DocumentGenerator};
pub use errors::{Result, SynthError};
pub use layout::{ContentOutput, LayoutDriver};
pub use reader::BlockCachedTextReader;
pub use record::{parse_line, Record};
