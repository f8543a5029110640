//! Corpus records: one JSON object per line.
//!
//! A record must carry string fields `text_in_img` (rendered on the page) and
//! `text_in_output` (ground truth for the dataset). Any other fields are kept
//! verbatim in `extra`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{Result, SynthError};
use crate::reader::BlockCachedTextReader;

/// A parsed corpus line. Both required fields are validated at parse time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub text_in_img: String,
    pub text_in_output: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    /// Parses a single (already trimmed or untrimmed) JSON line.
    pub fn from_json_str(line: &str) -> Result<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Err(SynthError::malformed(line, "empty line"));
        }
        serde_json::from_str::<Record>(trimmed)
            .map_err(|e| SynthError::malformed(trimmed, e.to_string()))
    }
}

/// Reads one line from the reader's cursor and parses it as a `Record`.
///
/// The cursor ends just past the line terminator, or at index 0 when the line was
/// the final, unterminated line of the corpus.
pub fn parse_line(reader: &mut BlockCachedTextReader) -> Result<Record> {
    let line = reader.read_line()?;
    Record::from_json_str(&line.text)
}
