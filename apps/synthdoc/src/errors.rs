use std::path::PathBuf;

use thiserror::Error;

/// Crate-level error type.
///
/// Fitter rejections are not errors; they are reported through
/// `layout::fitter::FitOutcome::Rejected`.
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("I/O error on corpus {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corpus {0} contains no text")]
    EmptyCorpus(PathBuf),

    #[error("Malformed record: {reason} (line: {line:?})")]
    MalformedRecord { line: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SynthError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SynthError::Io {
            path: path.into(),
            source,
        }
    }

    /// Builds a `MalformedRecord`, keeping at most `MAX_SNIPPET_CHARS` of the offending line.
    pub(crate) fn malformed(line: &str, reason: impl Into<String>) -> Self {
        const MAX_SNIPPET_CHARS: usize = 120;
        let line = if line.chars().count() > MAX_SNIPPET_CHARS {
            let mut snippet: String = line.chars().take(MAX_SNIPPET_CHARS).collect();
            snippet.push('…');
            snippet
        } else {
            line.to_string()
        };
        SynthError::MalformedRecord {
            line,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SynthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_keeps_short_line_intact() {
        let err = SynthError::malformed("{\"a\":1}", "missing field");
        match err {
            SynthError::MalformedRecord { line, reason } => {
                assert_eq!(line, "{\"a\":1}");
                assert_eq!(reason, "missing field");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_truncates_long_line() {
        let long = "x".repeat(500);
        let err = SynthError::malformed(&long, "bad");
        let SynthError::MalformedRecord { line, .. } = err else {
            panic!("expected MalformedRecord");
        };
        assert_eq!(line.chars().count(), 121);
        assert!(line.ends_with('…'));
    }

    #[test]
    fn test_io_error_display_names_path() {
        let err = SynthError::io(
            "/no/such/corpus.jsonl",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/no/such/corpus.jsonl"), "got: {msg}");
    }
}
