//! Centralized error types for emltree.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the emltree library.
#[derive(Error, Debug)]
pub enum EmlError {
    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified file does not exist.
    #[error("message file not found: {0}")]
    FileNotFound(PathBuf),

    /// Malformed header block, Content-Type value or multipart framing.
    #[error("format error: {0}")]
    Format(String),

    /// A header the decoder cannot do without is absent.
    #[error("missing required header: {0}")]
    MissingHeader(String),

    /// A media type lacks a parameter it requires (`boundary` for multipart).
    #[error("'{media_type}' is missing the '{parameter}' parameter")]
    MissingParameter {
        media_type: String,
        parameter: String,
    },

    /// The body payload is not valid for its Content-Transfer-Encoding.
    #[error("failed to decode {encoding} body: {reason}")]
    Encoding { encoding: String, reason: String },

    /// An encoded word inside a header value has a malformed payload.
    #[error("failed to decode header {field}: {value}: {reason}")]
    HeaderDecode {
        field: String,
        value: String,
        reason: String,
    },

    /// A multipart child failed; `index` is its position among the parent's parts.
    #[error("failed to parse multipart part {index}: {source}")]
    PartParse {
        index: usize,
        source: Box<EmlError>,
    },

    /// MIME nesting went deeper than the configured limit.
    #[error("MIME nesting exceeds the maximum depth of {limit}")]
    DepthExceeded { limit: usize },
}

/// Convenience alias for `Result<T, EmlError>`.
pub type Result<T> = std::result::Result<T, EmlError>;

impl EmlError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a child failure with its index in the parent's part list.
    pub fn in_part(index: usize, source: EmlError) -> Self {
        Self::PartParse {
            index,
            source: Box::new(source),
        }
    }

    /// The innermost error, with every `PartParse` layer peeled off.
    pub fn root_cause(&self) -> &EmlError {
        let mut err = self;
        while let EmlError::PartParse { source, .. } = err {
            err = source;
        }
        err
    }

    /// Index path from the root to the node that failed (empty for the root).
    pub fn part_path(&self) -> Vec<usize> {
        let mut path = Vec::new();
        let mut err = self;
        while let EmlError::PartParse { index, source } = err {
            path.push(*index);
            err = source;
        }
        path
    }
}

/// Allow `?` on `std::io::Error` when no path context is available
/// (streams read through [`crate::parser::eml::parse`]).
impl From<std::io::Error> for EmlError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<stream>"),
            source,
        }
    }
}
