use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure kinds surfaced by the codecs. Validation findings are data
/// (see `validate`), never errors.
#[derive(Debug, Error)]
pub enum Arinc665Error {
    /// Malformed, truncated or unreadable binary artifact.
    #[error("invalid format in {}: {reason}", path.display())]
    InvalidFormat { path: PathBuf, reason: String },

    /// Encode-time contract violation: a text field exceeds its fixed width.
    #[error("{field} too long: {actual} bytes (field holds {limit})")]
    FieldTooLong { field: &'static str, limit: usize, actual: usize },

    /// Interchange document carries an unrecognized version or enumerated value.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl Arinc665Error {
    /// Wrap a decode failure with the offending artifact path.
    pub fn invalid_format(path: &Path, reason: impl std::fmt::Display) -> anyhow::Error {
        Arinc665Error::InvalidFormat { path: path.to_path_buf(), reason: reason.to_string() }
            .into()
    }
}
