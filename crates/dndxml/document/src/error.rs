use std::path::PathBuf;

use dndxml_core::FormatError;

/// Errors raised while reading or writing a document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// An entity, or the XML text itself, is malformed.
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The root is not a `<document>` in the dialect namespace.
    #[error("root element <{found}> is not a dndxml document")]
    NotADocument { found: String },

    /// Re-reading written output did not reproduce the written tree.
    #[error("document did not survive a round trip: {0}")]
    RoundTrip(String),
}

impl DocumentError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, DocumentError>;
