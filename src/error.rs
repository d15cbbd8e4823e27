//! Error types for indexing and ranking

use std::path::PathBuf;

/// Result type used throughout the library.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors surfaced by the retrieval core and its collaborators.
///
/// An empty corpus is deliberately not represented here: ranking against it
/// yields an empty result list.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Embedder unavailable or returned malformed output
    #[error("Embedding failed: {message}")]
    Embedding { message: String },

    /// Query vector and index vectors have different lengths
    #[error("Dimension mismatch: index has {expected} dimensions, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Query embedded with a different model than the index
    #[error("Model mismatch: index built with '{index}', query embedded with '{query}'")]
    ModelMismatch { index: String, query: String },

    /// Vectors and items cannot be paired one-to-one
    #[error("Index misaligned: {vectors} vectors for {items} items")]
    Misaligned { vectors: usize, items: usize },

    #[error("Failed to load corpus {path}: {message}")]
    CorpusLoad { path: PathBuf, message: String },

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("Embedding cache error: {0}")]
    Cache(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SearchError {
    pub fn embedding<S: Into<String>>(message: S) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn corpus_load<P: Into<PathBuf>, S: Into<String>>(path: P, message: S) -> Self {
        Self::CorpusLoad {
            path: path.into(),
            message: message.into(),
        }
    }
}
