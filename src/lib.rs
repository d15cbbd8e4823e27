//! scripture-search library
//!
//! Semantic search over Quran ayat and Hadith.
//!
//! # Modules
//!
//! - `core`: Typed corpus records, CSV loading, verse references
//! - `search`: Embeddings, per-corpus ranking, embedding cache, engine
//! - `pipeline`: Staged question pipeline (transcribe → … → synthesize)
//! - `config`: `scripture.yaml` settings
//! - `logging`: tracing subscriber setup

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod search;
#[cfg(feature = "watch")]
pub mod watch;

// Re-exports for convenience
pub use config::Config;
pub use core::{load_csv, Ayah, CorpusItem, Hadith, VerseRef};
pub use error::{Result, SearchError};
pub use search::{
    CorpusIndex, CorpusSelection, Embedder, HtpEmbedder, ScoredResult, SearchEngine,
    SearchSections,
};
