//! Semantic search over embedded corpora
//!
//! - `embedding`: the `Embedder` seam and the default HTP model
//! - `index`: per-corpus index and top-K ranking
//! - `cache`: SQLite persistence for corpus embeddings
//! - `engine`: both corpora behind one handle

pub mod cache;
pub mod embedding;
pub mod engine;
pub mod index;
pub mod shared;

pub use cache::EmbeddingCache;
pub use embedding::{cosine_similarity, Embedder, Embedding, HtpEmbedder, EMBEDDING_DIM};
pub use engine::{CorpusSelection, CorpusStats, IndexSource, SearchEngine, SearchSections};
pub use index::{index, rank, rank_by_vector, CorpusIndex, ScoredResult};
pub use shared::SharedIndex;
