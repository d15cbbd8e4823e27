use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, SearchError};

/// A row of a searchable corpus.
///
/// Each item carries exactly one free-text field used for semantic matching,
/// plus typed metadata used for citation and lookup.
pub trait CorpusItem: Clone + Serialize + Send + Sync + 'static {
    /// Corpus name, used as the cache key and in logs
    const CORPUS: &'static str;

    /// The free-text field that gets embedded
    fn text(&self) -> &str;

    /// Explicit identity, stable across reloads
    fn key(&self) -> String;

    /// Human-readable source label
    fn citation(&self) -> String;
}

/// Load a CSV corpus, one item per data row, in file order.
///
/// Any unreadable file or undecodable row fails the whole load.
pub fn load_csv<T>(path: &Path) -> Result<Vec<T>>
where
    T: CorpusItem + DeserializeOwned,
{
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| SearchError::corpus_load(path, e.to_string()))?;

    let mut items = Vec::new();
    for (row, record) in reader.deserialize::<T>().enumerate() {
        // Row numbers are 1-based and skip the header line
        let item = record
            .map_err(|e| SearchError::corpus_load(path, format!("row {}: {}", row + 2, e)))?;
        items.push(item);
    }

    tracing::debug!(corpus = T::CORPUS, path = %path.display(), rows = items.len(), "loaded corpus");
    Ok(items)
}
