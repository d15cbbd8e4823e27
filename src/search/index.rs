//! Embedding index and top-K ranking for a single corpus

use std::cmp::Ordering;

use serde::Serialize;

use super::embedding::{cosine_similarity, validate_vector, Embedder, Embedding};
use crate::core::corpus::CorpusItem;
use crate::error::{Result, SearchError};

/// A corpus item paired with its similarity to the current query
#[derive(Debug, Clone, Serialize)]
pub struct ScoredResult<T> {
    pub item: T,
    /// Row position of the item in its corpus
    pub position: usize,
    pub score: f32,
}

/// Embed every text, preserving order.
///
/// Either every text gets a validated vector or the whole call fails.
pub fn index(embedder: &dyn Embedder, texts: &[&str]) -> Result<Vec<Embedding>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let vectors = embedder.embed_batch(texts)?;
    if vectors.len() != texts.len() {
        return Err(SearchError::embedding(format!(
            "embedder returned {} vectors for {} texts",
            vectors.len(),
            texts.len()
        )));
    }

    let dimension = embedder.dimension();
    for vector in &vectors {
        validate_vector(vector, dimension)?;
    }

    Ok(vectors)
}

/// Embed `query` and rank `items` by cosine similarity against `vectors`.
pub fn rank<T: Clone>(
    embedder: &dyn Embedder,
    query: &str,
    vectors: &[Embedding],
    items: &[T],
    k: usize,
) -> Result<Vec<ScoredResult<T>>> {
    if vectors.len() != items.len() {
        return Err(SearchError::Misaligned {
            vectors: vectors.len(),
            items: items.len(),
        });
    }
    if k == 0 || items.is_empty() {
        return Ok(Vec::new());
    }

    let query_vector = embedder.embed(query)?;
    rank_by_vector(&query_vector, vectors, items, k)
}

/// Rank with an already embedded query.
///
/// Scores sort descending; equal scores keep corpus order.
pub fn rank_by_vector<T: Clone>(
    query_vector: &[f32],
    vectors: &[Embedding],
    items: &[T],
    k: usize,
) -> Result<Vec<ScoredResult<T>>> {
    if vectors.len() != items.len() {
        return Err(SearchError::Misaligned {
            vectors: vectors.len(),
            items: items.len(),
        });
    }
    if k == 0 || items.is_empty() {
        return Ok(Vec::new());
    }

    let expected = vectors[0].len();
    if query_vector.len() != expected {
        return Err(SearchError::DimensionMismatch {
            expected,
            actual: query_vector.len(),
        });
    }
    if query_vector.iter().any(|v| !v.is_finite()) {
        return Err(SearchError::embedding("query vector contains non-finite values"));
    }

    let mut scored: Vec<(usize, f32)> = vectors
        .iter()
        .enumerate()
        .map(|(position, vector)| (position, cosine_similarity(query_vector, vector)))
        .collect();

    scored.sort_by(|a, b| compare_scored(*a, *b));
    scored.truncate(k);

    Ok(scored
        .into_iter()
        .map(|(position, score)| ScoredResult {
            item: items[position].clone(),
            position,
            score,
        })
        .collect())
}

fn compare_scored(a: (usize, f32), b: (usize, f32)) -> Ordering {
    b.1.partial_cmp(&a.1)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.0.cmp(&b.0))
}

/// An immutable corpus together with one embedding per item.
///
/// Vector `i` always belongs to item `i`; nothing here reorders or mutates
/// either side after construction.
#[derive(Debug)]
pub struct CorpusIndex<T> {
    items: Vec<T>,
    vectors: Vec<Embedding>,
    model_id: String,
    dimension: usize,
}

impl<T: CorpusItem> CorpusIndex<T> {
    /// Embed every item's text with `embedder`.
    pub fn build(embedder: &dyn Embedder, items: Vec<T>) -> Result<Self> {
        let texts: Vec<&str> = items.iter().map(|item| item.text()).collect();
        let vectors = index(embedder, &texts)?;
        Self::from_parts(items, vectors, embedder.model_id(), embedder.dimension())
    }

    /// Assemble from vectors computed earlier, e.g. loaded from the cache.
    pub fn from_parts(
        items: Vec<T>,
        vectors: Vec<Embedding>,
        model_id: &str,
        dimension: usize,
    ) -> Result<Self> {
        if vectors.len() != items.len() {
            return Err(SearchError::Misaligned {
                vectors: vectors.len(),
                items: items.len(),
            });
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(SearchError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            });
        }
        for vector in &vectors {
            validate_vector(vector, dimension)?;
        }

        Ok(Self {
            items,
            vectors,
            model_id: model_id.to_string(),
            dimension,
        })
    }

    /// Top `k` items for `query`, embedding the query with `embedder`.
    pub fn rank(&self, embedder: &dyn Embedder, query: &str, k: usize) -> Result<Vec<ScoredResult<T>>> {
        self.check_model(embedder)?;
        if k == 0 || self.is_empty() {
            tracing::debug!(corpus = T::CORPUS, k, "nothing to rank");
            return Ok(Vec::new());
        }
        let query_vector = embedder.embed(query)?;
        self.rank_by_vector(&query_vector, k)
    }

    /// Top `k` items for a query vector from the same model.
    pub fn rank_by_vector(&self, query_vector: &[f32], k: usize) -> Result<Vec<ScoredResult<T>>> {
        if query_vector.len() != self.dimension {
            return Err(SearchError::DimensionMismatch {
                expected: self.dimension,
                actual: query_vector.len(),
            });
        }
        let results = rank_by_vector(query_vector, &self.vectors, &self.items, k)?;
        tracing::debug!(corpus = T::CORPUS, k, returned = results.len(), "ranked corpus");
        Ok(results)
    }

    pub(crate) fn check_model(&self, embedder: &dyn Embedder) -> Result<()> {
        if embedder.dimension() != self.dimension {
            return Err(SearchError::DimensionMismatch {
                expected: self.dimension,
                actual: embedder.dimension(),
            });
        }
        if embedder.model_id() != self.model_id {
            return Err(SearchError::ModelMismatch {
                index: self.model_id.clone(),
                query: embedder.model_id().to_string(),
            });
        }
        Ok(())
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn vectors(&self) -> &[Embedding] {
        &self.vectors
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
