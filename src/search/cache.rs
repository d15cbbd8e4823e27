//! Persistent embedding cache using SQLite
//!
//! Stores one BLOB per corpus row, keyed by corpus name and row position.
//! A corpus entry is only reused when the model and the fingerprint of every
//! item text still match, so a stale cache can never misalign an index.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::embedding::{validate_vector, Embedding};
use crate::error::Result;

/// SQLite-backed store of corpus embeddings
pub struct EmbeddingCache {
    conn: Connection,
}

/// One cached corpus as reported by [`EmbeddingCache::stats`]
#[derive(Debug, Clone, serde::Serialize)]
pub struct CachedCorpus {
    pub name: String,
    pub model_id: String,
    pub dimension: usize,
    pub item_count: usize,
    pub indexed_at: i64,
}

impl EmbeddingCache {
    /// Open or create the cache database at `db_path`
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;
        let cache = Self { conn };
        cache.init_schema()?;
        Ok(cache)
    }

    /// Open in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self { conn };
        cache.init_schema()?;
        Ok(cache)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS corpora (
                name TEXT PRIMARY KEY,
                model_id TEXT NOT NULL,
                dimension INTEGER NOT NULL,
                item_count INTEGER NOT NULL,
                fingerprint TEXT NOT NULL,
                indexed_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS embeddings (
                corpus TEXT NOT NULL,
                position INTEGER NOT NULL,
                embedding BLOB NOT NULL,
                PRIMARY KEY (corpus, position)
            );

            CREATE TABLE IF NOT EXISTS index_meta (
                key TEXT PRIMARY KEY,
                value TEXT
            );
            "#,
        )?;

        Ok(())
    }

    /// Cached vectors for `name`, in row order, if they are still valid.
    ///
    /// Returns `None` when the corpus was never cached, was built with another
    /// model, its texts changed, or any stored row is missing or malformed.
    pub fn load(
        &self,
        name: &str,
        model_id: &str,
        fingerprint: &str,
        item_count: usize,
        dimension: usize,
    ) -> Result<Option<Vec<Embedding>>> {
        let header: Option<(String, i64, i64, String)> = self
            .conn
            .query_row(
                "SELECT model_id, dimension, item_count, fingerprint FROM corpora WHERE name = ?1",
                params![name],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        let Some((cached_model, cached_dim, cached_count, cached_fingerprint)) = header else {
            return Ok(None);
        };

        if cached_model != model_id
            || cached_dim as usize != dimension
            || cached_count as usize != item_count
            || cached_fingerprint != fingerprint
        {
            tracing::info!(corpus = name, "cached embeddings are stale");
            return Ok(None);
        }

        let mut stmt = self
            .conn
            .prepare("SELECT position, embedding FROM embeddings WHERE corpus = ?1 ORDER BY position")?;
        let rows = stmt.query_map(params![name], |row| {
            let position: i64 = row.get(0)?;
            let blob: Vec<u8> = row.get(1)?;
            Ok((position, blob))
        })?;

        let mut vectors = Vec::with_capacity(item_count);
        for (expected, row) in rows.enumerate() {
            let (position, blob) = row?;
            if position as usize != expected || blob.len() != dimension * 4 {
                tracing::warn!(corpus = name, position, "corrupt cache row, recomputing");
                return Ok(None);
            }
            let vector = blob_to_embedding(&blob);
            if validate_vector(&vector, dimension).is_err() {
                tracing::warn!(corpus = name, position, "non-finite cached embedding, recomputing");
                return Ok(None);
            }
            vectors.push(vector);
        }

        if vectors.len() != item_count {
            tracing::warn!(corpus = name, rows = vectors.len(), expected = item_count, "incomplete cache");
            return Ok(None);
        }

        Ok(Some(vectors))
    }

    /// Replace everything cached for `name` in one transaction
    pub fn store(
        &mut self,
        name: &str,
        model_id: &str,
        fingerprint: &str,
        dimension: usize,
        vectors: &[Embedding],
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let tx = self.conn.transaction()?;

        tx.execute("DELETE FROM embeddings WHERE corpus = ?1", params![name])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO embeddings (corpus, position, embedding) VALUES (?1, ?2, ?3)",
            )?;
            for (position, vector) in vectors.iter().enumerate() {
                insert.execute(params![name, position as i64, embedding_to_blob(vector)])?;
            }
        }

        tx.execute(
            r#"
            INSERT INTO corpora (name, model_id, dimension, item_count, fingerprint, indexed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(name) DO UPDATE SET
                model_id = excluded.model_id,
                dimension = excluded.dimension,
                item_count = excluded.item_count,
                fingerprint = excluded.fingerprint,
                indexed_at = excluded.indexed_at
            "#,
            params![
                name,
                model_id,
                dimension as i64,
                vectors.len() as i64,
                fingerprint,
                now
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// All cached corpora, by name
    pub fn stats(&self) -> Result<Vec<CachedCorpus>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, model_id, dimension, item_count, indexed_at FROM corpora ORDER BY name",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CachedCorpus {
                name: row.get(0)?,
                model_id: row.get(1)?,
                dimension: row.get::<_, i64>(2)? as usize,
                item_count: row.get::<_, i64>(3)? as usize,
                indexed_at: row.get(4)?,
            })
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO index_meta (key, value) VALUES (?1, ?2) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM index_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }
}

/// BLAKE3 over the model id and every text, length-prefixed so that
/// `["ab", "c"]` and `["a", "bc"]` differ.
pub fn fingerprint<'a, I>(model_id: &str, texts: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(model_id.len() as u64).to_le_bytes());
    hasher.update(model_id.as_bytes());
    for text in texts {
        hasher.update(&(text.len() as u64).to_le_bytes());
        hasher.update(text.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(embedding.len() * 4);
    for &val in embedding {
        blob.extend_from_slice(&val.to_le_bytes());
    }
    blob
}

fn blob_to_embedding(blob: &[u8]) -> Embedding {
    blob.chunks_exact(4)
        .map(|chunk| {
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(chunk);
            f32::from_le_bytes(bytes)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vectors() -> Vec<Embedding> {
        vec![vec![1.0, 0.0, -0.5], vec![0.25, 0.5, 0.75]]
    }

    #[test]
    fn test_blob_conversion() {
        let embedding = vec![1.0, 2.0, 3.0, -0.5];
        assert_eq!(blob_to_embedding(&embedding_to_blob(&embedding)), embedding);
    }

    #[test]
    fn test_store_and_load() -> Result<()> {
        let mut cache = EmbeddingCache::open_in_memory()?;
        cache.store("quran", "htp-384", "abc", 3, &vectors())?;

        let loaded = cache.load("quran", "htp-384", "abc", 2, 3)?;
        assert_eq!(loaded, Some(vectors()));

        let stats = cache.stats()?;
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].name, "quran");
        assert_eq!(stats[0].item_count, 2);
        Ok(())
    }

    #[test]
    fn test_stale_entries_ignored() -> Result<()> {
        let mut cache = EmbeddingCache::open_in_memory()?;
        cache.store("quran", "htp-384", "abc", 3, &vectors())?;

        assert!(cache.load("hadith", "htp-384", "abc", 2, 3)?.is_none());
        assert!(cache.load("quran", "other", "abc", 2, 3)?.is_none());
        assert!(cache.load("quran", "htp-384", "changed", 2, 3)?.is_none());
        assert!(cache.load("quran", "htp-384", "abc", 3, 3)?.is_none());
        assert!(cache.load("quran", "htp-384", "abc", 2, 4)?.is_none());
        Ok(())
    }

    #[test]
    fn test_store_replaces_previous_rows() -> Result<()> {
        let mut cache = EmbeddingCache::open_in_memory()?;
        cache.store("hadith", "htp-384", "v1", 3, &vectors())?;
        cache.store("hadith", "htp-384", "v2", 3, &[vec![9.0, 9.0, 9.0]])?;

        assert!(cache.load("hadith", "htp-384", "v1", 2, 3)?.is_none());
        assert_eq!(
            cache.load("hadith", "htp-384", "v2", 1, 3)?,
            Some(vec![vec![9.0, 9.0, 9.0]])
        );
        Ok(())
    }

    #[test]
    fn test_non_finite_rows_are_stale() -> Result<()> {
        let mut cache = EmbeddingCache::open_in_memory()?;
        cache.store("quran", "htp-384", "abc", 3, &[vec![1.0, f32::NAN, 0.0], vec![f32::INFINITY, 0.0, 0.0]])?;

        assert!(cache.load("quran", "htp-384", "abc", 2, 3)?.is_none());
        Ok(())
    }

    #[test]
    fn test_meta() -> Result<()> {
        let cache = EmbeddingCache::open_in_memory()?;
        assert_eq!(cache.get_meta("last_full_index")?, None);
        cache.set_meta("last_full_index", "1700000000")?;
        assert_eq!(cache.get_meta("last_full_index")?.as_deref(), Some("1700000000"));
        Ok(())
    }

    #[test]
    fn test_fingerprint() {
        let a = fingerprint("m", ["ab", "c"]);
        let b = fingerprint("m", ["a", "bc"]);
        let c = fingerprint("other", ["ab", "c"]);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, fingerprint("m", vec!["ab", "c"]));
    }
}
