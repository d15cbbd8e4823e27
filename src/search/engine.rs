//! Search Engine - both corpora, their indexes and the embedder
//!
//! Each corpus is ranked on its own; results are never merged across corpora.

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use super::cache::{fingerprint, EmbeddingCache};
use super::embedding::Embedder;
use super::index::{CorpusIndex, ScoredResult};
use super::shared::SharedIndex;
use crate::config::Config;
use crate::core::corpus::{load_csv, CorpusItem};
use crate::core::records::{Ayah, Hadith};
use crate::core::reference::VerseRef;
use crate::error::Result;

/// Which corpora a search should cover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, clap::ValueEnum)]
#[cfg_attr(feature = "mcp", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum CorpusSelection {
    #[default]
    All,
    Quran,
    Hadith,
}

impl CorpusSelection {
    fn quran(self) -> bool {
        matches!(self, Self::All | Self::Quran)
    }

    fn hadith(self) -> bool {
        matches!(self, Self::All | Self::Hadith)
    }
}

/// Independent top-K lists, one per searched corpus
#[derive(Debug, Clone, Serialize)]
pub struct SearchSections {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quran: Option<Vec<ScoredResult<Ayah>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hadith: Option<Vec<ScoredResult<Hadith>>>,
}

/// How an index came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexSource {
    Cache,
    Embedded,
}

/// Indexing statistics for one corpus
#[derive(Debug, Clone, Serialize)]
pub struct CorpusStats {
    pub corpus: &'static str,
    pub items: usize,
    pub source: IndexSource,
    pub duration_ms: u128,
}

/// Search engine over the Quran and Hadith corpora
pub struct SearchEngine {
    embedder: Arc<dyn Embedder>,
    quran: SharedIndex<Ayah>,
    hadith: SharedIndex<Hadith>,
}

impl SearchEngine {
    /// Load both corpora named in `config` and index them, reusing cached
    /// embeddings when `config.cache_path` is set.
    pub fn open(config: &Config, embedder: Arc<dyn Embedder>) -> Result<(Self, Vec<CorpusStats>)> {
        let (quran, hadith, stats) = load_indexes(config, embedder.as_ref())?;
        let engine = Self {
            embedder,
            quran: SharedIndex::new(quran),
            hadith: SharedIndex::new(hadith),
        };
        Ok((engine, stats))
    }

    /// Index in-memory corpora without touching the filesystem
    pub fn from_corpora(
        embedder: Arc<dyn Embedder>,
        quran: Vec<Ayah>,
        hadith: Vec<Hadith>,
    ) -> Result<Self> {
        let quran = CorpusIndex::build(embedder.as_ref(), quran)?;
        let hadith = CorpusIndex::build(embedder.as_ref(), hadith)?;
        Ok(Self {
            embedder,
            quran: SharedIndex::new(quran),
            hadith: SharedIndex::new(hadith),
        })
    }

    /// Rank the selected corpora against `query`, `k` results each.
    ///
    /// The query is embedded once and ranked against a snapshot of each index.
    pub fn search(&self, query: &str, k: usize, selection: CorpusSelection) -> Result<SearchSections> {
        let quran = self.quran.snapshot();
        let hadith = self.hadith.snapshot();
        if selection.quran() {
            quran.check_model(self.embedder.as_ref())?;
        }
        if selection.hadith() {
            hadith.check_model(self.embedder.as_ref())?;
        }

        if k == 0 {
            return Ok(SearchSections {
                quran: selection.quran().then(Vec::new),
                hadith: selection.hadith().then(Vec::new),
            });
        }

        let query_vector = self.embedder.embed(query)?;
        tracing::debug!(query, k, ?selection, "searching");

        let quran = if selection.quran() {
            Some(quran.rank_by_vector(&query_vector, k)?)
        } else {
            None
        };
        let hadith = if selection.hadith() {
            Some(hadith.rank_by_vector(&query_vector, k)?)
        } else {
            None
        };

        Ok(SearchSections { quran, hadith })
    }

    /// The ayah a reference points at, if the Quran corpus has it
    pub fn verse(&self, reference: &VerseRef) -> Option<Ayah> {
        self.quran
            .snapshot()
            .items()
            .iter()
            .find(|ayah| reference.matches(ayah))
            .cloned()
    }

    /// Reload both corpora and swap in fresh indexes.
    ///
    /// Both indexes are built before either is swapped; on error the current
    /// indexes keep serving.
    pub fn reload(&self, config: &Config) -> Result<Vec<CorpusStats>> {
        let (quran, hadith, stats) = load_indexes(config, self.embedder.as_ref())?;
        self.quran.replace(quran);
        self.hadith.replace(hadith);
        tracing::info!("corpora reloaded");
        Ok(stats)
    }

    pub fn quran_len(&self) -> usize {
        self.quran.snapshot().len()
    }

    pub fn hadith_len(&self) -> usize {
        self.hadith.snapshot().len()
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }
}

fn load_indexes(
    config: &Config,
    embedder: &dyn Embedder,
) -> Result<(CorpusIndex<Ayah>, CorpusIndex<Hadith>, Vec<CorpusStats>)> {
    let ayat: Vec<Ayah> = load_csv(&config.quran_path)?;
    let hadith: Vec<Hadith> = load_csv(&config.hadith_path)?;

    let mut cache = config
        .cache_path
        .as_deref()
        .map(EmbeddingCache::open)
        .transpose()?;

    let (quran_index, quran_stats) = build_or_load(embedder, ayat, cache.as_mut())?;
    let (hadith_index, hadith_stats) = build_or_load(embedder, hadith, cache.as_mut())?;

    if let Some(cache) = &cache {
        cache.set_meta("last_full_index", &chrono::Utc::now().timestamp().to_string())?;
    }

    Ok((quran_index, hadith_index, vec![quran_stats, hadith_stats]))
}

/// Build an index for `items`, reading and refreshing `cache` when given
pub fn build_or_load<T: CorpusItem>(
    embedder: &dyn Embedder,
    items: Vec<T>,
    cache: Option<&mut EmbeddingCache>,
) -> Result<(CorpusIndex<T>, CorpusStats)> {
    let start = Instant::now();
    let model_id = embedder.model_id();
    let dimension = embedder.dimension();

    let Some(cache) = cache else {
        let index = CorpusIndex::build(embedder, items)?;
        let count = index.len();
        return Ok((index, stats::<T>(IndexSource::Embedded, start, count)));
    };

    let print = fingerprint(model_id, items.iter().map(|item| item.text()));
    if let Some(vectors) = cache.load(T::CORPUS, model_id, &print, items.len(), dimension)? {
        let index = CorpusIndex::from_parts(items, vectors, model_id, dimension)?;
        tracing::info!(corpus = T::CORPUS, items = index.len(), "loaded embeddings from cache");
        let count = index.len();
        return Ok((index, stats::<T>(IndexSource::Cache, start, count)));
    }

    let index = CorpusIndex::build(embedder, items)?;
    cache.store(T::CORPUS, model_id, &print, dimension, index.vectors())?;
    tracing::info!(corpus = T::CORPUS, items = index.len(), "embedded corpus");
    let count = index.len();
    Ok((index, stats::<T>(IndexSource::Embedded, start, count)))
}

fn stats<T: CorpusItem>(source: IndexSource, start: Instant, items: usize) -> CorpusStats {
    CorpusStats {
        corpus: T::CORPUS,
        items,
        source,
        duration_ms: start.elapsed().as_millis(),
    }
}

/// Size of the cache database file, 0 when absent
pub fn cache_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchError;
    use crate::search::embedding::HtpEmbedder;

    fn engine() -> SearchEngine {
        let quran = vec![
            Ayah {
                surah: "2".into(),
                ayah: 153,
                translation: "seek help through patience and prayer".into(),
            },
            Ayah {
                surah: "2".into(),
                ayah: 255,
                translation: "neither drowsiness overtakes Him nor sleep".into(),
            },
        ];
        let hadith = vec![
            Hadith {
                source: "Bukhari".into(),
                hadith_no: "1".into(),
                text: "actions are judged by intentions".into(),
            },
            Hadith {
                source: "Muslim".into(),
                hadith_no: "55".into(),
                text: "the religion is sincerity".into(),
            },
            Hadith {
                source: "Bukhari".into(),
                hadith_no: "8".into(),
                text: "islam is built upon five pillars including prayer".into(),
            },
        ];
        SearchEngine::from_corpora(Arc::new(HtpEmbedder::new()), quran, hadith).unwrap()
    }

    #[test]
    fn test_sections_are_independent() {
        let engine = engine();
        let sections = engine.search("patience and prayer", 5, CorpusSelection::All).unwrap();

        let quran = sections.quran.unwrap();
        let hadith = sections.hadith.unwrap();
        assert_eq!(quran.len(), 2);
        assert_eq!(hadith.len(), 3);
        assert_eq!(quran[0].item.ayah, 153);
        assert_eq!(hadith[0].item.hadith_no, "8");
    }

    #[test]
    fn test_selection() {
        let engine = engine();
        let only_hadith = engine.search("sincerity", 1, CorpusSelection::Hadith).unwrap();
        assert!(only_hadith.quran.is_none());
        assert_eq!(only_hadith.hadith.unwrap()[0].item.hadith_no, "55");

        let zero = engine.search("sincerity", 0, CorpusSelection::Quran).unwrap();
        assert_eq!(zero.quran.map(|r| r.len()), Some(0));
        assert!(zero.hadith.is_none());
    }

    /// HTP vectors under a different model id
    struct RenamedHtp(HtpEmbedder);

    impl Embedder for RenamedHtp {
        fn model_id(&self) -> &str {
            "htp-renamed"
        }

        fn dimension(&self) -> usize {
            self.0.dimension()
        }

        fn embed(&self, text: &str) -> Result<crate::search::embedding::Embedding> {
            self.0.embed(text)
        }
    }

    #[test]
    fn test_model_check_limited_to_selection() {
        let embedder = HtpEmbedder::new();
        let quran = CorpusIndex::build(
            &embedder,
            vec![Ayah {
                surah: "2".into(),
                ayah: 153,
                translation: "seek help through patience and prayer".into(),
            }],
        )
        .unwrap();
        let hadith = CorpusIndex::build(
            &RenamedHtp(HtpEmbedder::new()),
            vec![Hadith {
                source: "Muslim".into(),
                hadith_no: "55".into(),
                text: "the religion is sincerity".into(),
            }],
        )
        .unwrap();
        let engine = SearchEngine {
            embedder: Arc::new(embedder),
            quran: SharedIndex::new(quran),
            hadith: SharedIndex::new(hadith),
        };

        let sections = engine.search("patience", 1, CorpusSelection::Quran).unwrap();
        assert_eq!(sections.quran.map(|r| r.len()), Some(1));

        let err = engine.search("patience", 1, CorpusSelection::All).unwrap_err();
        assert!(matches!(err, SearchError::ModelMismatch { .. }));
    }

    #[test]
    fn test_verse_lookup() {
        let engine = engine();
        let found = engine.verse(&VerseRef { surah: "2".into(), ayah: 255 }).unwrap();
        assert!(found.translation.contains("drowsiness"));
        assert!(engine.verse(&VerseRef { surah: "3".into(), ayah: 1 }).is_none());
    }

    #[test]
    fn test_build_or_load_uses_cache() {
        let embedder = HtpEmbedder::new();
        let mut cache = EmbeddingCache::open_in_memory().unwrap();
        let items = vec![Hadith {
            source: "Tirmidhi".into(),
            hadith_no: "2516".into(),
            text: "be mindful of God and He will protect you".into(),
        }];

        let (first, stats) = build_or_load(&embedder, items.clone(), Some(&mut cache)).unwrap();
        assert_eq!(stats.source, IndexSource::Embedded);

        let (second, stats) = build_or_load(&embedder, items.clone(), Some(&mut cache)).unwrap();
        assert_eq!(stats.source, IndexSource::Cache);
        assert_eq!(first.vectors(), second.vectors());

        let mut changed = items;
        changed[0].text.push_str(" always");
        let (_, stats) = build_or_load(&embedder, changed, Some(&mut cache)).unwrap();
        assert_eq!(stats.source, IndexSource::Embedded);
    }
}
