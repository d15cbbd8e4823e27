//! End-to-end tests over CSV corpora on disk
//!
//! Covers config loading, the embedding cache across engine restarts,
//! hot reload and the question pipeline.

use anyhow::Result;
use std::fs;
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

use scripture_search::pipeline::{Stage, VoicePipeline};
use scripture_search::search::engine::IndexSource;
use scripture_search::search::CorpusSelection;
use scripture_search::{Config, HtpEmbedder, SearchEngine, SearchError, VerseRef};

const QURAN_CSV: &str = "\
surahs,ayahs,ayahs-translation
2,153,\"O you who believe, seek help through patience and prayer\"
2,255,neither drowsiness overtakes Him nor sleep
";

const HADITH_CSV: &str = "\
source,hadith_no,text_en,grade
Bukhari,1,actions are judged by intentions,sahih
Muslim,55,the religion is sincerity,sahih
Bukhari,8,islam is built upon five pillars including prayer,sahih
";

const CONFIG_YAML: &str = "\
quran_path: quran.csv
hadith_path: hadith.csv
cache_path: cache/embeddings.db
top_k: 2
";

fn setup() -> Result<(TempDir, Config)> {
    let dir = tempdir()?;
    fs::write(dir.path().join("quran.csv"), QURAN_CSV)?;
    fs::write(dir.path().join("hadith.csv"), HADITH_CSV)?;
    fs::write(dir.path().join("scripture.yaml"), CONFIG_YAML)?;

    let config = Config::load(None, dir.path())?;
    Ok((dir, config))
}

fn open(config: &Config) -> Result<(SearchEngine, Vec<IndexSource>)> {
    let (engine, stats) = SearchEngine::open(config, Arc::new(HtpEmbedder::new()))?;
    Ok((engine, stats.iter().map(|s| s.source).collect()))
}

#[test]
fn test_config_paths_resolve_against_config_dir() -> Result<()> {
    let (dir, config) = setup()?;

    assert_eq!(config.quran_path, dir.path().join("quran.csv"));
    assert_eq!(config.cache_path, Some(dir.path().join("cache/embeddings.db")));
    assert_eq!(config.top_k, 2);
    assert_eq!(config.max_limit, 100);
    assert_eq!(config.clamp_limit(None), 2);
    assert_eq!(config.clamp_limit(Some(500)), 100);

    Ok(())
}

#[test]
fn test_second_open_reads_cache() -> Result<()> {
    let (_dir, config) = setup()?;

    let (first, sources) = open(&config)?;
    assert_eq!(sources, vec![IndexSource::Embedded, IndexSource::Embedded]);
    assert!(config.cache_path.as_ref().is_some_and(|p| p.exists()));

    let (second, sources) = open(&config)?;
    assert_eq!(sources, vec![IndexSource::Cache, IndexSource::Cache]);

    let a = first.search("patience and prayer", 5, CorpusSelection::All)?;
    let b = second.search("patience and prayer", 5, CorpusSelection::All)?;
    let scores = |s: &scripture_search::SearchSections| -> Vec<f32> {
        s.quran
            .iter()
            .flatten()
            .map(|r| r.score)
            .chain(s.hadith.iter().flatten().map(|r| r.score))
            .collect()
    };
    assert_eq!(scores(&a), scores(&b));

    Ok(())
}

#[test]
fn test_search_ranks_each_corpus() -> Result<()> {
    let (_dir, config) = setup()?;
    let (engine, _) = open(&config)?;

    let sections = engine.search("patience and prayer", config.clamp_limit(None), CorpusSelection::All)?;
    let quran = sections.quran.unwrap_or_default();
    let hadith = sections.hadith.unwrap_or_default();

    assert_eq!(quran.len(), 2);
    assert_eq!(hadith.len(), 2);
    assert_eq!(quran[0].item.ayah, 153);
    assert_eq!(hadith[0].item.hadith_no, "8");
    assert!(quran[0].score >= quran[1].score);

    Ok(())
}

#[test]
fn test_reload_swaps_in_new_corpus() -> Result<()> {
    let (dir, config) = setup()?;
    let (engine, _) = open(&config)?;
    assert_eq!(engine.quran_len(), 2);

    let mut updated = QURAN_CSV.to_string();
    updated.push_str("1,1,In the name of God the most gracious the most merciful\n");
    fs::write(dir.path().join("quran.csv"), updated)?;

    let stats = engine.reload(&config)?;
    assert_eq!(stats[0].source, IndexSource::Embedded);
    assert_eq!(stats[1].source, IndexSource::Cache);
    assert_eq!(engine.quran_len(), 3);

    let sections = engine.search("the most merciful", 1, CorpusSelection::Quran)?;
    let top = &sections.quran.unwrap_or_default()[0];
    assert_eq!((top.item.surah.as_str(), top.item.ayah), ("1", 1));

    Ok(())
}

#[test]
fn test_failed_reload_keeps_serving() -> Result<()> {
    let (dir, config) = setup()?;
    let (engine, _) = open(&config)?;

    fs::write(dir.path().join("quran.csv"), "surahs,ayahs,ayahs-translation\n2,not-a-number,x\n")?;
    let err = engine.reload(&config).unwrap_err();
    assert!(matches!(err, SearchError::CorpusLoad { .. }));

    assert_eq!(engine.quran_len(), 2);
    let found = engine.verse(&VerseRef { surah: "2".into(), ayah: 255 });
    assert!(found.is_some());

    Ok(())
}

#[test]
fn test_missing_corpus_is_reported() -> Result<()> {
    let (dir, config) = setup()?;
    fs::remove_file(dir.path().join("hadith.csv"))?;

    let err = SearchEngine::open(&config, Arc::new(HtpEmbedder::new())).err();
    match err {
        Some(SearchError::CorpusLoad { path, .. }) => {
            assert_eq!(path, dir.path().join("hadith.csv"));
        }
        other => panic!("expected CorpusLoad, got {:?}", other.map(|e| e.to_string())),
    }

    Ok(())
}

#[test]
fn test_pipeline_over_engine() -> Result<()> {
    let (_dir, config) = setup()?;
    let (engine, _) = open(&config)?;
    let pipeline = VoicePipeline::text(&engine);

    let output = pipeline.run(b"What does surah 2 ayah 255 say?")?;
    assert_eq!(output.reference.to_string(), "2:255");
    assert_eq!(output.answer, "neither drowsiness overtakes Him nor sleep");

    let err = pipeline.run(b"read 9:9 please").unwrap_err();
    assert_eq!(err.stage, Stage::Fetch);

    let err = pipeline.run(b"tell me about patience").unwrap_err();
    assert_eq!(err.stage, Stage::Extract);

    Ok(())
}
