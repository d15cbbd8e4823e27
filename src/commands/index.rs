//! Index command - build the embedding cache

use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

use scripture_search::search::engine::{cache_file_size, IndexSource};
use scripture_search::search::EmbeddingCache;
use scripture_search::{HtpEmbedder, SearchEngine};

use super::load_config;

/// Run index command
pub fn run(config_path: Option<&Path>, status_only: bool, rebuild: bool, json: bool) -> Result<()> {
    let config = load_config(config_path)?;

    let Some(db_path) = config.cache_path.clone() else {
        if json {
            println!("{}", serde_json::json!({ "error": "cache_path is not configured" }));
        } else {
            eprintln!(
                "{} No cache_path configured; corpora are embedded on every run.",
                "!".yellow().bold()
            );
        }
        return Ok(());
    };

    if status_only {
        return show_status(&db_path, json);
    }

    for path in [&config.quran_path, &config.hadith_path] {
        if !path.exists() {
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "error": "Corpus not found",
                        "path": path.display().to_string(),
                    })
                );
            } else {
                eprintln!("{} Corpus not found at: {}", "Error:".red().bold(), path.display());
                eprintln!();
                eprintln!("Set {} and {} in scripture.yaml", "quran_path".cyan(), "hadith_path".cyan());
            }
            bail!("missing corpus file {}", path.display());
        }
    }

    if rebuild && db_path.exists() {
        std::fs::remove_file(&db_path)?;
        if !json {
            println!("{} Removed existing cache", "→".dimmed());
        }
    }

    if !json {
        println!("{} Building embedding index...", "→".dimmed());
    }

    let (_, stats) = SearchEngine::open(&config, Arc::new(HtpEmbedder::new()))
        .context("Failed to build index")?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "corpora": stats,
                "cache_path": db_path.display().to_string(),
            })
        );
    } else {
        println!();
        for s in &stats {
            let how = match s.source {
                IndexSource::Cache => "loaded from cache".dimmed(),
                IndexSource::Embedded => "embedded".green(),
            };
            println!(
                "{} {} {} items {} in {:.2}s",
                "✓".green().bold(),
                s.corpus.bold(),
                s.items.to_string().cyan(),
                how,
                s.duration_ms as f64 / 1000.0
            );
        }
        println!("  {} Cache saved to: {}", "→".dimmed(), db_path.display());
    }

    Ok(())
}

/// Show cache status
fn show_status(db_path: &Path, json: bool) -> Result<()> {
    if !db_path.exists() {
        if json {
            println!(
                "{}",
                serde_json::json!({
                    "exists": false,
                    "error": "Cache not found"
                })
            );
        } else {
            println!(
                "{} Cache not found. Run {} first.",
                "!".yellow().bold(),
                "scripture index".cyan()
            );
        }
        return Ok(());
    }

    let cache = EmbeddingCache::open(db_path)?;
    let corpora = cache.stats()?;
    let last_full_index = cache.get_meta("last_full_index")?;
    let file_size = cache_file_size(db_path);

    if json {
        println!(
            "{}",
            serde_json::json!({
                "exists": true,
                "corpora": corpora,
                "last_full_index": last_full_index,
                "file_size_bytes": file_size,
            })
        );
        return Ok(());
    }

    println!("{}", "Cache Status".bold());
    println!();
    for corpus in &corpora {
        println!(
            "  {} {}: {} embeddings ({}, {} dims)",
            "→".dimmed(),
            corpus.name.bold(),
            corpus.item_count.to_string().cyan(),
            corpus.model_id,
            corpus.dimension
        );
    }
    println!("  {} Size: {:.2} KB", "→".dimmed(), file_size as f64 / 1024.0);
    if let Some(ts) = last_full_index.and_then(|v| v.parse::<i64>().ok()) {
        let dt = chrono::DateTime::from_timestamp(ts, 0)
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        println!("  {} Last indexed: {}", "→".dimmed(), dt);
    }

    Ok(())
}
