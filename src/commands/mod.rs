pub mod ask;
pub mod index;
pub mod search;
pub mod verse;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use scripture_search::{Config, HtpEmbedder, SearchEngine};
use unicode_width::UnicodeWidthChar;

/// Load config relative to the working directory
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    Config::load(explicit, &cwd).context("Failed to load configuration")
}

/// Load corpora and build the engine with the default embedder
pub fn open_engine(config: &Config) -> Result<SearchEngine> {
    let (engine, stats) = SearchEngine::open(config, Arc::new(HtpEmbedder::new()))
        .context("Failed to open search engine")?;
    for s in &stats {
        tracing::info!(corpus = s.corpus, items = s.items, source = ?s.source, "index ready");
    }
    Ok(engine)
}

/// Cut `s` to at most `max_width` terminal columns, appending "..." when cut
pub fn truncate_width(s: &str, max_width: usize) -> String {
    let total: usize = s.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= max_width {
        return s.to_string();
    }

    let budget = max_width.saturating_sub(3);
    let mut used = 0;
    let mut out = String::new();
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str("...");
    out
}
