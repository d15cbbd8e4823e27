//! Search command - semantic search over both corpora

use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use scripture_search::search::CorpusSelection;
use scripture_search::{CorpusItem, ScoredResult};

use super::{load_config, open_engine, truncate_width};

const DISPLAY_WIDTH: usize = 160;

/// Run search command
pub fn run(
    config_path: Option<&Path>,
    query: &str,
    limit: Option<usize>,
    selection: CorpusSelection,
    json: bool,
    full: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let limit = config.clamp_limit(limit);
    let engine = open_engine(&config)?;

    let sections = engine.search(query, limit, selection)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sections)?);
        return Ok(());
    }

    if let Some(quran) = &sections.quran {
        print_section("Top Matching Quran Ayat", quran, query, full);
    }
    if let Some(hadith) = &sections.hadith {
        print_section("Top Matching Hadith", hadith, query, full);
    }

    Ok(())
}

fn print_section<T: CorpusItem>(title: &str, results: &[ScoredResult<T>], query: &str, full: bool) {
    println!("{}", format!("### {}", title).bold());
    println!();

    if results.is_empty() {
        println!("{} No results found for: {}", "→".dimmed(), query.cyan());
        println!();
        return;
    }

    for result in results {
        let score_str = format!("{:.2}", result.score);
        let score_colored = if result.score > 0.8 {
            score_str.green()
        } else if result.score > 0.6 {
            score_str.yellow()
        } else {
            score_str.dimmed()
        };

        println!("{}", result.item.citation().cyan().bold());
        let text = result.item.text();
        if full {
            println!("{}", text);
        } else {
            println!("{}", truncate_width(text, DISPLAY_WIDTH));
        }
        println!("Similarity Score: {}", score_colored);
        println!("{}", "---".dimmed());
    }
    println!();
}
