use anyhow::{bail, Result};
use colored::Colorize;
use std::path::Path;

use scripture_search::{CorpusItem, VerseRef};

use super::{load_config, open_engine};

pub fn run(config_path: Option<&Path>, reference: &str, json: bool) -> Result<()> {
    let Some(verse_ref) = VerseRef::parse(reference) else {
        bail!("not a verse reference: \"{}\" (try \"2:255\")", reference);
    };

    let config = load_config(config_path)?;
    let engine = open_engine(&config)?;

    match engine.verse(&verse_ref) {
        Some(ayah) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&ayah)?);
            } else {
                println!("{}", ayah.citation().cyan().bold());
                println!("{}", ayah.translation);
            }
            Ok(())
        }
        None => {
            if json {
                println!(
                    "{}",
                    serde_json::json!({ "error": "Verse not found", "reference": verse_ref })
                );
            } else {
                println!("{} Verse not found: {}", "!".yellow().bold(), verse_ref);
            }
            std::process::exit(1);
        }
    }
}
