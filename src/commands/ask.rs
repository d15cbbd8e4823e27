use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use scripture_search::pipeline::VoicePipeline;

use super::{load_config, open_engine};

pub fn run(config_path: Option<&Path>, question: &str, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let engine = open_engine(&config)?;

    match VoicePipeline::text(&engine).run(question.as_bytes()) {
        Ok(output) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{} {}", "Reference:".bold(), output.reference.to_string().cyan());
                println!("{}", output.answer);
            }
            Ok(())
        }
        Err(e) => {
            if json {
                println!(
                    "{}",
                    serde_json::json!({ "stage": e.stage, "error": format!("{:#}", e.source) })
                );
            } else {
                eprintln!("{} {}", "Error:".red().bold(), e);
            }
            std::process::exit(1);
        }
    }
}
