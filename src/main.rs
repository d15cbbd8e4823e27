mod commands;
#[cfg(feature = "mcp")]
mod mcp;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use scripture_search::search::CorpusSelection;

#[derive(Parser)]
#[command(name = "scripture")]
#[command(about = "Semantic search over Quran ayat and Hadith", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(long, global = true, help = "Config file (default: ./scripture.yaml)")]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "More log output (-v info, -vv debug)")]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build or refresh the embedding cache
    Index {
        #[arg(long, help = "Show cache status only")]
        status: bool,
        #[arg(long, help = "Delete the cache and embed everything again")]
        rebuild: bool,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Semantic search across both corpora
    #[command(alias = "s")]
    Search {
        query: String,
        #[arg(long, short, help = "Results per corpus")]
        limit: Option<usize>,
        #[arg(long, value_enum, default_value_t = CorpusSelection::All, help = "Corpora to search")]
        corpus: CorpusSelection,
        #[arg(long, help = "JSON output")]
        json: bool,
        #[arg(long, help = "Print full texts without truncation")]
        full: bool,
    },
    /// Look up an ayah by reference, e.g. "2:255"
    Verse {
        reference: String,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Answer a question that names a verse
    Ask {
        question: String,
        #[arg(long, help = "JSON output")]
        json: bool,
    },

    // ===== MCP Server =====
    /// Start MCP server on stdio
    #[cfg(feature = "mcp")]
    Mcp {
        #[arg(long, help = "Show client configuration instructions")]
        install: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    scripture_search::logging::init(cli.verbose);

    let config = cli.config.as_deref();

    match cli.command {
        Commands::Index {
            status,
            rebuild,
            json,
        } => commands::index::run(config, status, rebuild, json),
        Commands::Search {
            query,
            limit,
            corpus,
            json,
            full,
        } => commands::search::run(config, &query, limit, corpus, json, full),
        Commands::Verse { reference, json } => commands::verse::run(config, &reference, json),
        Commands::Ask { question, json } => commands::ask::run(config, &question, json),

        #[cfg(feature = "mcp")]
        Commands::Mcp { install } => {
            if install {
                print_mcp_install_instructions();
                Ok(())
            } else {
                run_mcp_server(config)
            }
        }
    }
}

#[cfg(feature = "mcp")]
fn run_mcp_server(config: Option<&std::path::Path>) -> anyhow::Result<()> {
    let config = commands::load_config(config)?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(mcp::run_mcp_server(config))
}

#[cfg(feature = "mcp")]
fn print_mcp_install_instructions() {
    use colored::Colorize;

    let cwd = std::env::current_dir()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| "/path/to/your/corpora".to_string());

    let binary_path = std::env::current_exe()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| "scripture".to_string());

    println!("{}", "MCP Server Installation Guide".bold().cyan());
    println!();
    println!("Add the following to your MCP client configuration:");
    println!();
    println!(r#"{{
  "mcpServers": {{
    "scripture-search": {{
      "command": "{}",
      "args": ["mcp"],
      "cwd": "{}"
    }}
  }}
}}"#, binary_path, cwd);
    println!();
    println!("{}", "Available tools:".bold());
    println!("  • {} - Semantic search over Quran and Hadith", "scripture_search".green());
    println!("  • {} - Look up an ayah by reference", "get_verse".green());
    println!("  • {} - Answer a question naming a verse", "ask".green());
    println!("  • {} - Corpus and cache status", "index_status".green());
}
