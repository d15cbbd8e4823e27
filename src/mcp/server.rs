//! Scripture MCP Server implementation

use anyhow::Result;
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use scripture_search::pipeline::VoicePipeline;
use scripture_search::search::engine::cache_file_size;
use scripture_search::search::CorpusSelection;
use scripture_search::{Config, HtpEmbedder, SearchEngine, VerseRef};

/// Parameters for scripture_search tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// Natural language search query (e.g., "patience in times of hardship")
    #[schemars(description = "Natural language search query")]
    pub query: String,
    /// Results per corpus (default from config, usually 5)
    #[schemars(description = "Maximum results per corpus (default: 5)")]
    #[serde(default)]
    pub limit: Option<usize>,
    /// Which corpora to search
    #[schemars(description = "Corpora to search: all, quran or hadith (default: all)")]
    #[serde(default)]
    pub corpus: CorpusSelection,
}

/// Parameters for get_verse tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetVerseParams {
    /// Verse reference (e.g., "2:255" or "surah 2 ayah 255")
    #[schemars(description = "Verse reference such as 2:255")]
    pub reference: String,
}

/// Parameters for ask tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct AskParams {
    /// Question naming a verse (e.g., "what does surah 2 verse 286 say?")
    #[schemars(description = "Question that names a surah and ayah")]
    pub question: String,
}

#[derive(Debug, Serialize)]
struct StatusJson {
    quran_items: usize,
    hadith_items: usize,
    model_id: String,
    dimension: usize,
    cache_path: Option<String>,
    cache_size_bytes: Option<u64>,
}

/// Scripture MCP Service
#[derive(Clone)]
pub struct ScriptureService {
    engine: Arc<SearchEngine>,
    config: Config,
    tool_router: ToolRouter<Self>,
}

impl ScriptureService {
    pub fn new(engine: Arc<SearchEngine>, config: Config) -> Self {
        Self {
            engine,
            config,
            tool_router: Self::tool_router(),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let output = serde_json::to_string_pretty(value).map_err(|e| {
        McpError::internal_error(format!("JSON serialization failed: {}", e), None)
    })?;
    Ok(CallToolResult::success(vec![Content::text(output)]))
}

#[tool_router]
impl ScriptureService {
    /// Search both corpora by meaning
    #[tool(description = "Semantic search over Quran ayat and Hadith. Returns an independent ranked list per corpus with similarity scores.")]
    async fn scripture_search(
        &self,
        params: Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        let limit = self.config.clamp_limit(params.0.limit);

        let sections = self
            .engine
            .search(&params.0.query, limit, params.0.corpus)
            .map_err(|e| McpError::internal_error(format!("Search failed: {}", e), None))?;

        to_json(&sections)
    }

    /// Look up one ayah
    #[tool(description = "Get the text of a Quran ayah by reference, e.g. 2:255.")]
    async fn get_verse(
        &self,
        params: Parameters<GetVerseParams>,
    ) -> Result<CallToolResult, McpError> {
        let Some(reference) = VerseRef::parse(&params.0.reference) else {
            return Err(McpError::invalid_params(
                format!("Not a verse reference: {}", params.0.reference),
                None,
            ));
        };

        match self.engine.verse(&reference) {
            Some(ayah) => to_json(&ayah),
            None => Ok(CallToolResult::success(vec![Content::text(format!(
                "Verse not found: {}",
                reference
            ))])),
        }
    }

    /// Run the question pipeline
    #[tool(description = "Answer a question that names a Quran verse (e.g. 'read surah 2 ayah 286'). Reports which stage failed otherwise.")]
    async fn ask(&self, params: Parameters<AskParams>) -> Result<CallToolResult, McpError> {
        match VoicePipeline::text(self.engine.as_ref()).run(params.0.question.as_bytes()) {
            Ok(output) => to_json(&output),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(e.to_string())])),
        }
    }

    /// Corpus sizes and cache information
    #[tool(description = "Get corpus sizes, embedding model and cache status.")]
    async fn index_status(&self) -> Result<CallToolResult, McpError> {
        let cache_path = self.config.cache_path.as_ref();

        let status = StatusJson {
            quran_items: self.engine.quran_len(),
            hadith_items: self.engine.hadith_len(),
            model_id: self.engine.embedder().model_id().to_string(),
            dimension: self.engine.embedder().dimension(),
            cache_path: cache_path.map(|p| p.display().to_string()),
            cache_size_bytes: cache_path.map(|p| cache_file_size(p)),
        };

        to_json(&status)
    }
}

#[tool_handler]
impl ServerHandler for ScriptureService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Scripture MCP Server. Semantic search and verse lookup over Quran ayat and Hadith.".to_string()
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Run the MCP server
pub async fn run_mcp_server(config: Config) -> Result<()> {
    use tokio::io::{stdin, stdout};

    let (engine, stats) = SearchEngine::open(&config, Arc::new(HtpEmbedder::new()))?;
    for s in &stats {
        tracing::info!(corpus = s.corpus, items = s.items, source = ?s.source, "index ready");
    }
    let engine = Arc::new(engine);

    #[cfg(feature = "watch")]
    let _watcher = scripture_search::watch::watch_corpora(Arc::clone(&engine), config.clone())?;

    let service = ScriptureService::new(engine, config);
    let transport = (stdin(), stdout());
    let server = service.serve(transport).await?;
    server.waiting().await?;

    Ok(())
}
