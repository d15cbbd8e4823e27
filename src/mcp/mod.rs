//! MCP server for scripture search
//!
//! Exposes semantic search, verse lookup and the question pipeline as tools.

mod server;

pub use server::run_mcp_server;
