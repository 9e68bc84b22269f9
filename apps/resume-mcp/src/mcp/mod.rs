//! Model Context Protocol server: JSON-RPC dispatch over the tool catalog,
//! served on stdio for local agents or at `/mcp` for authenticated clients.

pub mod http;
mod server;
mod stdio;
pub mod types;

pub use server::McpServer;
pub use stdio::serve_stdio;
