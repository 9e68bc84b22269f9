use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;

use super::McpServer;
use crate::models::AuthContext;

/// Serves newline-delimited JSON-RPC until the reader hits EOF.
/// stdout carries protocol traffic only; logs go to stderr.
pub async fn serve_stdio(server: &McpServer) -> Result<()> {
    serve_lines(server, tokio::io::stdin(), tokio::io::stdout()).await
}

pub async fn serve_lines<R, W>(server: &McpServer, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let auth = AuthContext::local();
    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(reply) = server.handle_message(&line, &auth).await {
            writer.write_all(reply.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }
    info!("stdin closed, stopping MCP server");
    Ok(())
}
