mod auth;
mod config;
mod db;
mod errors;
mod mcp;
mod models;
mod render;
mod repository;
mod routes;
mod state;
mod tools;
mod urls;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::AuthState;
use crate::config::Config;
use crate::db::create_pool;
use crate::render::{ChromePdfPrinter, TemplateRenderer};
use crate::repository::Repository;
use crate::routes::build_router;
use crate::state::AppState;
use crate::tools::Toolbox;
use crate::urls::PreviewUrls;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    /// Single user: tool protocol on stdin/stdout, preview server alongside.
    Stdio,
    /// Multi-tenant: tool protocol at POST /mcp behind authentication.
    Http,
}

#[derive(Parser)]
#[command(version, about = "Resume management MCP server with HTML preview and PDF export")]
struct Cli {
    /// HTTP listen port; 0 picks a free one. Overrides PORT.
    #[arg(long)]
    port: Option<u16>,

    #[arg(long, value_enum, default_value = "stdio")]
    transport: Transport,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // stdout belongs to the stdio transport, so logs always go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        transport = ?cli.transport,
        "Starting resume-mcp v{}",
        env!("CARGO_PKG_VERSION")
    );

    let auth = match cli.transport {
        Transport::Http => Some(AuthState::from_config(&config).context(
            "http transport requires AUTH_SERVER_URL or JWT_SECRET to authenticate /mcp",
        )?),
        Transport::Stdio => None,
    };

    let pool = create_pool(&config.database_url).await?;
    let repo = Repository::new(pool);

    let printer = Arc::new(ChromePdfPrinter::new(config.browser_ws_url.clone()));
    let renderer = TemplateRenderer::new(printer);

    let port = cli.port.unwrap_or(config.port);
    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let actual_port = listener.local_addr()?.port();
    info!("Listening on 0.0.0.0:{actual_port}");

    let urls = PreviewUrls::new(config.base_url.as_deref(), actual_port)?;
    let toolbox = Toolbox::new(repo, renderer, urls);
    let state = AppState::new(toolbox);
    let mcp_server = state.mcp.clone();

    let app = build_router(state, auth)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    match cli.transport {
        Transport::Stdio => {
            let server = tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, app).await {
                    error!("Preview server error: {e}");
                }
            });
            tokio::select! {
                result = mcp::serve_stdio(&mcp_server) => result?,
                _ = tokio::signal::ctrl_c() => info!("Interrupted, shutting down"),
            }
            server.abort();
        }
        Transport::Http => {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        info!("Interrupted, shutting down");
                    }
                })
                .await?;
        }
    }

    Ok(())
}
