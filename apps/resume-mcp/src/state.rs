use std::sync::Arc;

use axum::extract::FromRef;

use crate::mcp::McpServer;
use crate::render::TemplateRenderer;
use crate::repository::Repository;
use crate::tools::Toolbox;
use crate::urls::PreviewUrls;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub repo: Repository,
    pub renderer: TemplateRenderer,
    pub urls: PreviewUrls,
    pub mcp: Arc<McpServer>,
}

impl AppState {
    pub fn new(toolbox: Toolbox) -> Self {
        AppState {
            repo: toolbox.repo.clone(),
            renderer: toolbox.renderer.clone(),
            urls: toolbox.urls.clone(),
            mcp: Arc::new(McpServer::new(toolbox)),
        }
    }
}

impl FromRef<AppState> for Arc<McpServer> {
    fn from_ref(state: &AppState) -> Self {
        state.mcp.clone()
    }
}
