use anyhow::{Context, Result};
use reqwest::Url;

/// Builds the preview and download links handed back to agents.
#[derive(Debug, Clone)]
pub struct PreviewUrls {
    base: Url,
}

impl PreviewUrls {
    /// `base_url` wins when configured; otherwise links point at the local listener.
    pub fn new(base_url: Option<&str>, port: u16) -> Result<Self> {
        let raw = match base_url {
            Some(url) => url.to_string(),
            None => format!("http://localhost:{port}"),
        };
        let base = Url::parse(&raw).with_context(|| format!("invalid BASE_URL: {raw}"))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("BASE_URL must be an absolute http(s) URL: {raw}");
        }
        Ok(PreviewUrls { base })
    }

    pub fn preview(&self, session_id: &str) -> String {
        self.with_path(&format!("/resume/preview/{session_id}"))
    }

    pub fn download(&self, session_id: &str) -> String {
        self.with_path(&format!("/resume/download/{session_id}"))
    }

    // Any path, query or fragment on the base is replaced.
    fn with_path(&self, path: &str) -> String {
        let mut url = self.base.clone();
        url.set_path(path);
        url.set_query(None);
        url.set_fragment(None);
        url.to_string()
    }
}
