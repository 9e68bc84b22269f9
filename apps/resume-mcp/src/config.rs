use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Everything has a usable default so the single-user stdio build starts with no setup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Externally reachable origin used when building preview/download links.
    pub base_url: Option<String>,
    /// DevTools endpoint of a remote headless Chrome. Unset means launch one locally.
    pub browser_ws_url: Option<String>,
    pub auth_server_url: Option<String>,
    pub auth_server_api_key: Option<String>,
    pub jwt_secret: Option<String>,
    /// 0 lets the OS pick a free port.
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let database_url = match optional_env("DATABASE_URL") {
            Some(url) => url,
            None => default_database_url()?,
        };

        Ok(Config {
            database_url,
            base_url: optional_env("BASE_URL"),
            browser_ws_url: optional_env("BROWSER_WS_URL"),
            auth_server_url: optional_env("AUTH_SERVER_URL"),
            auth_server_api_key: optional_env("AUTH_SERVER_API_KEY"),
            jwt_secret: optional_env("JWT_SECRET"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "0".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// `$HOME/resume.db`, created on first use.
fn default_database_url() -> Result<String> {
    let home = std::env::var("HOME")
        .context("DATABASE_URL is not set and HOME is unavailable for the default SQLite file")?;
    Ok(format!("sqlite://{home}/resume.db?mode=rwc"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
