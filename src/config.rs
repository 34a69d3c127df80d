use std::{fs, net::SocketAddr, path::PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Names a JSON file whose values sit under the environment overrides.
pub const CONFIG_PATH_ENV: &str = "WORDLENS_CONFIG";
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const PORT_ENV: &str = "PORT";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// SQLite database path; a `sqlite://` or `sqlite:` prefix is accepted.
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub title_max_length: usize,
    pub text_max_length: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "wordlens.sqlite3".into(),
            host: "0.0.0.0".into(),
            port: 8080,
            title_max_length: 30,
            text_max_length: 10_000,
        }
    }
}

impl AppConfig {
    /// Read configuration once at start-up: optional file, then environment.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(PathBuf::from(path))?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: PathBuf) -> Result<Self> {
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(DATABASE_URL_ENV).filter(|url| !url.trim().is_empty()) {
            self.database_url = url.trim().to_string();
        }
        if let Some(port) = lookup(PORT_ENV) {
            self.port = port
                .trim()
                .parse()
                .with_context(|| format!("{PORT_ENV} must be a port number, got '{port}'"))?;
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        let url = self.database_url.as_str();
        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);
        PathBuf::from(path)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .with_context(|| format!("invalid listen address '{addr}'"))
    }
}
