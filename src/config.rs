//! Configuration management
//!
//! All settings come from the environment (optionally via a `.env` file),
//! with defaults suitable for local single-instance deployment.

use std::env;
use std::path::PathBuf;

use crate::errors::{Result, ShortstashError};

#[derive(Clone, Debug)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    /// Public base URL short links are appended to. Always ends with `/`.
    pub base_url: String,
    /// Directory holding the shared one-file-per-code store.
    pub storage_dir: PathBuf,
    /// Set the `Secure` attribute on the session cookie.
    pub cookie_secure: bool,
    pub log_level: String,
    pub log_file: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let server_port: u16 = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|e| ShortstashError::config(format!("invalid SERVER_PORT: {}", e)))?;

        let base_url = env::var("BASE_URL")
            .unwrap_or_else(|_| format!("http://{}:{}/", server_host, server_port));
        let base_url = if base_url.ends_with('/') {
            base_url
        } else {
            format!("{}/", base_url)
        };

        let storage_dir = env::var("STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| env::temp_dir().join("shortstash"));

        let cookie_secure = env::var("COOKIE_SECURE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_file = env::var("LOG_FILE").ok().filter(|f| !f.is_empty());

        Ok(Config {
            server_host,
            server_port,
            base_url,
            storage_dir,
            cookie_secure,
            log_level,
            log_file,
        })
    }
}
