use anyhow::{Context, Result, bail};
use std::env;
use std::net::SocketAddr;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub cors_allowed_origin: String,
    pub seed_demo_data: bool,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// # Environment Variables
    /// - `BIND_ADDR`: Optional - Listen address (default: "127.0.0.1:5000")
    /// - `CORS_ALLOWED_ORIGIN`: Optional - Origin allowed to call the API from a browser (default: "http://localhost:5173")
    /// - `SEED_DEMO_DATA`: Optional - Create a demo package when the store is empty (default: "true")
    pub fn from_env() -> Result<Self> {
        // Parse listen address (optional, has default)
        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:5000".to_string());

        let bind_addr: SocketAddr = bind_addr
            .parse()
            .with_context(|| format!("BIND_ADDR is not a valid socket address: {bind_addr}"))?;

        // Parse CORS origin (optional, has default)
        let cors_allowed_origin = env::var("CORS_ALLOWED_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:5173".to_string());

        if cors_allowed_origin.trim().is_empty() {
            bail!("CORS_ALLOWED_ORIGIN cannot be empty");
        }

        // Parse demo seeding flag (optional, has default)
        let seed_demo_data = match env::var("SEED_DEMO_DATA") {
            Err(_) => true,
            Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                other => bail!("SEED_DEMO_DATA must be a boolean, got: {other}"),
            },
        };

        Ok(Config {
            bind_addr,
            cors_allowed_origin,
            seed_demo_data,
        })
    }
}
