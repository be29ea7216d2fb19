use std::env;

use anyhow::{Context, Result};

const DEFAULT_API_URL: &str = "http://localhost:8989";
const DEFAULT_PORT: u16 = 8080;

/// Process configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the backend catalog API.
    pub api_base_url: String,
    /// Port the front-end listens on.
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let api_base_url =
            env::var("COMICS_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {raw:?}"))?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Self { api_base_url, port })
    }
}
