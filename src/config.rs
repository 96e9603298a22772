use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::client::StalePolicy;

pub const DEFAULT_TMDB_BASE: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3146";
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Upstream credential. Its absence is reported per request, not at startup.
    pub tmdb_api_key: Option<String>,
    pub tmdb_base_url: String,
    pub bind_addr: SocketAddr,
}

impl ProxyConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = optional("PROXY_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("PROXY_BIND_ADDR is not a valid socket address")?;
        Ok(Self {
            tmdb_api_key: optional("TMDB_API_KEY"),
            tmdb_base_url: optional("TMDB_BASE_URL")
                .unwrap_or_else(|| DEFAULT_TMDB_BASE.to_string()),
            bind_addr,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Full URL of the proxy endpoint.
    pub endpoint: String,
    /// Public key sent as a bearer token on every proxy call.
    pub client_key: String,
    pub stale_time: Duration,
    pub stale_policy: StalePolicy,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>, client_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client_key: client_key.into(),
            stale_time: DEFAULT_STALE_TIME,
            stale_policy: StalePolicy::default(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let endpoint = required("PROXY_ENDPOINT")?;
        let client_key = required("PROXY_CLIENT_KEY")?;
        let mut config = Self::new(endpoint, client_key);
        if optional("PROXY_STALE_WHILE_REVALIDATE").as_deref() == Some("true") {
            config.stale_policy = StalePolicy::StaleWhileRevalidate;
        }
        Ok(config)
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn required(key: &str) -> Result<String> {
    optional(key)
        .ok_or_else(|| anyhow::anyhow!("Missing required environment variable: {}", key))
}
