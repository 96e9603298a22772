use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::{FetchError, MovieSource};
use crate::config::ClientConfig;
use crate::models::{DetailFetchResult, ListingKey, MoviePage};

/// HTTP client for the proxy endpoint.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    client: Client,
    endpoint: String,
    client_key: String,
}

impl ProxyClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let user_agent = format!("cineflix/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .context("Failed to build proxy HTTP client")?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            client_key: config.client_key.clone(),
        })
    }

    async fn get(&self, params: &[(&str, String)]) -> reqwest::Result<Response> {
        self.client
            .get(&self.endpoint)
            .query(params)
            .bearer_auth(&self.client_key)
            .send()
            .await
    }
}

#[async_trait]
impl MovieSource for ProxyClient {
    async fn fetch_movies(&self, key: &ListingKey) -> Result<MoviePage, FetchError> {
        let mut params = vec![
            ("category", key.category.as_str().to_string()),
            ("page", key.page.to_string()),
        ];
        if !key.query.is_empty() {
            params.push(("query", key.query.clone()));
        }
        debug!(?key, "Fetching movies");

        let response = self.get(&params).await.map_err(|e| {
            warn!("Fetch failed: {}", e);
            FetchError::Movies
        })?;
        if !response.status().is_success() {
            warn!("Fetch failed: {}", response.status());
            return Err(FetchError::Movies);
        }
        response.json::<MoviePage>().await.map_err(|e| {
            warn!("Movies response could not be decoded: {}", e);
            FetchError::Movies
        })
    }

    async fn fetch_movie(&self, id: &str) -> Result<DetailFetchResult, FetchError> {
        debug!(movie_id = id, "Fetching movie details");
        let response = self
            .get(&[("movieId", id.to_string())])
            .await
            .map_err(|e| {
                warn!("Fetch failed: {}", e);
                FetchError::MovieDetails
            })?;
        if !response.status().is_success() {
            warn!("Fetch failed: {}", response.status());
            return Err(FetchError::MovieDetails);
        }
        let body: Value = response.json().await.map_err(|e| {
            warn!("Movie details response is not JSON: {}", e);
            FetchError::MovieDetails
        })?;
        let result = DetailFetchResult::from_json(body);
        if let DetailFetchResult::Invalid(reason) = &result {
            warn!(movie_id = id, "Movie details incomplete: {}", reason);
        }
        Ok(result)
    }
}
