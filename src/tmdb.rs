use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ProxyConfig;
use crate::models::Category;

const DETAIL_APPENDS: &str = "credits,similar,videos";

/// Selection parameters accepted by the proxy endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyParams {
    pub category: Option<String>,
    pub query: Option<String>,
    pub page: Option<String>,
    pub movie_id: Option<String>,
}

impl ProxyParams {
    /// Builds params from raw query pairs. The first occurrence of a name wins and
    /// empty values count as absent.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let first = |name: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
                .filter(|v| !v.is_empty())
        };
        Self {
            category: first("category"),
            query: first("query"),
            page: first("page"),
            movie_id: first("movieId"),
        }
    }
}

/// The single upstream call a proxy request maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamRequest {
    Detail { movie_id: String },
    Search { query: String, page: String },
    Trending { page: String },
    TopRated { page: String },
    Popular { page: String },
}

impl UpstreamRequest {
    pub fn from_params(params: &ProxyParams) -> Self {
        if let Some(movie_id) = &params.movie_id {
            return UpstreamRequest::Detail {
                movie_id: movie_id.clone(),
            };
        }
        let page = params.page.clone().unwrap_or_else(|| "1".to_string());
        if let Some(query) = &params.query {
            return UpstreamRequest::Search {
                query: query.clone(),
                page,
            };
        }
        let category = params
            .category
            .as_deref()
            .map(Category::from_param)
            .unwrap_or_default();
        match category {
            Category::Trending => UpstreamRequest::Trending { page },
            Category::TopRated => UpstreamRequest::TopRated { page },
            Category::Popular => UpstreamRequest::Popular { page },
        }
    }

    /// Path and query relative to the upstream base, without the credential.
    pub fn path_and_query(&self) -> String {
        match self {
            UpstreamRequest::Detail { movie_id } => format!(
                "/movie/{}?append_to_response={DETAIL_APPENDS}",
                urlencoding::encode(movie_id)
            ),
            UpstreamRequest::Search { query, page } => format!(
                "/search/movie?query={}&page={}",
                urlencoding::encode(query),
                urlencoding::encode(page)
            ),
            UpstreamRequest::Trending { page } => {
                format!("/trending/movie/week?page={}", urlencoding::encode(page))
            }
            UpstreamRequest::TopRated { page } => {
                format!("/movie/top_rated?page={}", urlencoding::encode(page))
            }
            UpstreamRequest::Popular { page } => {
                format!("/movie/popular?page={}", urlencoding::encode(page))
            }
        }
    }
}

#[async_trait]
pub trait TmdbApi: Send + Sync {
    /// Performs the upstream call and returns its body text unchanged, whatever the
    /// upstream status. Fails if the body is not JSON.
    async fn fetch(&self, request: &UpstreamRequest) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TmdbClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let user_agent = format!("cineflix/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Returns `None` when no credential is configured.
    pub fn from_config(config: &ProxyConfig) -> Result<Option<Self>> {
        config
            .tmdb_api_key
            .as_deref()
            .map(|key| Self::new(key, config.tmdb_base_url.as_str()))
            .transpose()
    }

    fn url_for(&self, request: &UpstreamRequest) -> String {
        let path = request.path_and_query();
        let separator = if path.contains('?') { '&' } else { '?' };
        format!(
            "{}{}{}api_key={}",
            self.base_url,
            path,
            separator,
            urlencoding::encode(&self.api_key)
        )
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn fetch(&self, request: &UpstreamRequest) -> Result<String> {
        let url = self.url_for(request);
        debug!(upstream = %request.path_and_query(), "Calling TMDB");
        // reqwest errors embed the URL, which carries the credential.
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!(e.without_url()))
            .context("request failed")?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| anyhow!(e.without_url()))
            .context("reading body failed")?;
        if !status.is_success() {
            warn!(
                upstream = %request.path_and_query(),
                status = status.as_u16(),
                "TMDB returned a non-success status; relaying body"
            );
        }
        serde_json::from_str::<Value>(&text).context("JSON parse failed")?;
        Ok(text)
    }
}
