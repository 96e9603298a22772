use async_trait::async_trait;

use crate::models::{DetailFetchResult, ListingKey, MoviePage};

mod cache;
mod proxy;
mod queries;

pub use cache::{CacheEntry, QueryCache, StalePolicy};
pub use proxy::ProxyClient;
pub use queries::{MovieQueries, QueryState};

/// Opaque failure surfaced to presentation code. Only the static message escapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to fetch movies")]
    Movies,
    #[error("Failed to fetch movie details")]
    MovieDetails,
}

/// Where the data layer gets its movies from.
#[async_trait]
pub trait MovieSource: Send + Sync {
    async fn fetch_movies(&self, key: &ListingKey) -> Result<MoviePage, FetchError>;
    async fn fetch_movie(&self, id: &str) -> Result<DetailFetchResult, FetchError>;
}
