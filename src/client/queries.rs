use std::sync::Arc;
use std::time::Duration;

use super::{FetchError, MovieSource, QueryCache, StalePolicy};
use crate::config::ClientConfig;
use crate::models::{DetailFetchResult, ListingKey, MoviePage};

/// What presentation code sees of a query.
#[derive(Debug)]
pub enum QueryState<T> {
    /// Disabled query; nothing was requested.
    Idle,
    Loading,
    Error(FetchError),
    Data(Arc<T>),
}

impl<T> QueryState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            QueryState::Data(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<FetchError> {
        match self {
            QueryState::Error(e) => Some(*e),
            _ => None,
        }
    }
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        match self {
            QueryState::Idle => QueryState::Idle,
            QueryState::Loading => QueryState::Loading,
            QueryState::Error(e) => QueryState::Error(*e),
            QueryState::Data(data) => QueryState::Data(Arc::clone(data)),
        }
    }
}

impl<T> From<Result<Arc<T>, FetchError>> for QueryState<T> {
    fn from(result: Result<Arc<T>, FetchError>) -> Self {
        match result {
            Ok(data) => QueryState::Data(data),
            Err(e) => QueryState::Error(e),
        }
    }
}

/// The listing and detail queries, each over its own cache namespace.
#[derive(Clone)]
pub struct MovieQueries {
    source: Arc<dyn MovieSource>,
    listings: QueryCache<ListingKey, MoviePage>,
    details: QueryCache<String, DetailFetchResult>,
}

impl MovieQueries {
    pub fn new(source: Arc<dyn MovieSource>, stale_time: Duration, policy: StalePolicy) -> Self {
        Self::with_caches(
            source,
            QueryCache::new(stale_time, policy),
            QueryCache::new(stale_time, policy),
        )
    }

    pub fn from_config(source: Arc<dyn MovieSource>, config: &ClientConfig) -> Self {
        Self::new(source, config.stale_time, config.stale_policy)
    }

    pub fn with_caches(
        source: Arc<dyn MovieSource>,
        listings: QueryCache<ListingKey, MoviePage>,
        details: QueryCache<String, DetailFetchResult>,
    ) -> Self {
        Self {
            source,
            listings,
            details,
        }
    }

    pub fn listings(&self) -> &QueryCache<ListingKey, MoviePage> {
        &self.listings
    }

    pub fn details(&self) -> &QueryCache<String, DetailFetchResult> {
        &self.details
    }

    pub async fn movies(&self, key: &ListingKey) -> Result<Arc<MoviePage>, FetchError> {
        let source = Arc::clone(&self.source);
        let request = key.clone();
        self.listings
            .fetch(key.clone(), move || async move {
                source.fetch_movies(&request).await
            })
            .await
    }

    /// Detail query. An absent or empty id is a no-op.
    pub async fn movie(&self, id: Option<&str>) -> QueryState<DetailFetchResult> {
        let Some(id) = id.filter(|id| !id.is_empty()) else {
            return QueryState::Idle;
        };
        let source = Arc::clone(&self.source);
        let request = id.to_string();
        self.details
            .fetch(id.to_string(), move || async move {
                source.fetch_movie(&request).await
            })
            .await
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Movie};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSource {
        listings: Mutex<Vec<ListingKey>>,
        details: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MovieSource for RecordingSource {
        async fn fetch_movies(&self, key: &ListingKey) -> Result<MoviePage, FetchError> {
            self.listings.lock().unwrap().push(key.clone());
            Ok(MoviePage {
                results: vec![Movie {
                    id: key.page as i64,
                    title: format!("{} {}", key.category, key.query),
                    poster_path: None,
                    backdrop_path: None,
                    vote_average: 7.0,
                    release_date: String::new(),
                    overview: String::new(),
                }],
                total_pages: 3,
                page: key.page,
            })
        }

        async fn fetch_movie(&self, id: &str) -> Result<DetailFetchResult, FetchError> {
            self.details.lock().unwrap().push(id.to_string());
            Err(FetchError::MovieDetails)
        }
    }

    fn queries(source: Arc<RecordingSource>) -> MovieQueries {
        MovieQueries::new(source, Duration::from_secs(300), StalePolicy::Blocking)
    }

    #[tokio::test]
    async fn identical_listing_reads_hit_network_once() {
        let source = Arc::new(RecordingSource::default());
        let queries = queries(source.clone());
        let key = ListingKey::new(Category::Trending, "", 2);

        let a = queries.movies(&key).await.unwrap();
        let b = queries.movies(&key).await.unwrap();

        assert_eq!(source.listings.lock().unwrap().len(), 1);
        assert_eq!(*a, *b);
    }

    #[tokio::test]
    async fn each_key_field_makes_a_distinct_entry() {
        let source = Arc::new(RecordingSource::default());
        let queries = queries(source.clone());
        let base = ListingKey::new(Category::Popular, "", 1);
        let keys = [
            base.clone(),
            ListingKey::new(Category::TopRated, "", 1),
            ListingKey::new(Category::Popular, "alien", 1),
            ListingKey::new(Category::Popular, "", 2),
        ];

        for key in &keys {
            queries.movies(key).await.unwrap();
        }
        queries.movies(&base).await.unwrap();

        assert_eq!(*source.listings.lock().unwrap(), keys.to_vec());
        assert_eq!(queries.listings().len().await, 4);
    }

    #[tokio::test]
    async fn missing_movie_id_makes_no_request() {
        let source = Arc::new(RecordingSource::default());
        let queries = queries(source.clone());

        assert!(matches!(queries.movie(None).await, QueryState::Idle));
        assert!(matches!(queries.movie(Some("")).await, QueryState::Idle));
        assert!(source.details.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn detail_errors_surface_as_error_state() {
        let source = Arc::new(RecordingSource::default());
        let queries = queries(source.clone());

        let state = queries.movie(Some("550")).await;
        assert_eq!(state.error(), Some(FetchError::MovieDetails));
        assert_eq!(state.error().unwrap().to_string(), "Failed to fetch movie details");
        assert!(queries.details().is_empty().await);
    }
}
