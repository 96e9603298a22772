use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::card::MovieCard;
use crate::client::{FetchError, MovieQueries, QueryState};
use crate::debounce::{Debouncer, SEARCH_DEBOUNCE};
use crate::models::{Category, ListingKey, MoviePage};

pub const EMPTY_MESSAGE: &str = "No movies found.";
pub const FAILURE_MESSAGE: &str = "Failed to load movies. Please try again.";

#[derive(Debug, Clone, PartialEq)]
pub enum ListingView {
    Loading,
    Failed(&'static str),
    Empty(&'static str),
    Movies {
        cards: Vec<MovieCard>,
        pagination: Option<Pagination>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub total_pages: u32,
    pub has_previous: bool,
    pub has_next: bool,
}

/// Browse page state: category, debounced search and pagination over the
/// listing query. Results are only accepted for the key that is currently
/// active, so a slow response for an older key never overwrites newer state.
pub struct Browser {
    queries: MovieQueries,
    category: Category,
    search_input: String,
    query: String,
    page: u32,
    active: ListingKey,
    listing: QueryState<MoviePage>,
    search: Debouncer<String>,
    committed: watch::Receiver<String>,
}

impl Browser {
    pub fn new(queries: MovieQueries) -> Self {
        Self::with_debounce(queries, SEARCH_DEBOUNCE)
    }

    pub fn with_debounce(queries: MovieQueries, delay: Duration) -> Self {
        let (search, committed) = Debouncer::new(String::new(), delay);
        let category = Category::default();
        Self {
            queries,
            category,
            search_input: String::new(),
            query: String::new(),
            page: 1,
            active: ListingKey::new(category, "", 1),
            listing: QueryState::Idle,
            search,
            committed,
        }
    }

    pub fn key(&self) -> ListingKey {
        ListingKey::new(self.category, self.query.clone(), self.page)
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn listing(&self) -> &QueryState<MoviePage> {
        &self.listing
    }

    /// Whether `category` is highlighted: selected and not overridden by a search.
    pub fn is_selected(&self, category: Category) -> bool {
        self.category == category && self.query.is_empty()
    }

    /// Records a keystroke. The query only follows after the debounce delay.
    pub fn type_search(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.search_input = text.clone();
        self.search.push(text);
    }

    /// Applies a committed search, if one arrived. Returns whether the query changed.
    pub fn take_committed_search(&mut self) -> bool {
        if !self.committed.has_changed().unwrap_or(false) {
            return false;
        }
        self.query = self.committed.borrow_and_update().clone();
        self.page = 1;
        true
    }

    /// Waits for the next committed search and applies it.
    pub async fn committed_search(&mut self) -> bool {
        if self.committed.changed().await.is_err() {
            return false;
        }
        self.query = self.committed.borrow_and_update().clone();
        self.page = 1;
        true
    }

    pub fn select_category(&mut self, category: Category) {
        self.category = category;
        self.search_input.clear();
        self.query.clear();
        self.page = 1;
        self.search.reset(String::new());
    }

    pub fn next_page(&mut self) -> bool {
        match self.total_pages() {
            Some(total) if self.page < total => {
                self.page += 1;
                true
            }
            _ => false,
        }
    }

    pub fn previous_page(&mut self) -> bool {
        if self.page <= 1 {
            return false;
        }
        self.page -= 1;
        true
    }

    /// Marks the current key as active and the listing as loading.
    pub fn begin_load(&mut self) -> ListingKey {
        let key = self.key();
        self.active = key.clone();
        self.listing = QueryState::Loading;
        key
    }

    /// Accepts `result` only if it belongs to the active key.
    pub fn apply(&mut self, key: &ListingKey, result: Result<Arc<MoviePage>, FetchError>) -> bool {
        if *key != self.active {
            debug!(?key, active = ?self.active, "Ignoring result for superseded listing");
            return false;
        }
        self.listing = result.into();
        true
    }

    pub async fn load(&mut self) -> &QueryState<MoviePage> {
        let key = self.begin_load();
        let result = self.queries.movies(&key).await;
        self.apply(&key, result);
        &self.listing
    }

    /// Starts loading the current key on a task; feed the output back through [`Browser::apply`].
    pub fn spawn_load(&mut self) -> JoinHandle<(ListingKey, Result<Arc<MoviePage>, FetchError>)> {
        let key = self.begin_load();
        let queries = self.queries.clone();
        tokio::spawn(async move {
            let result = queries.movies(&key).await;
            (key, result)
        })
    }

    pub fn view(&self) -> ListingView {
        match &self.listing {
            QueryState::Idle | QueryState::Loading => ListingView::Loading,
            QueryState::Error(_) => ListingView::Failed(FAILURE_MESSAGE),
            QueryState::Data(page) if page.results.is_empty() => ListingView::Empty(EMPTY_MESSAGE),
            QueryState::Data(data) => ListingView::Movies {
                cards: data.results.iter().map(MovieCard::from).collect(),
                pagination: (data.total_pages > 1).then(|| Pagination {
                    page: self.page,
                    total_pages: data.total_pages,
                    has_previous: self.page > 1,
                    has_next: self.page < data.total_pages,
                }),
            },
        }
    }

    fn total_pages(&self) -> Option<u32> {
        self.listing.data().map(|d| d.total_pages)
    }
}
