use crate::card::{self, MovieCard};
use crate::client::QueryState;
use crate::models::{CastMember, DetailFetchResult, Genre, Movie, MovieDetail};

pub const PARTIAL_NOTICE: &str = "Limited details available.";
pub const FAILURE_MESSAGE: &str = "Failed to load movie details.";
const TOP_CAST: usize = 6;
const SIMILAR_SHOWN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    Back,
}

#[derive(Debug, Clone)]
pub enum DetailView {
    Loading,
    /// Nothing to show; the only way out is back navigation.
    Failed {
        message: &'static str,
        action: NavAction,
    },
    Ready(DetailPage),
}

#[derive(Debug, Clone)]
pub enum ShownMovie {
    Full(Box<MovieDetail>),
    /// List-form data carried from navigation; detail fields are unknown.
    Partial(Movie),
}

#[derive(Debug, Clone)]
pub struct DetailPage {
    pub movie: ShownMovie,
    pub partial: bool,
}

/// Decides what the detail page shows from the detail query and the movie
/// carried over from the listing, if any.
pub fn reconcile(state: &QueryState<DetailFetchResult>, fallback: Option<&Movie>) -> DetailView {
    if let Some(DetailFetchResult::Valid(detail)) = state.data() {
        return DetailView::Ready(DetailPage {
            movie: ShownMovie::Full(Box::new(detail.clone())),
            partial: false,
        });
    }

    match (state, fallback) {
        (_, Some(movie)) => DetailView::Ready(DetailPage {
            movie: ShownMovie::Partial(movie.clone()),
            partial: true,
        }),
        (QueryState::Loading, None) => DetailView::Loading,
        (_, None) => DetailView::Failed {
            message: FAILURE_MESSAGE,
            action: NavAction::Back,
        },
    }
}

impl DetailPage {
    fn base(&self) -> &Movie {
        match &self.movie {
            ShownMovie::Full(detail) => &detail.movie,
            ShownMovie::Partial(movie) => movie,
        }
    }

    fn detail(&self) -> Option<&MovieDetail> {
        match &self.movie {
            ShownMovie::Full(detail) => Some(detail.as_ref()),
            ShownMovie::Partial(_) => None,
        }
    }

    pub fn notice(&self) -> Option<&'static str> {
        self.partial.then_some(PARTIAL_NOTICE)
    }

    pub fn title(&self) -> &str {
        &self.base().title
    }

    pub fn overview(&self) -> &str {
        &self.base().overview
    }

    pub fn tagline(&self) -> Option<&str> {
        self.detail()
            .and_then(|d| d.tagline.as_deref())
            .filter(|t| !t.is_empty())
    }

    pub fn rating_label(&self) -> String {
        card::format_rating(self.base().vote_average)
    }

    pub fn year_label(&self) -> String {
        card::extract_year(&self.base().release_date).unwrap_or_else(|| "N/A".to_string())
    }

    pub fn runtime_label(&self) -> String {
        match self.detail().and_then(|d| d.runtime).filter(|r| *r > 0) {
            Some(minutes) => format!("{} min", minutes),
            None => "? min".to_string(),
        }
    }

    pub fn poster_url(&self) -> Option<String> {
        card::poster_url(self.base().poster_path.as_deref())
    }

    pub fn backdrop_url(&self) -> Option<String> {
        card::backdrop_url(self.base().backdrop_path.as_deref())
    }

    /// `None` means unknown (partial data), not an empty list.
    pub fn genres(&self) -> Option<&[Genre]> {
        self.detail().map(|d| d.genres.as_slice())
    }

    pub fn top_cast(&self) -> Option<&[CastMember]> {
        self.detail().map(|d| {
            let cast = d.credits.cast.as_slice();
            &cast[..cast.len().min(TOP_CAST)]
        })
    }

    pub fn similar(&self) -> Option<Vec<MovieCard>> {
        self.detail().map(|d| {
            d.similar
                .results
                .iter()
                .take(SIMILAR_SHOWN)
                .map(MovieCard::from)
                .collect()
        })
    }

    pub fn trailer_url(&self) -> Option<String> {
        self.detail()
            .and_then(|d| card::select_trailer(&d.videos.results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FetchError;
    use crate::models::InvalidReason;
    use serde_json::json;
    use std::sync::Arc;

    fn list_movie() -> Movie {
        Movie {
            id: 550,
            title: "Fight Club".to_string(),
            poster_path: Some("/fc.jpg".to_string()),
            backdrop_path: Some("/fc-bg.jpg".to_string()),
            vote_average: 8.4,
            release_date: "1999-10-15".to_string(),
            overview: "Mischief. Mayhem. Soap.".to_string(),
        }
    }

    fn valid_detail() -> DetailFetchResult {
        let cast: Vec<_> = (0..8)
            .map(|i| json!({ "id": i, "name": format!("Actor {i}"), "character": "", "profile_path": null }))
            .collect();
        DetailFetchResult::from_json(json!({
            "id": 550,
            "title": "Fight Club (Detail)",
            "poster_path": "/fc.jpg",
            "backdrop_path": null,
            "vote_average": 8.438,
            "release_date": "1999-10-15",
            "overview": "An insomniac office worker...",
            "runtime": 139,
            "tagline": "Mischief. Mayhem. Soap.",
            "genres": [{ "id": 18, "name": "Drama" }],
            "credits": { "cast": cast },
            "similar": { "results": [] },
            "videos": { "results": [{ "key": "SUXWAEX2jlg", "site": "YouTube", "type": "Trailer" }] }
        }))
    }

    fn data(result: DetailFetchResult) -> QueryState<DetailFetchResult> {
        QueryState::Data(Arc::new(result))
    }

    #[test]
    fn valid_detail_takes_precedence() {
        let view = reconcile(&data(valid_detail()), Some(&list_movie()));
        let DetailView::Ready(page) = view else {
            panic!("expected ready view");
        };
        assert!(!page.partial);
        assert_eq!(page.notice(), None);
        assert_eq!(page.title(), "Fight Club (Detail)");
        assert_eq!(page.runtime_label(), "139 min");
        assert_eq!(page.rating_label(), "8.4");
        assert_eq!(page.top_cast().unwrap().len(), 6);
        assert_eq!(page.similar().unwrap().len(), 0);
        assert_eq!(
            page.trailer_url().as_deref(),
            Some("https://www.youtube.com/watch?v=SUXWAEX2jlg")
        );
        assert_eq!(page.backdrop_url(), None);
    }

    #[test]
    fn invalid_detail_falls_back_to_list_movie() {
        let state = data(DetailFetchResult::Invalid(InvalidReason::MissingVoteAverage));
        let DetailView::Ready(page) = reconcile(&state, Some(&list_movie())) else {
            panic!("expected partial view");
        };
        assert!(page.partial);
        assert_eq!(page.notice(), Some(PARTIAL_NOTICE));
        assert_eq!(page.title(), "Fight Club");
        assert_eq!(page.year_label(), "1999");
        assert_eq!(page.runtime_label(), "? min");
        assert!(page.genres().is_none());
        assert!(page.top_cast().is_none());
        assert!(page.similar().is_none());
        assert!(page.trailer_url().is_none());
        assert_eq!(
            page.backdrop_url().as_deref(),
            Some("https://image.tmdb.org/t/p/original/fc-bg.jpg")
        );
    }

    #[test]
    fn fetch_error_with_fallback_is_partial() {
        let state = QueryState::Error(FetchError::MovieDetails);
        let DetailView::Ready(page) = reconcile(&state, Some(&list_movie())) else {
            panic!("expected partial view");
        };
        assert!(page.partial);
    }

    #[test]
    fn loading_shows_carried_movie_when_available() {
        assert!(matches!(
            reconcile(&QueryState::Loading, Some(&list_movie())),
            DetailView::Ready(DetailPage { partial: true, .. })
        ));
        assert!(matches!(
            reconcile(&QueryState::Loading, None),
            DetailView::Loading
        ));
    }

    #[test]
    fn failure_without_fallback_is_terminal() {
        for state in [
            QueryState::Error(FetchError::MovieDetails),
            data(DetailFetchResult::Invalid(InvalidReason::MissingTitle)),
            QueryState::Idle,
        ] {
            match reconcile(&state, None) {
                DetailView::Failed { message, action } => {
                    assert_eq!(message, FAILURE_MESSAGE);
                    assert_eq!(action, NavAction::Back);
                }
                other => panic!("expected failure, got {:?}", other),
            }
        }
    }
}
