use crate::models::{Movie, Video};

pub const POSTER_BASE: &str = "https://image.tmdb.org/t/p/w500";
pub const BACKDROP_BASE: &str = "https://image.tmdb.org/t/p/original";
const YOUTUBE_WATCH: &str = "https://www.youtube.com/watch?v=";

/// Summary of a list-form movie as rendered in grids.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieCard {
    pub id: i64,
    pub title: String,
    pub year: Option<String>,
    pub rating: String,
    pub poster_url: Option<String>,
    pub overview: String,
}

impl From<&Movie> for MovieCard {
    fn from(movie: &Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            year: extract_year(&movie.release_date),
            rating: format_rating(movie.vote_average),
            poster_url: poster_url(movie.poster_path.as_deref()),
            overview: movie.overview.clone(),
        }
    }
}

pub fn poster_url(path: Option<&str>) -> Option<String> {
    path.map(|p| format!("{POSTER_BASE}{p}"))
}

pub fn backdrop_url(path: Option<&str>) -> Option<String> {
    path.map(|p| format!("{BACKDROP_BASE}{p}"))
}

pub fn format_rating(vote_average: f64) -> String {
    format!("{:.1}", vote_average)
}

/// Year part of an ISO date; `None` for an empty date.
pub fn extract_year(date: &str) -> Option<String> {
    date.split('-')
        .next()
        .filter(|y| !y.is_empty())
        .map(|s| s.to_string())
}

/// First YouTube trailer or teaser, in upstream order.
pub fn select_trailer(videos: &[Video]) -> Option<String> {
    videos
        .iter()
        .find(|v| v.site == "YouTube" && (v.video_type == "Trailer" || v.video_type == "Teaser"))
        .map(|v| format!("{YOUTUBE_WATCH}{}", v.key))
}
