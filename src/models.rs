use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Listing mode selecting which upstream collection is paged through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    Popular,
    TopRated,
    Trending,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Popular, Category::TopRated, Category::Trending];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Popular => "popular",
            Category::TopRated => "top_rated",
            Category::Trending => "trending",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Popular => "Popular",
            Category::TopRated => "Top Rated",
            Category::Trending => "Trending",
        }
    }

    /// Lenient parse used for request parameters: anything unrecognised is `Popular`.
    pub fn from_param(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "popular" => Ok(Category::Popular),
            "top_rated" => Ok(Category::TopRated),
            "trending" => Ok(Category::Trending),
            _ => Err(anyhow::anyhow!(
                "category must be one of 'popular', 'top_rated' or 'trending'"
            )),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cache key of a listing query. Equality covers every field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingKey {
    pub category: Category,
    pub query: String,
    pub page: u32,
}

impl ListingKey {
    pub fn new(category: Category, query: impl Into<String>, page: u32) -> Self {
        Self {
            category,
            query: query.into(),
            page: page.max(1),
        }
    }
}

/// Treats an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// List-form movie as returned by listing and search endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_average: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub release_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overview: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoviePage {
    pub results: Vec<Movie>,
    pub total_pages: u32,
    pub page: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub character: String,
    #[serde(default)]
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Credits {
    #[serde(default, deserialize_with = "null_as_default")]
    pub cast: Vec<CastMember>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimilarMovies {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<Movie>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    #[serde(default, deserialize_with = "null_as_default")]
    pub key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub site: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub video_type: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Videos {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<Video>,
}

/// Detail-form movie: the list form plus the appended credits, similar titles and videos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetail {
    #[serde(flatten)]
    pub movie: Movie,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<Genre>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub credits: Credits,
    #[serde(default, deserialize_with = "null_as_default")]
    pub similar: SimilarMovies,
    #[serde(default, deserialize_with = "null_as_default")]
    pub videos: Videos,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    MissingTitle,
    MissingVoteAverage,
    Malformed(String),
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::MissingTitle => f.write_str("response has no title"),
            InvalidReason::MissingVoteAverage => f.write_str("response has no numeric vote_average"),
            InvalidReason::Malformed(e) => write!(f, "response is malformed: {}", e),
        }
    }
}

/// Outcome of a detail fetch, classified once when the body is decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailFetchResult {
    Valid(MovieDetail),
    Invalid(InvalidReason),
}

impl DetailFetchResult {
    pub fn from_json(body: Value) -> Self {
        let has_title = body
            .get("title")
            .and_then(|t| t.as_str())
            .map(|t| !t.is_empty())
            .unwrap_or(false);
        if !has_title {
            return DetailFetchResult::Invalid(InvalidReason::MissingTitle);
        }
        if !body.get("vote_average").map(Value::is_number).unwrap_or(false) {
            return DetailFetchResult::Invalid(InvalidReason::MissingVoteAverage);
        }
        match serde_json::from_value::<MovieDetail>(body) {
            Ok(detail) => DetailFetchResult::Valid(detail),
            Err(e) => DetailFetchResult::Invalid(InvalidReason::Malformed(e.to_string())),
        }
    }

    pub fn valid(&self) -> Option<&MovieDetail> {
        match self {
            DetailFetchResult::Valid(detail) => Some(detail),
            DetailFetchResult::Invalid(_) => None,
        }
    }
}
