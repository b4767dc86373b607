use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// Lowest rating value counted as a positive signal (four stars and up).
pub const MIN_POSITIVE_RATING: i16 = 4;

/// Valid star-rating range, inclusive.
pub const RATING_RANGE: std::ops::RangeInclusive<i16> = 1..=5;

/// A movie genre
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Genre {
    pub id: Uuid,
    pub name: String,
}

/// A movie in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Movie {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub release_year: Option<i32>,
    pub image_url: Option<String>,
}

/// A movie joined with its genre memberships
#[derive(Debug, Clone, PartialEq)]
pub struct MovieWithGenres {
    pub movie: Movie,
    pub genres: Vec<Genre>,
}

/// Presentation shape for a movie: descriptive attributes plus a flattened
/// list of genre names. This is the contract the HTTP layer returns for
/// catalog listings and recommendations alike.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieSummary {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub release_year: Option<i32>,
    pub image_url: Option<String>,
    pub genres: Vec<String>,
}

impl From<MovieWithGenres> for MovieSummary {
    fn from(entry: MovieWithGenres) -> Self {
        Self {
            id: entry.movie.id,
            title: entry.movie.title,
            description: entry.movie.description,
            release_year: entry.movie.release_year,
            image_url: entry.movie.image_url,
            genres: entry.genres.into_iter().map(|g| g.name).collect(),
        }
    }
}

/// A star rating authored by a user for a movie.
/// Unique per (user, movie) pair; re-rating overwrites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Rating {
    pub id: Uuid,
    pub user_id: Uuid,
    pub movie_id: Uuid,
    pub value: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating or overwriting a rating
#[derive(Debug, Clone)]
pub struct NewRating {
    pub user_id: Uuid,
    pub movie_id: Uuid,
    pub value: i16,
    pub comment: Option<String>,
}

/// Similarity of another user to the target user, derived from
/// rating overlap. Score lies in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSimilarity {
    pub user_id: Uuid,
    pub score: f64,
}

/// Filters and paging for catalog listings
#[derive(Debug, Clone, Default)]
pub struct MovieFilter {
    /// Case-insensitive genre name the movie must belong to
    pub genre: Option<String>,
    /// Case-insensitive substring of the title
    pub search: Option<String>,
    /// 1-based page number
    pub page: usize,
    /// Page size
    pub limit: usize,
}

/// One page of catalog results with the total match count
#[derive(Debug, Clone)]
pub struct MoviePage {
    pub movies: Vec<MovieWithGenres>,
    pub total: u64,
}

/// Catalog display order: newest release year first, unknown years last.
/// Ties break on title then id so repeated queries are stable.
pub fn newest_first(a: &Movie, b: &Movie) -> Ordering {
    b.release_year
        .cmp(&a.release_year)
        .then_with(|| a.title.cmp(&b.title))
        .then_with(|| a.id.cmp(&b.id))
}
