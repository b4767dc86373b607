use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{MovieFilter, MoviePage, MovieWithGenres, NewRating, Rating};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::{create_pool, PgCatalogStore};

/// Read/write access to the movie catalog, genre subscriptions, and ratings.
///
/// The recommendation engine treats this as its only collaborator: every
/// method is a single query against current stored state, and derived values
/// (preference sets, similarity scores) are recomputed from these reads on
/// every request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Genre ids the user explicitly subscribed to.
    async fn subscribed_genre_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>>;

    /// Every rating authored by the user, any value.
    async fn ratings_by_user(&self, user_id: Uuid) -> AppResult<Vec<Rating>>;

    /// Deduplicated genre ids attached to any of the given movies.
    async fn genre_ids_for_movies(&self, movie_ids: Vec<Uuid>) -> AppResult<Vec<Uuid>>;

    /// Movies with at least one membership in `genre_ids`, excluding
    /// `exclude_movie_ids`, newest release year first, at most `limit`.
    async fn movies_matching_genres(
        &self,
        genre_ids: Vec<Uuid>,
        exclude_movie_ids: Vec<Uuid>,
        limit: usize,
    ) -> AppResult<Vec<MovieWithGenres>>;

    /// All ratings authored by users other than `exclude_user` who rated at
    /// least one movie in `movie_ids`. Returns each qualifying author's full
    /// rating set, so similarity unions are computed over complete histories.
    async fn ratings_by_overlapping_users(
        &self,
        movie_ids: Vec<Uuid>,
        exclude_user: Uuid,
    ) -> AppResult<Vec<Rating>>;

    /// Movies rated at or above `min_value` by any of `rater_ids` that carry
    /// no rating at all from `exclude_user`, deduplicated, newest release
    /// year first, at most `limit`.
    async fn movies_liked_by_users(
        &self,
        rater_ids: Vec<Uuid>,
        min_value: i16,
        exclude_user: Uuid,
        limit: usize,
    ) -> AppResult<Vec<MovieWithGenres>>;

    /// Paged catalog listing with optional genre and title filters.
    async fn list_movies(&self, filter: MovieFilter) -> AppResult<MoviePage>;

    /// Fetches a single movie with its genres, or `None` when absent.
    async fn get_movie(&self, movie_id: Uuid) -> AppResult<Option<MovieWithGenres>>;

    /// Creates or overwrites the (user, movie) rating. Values outside 1..=5
    /// are clamped into range.
    async fn upsert_rating(&self, new: NewRating) -> AppResult<Rating>;
}
