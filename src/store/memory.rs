use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    newest_first, Genre, Movie, MovieFilter, MoviePage, MovieWithGenres, NewRating, Rating,
    RATING_RANGE,
};
use crate::store::CatalogStore;

/// In-memory catalog backed by `HashMap`s behind a `tokio::sync::RwLock`.
///
/// Used by tests and local development; `PgCatalogStore` is the production
/// implementation. Ordering mirrors the Postgres queries (`newest_first`)
/// so the two are interchangeable.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    movies: HashMap<Uuid, Movie>,
    genres: HashMap<Uuid, Genre>,
    /// movie id -> genre ids
    movie_genres: HashMap<Uuid, Vec<Uuid>>,
    /// user id -> subscribed genre ids
    subscriptions: HashMap<Uuid, Vec<Uuid>>,
    /// (user id, movie id) -> rating
    ratings: HashMap<(Uuid, Uuid), Rating>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a genre to the catalog and returns it.
    pub async fn add_genre(&self, name: &str) -> Genre {
        let genre = Genre {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        let mut inner = self.inner.write().await;
        inner.genres.insert(genre.id, genre.clone());
        genre
    }

    /// Adds a movie with the given genre memberships and returns it.
    pub async fn add_movie(
        &self,
        title: &str,
        release_year: Option<i32>,
        genre_ids: &[Uuid],
    ) -> Movie {
        let movie = Movie {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: None,
            release_year,
            image_url: None,
        };
        let mut inner = self.inner.write().await;
        inner.movies.insert(movie.id, movie.clone());
        inner.movie_genres.insert(movie.id, genre_ids.to_vec());
        movie
    }

    /// Records an explicit genre subscription for the user.
    pub async fn subscribe_to_genre(&self, user_id: Uuid, genre_id: Uuid) {
        let mut inner = self.inner.write().await;
        let subscribed = inner.subscriptions.entry(user_id).or_default();
        if !subscribed.contains(&genre_id) {
            subscribed.push(genre_id);
        }
    }
}

impl MemoryStoreInner {
    fn with_genres(&self, movie: &Movie) -> MovieWithGenres {
        let genres = self
            .movie_genres
            .get(&movie.id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.genres.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();

        MovieWithGenres {
            movie: movie.clone(),
            genres,
        }
    }

    fn collect_sorted(&self, mut movies: Vec<Movie>) -> Vec<MovieWithGenres> {
        movies.sort_by(newest_first);
        movies.iter().map(|m| self.with_genres(m)).collect()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn subscribed_genre_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let inner = self.inner.read().await;
        Ok(inner.subscriptions.get(&user_id).cloned().unwrap_or_default())
    }

    async fn ratings_by_user(&self, user_id: Uuid) -> AppResult<Vec<Rating>> {
        let inner = self.inner.read().await;
        Ok(inner
            .ratings
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn genre_ids_for_movies(&self, movie_ids: Vec<Uuid>) -> AppResult<Vec<Uuid>> {
        let inner = self.inner.read().await;
        let mut seen = HashSet::new();
        let mut genre_ids = Vec::new();
        for movie_id in movie_ids {
            for genre_id in inner.movie_genres.get(&movie_id).into_iter().flatten() {
                if seen.insert(*genre_id) {
                    genre_ids.push(*genre_id);
                }
            }
        }
        Ok(genre_ids)
    }

    async fn movies_matching_genres(
        &self,
        genre_ids: Vec<Uuid>,
        exclude_movie_ids: Vec<Uuid>,
        limit: usize,
    ) -> AppResult<Vec<MovieWithGenres>> {
        let wanted: HashSet<Uuid> = genre_ids.into_iter().collect();
        let excluded: HashSet<Uuid> = exclude_movie_ids.into_iter().collect();

        let inner = self.inner.read().await;
        let matching: Vec<Movie> = inner
            .movies
            .values()
            .filter(|m| !excluded.contains(&m.id))
            .filter(|m| {
                inner
                    .movie_genres
                    .get(&m.id)
                    .is_some_and(|ids| ids.iter().any(|id| wanted.contains(id)))
            })
            .cloned()
            .collect();

        let mut results = inner.collect_sorted(matching);
        results.truncate(limit);
        Ok(results)
    }

    async fn ratings_by_overlapping_users(
        &self,
        movie_ids: Vec<Uuid>,
        exclude_user: Uuid,
    ) -> AppResult<Vec<Rating>> {
        let overlap: HashSet<Uuid> = movie_ids.into_iter().collect();

        let inner = self.inner.read().await;
        let candidates: HashSet<Uuid> = inner
            .ratings
            .values()
            .filter(|r| r.user_id != exclude_user && overlap.contains(&r.movie_id))
            .map(|r| r.user_id)
            .collect();

        Ok(inner
            .ratings
            .values()
            .filter(|r| candidates.contains(&r.user_id))
            .cloned()
            .collect())
    }

    async fn movies_liked_by_users(
        &self,
        rater_ids: Vec<Uuid>,
        min_value: i16,
        exclude_user: Uuid,
        limit: usize,
    ) -> AppResult<Vec<MovieWithGenres>> {
        let raters: HashSet<Uuid> = rater_ids.into_iter().collect();

        let inner = self.inner.read().await;
        let rated_by_target: HashSet<Uuid> = inner
            .ratings
            .values()
            .filter(|r| r.user_id == exclude_user)
            .map(|r| r.movie_id)
            .collect();

        let liked: HashSet<Uuid> = inner
            .ratings
            .values()
            .filter(|r| raters.contains(&r.user_id) && r.value >= min_value)
            .map(|r| r.movie_id)
            .filter(|movie_id| !rated_by_target.contains(movie_id))
            .collect();

        let matching: Vec<Movie> = liked
            .iter()
            .filter_map(|id| inner.movies.get(id).cloned())
            .collect();

        let mut results = inner.collect_sorted(matching);
        results.truncate(limit);
        Ok(results)
    }

    async fn list_movies(&self, filter: MovieFilter) -> AppResult<MoviePage> {
        let inner = self.inner.read().await;

        let genre_ids: Option<HashSet<Uuid>> = filter.genre.as_ref().map(|name| {
            inner
                .genres
                .values()
                .filter(|g| g.name.eq_ignore_ascii_case(name))
                .map(|g| g.id)
                .collect()
        });
        let search = filter.search.as_ref().map(|s| s.to_lowercase());

        let matching: Vec<Movie> = inner
            .movies
            .values()
            .filter(|m| match &genre_ids {
                Some(wanted) => inner
                    .movie_genres
                    .get(&m.id)
                    .is_some_and(|ids| ids.iter().any(|id| wanted.contains(id))),
                None => true,
            })
            .filter(|m| match &search {
                Some(needle) => m.title.to_lowercase().contains(needle),
                None => true,
            })
            .cloned()
            .collect();

        let total = matching.len() as u64;
        let page = filter.page.max(1);
        let sorted = inner.collect_sorted(matching);
        let movies = sorted
            .into_iter()
            .skip((page - 1) * filter.limit)
            .take(filter.limit)
            .collect();

        Ok(MoviePage { movies, total })
    }

    async fn get_movie(&self, movie_id: Uuid) -> AppResult<Option<MovieWithGenres>> {
        let inner = self.inner.read().await;
        Ok(inner.movies.get(&movie_id).map(|m| inner.with_genres(m)))
    }

    async fn upsert_rating(&self, new: NewRating) -> AppResult<Rating> {
        let value = new
            .value
            .clamp(*RATING_RANGE.start(), *RATING_RANGE.end());

        let mut inner = self.inner.write().await;
        let key = (new.user_id, new.movie_id);
        let rating = match inner.ratings.get(&key) {
            // Overwrite in place, keeping identity and creation time
            Some(existing) => Rating {
                value,
                comment: new.comment,
                ..existing.clone()
            },
            None => Rating {
                id: Uuid::new_v4(),
                user_id: new.user_id,
                movie_id: new.movie_id,
                value,
                comment: new.comment,
                created_at: Utc::now(),
            },
        };
        inner.ratings.insert(key, rating.clone());
        Ok(rating)
    }
}
