use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    Genre, Movie, MovieFilter, MoviePage, MovieWithGenres, NewRating, Rating, RATING_RANGE,
};
use crate::store::CatalogStore;

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// `CatalogStore` backed by PostgreSQL.
///
/// Expects the `movies`, `genres`, `movie_genres`, `user_genres`, and
/// `ratings` tables; schema management is handled outside this service.
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Joins genre rows onto the given movies, preserving movie order.
    async fn attach_genres(&self, movies: Vec<Movie>) -> AppResult<Vec<MovieWithGenres>> {
        if movies.is_empty() {
            return Ok(Vec::new());
        }

        #[derive(sqlx::FromRow)]
        struct MembershipRow {
            movie_id: Uuid,
            id: Uuid,
            name: String,
        }

        let movie_ids: Vec<Uuid> = movies.iter().map(|m| m.id).collect();
        let rows: Vec<MembershipRow> = sqlx::query_as(
            r#"
            SELECT mg.movie_id, g.id, g.name
            FROM movie_genres mg
            JOIN genres g ON g.id = mg.genre_id
            WHERE mg.movie_id = ANY($1)
            ORDER BY g.name
            "#,
        )
        .bind(&movie_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_movie: HashMap<Uuid, Vec<Genre>> = HashMap::new();
        for row in rows {
            by_movie.entry(row.movie_id).or_default().push(Genre {
                id: row.id,
                name: row.name,
            });
        }

        Ok(movies
            .into_iter()
            .map(|movie| {
                let genres = by_movie.remove(&movie.id).unwrap_or_default();
                MovieWithGenres { movie, genres }
            })
            .collect())
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn subscribed_genre_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let genre_ids = sqlx::query_scalar(
            "SELECT genre_id FROM user_genres WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(genre_ids)
    }

    async fn ratings_by_user(&self, user_id: Uuid) -> AppResult<Vec<Rating>> {
        let ratings = sqlx::query_as(
            r#"
            SELECT id, user_id, movie_id, value, comment, created_at
            FROM ratings
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ratings)
    }

    async fn genre_ids_for_movies(&self, movie_ids: Vec<Uuid>) -> AppResult<Vec<Uuid>> {
        let genre_ids = sqlx::query_scalar(
            "SELECT DISTINCT genre_id FROM movie_genres WHERE movie_id = ANY($1)",
        )
        .bind(&movie_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(genre_ids)
    }

    async fn movies_matching_genres(
        &self,
        genre_ids: Vec<Uuid>,
        exclude_movie_ids: Vec<Uuid>,
        limit: usize,
    ) -> AppResult<Vec<MovieWithGenres>> {
        let movies: Vec<Movie> = sqlx::query_as(
            r#"
            SELECT DISTINCT m.id, m.title, m.description, m.release_year, m.image_url
            FROM movies m
            JOIN movie_genres mg ON mg.movie_id = m.id
            WHERE mg.genre_id = ANY($1)
              AND m.id <> ALL($2)
            ORDER BY m.release_year DESC NULLS LAST, m.title, m.id
            LIMIT $3
            "#,
        )
        .bind(&genre_ids)
        .bind(&exclude_movie_ids)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        self.attach_genres(movies).await
    }

    async fn ratings_by_overlapping_users(
        &self,
        movie_ids: Vec<Uuid>,
        exclude_user: Uuid,
    ) -> AppResult<Vec<Rating>> {
        let ratings = sqlx::query_as(
            r#"
            SELECT r.id, r.user_id, r.movie_id, r.value, r.comment, r.created_at
            FROM ratings r
            WHERE r.user_id <> $2
              AND r.user_id IN (
                  SELECT user_id FROM ratings
                  WHERE movie_id = ANY($1) AND user_id <> $2
              )
            "#,
        )
        .bind(&movie_ids)
        .bind(exclude_user)
        .fetch_all(&self.pool)
        .await?;

        Ok(ratings)
    }

    async fn movies_liked_by_users(
        &self,
        rater_ids: Vec<Uuid>,
        min_value: i16,
        exclude_user: Uuid,
        limit: usize,
    ) -> AppResult<Vec<MovieWithGenres>> {
        let movies: Vec<Movie> = sqlx::query_as(
            r#"
            SELECT DISTINCT m.id, m.title, m.description, m.release_year, m.image_url
            FROM movies m
            JOIN ratings r ON r.movie_id = m.id
            WHERE r.user_id = ANY($1)
              AND r.value >= $2
              AND NOT EXISTS (
                  SELECT 1 FROM ratings mine
                  WHERE mine.movie_id = m.id AND mine.user_id = $3
              )
            ORDER BY m.release_year DESC NULLS LAST, m.title, m.id
            LIMIT $4
            "#,
        )
        .bind(&rater_ids)
        .bind(min_value)
        .bind(exclude_user)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        self.attach_genres(movies).await
    }

    async fn list_movies(&self, filter: MovieFilter) -> AppResult<MoviePage> {
        let page = filter.page.max(1);
        let offset = (page - 1) * filter.limit;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT m.id)
            FROM movies m
            LEFT JOIN movie_genres mg ON mg.movie_id = m.id
            LEFT JOIN genres g ON g.id = mg.genre_id
            WHERE ($1::text IS NULL OR lower(g.name) = lower($1))
              AND ($2::text IS NULL OR m.title ILIKE '%' || $2 || '%')
            "#,
        )
        .bind(&filter.genre)
        .bind(&filter.search)
        .fetch_one(&self.pool)
        .await?;

        let movies: Vec<Movie> = sqlx::query_as(
            r#"
            SELECT DISTINCT m.id, m.title, m.description, m.release_year, m.image_url
            FROM movies m
            LEFT JOIN movie_genres mg ON mg.movie_id = m.id
            LEFT JOIN genres g ON g.id = mg.genre_id
            WHERE ($1::text IS NULL OR lower(g.name) = lower($1))
              AND ($2::text IS NULL OR m.title ILIKE '%' || $2 || '%')
            ORDER BY m.release_year DESC NULLS LAST, m.title, m.id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&filter.genre)
        .bind(&filter.search)
        .bind(filter.limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        let movies = self.attach_genres(movies).await?;

        Ok(MoviePage {
            movies,
            total: total as u64,
        })
    }

    async fn get_movie(&self, movie_id: Uuid) -> AppResult<Option<MovieWithGenres>> {
        let movie: Option<Movie> = sqlx::query_as(
            "SELECT id, title, description, release_year, image_url FROM movies WHERE id = $1",
        )
        .bind(movie_id)
        .fetch_optional(&self.pool)
        .await?;

        match movie {
            Some(movie) => {
                let mut entries = self.attach_genres(vec![movie]).await?;
                Ok(entries.pop())
            }
            None => Ok(None),
        }
    }

    async fn upsert_rating(&self, new: NewRating) -> AppResult<Rating> {
        let value = new
            .value
            .clamp(*RATING_RANGE.start(), *RATING_RANGE.end());

        let rating = sqlx::query_as(
            r#"
            INSERT INTO ratings (id, user_id, movie_id, value, comment, created_at)
            VALUES ($1, $2, $3, $4, $5, now())
            ON CONFLICT (user_id, movie_id)
            DO UPDATE SET value = EXCLUDED.value, comment = EXCLUDED.comment
            RETURNING id, user_id, movie_id, value, comment, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(new.movie_id)
        .bind(value)
        .bind(&new.comment)
        .fetch_one(&self.pool)
        .await?;

        Ok(rating)
    }
}
