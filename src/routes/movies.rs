use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{MovieFilter, MovieSummary};

use super::AppState;

const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Deserialize)]
pub struct ListMoviesQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub genre: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub total: u64,
    pub page: usize,
    pub limit: usize,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct MovieListResponse {
    pub movies: Vec<MovieSummary>,
    pub pagination: Pagination,
}

/// Handler for paged catalog listings with optional genre/title filters
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListMoviesQuery>,
) -> AppResult<Json<MovieListResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1);

    let result = state
        .store
        .list_movies(MovieFilter {
            genre: query.genre,
            search: query.search,
            page,
            limit,
        })
        .await?;

    let total_pages = result.total.div_ceil(limit as u64);
    let movies = result.movies.into_iter().map(MovieSummary::from).collect();

    Ok(Json(MovieListResponse {
        movies,
        pagination: Pagination {
            total: result.total,
            page,
            limit,
            total_pages,
        },
    }))
}

/// Handler for fetching a single movie with its genre names
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MovieSummary>> {
    let movie = state
        .store
        .get_movie(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Movie {} not found", id)))?;

    Ok(Json(MovieSummary::from(movie)))
}
