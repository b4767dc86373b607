use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{NewRating, Rating, RATING_RANGE};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct RateMovieRequest {
    pub user_id: Uuid,
    pub movie_id: Uuid,
    pub value: i16,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RatingResponse {
    pub rating: Rating,
}

/// Handler for creating or overwriting a rating.
///
/// Upsert semantics: a second rating by the same user for the same movie
/// replaces the first, it never duplicates.
pub async fn rate_movie(
    State(state): State<AppState>,
    Json(request): Json<RateMovieRequest>,
) -> AppResult<Json<RatingResponse>> {
    if !RATING_RANGE.contains(&request.value) {
        return Err(AppError::InvalidInput(format!(
            "Rating value must be between {} and {}",
            RATING_RANGE.start(),
            RATING_RANGE.end()
        )));
    }

    state
        .store
        .get_movie(request.movie_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Movie {} not found", request.movie_id)))?;

    let rating = state
        .store
        .upsert_rating(NewRating {
            user_id: request.user_id,
            movie_id: request.movie_id,
            value: request.value,
            comment: request.comment,
        })
        .await?;

    Ok(Json(RatingResponse { rating }))
}
