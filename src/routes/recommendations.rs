use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::MovieSummary;
use crate::services::DEFAULT_RECOMMENDATION_LIMIT;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct RecommendationsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub movies: Vec<MovieSummary>,
}

/// Handler for personalized hybrid recommendations.
///
/// Always responds with a (possibly empty) list: the engine degrades store
/// failures to empty results rather than surfacing them.
pub async fn for_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<RecommendationsQuery>,
) -> Json<RecommendationsResponse> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECOMMENDATION_LIMIT)
        .max(1);

    let movies = state.engine.hybrid_recommendations(user_id, limit).await;

    Json(RecommendationsResponse { movies })
}
