use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{MovieSummary, Rating, UserSimilarity, MIN_POSITIVE_RATING};
use crate::services::similarity;
use crate::store::CatalogStore;

/// How many results a recommendation request yields when the caller
/// doesn't specify a limit.
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 10;

/// Size of the neighbor set used for collaborative filtering.
pub const TOP_SIMILAR_USERS: usize = 5;

/// Generates personalized movie recommendations.
///
/// Combines two strategies over the catalog store:
/// - content-based: unrated movies matching the user's preferred genres
///   (explicit subscriptions plus genres of movies they rated highly)
/// - collaborative: movies rated highly by the most similar other users,
///   where similarity is the Jaccard index of rated-movie sets
///
/// All derived state is recomputed from the store on every call; nothing is
/// cached between requests. The public recommenders never return an error:
/// store failures degrade to an empty list (the HTTP layer depends on this),
/// while "not enough data to recommend" is an ordinary empty result.
#[derive(Clone)]
pub struct RecommendationEngine {
    store: Arc<dyn CatalogStore>,
}

impl RecommendationEngine {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Derives the user's preferred genre set: explicit subscriptions
    /// unioned with the genres of movies they rated at four stars or above.
    pub async fn preferred_genres(&self, user_id: Uuid) -> AppResult<HashSet<Uuid>> {
        let ratings = self.store.ratings_by_user(user_id).await?;
        self.preferred_genres_from(user_id, &ratings).await
    }

    async fn preferred_genres_from(
        &self,
        user_id: Uuid,
        ratings: &[Rating],
    ) -> AppResult<HashSet<Uuid>> {
        let subscribed = self.store.subscribed_genre_ids(user_id).await?;

        let liked_movies: Vec<Uuid> = ratings
            .iter()
            .filter(|r| r.value >= MIN_POSITIVE_RATING)
            .map(|r| r.movie_id)
            .collect();

        let mut preferred: HashSet<Uuid> = subscribed.into_iter().collect();
        if !liked_movies.is_empty() {
            let implicit = self.store.genre_ids_for_movies(liked_movies).await?;
            preferred.extend(implicit);
        }

        Ok(preferred)
    }

    /// Content-based recommendations: up to `limit` unrated movies matching
    /// the user's preferred genres, newest release year first.
    ///
    /// Fails soft: a store error yields an empty list.
    pub async fn recommendations_for_user(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Vec<MovieSummary> {
        match self.try_content_based(user_id, limit).await {
            Ok(movies) => movies,
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %e,
                    "Content-based recommendation failed, returning empty list"
                );
                Vec::new()
            }
        }
    }

    async fn try_content_based(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> AppResult<Vec<MovieSummary>> {
        let ratings = self.store.ratings_by_user(user_id).await?;
        let preferred = self.preferred_genres_from(user_id, &ratings).await?;

        // No subscriptions and no high ratings: the genre filter matches
        // nothing, which is a valid empty result rather than an error
        if preferred.is_empty() {
            return Ok(Vec::new());
        }

        let already_rated: Vec<Uuid> = ratings.iter().map(|r| r.movie_id).collect();
        let movies = self
            .store
            .movies_matching_genres(preferred.into_iter().collect(), already_rated, limit)
            .await?;

        Ok(movies.into_iter().map(MovieSummary::from).collect())
    }

    /// Ranks all other users by Jaccard similarity of rated-movie sets,
    /// descending. A target user with no ratings yields an empty ranking.
    pub async fn rank_similar_users(&self, user_id: Uuid) -> AppResult<Vec<UserSimilarity>> {
        let ratings = self.store.ratings_by_user(user_id).await?;
        if ratings.is_empty() {
            return Ok(Vec::new());
        }

        let target_movies: HashSet<Uuid> = ratings.iter().map(|r| r.movie_id).collect();
        let overlap_ratings = self
            .store
            .ratings_by_overlapping_users(target_movies.iter().copied().collect(), user_id)
            .await?;

        let mut candidates: HashMap<Uuid, HashSet<Uuid>> = HashMap::new();
        for rating in overlap_ratings {
            candidates
                .entry(rating.user_id)
                .or_default()
                .insert(rating.movie_id);
        }

        Ok(similarity::rank_by_overlap(&target_movies, candidates))
    }

    /// Collaborative recommendations: up to `limit` movies rated highly by
    /// the top `TOP_SIMILAR_USERS` most similar users, excluding everything
    /// the target user has already rated.
    ///
    /// Fails soft: a store error yields an empty list.
    pub async fn collaborative_recommendations(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Vec<MovieSummary> {
        match self.try_collaborative(user_id, limit).await {
            Ok(movies) => movies,
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %e,
                    "Collaborative recommendation failed, returning empty list"
                );
                Vec::new()
            }
        }
    }

    async fn try_collaborative(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> AppResult<Vec<MovieSummary>> {
        let ranked = self.rank_similar_users(user_id).await?;
        if ranked.is_empty() {
            return Ok(Vec::new());
        }

        let neighbors: Vec<Uuid> = ranked
            .iter()
            .take(TOP_SIMILAR_USERS)
            .map(|s| s.user_id)
            .collect();

        // The exclusion is keyed on the target's own ratings regardless of
        // which neighbor contributed the qualifying high rating
        let movies = self
            .store
            .movies_liked_by_users(neighbors, MIN_POSITIVE_RATING, user_id, limit)
            .await?;

        Ok(movies.into_iter().map(MovieSummary::from).collect())
    }

    /// Hybrid recommendations: the deduplicated union of the content-based
    /// and collaborative lists, content-based first, truncated to `limit`.
    ///
    /// The two inner recommenders run concurrently and each degrades to an
    /// empty list on failure, so this always returns a (possibly empty) list.
    pub async fn hybrid_recommendations(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Vec<MovieSummary> {
        let (content_based, collaborative) = tokio::join!(
            self.recommendations_for_user(user_id, limit),
            self.collaborative_recommendations(user_id, limit),
        );

        tracing::debug!(
            user_id = %user_id,
            content_based = content_based.len(),
            collaborative = collaborative.len(),
            "Merging recommendation lists"
        );

        // First occurrence wins, so content-based ordering takes priority
        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        for movie in content_based.into_iter().chain(collaborative) {
            if seen.insert(movie.id) {
                merged.push(movie);
            }
        }

        merged.truncate(limit);
        merged
    }
}
