use std::sync::Arc;

use axum_test::TestServer;
use serde_json::json;
use uuid::Uuid;

use cinematch::models::NewRating;
use cinematch::routes::{create_router, AppState};
use cinematch::store::{CatalogStore, MemoryStore};

fn create_test_server(store: &MemoryStore) -> TestServer {
    let state = AppState::new(Arc::new(store.clone()));
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

async fn rate(store: &MemoryStore, user_id: Uuid, movie_id: Uuid, value: i16) {
    store
        .upsert_rating(NewRating {
            user_id,
            movie_id,
            value,
            comment: None,
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_health_check() {
    let store = MemoryStore::new();
    let server = create_test_server(&store);
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_list_movies_with_pagination() {
    let store = MemoryStore::new();
    let drama = store.add_genre("Drama").await;
    for i in 0..5 {
        store
            .add_movie(&format!("Movie {}", i), Some(2000 + i), &[drama.id])
            .await;
    }

    let server = create_test_server(&store);
    let response = server
        .get("/api/v1/movies")
        .add_query_param("page", 1)
        .add_query_param("limit", 2)
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["movies"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["total"], 5);
    assert_eq!(body["pagination"]["total_pages"], 3);

    // Newest release year first
    assert_eq!(body["movies"][0]["release_year"], 2004);
    assert_eq!(body["movies"][1]["release_year"], 2003);
}

#[tokio::test]
async fn test_list_movies_genre_filter() {
    let store = MemoryStore::new();
    let drama = store.add_genre("Drama").await;
    let action = store.add_genre("Action").await;
    store.add_movie("Moonlight", Some(2016), &[drama.id]).await;
    store.add_movie("Mad Max", Some(2015), &[action.id]).await;

    let server = create_test_server(&store);
    let response = server
        .get("/api/v1/movies")
        .add_query_param("genre", "Action")
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let movies = body["movies"].as_array().unwrap();
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0]["title"], "Mad Max");
    assert_eq!(movies[0]["genres"], json!(["Action"]));
}

#[tokio::test]
async fn test_get_movie_by_id() {
    let store = MemoryStore::new();
    let scifi = store.add_genre("Sci-Fi").await;
    let movie = store.add_movie("Arrival", Some(2016), &[scifi.id]).await;

    let server = create_test_server(&store);
    let response = server.get(&format!("/api/v1/movies/{}", movie.id)).await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["title"], "Arrival");
    assert_eq!(body["genres"], json!(["Sci-Fi"]));
}

#[tokio::test]
async fn test_get_movie_not_found() {
    let store = MemoryStore::new();
    let server = create_test_server(&store);

    let response = server
        .get(&format!("/api/v1/movies/{}", Uuid::new_v4()))
        .await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);

    let body: serde_json::Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_rate_movie_and_rerate_overwrites() {
    let store = MemoryStore::new();
    let movie = store.add_movie("Heat", Some(1995), &[]).await;
    let user_id = Uuid::new_v4();

    let server = create_test_server(&store);

    let response = server
        .post("/api/v1/ratings")
        .json(&json!({
            "user_id": user_id,
            "movie_id": movie.id,
            "value": 3,
            "comment": "Decent"
        }))
        .await;
    response.assert_status_ok();
    let first: serde_json::Value = response.json();
    assert_eq!(first["rating"]["value"], 3);

    // Re-rating overwrites rather than duplicating
    let response = server
        .post("/api/v1/ratings")
        .json(&json!({
            "user_id": user_id,
            "movie_id": movie.id,
            "value": 5
        }))
        .await;
    response.assert_status_ok();
    let second: serde_json::Value = response.json();
    assert_eq!(second["rating"]["value"], 5);
    assert_eq!(second["rating"]["id"], first["rating"]["id"]);

    let ratings = store.ratings_by_user(user_id).await.unwrap();
    assert_eq!(ratings.len(), 1);
    assert_eq!(ratings[0].value, 5);
}

#[tokio::test]
async fn test_rate_movie_rejects_out_of_range_value() {
    let store = MemoryStore::new();
    let movie = store.add_movie("Heat", Some(1995), &[]).await;

    let server = create_test_server(&store);
    let response = server
        .post("/api/v1/ratings")
        .json(&json!({
            "user_id": Uuid::new_v4(),
            "movie_id": movie.id,
            "value": 6
        }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rate_unknown_movie_returns_not_found() {
    let store = MemoryStore::new();
    let server = create_test_server(&store);

    let response = server
        .post("/api/v1/ratings")
        .json(&json!({
            "user_id": Uuid::new_v4(),
            "movie_id": Uuid::new_v4(),
            "value": 4
        }))
        .await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recommendations_flow() {
    let store = MemoryStore::new();
    let action = store.add_genre("Action").await;
    let drama = store.add_genre("Drama").await;

    let target = Uuid::new_v4();
    let neighbor = Uuid::new_v4();
    store.subscribe_to_genre(target, action.id).await;

    // Shared history links the two users
    let shared = store.add_movie("Shared", Some(1999), &[drama.id]).await;
    rate(&store, target, shared.id, 5).await;
    rate(&store, neighbor, shared.id, 4).await;

    store.add_movie("Content Pick", Some(2021), &[action.id]).await;
    let collab_pick = store.add_movie("Collab Pick", Some(2018), &[drama.id]).await;
    rate(&store, neighbor, collab_pick.id, 5).await;

    let server = create_test_server(&store);
    let response = server
        .get(&format!("/api/v1/users/{}/recommendations", target))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let movies = body["movies"].as_array().unwrap();
    let titles: Vec<&str> = movies.iter().map(|m| m["title"].as_str().unwrap()).collect();

    assert!(titles.contains(&"Content Pick"));
    assert!(titles.contains(&"Collab Pick"));
    // The shared movie is already rated by the target and never resurfaces
    assert!(!titles.contains(&"Shared"));

    // Genre names come flattened, not as identifiers
    let content = movies
        .iter()
        .find(|m| m["title"] == "Content Pick")
        .unwrap();
    assert_eq!(content["genres"], json!(["Action"]));
}

#[tokio::test]
async fn test_recommendations_respect_limit() {
    let store = MemoryStore::new();
    let action = store.add_genre("Action").await;
    let user = Uuid::new_v4();
    store.subscribe_to_genre(user, action.id).await;

    for i in 0..15 {
        store
            .add_movie(&format!("Movie {}", i), Some(2000 + i), &[action.id])
            .await;
    }

    let server = create_test_server(&store);

    let response = server
        .get(&format!("/api/v1/users/{}/recommendations", user))
        .add_query_param("limit", 3)
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["movies"].as_array().unwrap().len(), 3);

    // Default limit is 10 when unspecified
    let response = server
        .get(&format!("/api/v1/users/{}/recommendations", user))
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["movies"].as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn test_recommendations_empty_for_unknown_user() {
    let store = MemoryStore::new();
    let action = store.add_genre("Action").await;
    store.add_movie("Heat", Some(1995), &[action.id]).await;

    let server = create_test_server(&store);
    let response = server
        .get(&format!("/api/v1/users/{}/recommendations", Uuid::new_v4()))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["movies"].as_array().unwrap().len(), 0);
}
