use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use tracing::{info, warn};
use uuid::Uuid;

use super::AppState;
use crate::error::{ApiError, method_not_allowed_fallback};
use crate::models::song::{Song, SongQuery};

pub fn song_routes() -> Router<AppState> {
    Router::new()
        .route("/add_song", post(add_song_route))
        .route("/find_song/{id}", get(find_song_route))
        .route("/view_song", get(view_songs_route))
        .route("/view_song_with_filter", get(view_songs_with_filter_route))
        .route("/update_song/{id}", put(update_song_route))
        .route("/delete_song/{id}", delete(delete_song_route))
        .method_not_allowed_fallback(method_not_allowed_fallback)
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|e| {
        warn!("Invalid UUID format {:?}: {}", raw, e);
        ApiError::invalid_id()
    })
}

/// An empty body decodes to `None`; anything else must be a JSON song.
fn parse_body(body: &Bytes) -> Result<Option<Song>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| ApiError::BadRequest(format!("Error parsing request body: {}", e)))
}

pub async fn add_song_route(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Song>), ApiError> {
    let song = parse_body(&body)?;
    let created = state
        .songs
        .create_song(song)
        .await
        .map_err(|e| ApiError::from_song("Failed to create song", e))?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn find_song_route(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Song>, ApiError> {
    let id = parse_id(&id)?;
    let song = state
        .songs
        .get_song_by_id(id)
        .await
        .map_err(|e| ApiError::from_song("Failed to fetch song", e))?;
    Ok(Json(song))
}

pub async fn view_songs_route(State(state): State<AppState>) -> Result<Json<Vec<Song>>, ApiError> {
    let songs = state
        .songs
        .get_all_songs()
        .await
        .map_err(|e| ApiError::from_song("Failed to fetch all songs", e))?;
    Ok(Json(songs))
}

pub async fn view_songs_with_filter_route(
    State(state): State<AppState>,
    query: Result<Query<SongQuery>, QueryRejection>,
) -> Result<Json<Vec<Song>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let (filter, page) = query.into_parts(state.max_page_limit);

    info!(
        "Received filter parameters: groupName={}, text={}, genre={}, link={}, page={}, limit={}",
        filter.group_name, filter.text, filter.genre, filter.link, page.page, page.limit
    );

    if filter.is_empty() {
        return view_songs_route(State(state)).await;
    }

    let songs = state
        .songs
        .get_filtered_songs(&filter, page)
        .await
        .map_err(|e| ApiError::from_song("Failed to fetch filtered songs", e))?;
    Ok(Json(songs))
}

pub async fn update_song_route(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Song>, ApiError> {
    let id = parse_id(&id)?;
    let song = parse_body(&body)?.map(|song| Song { id, ..song });
    let updated = state
        .songs
        .update_song(song)
        .await
        .map_err(|e| ApiError::from_song("Failed to update song", e))?;
    Ok(Json(updated))
}

pub async fn delete_song_route(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state
        .songs
        .delete_song(id)
        .await
        .map_err(|e| ApiError::from_song("Failed to delete song", e))?;
    Ok(StatusCode::NO_CONTENT)
}
