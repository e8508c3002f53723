pub mod root;
pub mod song;

use axum::{Router, routing::get};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::controllers::SongController;
use crate::error::{method_not_allowed_fallback, not_found_fallback, panic_response};
pub use root::health_check_route;
pub use song::song_routes;

/// Shared by every handler; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub songs: SongController,
    pub max_page_limit: i64,
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check_route))
        .nest("/api", song_routes())
        .fallback(not_found_fallback)
        .method_not_allowed_fallback(method_not_allowed_fallback)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
