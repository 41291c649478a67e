//! Route definitions and router construction (C11).

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

fn downloads_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::downloads::enqueue).get(handlers::downloads::list))
        .route("/{id}", get(handlers::downloads::get_status))
        .route("/{id}/logs", get(handlers::downloads::logs))
        .route("/{id}/cancel", post(handlers::downloads::cancel))
        .route("/{id}/retry", post(handlers::downloads::retry))
        .route("/{id}/move", post(handlers::downloads::move_to_destination))
        .route("/media/{id}", get(handlers::media::get).patch(handlers::media::update))
}

fn sandbox_routes() -> Router<AppState> {
    Router::new()
        .route("/yt-dlp", post(handlers::sandbox::yt_dlp))
        .route("/yt-dlp/stream", post(handlers::sandbox::yt_dlp_stream))
}

/// Build the full router: `/api/downloads`, `/api/sandbox`, and `/health`.
#[must_use]
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/downloads", downloads_routes())
        .nest("/api/sandbox", sandbox_routes())
        .route("/health", get(handlers::health::health))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
