//! HBNB API Server
//!
//! REST API over states, cities, users, places, amenities and reviews,
//! backed by either a JSON file or an embedded SQLite database.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod services;
pub mod storage;

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use hbnb_core::Storage;
use std::sync::Arc;
use tower::Layer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }
}

/// The full HTTP application. Trailing slashes are trimmed before routing.
pub fn app(storage: Arc<dyn Storage>) -> NormalizePath<Router> {
    let state = AppState::new(storage);

    let router = Router::new()
        .nest("/api/v1", api_routes())
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), close_storage))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    NormalizePathLayer::trim_trailing_slash().layer(router)
}

fn api_routes() -> Router<AppState> {
    use handlers::{
        amenities, cities, places, places_amenities, places_search, reviews, states, users,
    };

    Router::new()
        .route("/status", get(handlers::status))
        .route("/stats", get(handlers::stats))
        .route("/states", get(states::list).post(states::create))
        .route(
            "/states/:state_id",
            get(states::get).put(states::update).delete(states::delete),
        )
        .route(
            "/states/:state_id/cities",
            get(cities::list).post(cities::create),
        )
        .route(
            "/cities/:city_id",
            get(cities::get).put(cities::update).delete(cities::delete),
        )
        .route(
            "/cities/:city_id/places",
            get(places::list).post(places::create),
        )
        .route("/amenities", get(amenities::list).post(amenities::create))
        .route(
            "/amenities/:amenity_id",
            get(amenities::get)
                .put(amenities::update)
                .delete(amenities::delete),
        )
        .route("/users", get(users::list).post(users::create))
        .route(
            "/users/:user_id",
            get(users::get).put(users::update).delete(users::delete),
        )
        .route(
            "/places/:place_id",
            get(places::get).put(places::update).delete(places::delete),
        )
        .route(
            "/places/:place_id/reviews",
            get(reviews::list).post(reviews::create),
        )
        .route(
            "/places/:place_id/amenities",
            get(places_amenities::list),
        )
        .route(
            "/places/:place_id/amenities/:amenity_id",
            post(places_amenities::link).delete(places_amenities::unlink),
        )
        .route("/places_search", post(places_search::search))
        .route(
            "/reviews/:review_id",
            get(reviews::get).put(reviews::update).delete(reviews::delete),
        )
}

/// Runs each request in its own storage session and releases it once the
/// response is built.
async fn close_storage(State(app): State<AppState>, req: Request, next: Next) -> Response {
    storage::session::scope(async move {
        let response = next.run(req).await;
        if let Err(e) = app.storage.close().await {
            warn!("Failed to close storage: {}", e);
        }
        response
    })
    .await
}
