//! HTTP routes
//!
//! - `/auth/v1/*`: password grant, current user, logout
//! - `/rest/v1/{table}`: employee rows, scoped to the caller

mod auth;
mod rest;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    // At most 100 requests in flight
    let concurrency_limit = ConcurrencyLimitLayer::new(100);

    Router::new()
        .route("/auth/v1/token", post(auth::token))
        .route("/auth/v1/user", get(auth::user))
        .route("/auth/v1/logout", post(auth::logout))
        .route(
            "/rest/v1/{table}",
            get(rest::list)
                .post(rest::insert)
                .patch(rest::update)
                .delete(rest::delete),
        )
        .layer(concurrency_limit)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
