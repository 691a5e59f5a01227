//! Welcome and resource routes. Handlers resolve the resource by path segment.

use crate::handlers::resource::{create, delete as delete_handler, list, read, update};
use crate::handlers::welcome::show;
use crate::state::AppState;
use axum::{routing::get, Router};

/// GET /, /api, /api/welcome and CRUD under /api/:resource.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(show))
        .route("/api", get(show))
        .route("/api/welcome", get(show))
        .route("/api/:resource", get(list).post(create))
        .route(
            "/api/:resource/:id",
            get(read).put(update).patch(update).delete(delete_handler),
        )
}
