use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;

use crate::handlers;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/submit_code", post(handlers::submit_code))
        .route("/get_challenges", get(handlers::student_challenges))
        .route(
            "/api/coding-challenges",
            get(handlers::list_challenges).post(handlers::create_challenge),
        )
        .route("/api/coding-challenges/:id", delete(handlers::delete_challenge))
        .route("/api/submissions", get(handlers::list_submissions))
        .route("/status", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_report))
}
