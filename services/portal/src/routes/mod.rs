//! Portal service routes

pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod public;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
};

use crate::middleware::route_guard;
use crate::state::AppState;

/// Create the router for the portal service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(public::health_check))
        .route("/api/inquiries", post(public::create_inquiry))
        .route("/api/newsletter", post(public::subscribe_newsletter))
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/profile", patch(auth::update_profile))
        .route("/api/dashboard", get(dashboard::overview))
        .route(
            "/api/dashboard/enrollments/:id/attendance",
            get(dashboard::enrollment_attendance),
        )
        .nest("/api/admin", admin::router())
        .layer(from_fn_with_state(state.clone(), route_guard))
        .with_state(state)
}
