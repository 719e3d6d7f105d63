//! HTTP route handlers for the portal.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness (image dir, reference files)
//!
//! GET  /                       - Redirect to the caller's landing page
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! POST /auth/logout            - Logout action
//!
//! # Admin (admin role only)
//! GET  /admin                  - Upload panel and current reference data
//! POST /admin/upload/{slot}    - Replace one reference file (multipart)
//! POST /admin/reload           - Re-read the reference files
//!
//! # Orders (employee role)
//! GET  /orders/new             - Order form
//! POST /orders                 - Submit an order (multipart)
//!
//! # Photos (any logged-in user)
//! GET  /photos/{filename}      - Saved photo preview
//! ```

pub mod admin;
pub mod auth;
pub mod health;
pub mod home;
pub mod orders;
pub mod photos;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::index))
        .route("/upload/{slot}", post(admin::upload))
        .route("/reload", post(admin::reload))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::submit))
        .route("/new", get(orders::new_order))
}

/// Create all routes for the portal.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/", get(home::home))
        .nest("/auth", auth_routes())
        .nest("/admin", admin_routes())
        .nest("/orders", order_routes())
        .route("/photos/{filename}", get(photos::show))
}
