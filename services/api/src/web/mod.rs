pub mod auth;
pub mod middleware;
pub mod rest;
pub mod state;

pub use auth::login_handler;
pub use middleware::{require_auth, AuthenticatedUser};
pub use rest::{
    download_paper_handler, generate_paper_handler, list_subjects_handler, list_topics_handler,
};

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use state::AppState;
use std::sync::Arc;

/// Builds the API router. Every route except `/login` requires a bearer token.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new().route("/login", post(login_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/subjects", get(list_subjects_handler))
        .route("/topics", get(list_topics_handler))
        .route("/generate", post(generate_paper_handler))
        .route("/download/{paper_id}", get(download_paper_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state)
}
