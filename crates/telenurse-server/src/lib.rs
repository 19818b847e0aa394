//! telenurse-server
//!
//! HTTP status and control surface for the interview session.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::Router;
use axum::middleware as axum_mw;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};

use state::AppState;

/// Interview policy used when none has been saved yet.
pub const DEFAULT_POLICY: &str = include_str!("../assets/interview-policy.md");

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        // Session
        .route("/api/assessment_status", get(routes::session::status))
        .route("/api/start_assessment", post(routes::session::start))
        .route("/api/send_message", post(routes::session::send_message))
        .route("/api/finish_assessment", post(routes::session::finish))
        .route("/api/cancel_assessment", post(routes::session::cancel))
        .route("/api/reset_assessment", post(routes::session::reset))
        // Saved assessments
        .route(
            "/api/get_saved_assessments",
            get(routes::assessments::list_assessments),
        )
        .route(
            "/api/assessment/{name}",
            get(routes::assessments::get_assessment),
        )
        // Interview policy
        .route("/api/get_system_prompt", get(routes::policy::get_policy))
        .route(
            "/api/update_system_prompt",
            post(routes::policy::update_policy),
        )
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::audit::audit_log,
        ))
        .layer(cors)
        .with_state(state)
}
