use std::sync::Arc;

use telenurse_session::SessionManager;

/// Shared application state, injected into all route handlers via Axum state.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SessionManager>,
}

impl AppState {
    pub fn new(session: SessionManager) -> Self {
        Self {
            session: Arc::new(session),
        }
    }
}
