use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::state::AppState;

/// Logs every API request as one `api_request` event.
///
/// Session routes also carry the patient and the phase the session ended
/// up in. Bodies are never logged; they carry patient data.
pub async fn audit_log(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    if is_session_route(&path) {
        let session = state.session.status();
        tracing::info!(
            method = %method,
            path = %path,
            status,
            elapsed_ms,
            patient_id = %session.patient_id,
            phase = session.phase.as_str(),
            "api_request"
        );
    } else {
        tracing::info!(method = %method, path = %path, status, elapsed_ms, "api_request");
    }

    response
}

fn is_session_route(path: &str) -> bool {
    matches!(
        path,
        "/api/assessment_status"
            | "/api/start_assessment"
            | "/api/send_message"
            | "/api/finish_assessment"
            | "/api/cancel_assessment"
            | "/api/reset_assessment"
    )
}
