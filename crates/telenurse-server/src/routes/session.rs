use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use telenurse_core::models::assessment::{InputMode, Language};
use telenurse_core::models::message::Message;
use telenurse_core::models::session::SessionStatus;
use telenurse_session::state::FinishedAssessment;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub patient_id: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub input_mode: InputMode,
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub greeting: Message,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub messages: [Message; 2],
}

pub async fn status(State(state): State<AppState>) -> Json<SessionStatus> {
    Json(state.session.status())
}

pub async fn start(
    State(state): State<AppState>,
    Json(req): Json<StartRequest>,
) -> Result<Json<StartResponse>, ApiError> {
    let greeting = state
        .session
        .start(&req.patient_id, req.language, req.input_mode)
        .await?;
    Ok(Json(StartResponse { greeting }))
}

pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    let messages = state.session.send_message(&req.message).await?;
    Ok(Json(SendMessageResponse { messages }))
}

pub async fn finish(State(state): State<AppState>) -> Result<Json<FinishedAssessment>, ApiError> {
    Ok(Json(state.session.finish().await?))
}

pub async fn cancel(State(state): State<AppState>) -> Result<Json<SessionStatus>, ApiError> {
    state.session.cancel()?;
    Ok(Json(state.session.status()))
}

pub async fn reset(State(state): State<AppState>) -> Result<Json<SessionStatus>, ApiError> {
    state.session.reset()?;
    Ok(Json(state.session.status()))
}
