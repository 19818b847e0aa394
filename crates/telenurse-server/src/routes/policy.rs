use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemPrompt {
    pub system_prompt: String,
}

pub async fn get_policy(State(state): State<AppState>) -> Json<SystemPrompt> {
    Json(SystemPrompt {
        system_prompt: state.session.policy().to_string(),
    })
}

pub async fn update_policy(
    State(state): State<AppState>,
    Json(req): Json<SystemPrompt>,
) -> Result<Json<SystemPrompt>, ApiError> {
    state.session.update_policy(&req.system_prompt).await?;
    Ok(Json(req))
}
