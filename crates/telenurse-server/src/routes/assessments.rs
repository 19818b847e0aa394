use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

use telenurse_core::models::assessment::Assessment;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AssessmentList {
    pub assessments: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AssessmentDetail {
    pub assessment: Assessment,
}

pub async fn list_assessments(State(state): State<AppState>) -> Result<Json<AssessmentList>, ApiError> {
    let assessments = state.session.list_saved_assessments().await?;
    Ok(Json(AssessmentList { assessments }))
}

pub async fn get_assessment(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<AssessmentDetail>, ApiError> {
    let assessment = state.session.get_assessment(&name).await?;
    Ok(Json(AssessmentDetail { assessment }))
}
