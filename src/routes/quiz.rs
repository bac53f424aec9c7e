use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    services::quiz::QuizView,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CompleteQuizRequest {
    #[serde(default)]
    pub tags: Vec<String>,
}

fn quiz_id(path: Result<Path<Uuid>, PathRejection>) -> AppResult<Uuid> {
    path.map(|Path(id)| id)
        .map_err(|_| AppError::Validation("invalid quiz id".to_string()))
}

pub async fn create(State(state): State<AppState>) -> (StatusCode, Json<QuizView>) {
    (StatusCode::CREATED, Json(state.quiz.store().create().await))
}

pub async fn show(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<QuizView>> {
    let id = quiz_id(path)?;
    Ok(Json(state.quiz.store().view(id).await?))
}

/// Finishes the quiz: its tags drive the first recommendation round
pub async fn complete(
    State(state): State<AppState>,
    request_id: RequestId,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<CompleteQuizRequest>, JsonRejection>,
) -> AppResult<Json<QuizView>> {
    let id = quiz_id(path)?;
    let Json(request) = payload?;

    tracing::info!(request_id = %request_id, quiz_id = %id, tags = request.tags.len(), "Completing quiz");
    Ok(Json(state.quiz.complete(id, &request.tags).await?))
}

/// "Show more": another round excluding everything already shown
pub async fn more(
    State(state): State<AppState>,
    request_id: RequestId,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<QuizView>> {
    let id = quiz_id(path)?;

    tracing::info!(request_id = %request_id, quiz_id = %id, "Loading more for quiz");
    Ok(Json(state.quiz.more(id).await?))
}

pub async fn restart(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<QuizView>> {
    let id = quiz_id(path)?;
    Ok(Json(state.quiz.store().restart(id).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<StatusCode> {
    let id = quiz_id(path)?;
    state.quiz.store().remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
