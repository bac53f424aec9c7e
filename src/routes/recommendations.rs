use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{ExclusionSet, MergeMode, ResolvedItem, Session},
    services::{accumulator, RoundOutcome},
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub message: Option<String>,
    #[serde(default)]
    pub excluded_titles: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub kind: &'static str,
    pub message: String,
    pub movies: Vec<ResolvedItem>,
    pub original_query: String,
}

/// One chat turn: free-text intent in, resolved movies out
pub async fn recommend(
    State(state): State<AppState>,
    request_id: RequestId,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<RecommendationResponse>> {
    let request = read_request(&headers, &body)?;

    let message = request
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::Validation("message required".to_string()))?;

    let exclusions: ExclusionSet = request.excluded_titles.into_iter().collect();

    tracing::info!(
        request_id = %request_id,
        excluded = exclusions.len(),
        "Recommendation request"
    );

    let outcome = state
        .pipeline
        .run_round(message, exclusions.titles())
        .await?;
    let kind = outcome.kind();

    let (message_text, movies) = match outcome {
        RoundOutcome::Clarification { question } => (question, Vec::new()),
        RoundOutcome::Recommendations { summary, items } => {
            let session = accumulator::merge(Session::new(), items, MergeMode::Replace);
            (summary, session.accumulated_items)
        }
    };

    tracing::info!(
        request_id = %request_id,
        kind,
        movies = movies.len(),
        "Recommendation request served"
    );

    Ok(Json(RecommendationResponse {
        kind,
        message: message_text,
        movies,
        original_query: message.to_string(),
    }))
}

/// Decodes the body, reading an absent or non-JSON body as an empty request
/// so it fails on the missing `message` like `{}` does
fn read_request(headers: &HeaderMap, body: &Bytes) -> AppResult<RecommendationRequest> {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            let mime = value.split(';').next().unwrap_or_default().trim();
            mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")
        })
        .unwrap_or(false);

    if !is_json || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RecommendationRequest::default());
    }

    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("invalid JSON body: {}", e)))
}
