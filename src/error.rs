use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    /// The generative model call failed (network, quota, credentials, empty reply)
    #[error("Generation error: {0}")]
    Generation(String),

    /// The generator replied, but not with the shape we asked for
    #[error("Format error: {reason}")]
    Format { raw_text: String, reason: String },

    #[error("Catalog lookup error: {0}")]
    CatalogLookup(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn format(raw_text: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Format {
            raw_text: raw_text.into(),
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::CatalogLookup(_) | AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
            AppError::Generation(_)
            | AppError::Format { .. }
            | AppError::Cache(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(self) -> Value {
        let mut body = Map::new();
        match self {
            AppError::Validation(msg) | AppError::NotFound(msg) | AppError::Conflict(msg) => {
                body.insert("error".into(), json!(msg));
            }
            AppError::Generation(details) => {
                body.insert("error".into(), json!("Failed to generate recommendations"));
                body.insert("details".into(), json!(details));
            }
            AppError::Format { raw_text, reason } => {
                body.insert("error".into(), json!("Failed to parse AI response"));
                body.insert("details".into(), json!(reason));
                body.insert("aiResponse".into(), json!(raw_text));
            }
            other => {
                body.insert("error".into(), json!(other.to_string()));
            }
        }
        Value::Object(body)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            AppError::Generation(details) => {
                tracing::error!(details = %details, "Generator call failed");
            }
            AppError::Format { reason, raw_text } => {
                tracing::error!(reason = %reason, raw_len = raw_text.len(), "Generator reply rejected");
            }
            e if status.is_server_error() => tracing::error!(error = %e, "Request failed"),
            _ => {}
        }

        (status, Json(self.body())).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_body_is_bare_error() {
        let err = AppError::Validation("message required".to_string());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.body(), json!({ "error": "message required" }));
    }

    #[test]
    fn test_format_error_carries_raw_text() {
        let err = AppError::format(r#"{"foo": 1}"#, "missing recommendations");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = err.body();
        assert_eq!(body["aiResponse"], r#"{"foo": 1}"#);
        assert_eq!(body["details"], "missing recommendations");
        assert!(body["error"].is_string());
    }

    #[test]
    fn test_generation_error_has_details_without_ai_response() {
        let err = AppError::Generation("quota exceeded".to_string());
        let body = err.body();
        assert_eq!(body["details"], "quota exceeded");
        assert!(body.get("aiResponse").is_none());
    }

    #[test]
    fn test_catalog_errors_map_to_bad_gateway() {
        let err = AppError::CatalogLookup("status 503".to_string());
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }
}
