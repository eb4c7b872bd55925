//! Error kinds surfaced to users.
//!
//! Every error is scoped to one interaction and leaves session state as it
//! was; the user recovers by submitting again.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// No API credential was found at startup.
    #[error(
        "⚠️ API key not found. Set {key_name} in the environment or in {secrets_file} to start generating games."
    )]
    ConfigMissing {
        key_name: String,
        secrets_file: String,
    },

    /// Blank submission.
    #[error("Describe your game or suggest an improvement.")]
    EmptyInput,

    /// The model reply has no `<html` marker.
    #[error("❌ Invalid HTML received. Try rephrasing your request.")]
    InvalidResponse,

    /// The completion call failed; carries the provider's detail.
    #[error("{provider} API error: {detail}")]
    ExternalCallFailed { provider: String, detail: String },

    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// The session has no accepted game to show or download.
    #[error("no game generated yet for session {0}")]
    NoGame(String),

    #[error("failed to render page: {0}")]
    Render(#[from] minijinja::Error),
}

impl GameError {
    /// Stable machine-readable code for API clients.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigMissing { .. } => "CONFIG_MISSING",
            Self::EmptyInput => "EMPTY_INPUT",
            Self::InvalidResponse => "INVALID_RESPONSE",
            Self::ExternalCallFailed { .. } => "EXTERNAL_CALL_FAILED",
            Self::SessionNotFound(_) => "SESSION_NOT_FOUND",
            Self::NoGame(_) => "NO_GAME",
            Self::Render(_) => "RENDER_FAILED",
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ConfigMissing { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::EmptyInput => StatusCode::BAD_REQUEST,
            Self::InvalidResponse => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ExternalCallFailed { .. } => StatusCode::BAD_GATEWAY,
            Self::SessionNotFound(_) | Self::NoGame(_) => StatusCode::NOT_FOUND,
            Self::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON body returned by API routes on failure.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl IntoResponse for GameError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_call_message_names_provider() {
        let err = GameError::ExternalCallFailed {
            provider: "Cerebras".to_string(),
            detail: "API error (401): Wrong API Key".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cerebras API error: API error (401): Wrong API Key"
        );
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_config_missing_mentions_key() {
        let err = GameError::ConfigMissing {
            key_name: "CEREBRAS_API_KEY".to_string(),
            secrets_file: "secrets.toml".to_string(),
        };
        assert!(err.to_string().contains("CEREBRAS_API_KEY"));
        assert_eq!(err.code(), "CONFIG_MISSING");
    }
}
