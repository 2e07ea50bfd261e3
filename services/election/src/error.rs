use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pilketua_store::StoreError;

use crate::domain::window::WindowStatus;

/// Election service error variants.
#[derive(Debug, thiserror::Error)]
pub enum ElectionError {
    #[error("token not found")]
    TokenNotFound,
    #[error("token is not bound to a voter")]
    Misconfigured,
    #[error("token already used by {voter}")]
    AlreadyUsed { voter: String },
    #[error("candidate not found")]
    CandidateNotFound,
    #[error("voting is not open ({status})")]
    VotingClosed { status: WindowStatus },
    #[error("start time must be before end time")]
    InvalidSchedule,
    #[error("the ballot box is busy, please try again")]
    Busy,
    #[error("unauthorized")]
    Unauthorized,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ElectionError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TokenNotFound => "TOKEN_NOT_FOUND",
            Self::Misconfigured => "TOKEN_MISCONFIGURED",
            Self::AlreadyUsed { .. } => "TOKEN_ALREADY_USED",
            Self::CandidateNotFound => "CANDIDATE_NOT_FOUND",
            Self::VotingClosed { .. } => "VOTING_NOT_OPEN",
            Self::InvalidSchedule => "INVALID_SCHEDULE",
            Self::Busy => "BUSY",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl From<StoreError> for ElectionError {
    fn from(err: StoreError) -> Self {
        match err {
            // Contention that survived the engine's retry budget.
            StoreError::Conflict => Self::Busy,
            other => Self::Internal(other.into()),
        }
    }
}

impl IntoResponse for ElectionError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::TokenNotFound | Self::CandidateNotFound => StatusCode::NOT_FOUND,
            Self::Misconfigured | Self::InvalidSchedule => StatusCode::UNPROCESSABLE_ENTITY,
            Self::AlreadyUsed { .. } => StatusCode::CONFLICT,
            Self::VotingClosed { .. } => StatusCode::FORBIDDEN,
            Self::Busy => StatusCode::SERVICE_UNAVAILABLE,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // Log 500s only — tower-http TraceLayer already records method/uri/status for all
        // requests. 4xx are expected client errors; logging them here would be noise.
        // Internal errors need the anyhow chain logged so the root cause is traceable.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
