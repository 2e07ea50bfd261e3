use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use pilketua_store::DocumentStore;

use crate::domain::window::window_status;
use crate::error::ElectionError;
use crate::infra::collections::load_window;
use crate::state::AppState;
use crate::usecase::cast_vote::{CastVoteInput, CastVoteUseCase};
use crate::usecase::validate::{ValidateTokenInput, ValidateTokenUseCase};

/// Both voter endpoints are gated on the window before anything touches
/// the token, so out-of-window attempts never reach the engine.
async fn ensure_votable<S: DocumentStore>(state: &AppState<S>) -> Result<(), ElectionError> {
    let window = load_window(&state.store).await?;
    let status = window_status(window.as_ref(), Utc::now());
    if state.policy.permits(status) {
        Ok(())
    } else {
        Err(ElectionError::VotingClosed { status })
    }
}

// ── POST /vote/validate ───────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ValidateRequest {
    pub code: String,
}

pub async fn validate_token<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Json(body): Json<ValidateRequest>,
) -> Result<impl IntoResponse, ElectionError> {
    ensure_votable(&state).await?;

    let usecase = ValidateTokenUseCase {
        store: state.store.clone(),
    };
    let identity = usecase.execute(ValidateTokenInput { code: body.code }).await?;
    Ok(Json(identity))
}

// ── POST /vote ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteRequest {
    pub code: String,
    pub candidate_id: Uuid,
    /// Identity claim echoed from the confirmation step. The binding on the
    /// token is authoritative; these are accepted for parity with the client
    /// flow and ignored.
    #[serde(default)]
    pub voter_name: Option<String>,
    #[serde(default)]
    pub voter_region: Option<String>,
}

pub async fn cast_vote<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Json(body): Json<CastVoteRequest>,
) -> Result<impl IntoResponse, ElectionError> {
    ensure_votable(&state).await?;

    let usecase = CastVoteUseCase::new(state.store.clone());
    let receipt = usecase
        .execute(CastVoteInput {
            code: body.code,
            candidate_id: body.candidate_id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
