use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;
use serde::Serialize;

use pilketua_store::DocumentStore;

use crate::domain::window::{ElectionWindow, WindowStatus, window_status};
use crate::error::ElectionError;
use crate::infra::collections::{list_tokens, load_window};
use crate::projections::{RegionalBreakdown, Scoreboard, regional_breakdown};
use crate::state::AppState;

// ── GET /results ──────────────────────────────────────────────────────────────

/// Latest scoreboard from the streaming feed; the handler never recomputes.
pub async fn scoreboard<S: DocumentStore>(State(state): State<AppState<S>>) -> Json<Scoreboard> {
    Json(state.scoreboard.borrow().clone())
}

// ── GET /results/regions/{region} ─────────────────────────────────────────────

pub async fn region_breakdown<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path(region): Path<String>,
) -> Result<Json<RegionalBreakdown>, ElectionError> {
    let tokens = list_tokens(&state.store).await?;
    Ok(Json(regional_breakdown(&tokens, &region)))
}

// ── GET /schedule ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub window: Option<ElectionWindow>,
    pub status: WindowStatus,
    pub accepting_votes: bool,
}

pub async fn schedule<S: DocumentStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<ScheduleResponse>, ElectionError> {
    let window = load_window(&state.store).await?;
    let status = window_status(window.as_ref(), Utc::now());
    Ok(Json(ScheduleResponse {
        window,
        status,
        accepting_votes: state.policy.permits(status),
    }))
}
