use axum::http::StatusCode;
use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};
use tower_http::trace::TraceLayer;

use pilketua_store::DocumentStore;

use crate::handlers::{
    admin::{
        create_candidate, delete_candidate, delete_voter, import_voters, list_voters,
        register_voter, reset_election, set_schedule, update_candidate,
    },
    results::{region_breakdown, schedule, scoreboard},
    vote::{cast_vote, validate_token},
};
use crate::state::AppState;

/// Handler for `GET /healthz` — liveness check.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Handler for `GET /readyz` — readiness check.
pub async fn readyz() -> StatusCode {
    StatusCode::OK
}

pub fn build_router<S: DocumentStore>(state: AppState<S>) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Voter flow
        .route("/vote/validate", post(validate_token))
        .route("/vote", post(cast_vote))
        // Results
        .route("/results", get(scoreboard))
        .route("/results/regions/{region}", get(region_breakdown))
        .route("/schedule", get(schedule))
        // Admin: voter roll
        .route("/admin/voters", get(list_voters))
        .route("/admin/voters", post(register_voter))
        .route("/admin/voters/import", post(import_voters))
        .route("/admin/voters/{code}", delete(delete_voter))
        // Admin: candidates
        .route("/admin/candidates", post(create_candidate))
        .route("/admin/candidates/{id}", patch(update_candidate))
        .route("/admin/candidates/{id}", delete(delete_candidate))
        // Admin: schedule + reset
        .route("/admin/schedule", put(set_schedule))
        .route("/admin/reset", post(reset_election))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
