use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pilketua_store::DocumentStore;

use crate::domain::types::{Token, normalize_code};
use crate::domain::window::ElectionWindow;
use crate::error::ElectionError;
use crate::infra::collections::{TOKENS, find_token, list_tokens, save_window};
use crate::state::AppState;
use crate::usecase::candidate::{
    CreateCandidateInput, CreateCandidateUseCase, DeleteCandidateUseCase, UpdateCandidateInput,
    UpdateCandidateUseCase,
};
use crate::usecase::reset::ResetElectionUseCase;
use crate::usecase::roll::{ImportVotersUseCase, RegisterVoterInput, RegisterVoterUseCase};

/// Committee credential check. A shared secret per request, deliberately
/// not a real security boundary.
fn require_admin<S: DocumentStore>(
    state: &AppState<S>,
    headers: &HeaderMap,
) -> Result<(), ElectionError> {
    let user = headers.get("x-admin-user").and_then(|v| v.to_str().ok());
    let pass = headers.get("x-admin-pass").and_then(|v| v.to_str().ok());
    if user == Some(state.admin_user.as_str()) && pass == Some(state.admin_pass.as_str()) {
        Ok(())
    } else {
        Err(ElectionError::Unauthorized)
    }
}

// ── Voter roll ────────────────────────────────────────────────────────────────

pub async fn list_voters<S: DocumentStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Token>>, ElectionError> {
    require_admin(&state, &headers)?;
    Ok(Json(list_tokens(&state.store).await?))
}

#[derive(Deserialize)]
pub struct RegisterVoterRequest {
    pub name: String,
    pub region: String,
}

pub async fn register_voter<S: DocumentStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Json(body): Json<RegisterVoterRequest>,
) -> Result<impl IntoResponse, ElectionError> {
    require_admin(&state, &headers)?;
    let usecase = RegisterVoterUseCase {
        store: state.store.clone(),
    };
    let token = usecase
        .execute(RegisterVoterInput {
            name: body.name,
            region: body.region,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(token)))
}

#[derive(Deserialize)]
pub struct ImportVotersRequest {
    pub voters: Vec<RegisterVoterRequest>,
}

#[derive(Serialize)]
pub struct ImportVotersResponse {
    pub registered: usize,
}

pub async fn import_voters<S: DocumentStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Json(body): Json<ImportVotersRequest>,
) -> Result<impl IntoResponse, ElectionError> {
    require_admin(&state, &headers)?;
    let usecase = ImportVotersUseCase {
        store: state.store.clone(),
    };
    let registered = usecase
        .execute(
            body.voters
                .into_iter()
                .map(|v| RegisterVoterInput {
                    name: v.name,
                    region: v.region,
                })
                .collect(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ImportVotersResponse { registered })))
}

pub async fn delete_voter<S: DocumentStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Path(code): Path<String>,
) -> Result<StatusCode, ElectionError> {
    require_admin(&state, &headers)?;
    let code = normalize_code(&code);
    if find_token(&state.store, &code).await?.is_none() {
        return Err(ElectionError::TokenNotFound);
    }
    state.store.delete(TOKENS, &code).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Candidates ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCandidateRequest {
    pub sequence_number: u32,
    pub name: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub photo_url: String,
}

pub async fn create_candidate<S: DocumentStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Json(body): Json<CreateCandidateRequest>,
) -> Result<impl IntoResponse, ElectionError> {
    require_admin(&state, &headers)?;
    let usecase = CreateCandidateUseCase {
        store: state.store.clone(),
    };
    let candidate = usecase
        .execute(CreateCandidateInput {
            sequence_number: body.sequence_number,
            name: body.name,
            region: body.region,
            photo_url: body.photo_url,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(candidate)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCandidateRequest {
    pub sequence_number: Option<u32>,
    pub name: Option<String>,
    pub region: Option<String>,
    pub photo_url: Option<String>,
}

pub async fn update_candidate<S: DocumentStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateCandidateRequest>,
) -> Result<impl IntoResponse, ElectionError> {
    require_admin(&state, &headers)?;
    let usecase = UpdateCandidateUseCase {
        store: state.store.clone(),
    };
    let candidate = usecase
        .execute(UpdateCandidateInput {
            id,
            sequence_number: body.sequence_number,
            name: body.name,
            region: body.region,
            photo_url: body.photo_url,
        })
        .await?;
    Ok(Json(candidate))
}

pub async fn delete_candidate<S: DocumentStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ElectionError> {
    require_admin(&state, &headers)?;
    let usecase = DeleteCandidateUseCase {
        store: state.store.clone(),
    };
    usecase.execute(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Schedule ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetScheduleRequest {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

pub async fn set_schedule<S: DocumentStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
    Json(body): Json<SetScheduleRequest>,
) -> Result<impl IntoResponse, ElectionError> {
    require_admin(&state, &headers)?;
    if body.start_time >= body.end_time {
        return Err(ElectionError::InvalidSchedule);
    }
    let window = ElectionWindow {
        start_time: body.start_time,
        end_time: body.end_time,
    };
    save_window(&state.store, &window).await?;
    Ok(Json(window))
}

// ── Reset ─────────────────────────────────────────────────────────────────────

pub async fn reset_election<S: DocumentStore>(
    State(state): State<AppState<S>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ElectionError> {
    require_admin(&state, &headers)?;
    let usecase = ResetElectionUseCase {
        store: state.store.clone(),
    };
    let summary = usecase.execute().await?;
    Ok(Json(summary))
}
