//! Collection layout and typed access on top of the store capability.

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use pilketua_store::{Document, DocumentStore};

use crate::domain::types::{Candidate, Token};
use crate::domain::window::ElectionWindow;
use crate::error::ElectionError;

pub const TOKENS: &str = "tokens";
pub const CANDIDATES: &str = "candidates";
pub const SETTINGS: &str = "settings";

/// Key of the singleton window record inside [`SETTINGS`].
pub const ELECTION_WINDOW_DOC: &str = "electionConfig";

pub fn encode<T: Serialize>(value: &T) -> Result<Document, ElectionError> {
    serde_json::to_value(value).map_err(|e| ElectionError::Internal(e.into()))
}

pub fn decode<T: DeserializeOwned>(doc: Document) -> Result<T, ElectionError> {
    serde_json::from_value(doc).map_err(|e| ElectionError::Internal(e.into()))
}

pub async fn find_token<S: DocumentStore>(
    store: &S,
    code: &str,
) -> Result<Option<Token>, ElectionError> {
    match store.get(TOKENS, code).await? {
        Some(doc) => Ok(Some(decode(doc)?)),
        None => Ok(None),
    }
}

pub async fn find_candidate<S: DocumentStore>(
    store: &S,
    id: Uuid,
) -> Result<Option<Candidate>, ElectionError> {
    match store.get(CANDIDATES, &id.to_string()).await? {
        Some(doc) => Ok(Some(decode(doc)?)),
        None => Ok(None),
    }
}

/// The full voter roll, newest first.
pub async fn list_tokens<S: DocumentStore>(store: &S) -> Result<Vec<Token>, ElectionError> {
    let mut tokens = Vec::new();
    for (_, doc) in store.list(TOKENS).await? {
        tokens.push(decode::<Token>(doc)?);
    }
    tokens.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(tokens)
}

/// All candidates in ballot order.
pub async fn list_candidates<S: DocumentStore>(store: &S) -> Result<Vec<Candidate>, ElectionError> {
    let mut candidates = Vec::new();
    for (_, doc) in store.list(CANDIDATES).await? {
        candidates.push(decode::<Candidate>(doc)?);
    }
    candidates.sort_by_key(|c| c.sequence_number);
    Ok(candidates)
}

pub async fn load_window<S: DocumentStore>(
    store: &S,
) -> Result<Option<ElectionWindow>, ElectionError> {
    match store.get(SETTINGS, ELECTION_WINDOW_DOC).await? {
        Some(doc) => Ok(Some(decode(doc)?)),
        None => Ok(None),
    }
}

pub async fn save_window<S: DocumentStore>(
    store: &S,
    window: &ElectionWindow,
) -> Result<(), ElectionError> {
    store
        .set(SETTINGS, ELECTION_WINDOW_DOC, encode(window)?)
        .await?;
    Ok(())
}
