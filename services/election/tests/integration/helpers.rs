use chrono::{Duration, Utc};
use uuid::Uuid;

use pilketua_election::config::ElectionConfig;
use pilketua_election::domain::types::{Candidate, Token};
use pilketua_election::domain::window::ElectionWindow;
use pilketua_election::infra::collections::{
    TOKENS, encode, find_candidate, list_tokens, save_window,
};
use pilketua_election::state::AppState;
use pilketua_election::usecase::candidate::{CreateCandidateInput, CreateCandidateUseCase};
use pilketua_store::DocumentStore;
use pilketua_store::memory::MemoryStore;

pub async fn signed_in_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.sign_in_anonymously().await.unwrap();
    store
}

pub fn test_config() -> ElectionConfig {
    ElectionConfig {
        port: 0,
        admin_user: "admin".to_owned(),
        admin_pass: "secret".to_owned(),
        open_when_unscheduled: false,
    }
}

pub fn test_state(store: &MemoryStore) -> AppState<MemoryStore> {
    AppState::new(store.clone(), &test_config())
}

pub async fn seed_candidate(store: &MemoryStore, seq: u32, name: &str) -> Candidate {
    CreateCandidateUseCase {
        store: store.clone(),
    }
    .execute(CreateCandidateInput {
        sequence_number: seq,
        name: name.to_owned(),
        region: "Block A".to_owned(),
        photo_url: String::new(),
    })
    .await
    .unwrap()
}

pub async fn seed_token(store: &MemoryStore, code: &str, name: &str, region: &str) -> Token {
    let token = Token::register(code.to_owned(), name.to_owned(), region.to_owned());
    store
        .set(TOKENS, &token.code, encode(&token).unwrap())
        .await
        .unwrap();
    token
}

/// A window spanning the current moment, so voting is open.
pub async fn open_schedule(store: &MemoryStore) -> ElectionWindow {
    let window = ElectionWindow {
        start_time: Utc::now() - Duration::hours(1),
        end_time: Utc::now() + Duration::hours(1),
    };
    save_window(store, &window).await.unwrap();
    window
}

pub async fn tally(store: &MemoryStore, id: Uuid) -> u64 {
    find_candidate(store, id).await.unwrap().unwrap().vote_count
}

pub async fn used_token_count(store: &MemoryStore) -> usize {
    list_tokens(store)
        .await
        .unwrap()
        .iter()
        .filter(|t| t.used)
        .count()
}
