//! Read-side projections: pure functions over the current token and
//! candidate collections, recomputed on every change via the store's
//! subscription channels.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::watch;
use uuid::Uuid;

use pilketua_store::{Document, DocumentStore, Snapshot};

use crate::domain::types::{Candidate, Token};
use crate::infra::collections::{CANDIDATES, TOKENS};

/// How long a candidate stays marked after their tally moves.
pub const HIGHLIGHT_TTL_MS: i64 = 2000;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total_votes: u64,
    pub tokens_issued: usize,
    pub tokens_used: usize,
    /// Fraction of issued tokens redeemed, 0 when no tokens exist.
    pub participation: f64,
}

pub fn totals(tokens: &[Token], candidates: &[Candidate]) -> Totals {
    let tokens_used = tokens.iter().filter(|t| t.used).count();
    Totals {
        total_votes: candidates.iter().map(|c| c.vote_count).sum(),
        tokens_issued: tokens.len(),
        tokens_used,
        participation: if tokens.is_empty() {
            0.0
        } else {
            tokens_used as f64 / tokens.len() as f64
        },
    }
}

/// Candidates by descending tally, ties broken by ballot order. The tie
/// rule is what makes display order deterministic.
pub fn leaderboard(candidates: &[Candidate]) -> Vec<Candidate> {
    let mut ranked = candidates.to_vec();
    ranked.sort_by_key(|c| (Reverse(c.vote_count), c.sequence_number));
    ranked
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionalBreakdown {
    pub region: String,
    pub tokens_issued: usize,
    pub tokens_used: usize,
    /// Redeemed-candidate distribution among this region's used tokens.
    /// Possible only because tokens keep their candidate choice after
    /// redemption — votes here are deliberately not a secret ballot.
    pub votes_by_candidate: BTreeMap<Uuid, u64>,
}

pub fn regional_breakdown(tokens: &[Token], region: &str) -> RegionalBreakdown {
    let in_region: Vec<&Token> = tokens.iter().filter(|t| t.voter_region == region).collect();
    let mut votes_by_candidate = BTreeMap::new();
    for token in in_region.iter().filter(|t| t.used) {
        if let Some(candidate_id) = token.redeemed_candidate_id {
            *votes_by_candidate.entry(candidate_id).or_insert(0) += 1;
        }
    }
    RegionalBreakdown {
        region: region.to_owned(),
        tokens_issued: in_region.len(),
        tokens_used: in_region.iter().filter(|t| t.used).count(),
        votes_by_candidate,
    }
}

/// Tracks which candidates' tallies just moved. Ephemeral and local to the
/// observer; nothing here is persisted. The first observation seeds the
/// baseline without flagging anything.
pub struct RecentChanges {
    ttl: Duration,
    previous: HashMap<Uuid, u64>,
    flashes: HashMap<Uuid, DateTime<Utc>>,
}

impl RecentChanges {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            previous: HashMap::new(),
            flashes: HashMap::new(),
        }
    }

    /// Fold in a fresh candidate snapshot and return everyone currently
    /// highlighted, sorted for determinism.
    pub fn observe(&mut self, candidates: &[Candidate], now: DateTime<Utc>) -> Vec<Uuid> {
        for candidate in candidates {
            match self.previous.get(&candidate.id) {
                Some(&prev) if candidate.vote_count > prev => {
                    self.flashes.insert(candidate.id, now);
                }
                _ => {}
            }
            self.previous.insert(candidate.id, candidate.vote_count);
        }
        let ttl = self.ttl;
        self.flashes.retain(|_, since| now - *since < ttl);

        let mut highlighted: Vec<Uuid> = self.flashes.keys().copied().collect();
        highlighted.sort();
        highlighted
    }
}

/// The live results view served to clients.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scoreboard {
    pub totals: Totals,
    pub leaderboard: Vec<Candidate>,
    pub recently_changed: Vec<Uuid>,
}

fn decode_all<T: serde::de::DeserializeOwned>(docs: &[(String, Document)]) -> Vec<T> {
    docs.iter()
        .filter_map(|(key, doc)| match serde_json::from_value(doc.clone()) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "skipping undecodable document");
                None
            }
        })
        .collect()
}

fn rebuild(
    tokens_snapshot: &Snapshot,
    candidates_snapshot: &Snapshot,
    recent: &mut RecentChanges,
) -> Scoreboard {
    let tokens: Vec<Token> = decode_all(&tokens_snapshot.docs);
    let mut candidates: Vec<Candidate> = decode_all(&candidates_snapshot.docs);
    candidates.sort_by_key(|c| c.sequence_number);

    Scoreboard {
        totals: totals(&tokens, &candidates),
        leaderboard: leaderboard(&candidates),
        recently_changed: recent.observe(&candidates, Utc::now()),
    }
}

/// Subscribe to both collections and republish a recomputed [`Scoreboard`]
/// on every change. The returned receiver always holds the latest board;
/// the task ends when the last receiver is dropped.
pub fn spawn_scoreboard_feed<S: DocumentStore>(store: S) -> watch::Receiver<Scoreboard> {
    let mut tokens_rx = store.subscribe(TOKENS);
    let mut candidates_rx = store.subscribe(CANDIDATES);
    let (tx, rx) = watch::channel(Scoreboard::default());

    tokio::spawn(async move {
        let mut recent = RecentChanges::new(Duration::milliseconds(HIGHLIGHT_TTL_MS));
        loop {
            let board = {
                let tokens_snapshot = tokens_rx.borrow_and_update().clone();
                let candidates_snapshot = candidates_rx.borrow_and_update().clone();
                rebuild(&tokens_snapshot, &candidates_snapshot, &mut recent)
            };
            if tx.send(board).is_err() {
                break;
            }
            tokio::select! {
                changed = tokens_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                changed = candidates_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
    });

    rx
}
