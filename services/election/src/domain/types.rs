use chrono::{DateTime, Utc};
use rand::RngExt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Charset for voting token codes. Excludes `0`, `O`, `1` and `I`, which are
/// too easy to confuse on a printed slip.
pub const CODE_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Token code length in characters.
pub const CODE_LEN: usize = 6;

pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| CODE_CHARSET[rng.random_range(0..CODE_CHARSET.len())] as char)
        .collect()
}

/// Canonical form of voter-supplied token input: trimmed, uppercased.
pub fn normalize_code(input: &str) -> String {
    input.trim().to_ascii_uppercase()
}

/// One single-use voting token, bound to a voter at registration. The code
/// is the natural key. After creation the only permitted state transition is
/// unused → used, which sets `redeemed_at` and `redeemed_candidate_id`
/// exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub code: String,
    #[serde(default)]
    pub voter_name: String,
    #[serde(default)]
    pub voter_region: String,
    pub used: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redeemed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redeemed_candidate_id: Option<Uuid>,
}

impl Token {
    pub fn register(code: String, voter_name: String, voter_region: String) -> Self {
        Self {
            code,
            voter_name,
            voter_region,
            used: false,
            created_at: Utc::now(),
            redeemed_at: None,
            redeemed_candidate_id: None,
        }
    }
}

/// A candidate on the ballot. `vote_count` is mutated only by the vote
/// transaction; every other field only by admin CRUD. The two paths touch
/// disjoint field sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: Uuid,
    pub sequence_number: u32,
    pub name: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub photo_url: String,
    pub vote_count: u64,
}

/// Voter identity bound to a token, returned by validation so the caller
/// can show a confirmation step before redeeming.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterIdentity {
    pub code: String,
    pub voter_name: String,
    pub voter_region: String,
}
