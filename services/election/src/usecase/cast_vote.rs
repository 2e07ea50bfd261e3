use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::RngExt;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use pilketua_store::{DocumentStore, StoreError, StoreTransaction};

use crate::domain::types::{Token, normalize_code};
use crate::error::ElectionError;
use crate::infra::collections::{CANDIDATES, TOKENS, decode};

/// How many times a conflicted redemption is retried before surfacing Busy.
pub const MAX_TXN_ATTEMPTS: u32 = 5;

const RETRY_BASE_DELAY_MS: u64 = 15;

pub struct CastVoteInput {
    pub code: String,
    pub candidate_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    pub code: String,
    pub candidate_id: Uuid,
    pub redeemed_at: DateTime<Utc>,
}

/// The redeem-and-tally engine.
///
/// One optimistic transaction per attempt: read the token, abort if absent
/// or already used; read the candidate, abort if absent; mark the token
/// used and increment the tally; commit. The token re-check happens inside
/// the transaction even though validation already checked it — the earlier
/// read is unguarded and a concurrent voter may have consumed the token in
/// between. On commit conflict the whole closure re-runs from the fresh
/// read, so a raced-out voter ends up with `AlreadyUsed`, never a double
/// count. The transaction body has no effects outside the store, which is
/// what makes re-running it safe.
pub struct CastVoteUseCase<S>
where
    S: DocumentStore,
{
    pub store: S,
    pub max_attempts: u32,
}

impl<S> CastVoteUseCase<S>
where
    S: DocumentStore,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            max_attempts: MAX_TXN_ATTEMPTS,
        }
    }

    pub async fn execute(&self, input: CastVoteInput) -> Result<VoteReceipt, ElectionError> {
        let code = normalize_code(&input.code);
        let candidate_key = input.candidate_id.to_string();

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                tokio::time::sleep(retry_delay(attempt)).await;
            }

            let mut txn = self.store.begin().await?;

            let token_doc = txn
                .get(TOKENS, &code)
                .await?
                .ok_or(ElectionError::TokenNotFound)?;
            let token: Token = decode(token_doc)?;
            if token.used {
                return Err(ElectionError::AlreadyUsed {
                    voter: token.voter_name,
                });
            }

            // Covers the candidate being deleted between selection and cast.
            if txn.get(CANDIDATES, &candidate_key).await?.is_none() {
                return Err(ElectionError::CandidateNotFound);
            }

            let now = Utc::now();
            txn.update(
                TOKENS,
                &code,
                json!({
                    "used": true,
                    "redeemedAt": now,
                    "redeemedCandidateId": input.candidate_id,
                }),
            );
            txn.increment(CANDIDATES, &candidate_key, "voteCount", 1);

            match txn.commit().await {
                Ok(()) => {
                    tracing::info!(code = %code, candidate = %input.candidate_id, "vote recorded");
                    return Ok(VoteReceipt {
                        code,
                        candidate_id: input.candidate_id,
                        redeemed_at: now,
                    });
                }
                Err(StoreError::Conflict) => {
                    tracing::debug!(code = %code, attempt, "redemption conflicted, retrying");
                    continue;
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(ElectionError::Busy)
    }
}

fn retry_delay(attempt: u32) -> Duration {
    let mut rng = rand::rng();
    let jitter: u64 = rng.random_range(0..RETRY_BASE_DELAY_MS);
    Duration::from_millis(RETRY_BASE_DELAY_MS * u64::from(attempt) + jitter)
}
