use serde::Serialize;
use serde_json::json;

use pilketua_store::{DocumentStore, MAX_BATCH_OPS, WriteOp};

use crate::error::ElectionError;
use crate::infra::collections::{CANDIDATES, TOKENS};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetSummary {
    pub tokens_removed: usize,
    pub candidates_zeroed: usize,
}

/// Full-election reset: drop the entire voter roll and zero every tally.
/// Candidates' descriptive fields and the schedule are left untouched.
pub struct ResetElectionUseCase<S>
where
    S: DocumentStore,
{
    pub store: S,
}

impl<S> ResetElectionUseCase<S>
where
    S: DocumentStore,
{
    pub async fn execute(&self) -> Result<ResetSummary, ElectionError> {
        let tokens = self.store.list(TOKENS).await?;
        let candidates = self.store.list(CANDIDATES).await?;

        let summary = ResetSummary {
            tokens_removed: tokens.len(),
            candidates_zeroed: candidates.len(),
        };

        let mut ops = Vec::with_capacity(tokens.len() + candidates.len());
        ops.extend(tokens.into_iter().map(|(key, _)| WriteOp::Delete {
            collection: TOKENS.to_owned(),
            key,
        }));
        ops.extend(candidates.into_iter().map(|(key, _)| WriteOp::Update {
            collection: CANDIDATES.to_owned(),
            key,
            fields: json!({"voteCount": 0}),
        }));

        for chunk in ops.chunks(MAX_BATCH_OPS) {
            self.store.batch_write(chunk.to_vec()).await?;
        }

        tracing::info!(
            tokens_removed = summary.tokens_removed,
            candidates_zeroed = summary.candidates_zeroed,
            "election data reset"
        );
        Ok(summary)
    }
}
