use pilketua_store::DocumentStore;

use crate::domain::types::{VoterIdentity, normalize_code};
use crate::error::ElectionError;
use crate::infra::collections::find_token;

pub struct ValidateTokenInput {
    pub code: String,
}

/// Pure-read token check, deliberately separate from redemption so the
/// caller can show a "confirm this is you" step without side effects. The
/// result is advisory: the vote engine re-checks everything under its
/// transaction, because this read is stale the moment it returns.
pub struct ValidateTokenUseCase<S>
where
    S: DocumentStore,
{
    pub store: S,
}

impl<S> ValidateTokenUseCase<S>
where
    S: DocumentStore,
{
    pub async fn execute(&self, input: ValidateTokenInput) -> Result<VoterIdentity, ElectionError> {
        let code = normalize_code(&input.code);
        let token = find_token(&self.store, &code)
            .await?
            .ok_or(ElectionError::TokenNotFound)?;

        // Registration writes the voter identity with the token; a record
        // without one was provisioned by hand and must not be redeemable.
        if token.voter_name.is_empty() {
            return Err(ElectionError::Misconfigured);
        }
        if token.used {
            return Err(ElectionError::AlreadyUsed {
                voter: token.voter_name,
            });
        }

        Ok(VoterIdentity {
            code,
            voter_name: token.voter_name,
            voter_region: token.voter_region,
        })
    }
}
