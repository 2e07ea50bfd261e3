use std::collections::HashSet;

use anyhow::anyhow;

use pilketua_store::{DocumentStore, MAX_BATCH_OPS, WriteOp};

use crate::domain::types::{Token, generate_code};
use crate::error::ElectionError;
use crate::infra::collections::{TOKENS, encode, find_token};

/// Attempts to find an unoccupied code before giving up. Collisions are
/// rare (32^6 keyspace) but a clash must never overwrite another voter.
const MAX_CODE_ATTEMPTS: usize = 8;

pub struct RegisterVoterInput {
    pub name: String,
    pub region: String,
}

/// Register a single voter: allocate a fresh token code and write the
/// unused token bound to their identity.
pub struct RegisterVoterUseCase<S>
where
    S: DocumentStore,
{
    pub store: S,
}

impl<S> RegisterVoterUseCase<S>
where
    S: DocumentStore,
{
    pub async fn execute(&self, input: RegisterVoterInput) -> Result<Token, ElectionError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_code();
            if find_token(&self.store, &code).await?.is_some() {
                continue;
            }
            let token = Token::register(code, input.name.clone(), input.region.clone());
            self.store.set(TOKENS, &token.code, encode(&token)?).await?;
            return Ok(token);
        }
        Err(ElectionError::Internal(anyhow!(
            "could not allocate a unique token code"
        )))
    }
}

/// Bulk voter registration (spreadsheet import lands here after parsing,
/// which happens upstream). Writes are chunked to the store's batch limit.
pub struct ImportVotersUseCase<S>
where
    S: DocumentStore,
{
    pub store: S,
}

impl<S> ImportVotersUseCase<S>
where
    S: DocumentStore,
{
    pub async fn execute(
        &self,
        voters: Vec<RegisterVoterInput>,
    ) -> Result<usize, ElectionError> {
        if voters.is_empty() {
            return Ok(0);
        }

        let mut taken: HashSet<String> = self
            .store
            .list(TOKENS)
            .await?
            .into_iter()
            .map(|(key, _)| key)
            .collect();

        let mut ops = Vec::with_capacity(voters.len());
        for voter in &voters {
            let code = allocate_code(&mut taken)?;
            let token = Token::register(code, voter.name.clone(), voter.region.clone());
            ops.push(WriteOp::Set {
                collection: TOKENS.to_owned(),
                key: token.code.clone(),
                doc: encode(&token)?,
            });
        }

        let registered = ops.len();
        for chunk in ops.chunks(MAX_BATCH_OPS) {
            self.store.batch_write(chunk.to_vec()).await?;
        }
        tracing::info!(registered, "voter import committed");
        Ok(registered)
    }
}

fn allocate_code(taken: &mut HashSet<String>) -> Result<String, ElectionError> {
    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = generate_code();
        if taken.insert(code.clone()) {
            return Ok(code);
        }
    }
    Err(ElectionError::Internal(anyhow!(
        "could not allocate a unique token code"
    )))
}
