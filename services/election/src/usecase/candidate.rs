use serde_json::{Map, json};
use uuid::Uuid;

use pilketua_store::DocumentStore;

use crate::domain::types::Candidate;
use crate::error::ElectionError;
use crate::infra::collections::{CANDIDATES, encode, find_candidate};

pub struct CreateCandidateInput {
    pub sequence_number: u32,
    pub name: String,
    pub region: String,
    pub photo_url: String,
}

pub struct CreateCandidateUseCase<S>
where
    S: DocumentStore,
{
    pub store: S,
}

impl<S> CreateCandidateUseCase<S>
where
    S: DocumentStore,
{
    pub async fn execute(&self, input: CreateCandidateInput) -> Result<Candidate, ElectionError> {
        let candidate = Candidate {
            id: Uuid::new_v4(),
            sequence_number: input.sequence_number,
            name: input.name,
            region: input.region,
            photo_url: input.photo_url,
            vote_count: 0,
        };
        self.store
            .set(CANDIDATES, &candidate.id.to_string(), encode(&candidate)?)
            .await?;
        Ok(candidate)
    }
}

pub struct UpdateCandidateInput {
    pub id: Uuid,
    pub sequence_number: Option<u32>,
    pub name: Option<String>,
    pub region: Option<String>,
    pub photo_url: Option<String>,
}

/// Admin edit of a candidate's descriptive fields. Builds a field merge
/// that can never touch `voteCount`, keeping the admin path disjoint from
/// the voting path.
pub struct UpdateCandidateUseCase<S>
where
    S: DocumentStore,
{
    pub store: S,
}

impl<S> UpdateCandidateUseCase<S>
where
    S: DocumentStore,
{
    pub async fn execute(&self, input: UpdateCandidateInput) -> Result<Candidate, ElectionError> {
        if find_candidate(&self.store, input.id).await?.is_none() {
            return Err(ElectionError::CandidateNotFound);
        }

        let mut fields = Map::new();
        if let Some(sequence_number) = input.sequence_number {
            fields.insert("sequenceNumber".to_owned(), json!(sequence_number));
        }
        if let Some(name) = input.name {
            fields.insert("name".to_owned(), json!(name));
        }
        if let Some(region) = input.region {
            fields.insert("region".to_owned(), json!(region));
        }
        if let Some(photo_url) = input.photo_url {
            fields.insert("photoUrl".to_owned(), json!(photo_url));
        }
        if !fields.is_empty() {
            self.store
                .update(CANDIDATES, &input.id.to_string(), fields.into())
                .await?;
        }

        find_candidate(&self.store, input.id)
            .await?
            .ok_or(ElectionError::CandidateNotFound)
    }
}

pub struct DeleteCandidateUseCase<S>
where
    S: DocumentStore,
{
    pub store: S,
}

impl<S> DeleteCandidateUseCase<S>
where
    S: DocumentStore,
{
    pub async fn execute(&self, id: Uuid) -> Result<(), ElectionError> {
        if find_candidate(&self.store, id).await?.is_none() {
            return Err(ElectionError::CandidateNotFound);
        }
        self.store.delete(CANDIDATES, &id.to_string()).await?;
        Ok(())
    }
}
