use serde_json::json;

use pilketua_election::error::ElectionError;
use pilketua_election::infra::collections::{TOKENS, find_token};
use pilketua_election::usecase::cast_vote::{CastVoteInput, CastVoteUseCase};
use pilketua_election::usecase::validate::{ValidateTokenInput, ValidateTokenUseCase};
use pilketua_store::DocumentStore;
use uuid::Uuid;

use crate::helpers::{seed_candidate, seed_token, signed_in_store, tally, used_token_count};

#[tokio::test]
async fn should_validate_lowercase_token_and_return_identity() {
    let store = signed_in_store().await;
    seed_token(&store, "AB3D9K", "Siti", "Block A").await;

    let identity = ValidateTokenUseCase {
        store: store.clone(),
    }
    .execute(ValidateTokenInput {
        code: " ab3d9k ".to_owned(),
    })
    .await
    .unwrap();

    assert_eq!(identity.code, "AB3D9K");
    assert_eq!(identity.voter_name, "Siti");
    assert_eq!(identity.voter_region, "Block A");
}

#[tokio::test]
async fn should_reject_unknown_token() {
    let store = signed_in_store().await;
    let candidate = seed_candidate(&store, 1, "Budi").await;

    let validated = ValidateTokenUseCase {
        store: store.clone(),
    }
    .execute(ValidateTokenInput {
        code: "ZZZZZZ".to_owned(),
    })
    .await;
    assert!(matches!(validated, Err(ElectionError::TokenNotFound)));

    let cast = CastVoteUseCase::new(store.clone())
        .execute(CastVoteInput {
            code: "ZZZZZZ".to_owned(),
            candidate_id: candidate.id,
        })
        .await;
    assert!(matches!(cast, Err(ElectionError::TokenNotFound)));
}

#[tokio::test]
async fn should_reject_misconfigured_token() {
    let store = signed_in_store().await;
    // A hand-provisioned record with no bound voter identity.
    store
        .set(
            TOKENS,
            "QQQQQQ",
            json!({
                "code": "QQQQQQ",
                "used": false,
                "createdAt": chrono::Utc::now(),
            }),
        )
        .await
        .unwrap();

    let result = ValidateTokenUseCase {
        store: store.clone(),
    }
    .execute(ValidateTokenInput {
        code: "QQQQQQ".to_owned(),
    })
    .await;
    assert!(matches!(result, Err(ElectionError::Misconfigured)));
}

#[tokio::test]
async fn should_reject_vote_for_missing_candidate() {
    let store = signed_in_store().await;
    seed_token(&store, "AB3D9K", "Siti", "Block A").await;

    let result = CastVoteUseCase::new(store.clone())
        .execute(CastVoteInput {
            code: "AB3D9K".to_owned(),
            candidate_id: Uuid::new_v4(),
        })
        .await;
    assert!(matches!(result, Err(ElectionError::CandidateNotFound)));

    // The aborted transaction must not have consumed the token.
    let token = find_token(&store, "AB3D9K").await.unwrap().unwrap();
    assert!(!token.used);
}

#[tokio::test]
async fn should_cast_vote_once_and_reject_second_attempt() {
    let store = signed_in_store().await;
    let candidate_x = seed_candidate(&store, 1, "Budi").await;
    let candidate_y = seed_candidate(&store, 2, "Wati").await;
    seed_token(&store, "AB3D9K", "Siti", "Block A").await;

    let engine = CastVoteUseCase::new(store.clone());
    let receipt = engine
        .execute(CastVoteInput {
            code: "AB3D9K".to_owned(),
            candidate_id: candidate_x.id,
        })
        .await
        .unwrap();
    assert_eq!(receipt.candidate_id, candidate_x.id);

    // Second redemption, different candidate: must fail and change nothing.
    let second = engine
        .execute(CastVoteInput {
            code: "AB3D9K".to_owned(),
            candidate_id: candidate_y.id,
        })
        .await;
    match second {
        Err(ElectionError::AlreadyUsed { voter }) => assert_eq!(voter, "Siti"),
        other => panic!("expected AlreadyUsed, got {other:?}"),
    }

    assert_eq!(tally(&store, candidate_x.id).await, 1);
    assert_eq!(tally(&store, candidate_y.id).await, 0);
}

#[tokio::test]
async fn should_mark_token_and_tally_together() {
    let store = signed_in_store().await;
    let candidate = seed_candidate(&store, 1, "Budi").await;
    seed_token(&store, "AB3D9K", "Siti", "Block A").await;

    CastVoteUseCase::new(store.clone())
        .execute(CastVoteInput {
            code: "AB3D9K".to_owned(),
            candidate_id: candidate.id,
        })
        .await
        .unwrap();

    let token = find_token(&store, "AB3D9K").await.unwrap().unwrap();
    assert!(token.used);
    assert_eq!(token.redeemed_candidate_id, Some(candidate.id));
    assert!(token.redeemed_at.is_some());
    assert_eq!(tally(&store, candidate.id).await, 1);
}

#[tokio::test]
async fn should_conserve_votes_across_mixed_operations() {
    let store = signed_in_store().await;
    let candidate_x = seed_candidate(&store, 1, "Budi").await;
    let candidate_y = seed_candidate(&store, 2, "Wati").await;
    let codes = ["AAAAAA", "BBBBBB", "CCCCCC", "DDDDDD", "EEEEEE"];
    for code in codes {
        seed_token(&store, code, "Voter", "Block A").await;
    }

    let engine = CastVoteUseCase::new(store.clone());
    let picks = [
        ("AAAAAA", candidate_x.id),
        ("BBBBBB", candidate_y.id),
        ("CCCCCC", candidate_x.id),
        // Replay of an already-consumed token, must not move any tally.
        ("AAAAAA", candidate_y.id),
        ("DDDDDD", candidate_x.id),
    ];
    for (code, candidate_id) in picks {
        let _ = engine
            .execute(CastVoteInput {
                code: code.to_owned(),
                candidate_id,
            })
            .await;
        let total = tally(&store, candidate_x.id).await + tally(&store, candidate_y.id).await;
        assert_eq!(
            total as usize,
            used_token_count(&store).await,
            "tally total must always equal used-token count"
        );
    }

    assert_eq!(tally(&store, candidate_x.id).await, 3);
    assert_eq!(tally(&store, candidate_y.id).await, 1);
    assert_eq!(used_token_count(&store).await, 4);
}
