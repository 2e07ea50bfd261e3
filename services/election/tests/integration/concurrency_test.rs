use pilketua_election::error::ElectionError;
use pilketua_election::usecase::cast_vote::{CastVoteInput, CastVoteUseCase};

use crate::helpers::{seed_candidate, seed_token, signed_in_store, tally};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn should_accept_exactly_one_of_many_concurrent_casts() {
    let store = signed_in_store().await;
    let candidate_id = seed_candidate(&store, 1, "Budi").await.id;
    seed_token(&store, "AB3D9K", "Siti", "Block A").await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = CastVoteUseCase::new(store.clone());
        handles.push(tokio::spawn(async move {
            engine
                .execute(CastVoteInput {
                    code: "AB3D9K".to_owned(),
                    candidate_id,
                })
                .await
        }));
    }

    let mut accepted = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(ElectionError::AlreadyUsed { .. }) => rejected += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(accepted, 1);
    assert_eq!(rejected, 7);
    assert_eq!(tally(&store, candidate_id).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn should_count_every_concurrent_vote_for_one_candidate() {
    let store = signed_in_store().await;
    let candidate_id = seed_candidate(&store, 1, "Budi").await.id;

    let codes = [
        "AAAAAA", "BBBBBB", "CCCCCC", "DDDDDD", "EEEEEE", "FFFFFF", "GGGGGG", "HHHHHH", "JJJJJJ",
        "KKKKKK",
    ];
    for code in codes {
        seed_token(&store, code, "Voter", "Block A").await;
    }

    // Every transaction increments the same counter document, so each pair
    // of concurrent commits races. None of them may be lost. Attempts are
    // raised above the service default: with ten racers a straggler can
    // conflict more than a handful of times before it wins a round.
    let mut handles = Vec::new();
    for code in codes {
        let engine = CastVoteUseCase {
            store: store.clone(),
            max_attempts: 32,
        };
        handles.push(tokio::spawn(async move {
            engine
                .execute(CastVoteInput {
                    code: code.to_owned(),
                    candidate_id,
                })
                .await
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(tally(&store, candidate_id).await, codes.len() as u64);
}
