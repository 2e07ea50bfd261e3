use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestServer};
use serde_json::{Value, json};

use pilketua_election::router::build_router;

use crate::helpers::{signed_in_store, test_state};

async fn spawn_server() -> TestServer {
    let store = signed_in_store().await;
    TestServer::new(build_router(test_state(&store))).unwrap()
}

fn as_admin(request: TestRequest) -> TestRequest {
    request
        .add_header(
            HeaderName::from_static("x-admin-user"),
            HeaderValue::from_static("admin"),
        )
        .add_header(
            HeaderName::from_static("x-admin-pass"),
            HeaderValue::from_static("secret"),
        )
}

#[tokio::test]
async fn should_answer_health_probes() {
    let server = spawn_server().await;
    server.get("/healthz").await.assert_status(StatusCode::OK);
    server.get("/readyz").await.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn should_reject_admin_requests_without_credentials() {
    let server = spawn_server().await;

    let response = server.get("/admin/voters").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["kind"], "UNAUTHORIZED");

    let wrong = server
        .get("/admin/voters")
        .add_header(
            HeaderName::from_static("x-admin-user"),
            HeaderValue::from_static("admin"),
        )
        .add_header(
            HeaderName::from_static("x-admin-pass"),
            HeaderValue::from_static("nope"),
        )
        .await;
    wrong.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn should_delete_voter_from_the_roll() {
    let server = spawn_server().await;

    let voter = as_admin(server.post("/admin/voters"))
        .json(&json!({"name": "Siti", "region": "Block A"}))
        .await;
    voter.assert_status(StatusCode::CREATED);
    let code = voter.json::<Value>()["code"].as_str().unwrap().to_owned();

    // Path codes are normalized like booth input.
    as_admin(server.delete(&format!("/admin/voters/{}", code.to_lowercase())))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let roll = as_admin(server.get("/admin/voters")).await.json::<Value>();
    assert_eq!(roll.as_array().unwrap().len(), 0);

    as_admin(server.delete(&format!("/admin/voters/{code}")))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_reject_voting_when_no_schedule_is_configured() {
    let server = spawn_server().await;

    let response = server
        .post("/vote/validate")
        .json(&json!({"code": "AB3D9K"}))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>()["kind"], "VOTING_NOT_OPEN");

    let schedule = server.get("/schedule").await.json::<Value>();
    assert_eq!(schedule["status"], "not_configured");
    assert_eq!(schedule["acceptingVotes"], false);
}

#[tokio::test]
async fn should_run_the_full_election_flow_over_http() {
    let server = spawn_server().await;

    // Committee opens a window around the current moment.
    let start = chrono::Utc::now() - chrono::Duration::hours(1);
    let end = chrono::Utc::now() + chrono::Duration::hours(1);
    as_admin(server.put("/admin/schedule"))
        .json(&json!({"startTime": start, "endTime": end}))
        .await
        .assert_status(StatusCode::OK);

    let schedule = server.get("/schedule").await.json::<Value>();
    assert_eq!(schedule["status"], "open");
    assert_eq!(schedule["acceptingVotes"], true);

    // Ballot and roll.
    let candidate = as_admin(server.post("/admin/candidates"))
        .json(&json!({"sequenceNumber": 1, "name": "Budi"}))
        .await;
    candidate.assert_status(StatusCode::CREATED);
    let candidate_id = candidate.json::<Value>()["id"].as_str().unwrap().to_owned();

    let voter = as_admin(server.post("/admin/voters"))
        .json(&json!({"name": "Siti", "region": "Block A"}))
        .await;
    voter.assert_status(StatusCode::CREATED);
    let code = voter.json::<Value>()["code"].as_str().unwrap().to_owned();

    // The slip is typed in lowercase at the booth.
    let validated = server
        .post("/vote/validate")
        .json(&json!({"code": code.to_lowercase()}))
        .await;
    validated.assert_status(StatusCode::OK);
    assert_eq!(validated.json::<Value>()["voterName"], "Siti");

    let cast = server
        .post("/vote")
        .json(&json!({"code": code, "candidateId": candidate_id}))
        .await;
    cast.assert_status(StatusCode::CREATED);
    assert_eq!(cast.json::<Value>()["candidateId"], candidate_id.as_str());

    let replay = server
        .post("/vote")
        .json(&json!({"code": code, "candidateId": candidate_id}))
        .await;
    replay.assert_status(StatusCode::CONFLICT);
    assert_eq!(replay.json::<Value>()["kind"], "TOKEN_ALREADY_USED");

    // The scoreboard is pushed by a background feed; give it a moment.
    let mut observed = Value::Null;
    for _ in 0..50 {
        observed = server.get("/results").await.json::<Value>();
        if observed["totals"]["totalVotes"] == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(observed["totals"]["totalVotes"], 1);
    assert_eq!(observed["totals"]["tokensUsed"], 1);
    assert_eq!(observed["leaderboard"][0]["name"], "Budi");
    assert_eq!(observed["leaderboard"][0]["voteCount"], 1);

    let breakdown = server.get("/results/regions/Block%20A").await;
    breakdown.assert_status(StatusCode::OK);
    let breakdown = breakdown.json::<Value>();
    assert_eq!(breakdown["tokensIssued"], 1);
    assert_eq!(breakdown["tokensUsed"], 1);
}
