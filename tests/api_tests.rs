//! HTTP surface tests over the in-memory backend.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot`
use wiki_survey::routes::create_routes;
use wiki_survey::Survey;

fn setup_app() -> Router {
    create_routes(Survey::in_memory())
}

fn request(method: &str, uri: &str, participant: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(p) = participant {
        builder = builder.header("x-participant-id", p);
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Should parse JSON")
    };
    (status, body)
}

async fn create_question(app: &Router) -> (String, String, String) {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/api/questions",
            None,
            Some(json!({
                "text": "What should the library offer?",
                "creator_id": "admin",
                "idea1": "Longer opening hours",
                "idea2": "A wonderful reading garden"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    (
        body["question_id"].as_str().unwrap().to_string(),
        body["ideas"][0]["id"].as_str().unwrap().to_string(),
        body["ideas"][1]["id"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn health_endpoint() {
    let app = setup_app();
    let (status, body) = send(&app, request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn create_question_rejects_blank_seed() {
    let app = setup_app();
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/questions",
            None,
            Some(json!({ "text": "Q", "creator_id": "admin", "idea1": "a", "idea2": "  " })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION");
}

#[tokio::test]
async fn vote_flow() {
    let app = setup_app();
    let (q, a, b) = create_question(&app).await;

    let (status, body) = send(&app, request("GET", &format!("/api/questions/{q}/pair"), Some("p1"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Unvoted");
    assert!(body["pair"]["left"]["id"].is_string());

    let vote = json!({ "winner_id": a, "loser_id": b });
    let uri = format!("/api/questions/{q}/votes");

    let (status, body) = send(&app, request("POST", &uri, Some("p1"), Some(vote.clone()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "recorded");

    let (status, body) = send(&app, request("POST", &uri, Some("p1"), Some(vote))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "already_voted");

    let (_, body) = send(&app, request("GET", &format!("/api/questions/{q}/pair"), Some("p1"), None)).await;
    assert_eq!(body["status"], "Voted");
    assert!(body["pair"].is_null());

    let (_, body) = send(&app, request("GET", &format!("/api/ideas/{a}/tally"), None, None)).await;
    assert_eq!(body["wins"], 1);
    assert_eq!(body["losses"], 0);

    let (_, body) = send(&app, request("GET", &format!("/api/questions/{q}/ranking"), None, None)).await;
    assert_eq!(body[0]["idea_id"], a);
    assert_eq!(body[0]["win_percentage"], 100.0);
    assert_eq!(body[1]["win_percentage"], 0.0);
    assert_eq!(body[0]["sentiment"]["label"], "Neutral");
    assert_eq!(body[1]["sentiment"]["label"], "Positive");
    assert!(body[1]["sentiment"]["score"].as_f64().unwrap() > 0.1);

    let (_, body) = send(&app, request("GET", &format!("/api/questions/{q}/statistics"), None, None)).await;
    assert_eq!(body["total_votes"], 1);
    assert_eq!(body["idea_count"], 2);

    let (_, body) = send(&app, request("GET", "/api/participants/me/questions", Some("p1"), None)).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
    let (_, body) = send(&app, request("GET", "/api/participants/me/questions", Some("p2"), None)).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn vote_requires_participant_header() {
    let app = setup_app();
    let (q, a, b) = create_question(&app).await;
    let (status, body) = send(
        &app,
        request(
            "POST",
            &format!("/api/questions/{q}/votes"),
            None,
            Some(json!({ "winner_id": a, "loser_id": b })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION");
}

#[tokio::test]
async fn vote_for_same_idea_is_rejected() {
    let app = setup_app();
    let (q, a, _) = create_question(&app).await;
    let (status, _) = send(
        &app,
        request(
            "POST",
            &format!("/api/questions/{q}/votes"),
            Some("p1"),
            Some(json!({ "winner_id": a, "loser_id": a })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ideas_comments_and_sentiment() {
    let app = setup_app();
    let (q, _, _) = create_question(&app).await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            &format!("/api/questions/{q}/ideas"),
            None,
            Some(json!({ "text": "This is terrible" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["label"], "Negative");

    let (status, body) = send(
        &app,
        request(
            "POST",
            &format!("/api/questions/{q}/comments"),
            Some("p1"),
            Some(json!({ "text": "Great initiative" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["label"], "Positive");

    let (_, ideas) = send(&app, request("GET", &format!("/api/questions/{q}/ideas"), None, None)).await;
    assert_eq!(ideas.as_array().unwrap().len(), 3);
    assert_eq!(ideas[2]["origin"], "UserSubmitted");

    let (_, snapshot) = send(&app, request("GET", &format!("/api/questions/{q}/sentiment"), None, None)).await;
    assert_eq!(snapshot["idea_counts"]["negative"], 1);
    assert_eq!(snapshot["idea_counts"]["positive"], 1);
    assert_eq!(snapshot["comment_counts"]["positive"], 1);

    let (_, rows) = send(&app, request("GET", "/api/analytics/comparison", None, None)).await;
    assert_eq!(rows[0]["question_id"], q);
    assert_eq!(rows[0]["total_positive"], 2);

    let (_, overview) = send(&app, request("GET", &format!("/api/questions/{q}/overview"), None, None)).await;
    assert_eq!(overview["items"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn malformed_question_id_uses_error_body() {
    let app = setup_app();
    let (status, body) = send(&app, request("GET", "/api/questions/not-a-uuid/ranking", None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION");
    assert!(body["error"]["message"].is_string());
}

#[tokio::test]
async fn malformed_json_body_uses_error_body() {
    let app = setup_app();
    let (q, _, _) = create_question(&app).await;
    let req = Request::builder()
        .method("POST")
        .uri(format!("/api/questions/{q}/votes"))
        .header("x-participant-id", "p1")
        .header("content-type", "application/json")
        .body(Body::from("{\"winner_id\": "))
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION");

    let (status, body) = send(
        &app,
        request("POST", "/api/questions", None, Some(json!({ "text": "missing fields" }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION");
}

#[tokio::test]
async fn unknown_question_is_404() {
    let app = setup_app();
    let uri = format!("/api/questions/{}/ranking", uuid::Uuid::new_v4());
    let (status, body) = send(&app, request("GET", &uri, None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn profile_is_saved_once() {
    let app = setup_app();
    let form = json!({ "country": "Kenya", "age": 34, "sex": "Other", "occupation": "Engineer" });

    let (status, body) = send(
        &app,
        request("PUT", "/api/participants/me/profile", Some("p1"), Some(form.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "saved");

    let (_, body) = send(
        &app,
        request("PUT", "/api/participants/me/profile", Some("p1"), Some(form)),
    )
    .await;
    assert_eq!(body["status"], "already_submitted");

    let (status, body) = send(&app, request("GET", "/api/participants/me/profile", Some("p1"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["country"], "Kenya");

    let (status, _) = send(&app, request("GET", "/api/participants/me/profile", Some("p2"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
