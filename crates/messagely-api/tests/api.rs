use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use messagely_api::auth::AppStateInner;
use messagely_api::credentials::HashCost;
use messagely_db::Database;

fn app() -> Router {
    let db = Database::open_in_memory().unwrap();
    let state = AppStateInner::new(db, "test-secret", HashCost::MIN).unwrap();
    messagely_api::router(state)
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => req.body(Body::empty()),
    }
    .unwrap();

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn register(app: &Router, username: &str, password: &str, first: &str, phone: &str) -> String {
    let (status, body) = call(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "username": username,
            "password": password,
            "first_name": first,
            "last_name": "A",
            "phone": phone,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn alice_and_bob_exchange_a_message() {
    let app = app();
    let alice = register(&app, "alice", "secret1", "Alice", "555-0001").await;
    let bob = register(&app, "bob", "secret2", "Bob", "555-0002").await;

    let (status, sent) = call(
        &app,
        "POST",
        "/messages",
        Some(&alice),
        Some(json!({ "to_username": "bob", "body": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sent["message"]["from_username"], "alice");
    assert_eq!(sent["message"]["to_username"], "bob");
    let id = sent["message"]["id"].as_str().unwrap().to_string();

    let (status, detail) = call(&app, "GET", &format!("/messages/{id}"), Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["message"]["body"], "hi");
    assert_eq!(detail["message"]["from_user"]["first_name"], "Alice");
    assert_eq!(detail["message"]["to_user"]["phone"], "555-0002");
    assert!(detail["message"]["read_at"].is_null());
    assert!(detail["message"]["from_user"].get("password").is_none());

    let read_uri = format!("/messages/{id}/read");
    let (status, body) = call(&app, "POST", &read_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, receipt) = call(&app, "POST", &read_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["message"]["id"], id.as_str());
    assert!(receipt["message"]["read_at"].is_string());

    let (_, detail) = call(&app, "GET", &format!("/messages/{id}"), Some(&alice), None).await;
    assert_eq!(detail["message"]["read_at"], receipt["message"]["read_at"]);
}

#[tokio::test]
async fn outsiders_cannot_view_a_message() {
    let app = app();
    let alice = register(&app, "alice", "secret1", "Alice", "555-0001").await;
    register(&app, "bob", "secret2", "Bob", "555-0002").await;
    let carol = register(&app, "carol", "secret3", "Carol", "555-0003").await;

    let (_, sent) = call(
        &app,
        "POST",
        "/messages",
        Some(&alice),
        Some(json!({ "to_username": "bob", "body": "private" })),
    )
    .await;
    let id = sent["message"]["id"].as_str().unwrap();

    let (status, _) = call(&app, "GET", &format!("/messages/{id}"), Some(&carol), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_checks_credentials() {
    let app = app();
    register(&app, "alice", "secret1", "Alice", "555-0001").await;

    let (status, body) = call(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap();

    let (status, _) = call(&app, "GET", "/users", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Incorrect username/password.");

    let (status, _) = call(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": "mallory", "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, "POST", "/auth/login", None, Some(json!({ "username": "alice" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn registration_rejects_missing_fields_and_duplicates() {
    let app = app();

    let (status, body) = call(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "username": "alice", "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please enter all required information");

    register(&app, "alice", "secret1", "Alice", "555-0001").await;

    let (status, body) = call(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "username": "alice",
            "password": "other",
            "first_name": "Imposter",
            "last_name": "Z",
            "phone": "555-6666",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Username is taken. Please select another");
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let app = app();

    let (status, _) = call(&app, "GET", "/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, "GET", "/users", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let foreign = messagely_api::tokens::TokenIssuer::new("other-secret")
        .issue("alice")
        .unwrap();
    let (status, _) = call(&app, "GET", "/users", Some(&foreign), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn users_see_only_their_own_profile_and_mailboxes() {
    let app = app();
    let alice = register(&app, "alice", "secret1", "Alice", "555-0001").await;
    let bob = register(&app, "bob", "secret2", "Bob", "555-0002").await;

    call(
        &app,
        "POST",
        "/messages",
        Some(&alice),
        Some(json!({ "to_username": "bob", "body": "hi bob" })),
    )
    .await;

    let (status, body) = call(&app, "GET", "/users", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"].as_array().unwrap().len(), 2);
    assert!(body["users"][0].get("join_at").is_none());

    let (status, body) = call(&app, "GET", "/users/bob", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "bob");
    assert!(body["user"]["last_login_at"].is_string());

    let (status, _) = call(&app, "GET", "/users/alice", Some(&bob), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(&app, "GET", "/users/bob/to", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["messages"][0]["body"], "hi bob");
    assert_eq!(body["messages"][0]["from_user"]["username"], "alice");

    let (status, body) = call(&app, "GET", "/users/alice/from", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["messages"][0]["to_user"]["username"], "bob");

    let (status, _) = call(&app, "GET", "/users/alice/from", Some(&bob), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_message_is_not_found() {
    let app = app();
    let alice = register(&app, "alice", "secret1", "Alice", "555-0001").await;
    let id = uuid::Uuid::new_v4();

    let (status, _) = call(&app, "GET", &format!("/messages/{id}"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, "POST", &format!("/messages/{id}/read"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_message_is_rejected() {
    let app = app();
    let alice = register(&app, "alice", "secret1", "Alice", "555-0001").await;

    let (status, _) = call(
        &app,
        "POST",
        "/messages",
        Some(&alice),
        Some(json!({ "to_username": "bob" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_moves_last_login_forward() {
    let app = app();
    let token = register(&app, "alice", "secret1", "Alice", "555-0001").await;

    let (_, before) = call(&app, "GET", "/users/alice", Some(&token), None).await;
    let before = before["user"]["last_login_at"].as_str().unwrap().to_string();

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let (status, _) = call(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, after) = call(&app, "GET", "/users/alice", Some(&token), None).await;
    let after = after["user"]["last_login_at"].as_str().unwrap();

    let parse = |raw: &str| raw.parse::<chrono::DateTime<chrono::Utc>>().unwrap();
    assert!(parse(after) > parse(&before));
}

#[tokio::test]
async fn null_fields_count_as_missing() {
    let app = app();

    let (status, body) = call(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "username": "alice",
            "password": "secret1",
            "first_name": "Alice",
            "last_name": "A",
            "phone": null,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please enter all required information");

    let (status, body) = call(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": "alice", "password": null })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please enter username and password");

    let alice = register(&app, "alice", "secret1", "Alice", "555-0001").await;
    let (status, body) = call(
        &app,
        "POST",
        "/messages",
        Some(&alice),
        Some(json!({ "to_username": "alice", "body": null })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn extra_fields_are_ignored() {
    let app = app();

    let (status, body) = call(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "username": "alice",
            "password": "secret1",
            "first_name": "Alice",
            "last_name": "A",
            "phone": "555-0001",
            "email": "x",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (status, body) = call(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "secret1", "remember": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap();

    let (status, body) = call(
        &app,
        "POST",
        "/messages",
        Some(token),
        Some(json!({ "to_username": "alice", "body": "note to self", "priority": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"]["body"], "note to self");
}

#[tokio::test]
async fn malformed_bodies_and_ids_get_json_errors() {
    let app = app();
    let alice = register(&app, "alice", "secret1", "Alice", "555-0001").await;

    let req = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].is_string());

    let (status, body) = call(&app, "POST", "/auth/login", None, Some(json!({ "username": 5 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = call(&app, "GET", "/messages/abc", Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Resource not found");

    let (status, body) = call(&app, "POST", "/messages/abc/read", Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}
