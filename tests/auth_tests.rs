// tests/auth_tests.rs

mod common;

use common::spawn_app;
use serde_json::Value;

#[tokio::test]
async fn unknown_path_is_404() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/random_path_that_does_not_exist"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn signup_reissue_and_single_use_codes() {
    let app = spawn_app().await;

    // First signup mails C1.
    let response = app.signup("alice", "alice@example.com").await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "alice@example.com");
    assert!(body.get("confirmation_code").is_none());
    let c1 = app.mailer.last_code_for("alice@example.com").unwrap();

    // Same username, different email.
    let response = app.signup("alice", "other@example.com").await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "email_mismatch");

    // Re-issue rotates the code.
    let response = app.signup("alice", "alice@example.com").await;
    assert_eq!(response.status().as_u16(), 200);
    let c2 = app.mailer.last_code_for("alice@example.com").unwrap();
    assert_ne!(c1, c2);

    let response = app.request_token("alice", &c1).await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "invalid_confirmation_code");

    let response = app.request_token("alice", &c2).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));

    // Replay.
    let response = app.request_token("alice", &c2).await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "invalid_confirmation_code");
}

#[tokio::test]
async fn each_exchange_yields_a_distinct_token() {
    let app = spawn_app().await;

    let first = app.token_for("bob", "bob@example.com").await;
    let second = app.token_for("bob", "bob@example.com").await;
    assert_ne!(first, second);
}

#[tokio::test]
async fn malformed_and_reserved_usernames_are_rejected() {
    let app = spawn_app().await;

    for bad in ["bad name", "bad#name", ""] {
        let response = app.signup(bad, "x@example.com").await;
        assert_eq!(response.status().as_u16(), 400, "accepted {bad:?}");
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["field"], "username");
    }

    let response = app.signup(&"a".repeat(151), "x@example.com").await;
    assert_eq!(response.status().as_u16(), 400);

    let response = app.signup("me", "me@example.com").await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "reserved_username");

    assert_eq!(app.mailer.sent_count(), 0);
}

#[tokio::test]
async fn invalid_email_is_rejected() {
    let app = spawn_app().await;

    let response = app.signup("carol", "not-an-email").await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["field"], "email");
}

#[tokio::test]
async fn email_of_another_user_conflicts() {
    let app = spawn_app().await;

    assert_eq!(app.signup("dave", "shared@example.com").await.status().as_u16(), 200);
    let response = app.signup("erin", "shared@example.com").await;
    assert_eq!(response.status().as_u16(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "email_taken");
}

#[tokio::test]
async fn token_for_unknown_user_is_404() {
    let app = spawn_app().await;

    let response = app.request_token("ghost", "ABCDEF").await;
    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "user_not_found");
}

#[tokio::test]
async fn mail_failure_is_503_and_signup_can_be_retried() {
    let app = spawn_app().await;

    app.mailer.set_failing(true);
    let response = app.signup("frank", "frank@example.com").await;
    assert_eq!(response.status().as_u16(), 503);

    // The account exists, so a retry is a re-issue to the same email.
    app.mailer.set_failing(false);
    let token = app.token_for("frank", "frank@example.com").await;
    assert!(!token.is_empty());
}

#[tokio::test]
async fn garbage_bearer_token_is_401() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/users/me"))
        .bearer_auth("not.a.jwt")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn overlong_wrong_code_is_an_invalid_confirmation_code() {
    let app = spawn_app().await;
    assert_eq!(app.signup("dora", "dora@example.com").await.status().as_u16(), 200);

    let response = app.request_token("dora", &"X".repeat(40)).await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "invalid_confirmation_code");
}
