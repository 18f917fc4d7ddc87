// tests/permission_tests.rs

mod common;

use common::spawn_app;
use serde_json::{Value, json};

#[tokio::test]
async fn anonymous_can_read_but_not_write() {
    let app = spawn_app().await;
    let admin = app.admin("root").await;
    let title_id = app.seed_title(&admin, "Solaris").await;

    for path in [
        "/categories".to_string(),
        "/genres".to_string(),
        "/titles".to_string(),
        format!("/titles/{title_id}"),
        format!("/titles/{title_id}/reviews"),
    ] {
        let response = app.client.get(app.url(&path)).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 200, "GET {path}");
    }

    let response = app
        .client
        .post(app.url("/categories"))
        .json(&json!({ "name": "Films", "slug": "films" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = app
        .client
        .post(app.url(&format!("/titles/{title_id}/reviews")))
        .json(&json!({ "text": "Nice", "score": 7 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = app.client.get(app.url("/users")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = app.client.get(app.url("/users/me")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn only_admins_manage_the_catalog() {
    let app = spawn_app().await;
    let user = app.user("plain").await;
    let moderator = app.moderator("mod").await;
    let admin = app.admin("root").await;

    for token in [&user, &moderator] {
        let response = app
            .client
            .post(app.url("/genres"))
            .bearer_auth(token)
            .json(&json!({ "name": "Horror", "slug": "horror" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 403);
    }

    let response = app
        .client
        .post(app.url("/genres"))
        .bearer_auth(&admin)
        .json(&json!({ "name": "Horror", "slug": "horror" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "name": "Horror", "slug": "horror" }));

    let response = app
        .client
        .delete(app.url("/genres/horror"))
        .bearer_auth(&user)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = app
        .client
        .delete(app.url("/genres/horror"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);
}

#[tokio::test]
async fn staff_flag_grants_admin_rights() {
    use yamdb_backend::{
        models::user::{NewUser, Role},
        store::UserStore,
    };

    let app = spawn_app().await;
    app.state
        .users
        .create_user(NewUser {
            username: "staffer".into(),
            email: "staffer@example.com".into(),
            role: Role::User,
            is_staff: true,
            ..Default::default()
        })
        .await
        .unwrap();
    let staff = app.token_for("staffer", "staffer@example.com").await;

    let response = app
        .client
        .post(app.url("/categories"))
        .bearer_auth(&staff)
        .json(&json!({ "name": "Music", "slug": "music" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
}

#[tokio::test]
async fn only_author_moderator_or_admin_modify_a_review() {
    let app = spawn_app().await;
    let admin = app.admin("root").await;
    let author = app.user("author").await;
    let stranger = app.user("stranger").await;
    let moderator = app.moderator("mod").await;
    let title_id = app.seed_title(&admin, "Solaris").await;

    let response = app.post_review(&author, title_id, 8).await;
    assert_eq!(response.status().as_u16(), 201);
    let review: Value = response.json().await.unwrap();
    let review_url = app.url(&format!("/titles/{title_id}/reviews/{}", review["id"]));

    let response = app
        .client
        .patch(&review_url)
        .bearer_auth(&stranger)
        .json(&json!({ "score": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = app
        .client
        .patch(&review_url)
        .bearer_auth(&author)
        .json(&json!({ "score": 9, "text": "Even better on re-read." }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["score"], 9);
    assert_eq!(body["author"], "author");

    let response = app
        .client
        .delete(&review_url)
        .bearer_auth(&stranger)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = app
        .client
        .delete(&review_url)
        .bearer_auth(&moderator)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let response = app.client.get(&review_url).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn moderator_and_admin_delete_any_comment() {
    let app = spawn_app().await;
    let admin = app.admin("root").await;
    let author = app.user("author").await;
    let moderator = app.moderator("mod").await;
    let stranger = app.user("stranger").await;
    let title_id = app.seed_title(&admin, "Solaris").await;

    let review: Value = app
        .post_review(&author, title_id, 6)
        .await
        .json()
        .await
        .unwrap();
    let comments_url = app.url(&format!("/titles/{title_id}/reviews/{}/comments", review["id"]));

    let mut urls = Vec::new();
    for _ in 0..2 {
        let response = app
            .client
            .post(&comments_url)
            .bearer_auth(&author)
            .json(&json!({ "text": "Agreed." }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
        let comment: Value = response.json().await.unwrap();
        urls.push(format!("{}/{}", comments_url, comment["id"]));
    }

    let response = app
        .client
        .delete(&urls[0])
        .bearer_auth(&stranger)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    for (url, token) in urls.iter().zip([&moderator, &admin]) {
        let response = app
            .client
            .delete(url)
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 204);
    }
}

#[tokio::test]
async fn user_management_is_admin_only() {
    let app = spawn_app().await;
    let admin = app.admin("root").await;
    let user = app.user("plain").await;

    let response = app
        .client
        .get(app.url("/users"))
        .bearer_auth(&user)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = app
        .client
        .post(app.url("/users"))
        .bearer_auth(&admin)
        .json(&json!({
            "username": "newmod",
            "email": "newmod@example.com",
            "role": "moderator",
            "bio": "Keeps things tidy"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["role"], "moderator");
    assert!(body.get("confirmation_code").is_none());

    let response = app
        .client
        .get(app.url("/users?search=newmod"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["username"], "newmod");

    let response = app
        .client
        .patch(app.url("/users/newmod"))
        .bearer_auth(&admin)
        .json(&json!({ "role": "admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["role"], "admin");

    let response = app
        .client
        .delete(app.url("/users/newmod"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let response = app
        .client
        .get(app.url("/users/newmod"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn admin_cannot_delete_self() {
    let app = spawn_app().await;
    let admin = app.admin("root").await;

    let response = app
        .client
        .delete(app.url("/users/root"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn role_change_applies_to_existing_tokens() {
    let app = spawn_app().await;
    let admin = app.admin("root").await;
    let user = app.user("promoted").await;

    let response = app
        .client
        .patch(app.url("/users/promoted"))
        .bearer_auth(&admin)
        .json(&json!({ "role": "admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let response = app
        .client
        .get(app.url("/users"))
        .bearer_auth(&user)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn profile_patch_keeps_role() {
    let app = spawn_app().await;
    let user = app.user("alice").await;

    let response = app
        .client
        .patch(app.url("/users/me"))
        .bearer_auth(&user)
        .json(&json!({ "role": "admin", "bio": "Reads a lot", "first_name": "Alice" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["role"], "user");
    assert_eq!(body["bio"], "Reads a lot");
    assert_eq!(body["first_name"], "Alice");

    let response = app
        .client
        .get(app.url("/users/me"))
        .bearer_auth(&user)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["username"], "alice");
    assert_eq!(body["role"], "user");

    // Still no admin access.
    let response = app
        .client
        .get(app.url("/users"))
        .bearer_auth(&user)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}
