// tests/review_tests.rs

mod common;

use common::spawn_app;
use serde_json::{Value, json};

#[tokio::test]
async fn concurrent_duplicate_review_yields_one_conflict() {
    let app = spawn_app().await;
    let admin = app.admin("root").await;
    let user = app.user("racer").await;
    let title_id = app.seed_title(&admin, "Solaris").await;

    let (first, second) = tokio::join!(
        app.post_review(&user, title_id, 7),
        app.post_review(&user, title_id, 9),
    );
    let mut statuses = [first.status().as_u16(), second.status().as_u16()];
    statuses.sort();
    assert_eq!(statuses, [201, 409]);

    let body: Value = app
        .client
        .get(app.url(&format!("/titles/{title_id}/reviews")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn second_review_by_same_author_conflicts() {
    let app = spawn_app().await;
    let admin = app.admin("root").await;
    let user = app.user("repeat").await;
    let title_id = app.seed_title(&admin, "Solaris").await;

    assert_eq!(app.post_review(&user, title_id, 5).await.status().as_u16(), 201);
    let response = app.post_review(&user, title_id, 6).await;
    assert_eq!(response.status().as_u16(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "duplicate_review");
}

#[tokio::test]
async fn out_of_range_score_is_rejected_without_side_effects() {
    let app = spawn_app().await;
    let admin = app.admin("root").await;
    let user = app.user("critic").await;
    let title_id = app.seed_title(&admin, "Solaris").await;

    for score in [0, 11] {
        let response = app.post_review(&user, title_id, score).await;
        assert_eq!(response.status().as_u16(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["code"], "score_out_of_range");
        assert_eq!(body["field"], "score");
    }

    let body: Value = app
        .client
        .get(app.url(&format!("/titles/{title_id}/reviews")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 0);

    // The failed attempts did not consume the one review slot.
    assert_eq!(app.post_review(&user, title_id, 10).await.status().as_u16(), 201);
}

#[tokio::test]
async fn review_on_missing_title_is_404() {
    let app = spawn_app().await;
    let user = app.user("critic").await;

    let response = app.post_review(&user, 4242, 5).await;
    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "title_not_found");
}

#[tokio::test]
async fn rating_is_null_then_mean_of_scores() {
    let app = spawn_app().await;
    let admin = app.admin("root").await;
    let title_id = app.seed_title(&admin, "Solaris").await;
    let title_url = app.url(&format!("/titles/{title_id}"));

    let body: Value = app.client.get(&title_url).send().await.unwrap().json().await.unwrap();
    assert!(body["rating"].is_null());

    for (name, score) in [("r1", 10), ("r2", 7), ("r3", 3)] {
        let token = app.user(name).await;
        assert_eq!(app.post_review(&token, title_id, score).await.status().as_u16(), 201);
    }

    let body: Value = app.client.get(&title_url).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["rating"].as_f64(), Some(6.67));

    // Deleting every review brings the rating back to null, not zero.
    let reviews: Value = app
        .client
        .get(app.url(&format!("/titles/{title_id}/reviews")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    for review in reviews["results"].as_array().unwrap() {
        let response = app
            .client
            .delete(app.url(&format!("/titles/{title_id}/reviews/{}", review["id"])))
            .bearer_auth(&admin)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 204);
    }
    let body: Value = app.client.get(&title_url).send().await.unwrap().json().await.unwrap();
    assert!(body["rating"].is_null());
}

#[tokio::test]
async fn reviews_list_newest_first_and_author_is_the_caller() {
    let app = spawn_app().await;
    let admin = app.admin("root").await;
    let title_id = app.seed_title(&admin, "Solaris").await;

    let first = app.user("first").await;
    let second = app.user("second").await;
    let response = app
        .client
        .post(app.url(&format!("/titles/{title_id}/reviews")))
        .bearer_auth(&first)
        .json(&json!({ "text": "Mine", "score": 4, "author": "second" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["author"], "first");
    assert!(body["pub_date"].is_string());

    assert_eq!(app.post_review(&second, title_id, 8).await.status().as_u16(), 201);

    let body: Value = app
        .client
        .get(app.url(&format!("/titles/{title_id}/reviews")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 2);
    assert_eq!(body["results"][0]["author"], "second");
    assert_eq!(body["results"][1]["author"], "first");
}

#[tokio::test]
async fn review_under_other_title_is_not_found() {
    let app = spawn_app().await;
    let admin = app.admin("root").await;
    let user = app.user("critic").await;
    let solaris = app.seed_title(&admin, "Solaris").await;
    let eden = app.seed_title(&admin, "Eden").await;

    let review: Value = app.post_review(&user, solaris, 9).await.json().await.unwrap();

    let response = app
        .client
        .get(app.url(&format!("/titles/{eden}/reviews/{}", review["id"])))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let response = app
        .client
        .post(app.url(&format!("/titles/{eden}/reviews/{}/comments", review["id"])))
        .bearer_auth(&user)
        .json(&json!({ "text": "Wrong place" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "review_not_found");
}

#[tokio::test]
async fn comment_lifecycle() {
    let app = spawn_app().await;
    let admin = app.admin("root").await;
    let author = app.user("author").await;
    let title_id = app.seed_title(&admin, "Solaris").await;
    let review: Value = app.post_review(&author, title_id, 8).await.json().await.unwrap();
    let comments_url = app.url(&format!("/titles/{title_id}/reviews/{}/comments", review["id"]));

    let response = app
        .client
        .post(&comments_url)
        .bearer_auth(&author)
        .json(&json!({ "text": "<b>Bold</b> claim<script>alert(1)</script>" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let comment: Value = response.json().await.unwrap();
    assert_eq!(comment["text"], "<b>Bold</b> claim");
    assert_eq!(comment["author"], "author");
    let comment_url = format!("{}/{}", comments_url, comment["id"]);

    let response = app
        .client
        .patch(&comment_url)
        .bearer_auth(&author)
        .json(&json!({ "text": "Edited" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = app.client.get(&comment_url).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["text"], "Edited");

    let response = app
        .client
        .post(&comments_url)
        .bearer_auth(&author)
        .json(&json!({ "text": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let body: Value = app.client.get(&comments_url).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn deleting_a_title_removes_its_reviews() {
    let app = spawn_app().await;
    let admin = app.admin("root").await;
    let user = app.user("critic").await;
    let title_id = app.seed_title(&admin, "Solaris").await;
    assert_eq!(app.post_review(&user, title_id, 5).await.status().as_u16(), 201);

    let response = app
        .client
        .delete(app.url(&format!("/titles/{title_id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let response = app
        .client
        .get(app.url(&format!("/titles/{title_id}/reviews")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn malformed_review_bodies_get_json_errors() {
    let app = spawn_app().await;
    let admin = app.admin("root").await;
    let user = app.user("sloppy").await;
    let title_id = app.seed_title(&admin, "Solaris").await;

    for body in [
        json!({ "text": "x", "score": 7.5 }),
        json!({ "text": "x" }),
        json!({ "text": "x", "score": "seven" }),
    ] {
        let response = app
            .client
            .post(app.url(&format!("/titles/{title_id}/reviews")))
            .bearer_auth(&user)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 400, "{body}");
        let error: Value = response.json().await.unwrap();
        assert_eq!(error["code"], "invalid");
        assert_eq!(error["field"], "score");
        assert!(error["error"].as_str().is_some_and(|m| !m.is_empty()));
    }

    let response = app
        .client
        .post(app.url(&format!("/titles/{title_id}/reviews")))
        .bearer_auth(&user)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 400);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["code"], "invalid");

    let body: Value = app
        .client
        .get(app.url(&format!("/titles/{title_id}/reviews")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn non_numeric_ids_get_json_errors() {
    let app = spawn_app().await;
    let admin = app.admin("root").await;
    let title_id = app.seed_title(&admin, "Solaris").await;

    for path in [
        "/titles/abc".to_string(),
        format!("/titles/{title_id}/reviews/abc"),
        format!("/titles/{title_id}/reviews/1/comments/abc"),
    ] {
        let response = app
            .client
            .get(app.url(&path))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 400, "{path}");
        let error: Value = response.json().await.unwrap();
        assert_eq!(error["code"], "invalid");
    }
}
