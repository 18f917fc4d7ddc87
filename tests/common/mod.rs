// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use serde_json::{Value, json};
use yamdb_backend::{
    config::Config,
    models::user::{NewUser, Role},
    routes,
    state::AppState,
    store::{UserStore, memory::MemoryStore},
    utils::mail::{MailError, Mailer},
};

/// Captures outgoing mail instead of delivering it. Can be switched into a
/// failing mode to simulate an unreachable mail server.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// The code from the most recent mail sent to `email`.
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        sent.iter().rev().find(|(to, _)| to == email).and_then(|(_, body)| {
            body.split("access token: ")
                .nth(1)
                .map(|rest| rest.trim().to_string())
        })
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, _subject: &str, body: &str) -> Result<(), MailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError("smtp unreachable".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        Ok(())
    }
}

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
}

/// Helper function to spawn the app on a random port for testing.
/// Backed by the in-memory store, so no database is required.
pub async fn spawn_app() -> TestApp {
    let mailer = Arc::new(RecordingMailer::default());
    let config = Config::for_testing("test_secret_for_integration_tests");
    let state = AppState::new(Arc::new(MemoryStore::new()), mailer.clone(), config);

    let app = routes::create_router(state.clone());

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}/api/v1", port),
        client: reqwest::Client::new(),
        state,
        mailer,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn signup(&self, username: &str, email: &str) -> reqwest::Response {
        self.client
            .post(self.url("/auth/signup"))
            .json(&json!({ "username": username, "email": email }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn request_token(&self, username: &str, code: &str) -> reqwest::Response {
        self.client
            .post(self.url("/auth/token"))
            .json(&json!({ "username": username, "confirmation_code": code }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Signs up (or re-issues for an existing account) and trades the mailed
    /// code for a token.
    pub async fn token_for(&self, username: &str, email: &str) -> String {
        let response = self.signup(username, email).await;
        assert_eq!(response.status().as_u16(), 200, "signup failed for {username}");
        let code = self.mailer.last_code_for(email).expect("no code mailed");

        let response = self.request_token(username, &code).await;
        assert_eq!(response.status().as_u16(), 200, "token failed for {username}");
        let body: Value = response.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    /// A signed-in plain user.
    pub async fn user(&self, username: &str) -> String {
        self.token_for(username, &format!("{username}@example.com"))
            .await
    }

    /// A signed-in user with the given role, created directly in the store.
    pub async fn user_with_role(&self, username: &str, role: Role) -> String {
        let email = format!("{username}@example.com");
        self.state
            .users
            .create_user(NewUser {
                username: username.to_string(),
                email: email.clone(),
                role,
                ..Default::default()
            })
            .await
            .expect("Failed to create user");
        self.token_for(username, &email).await
    }

    pub async fn admin(&self, username: &str) -> String {
        self.user_with_role(username, Role::Admin).await
    }

    pub async fn moderator(&self, username: &str) -> String {
        self.user_with_role(username, Role::Moderator).await
    }

    /// Seeds a category, two genres and one title as `admin_token`.
    /// Returns the title id.
    pub async fn seed_title(&self, admin_token: &str, name: &str) -> i64 {
        for (path, body) in [
            ("/categories", json!({ "name": "Books", "slug": "books" })),
            ("/genres", json!({ "name": "Science fiction", "slug": "sci-fi" })),
            ("/genres", json!({ "name": "Drama", "slug": "drama" })),
        ] {
            // Repeated seeding within one app hits 409; that is fine.
            self.client
                .post(self.url(path))
                .bearer_auth(admin_token)
                .json(&body)
                .send()
                .await
                .expect("Failed to execute request");
        }

        let response = self
            .client
            .post(self.url("/titles"))
            .bearer_auth(admin_token)
            .json(&json!({
                "name": name,
                "year": 1961,
                "description": "A planet that thinks.",
                "genre": ["sci-fi", "drama"],
                "category": "books"
            }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.unwrap();
        body["id"].as_i64().unwrap()
    }

    pub async fn post_review(&self, token: &str, title_id: i64, score: i64) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/titles/{title_id}/reviews")))
            .bearer_auth(token)
            .json(&json!({ "text": "Worth reading.", "score": score }))
            .send()
            .await
            .expect("Failed to execute request")
    }
}
