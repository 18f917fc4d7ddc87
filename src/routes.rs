// src/routes.rs

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{delete, get, post},
};
use tower::ServiceBuilder;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, catalog, comments, reviews, titles, users},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Everything lives under `/api/v1`.
/// * The auth routes get a per-IP rate limit when one is configured. Serving
///   the router then requires connect info (`into_make_service_with_connect_info`).
/// * Trace and CORS wrap the whole tree.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let mut auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/token", post(auth::token));

    if let Some(limit) = state.config.auth_rate_limit {
        match GovernorConfigBuilder::default()
            .per_second(limit.per_second)
            .burst_size(limit.burst_size)
            .finish()
        {
            Some(governor_conf) => {
                auth_routes = auth_routes.layer(GovernorLayer::new(Arc::new(governor_conf)));
            }
            None => tracing::warn!("Invalid auth rate limit {:?}, limiter disabled", limit),
        }
    }

    let term_routes = Router::new()
        .route(
            "/categories",
            get(catalog::list_categories).post(catalog::create_category),
        )
        .route("/categories/{slug}", delete(catalog::delete_category))
        .route(
            "/genres",
            get(catalog::list_genres).post(catalog::create_genre),
        )
        .route("/genres/{slug}", delete(catalog::delete_genre));

    let title_routes = Router::new()
        .route("/", get(titles::list_titles).post(titles::create_title))
        .route(
            "/{title_id}",
            get(titles::get_title)
                .patch(titles::update_title)
                .delete(titles::delete_title),
        )
        .route(
            "/{title_id}/reviews",
            get(reviews::list_reviews).post(reviews::create_review),
        )
        .route(
            "/{title_id}/reviews/{review_id}",
            get(reviews::get_review)
                .patch(reviews::update_review)
                .delete(reviews::delete_review),
        )
        .route(
            "/{title_id}/reviews/{review_id}/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/{title_id}/reviews/{review_id}/comments/{comment_id}",
            get(comments::get_comment)
                .patch(comments::update_comment)
                .delete(comments::delete_comment),
        );

    // The profile segment is a static route, so it wins over `{username}`.
    let profile_path = format!("/{}", state.config.profile_endpoint);
    let user_routes = Router::new()
        .route("/", get(users::list_users).post(users::create_user))
        .route(&profile_path, get(users::get_me).patch(users::update_me))
        .route(
            "/{username}",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        );

    let api = Router::new()
        .nest("/auth", auth_routes)
        .merge(term_routes)
        .nest("/titles", title_routes)
        .nest("/users", user_routes);

    Router::new()
        .nest("/api/v1", api)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
