use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    services::accounts::UsernamePolicy,
    store::{CatalogStore, ReviewStore, UserStore},
    utils::{jwt::JwtSigner, mail::Mailer},
};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub reviews: Arc<dyn ReviewStore>,
    pub mailer: Arc<dyn Mailer>,
    pub tokens: JwtSigner,
    pub usernames: UsernamePolicy,
    pub config: Config,
}

impl AppState {
    /// Builds the state around one store that backs all three ports.
    pub fn new<S>(store: Arc<S>, mailer: Arc<dyn Mailer>, config: Config) -> Self
    where
        S: UserStore + CatalogStore + ReviewStore + 'static,
    {
        Self {
            users: store.clone(),
            catalog: store.clone(),
            reviews: store,
            mailer,
            tokens: JwtSigner::new(&config.jwt_secret, config.jwt_expiration),
            usernames: UsernamePolicy::from_config(&config),
            config,
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
