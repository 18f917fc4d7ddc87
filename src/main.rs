// src/main.rs

use std::{net::SocketAddr, sync::Arc, time::Duration};

use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use yamdb_backend::{
    config::Config,
    routes,
    services::accounts,
    state::AppState,
    store::{memory::MemoryStore, postgres::PgStore},
    utils::mail::{FileMailer, LogMailer, Mailer},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from environment (.env included)
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let mailer: Arc<dyn Mailer> = match &config.mail_dir {
        Some(dir) => {
            tracing::info!("Writing outgoing mail to {}", dir.display());
            Arc::new(FileMailer {
                from: config.mail_from.clone(),
                dir: dir.clone(),
            })
        }
        None => Arc::new(LogMailer {
            from: config.mail_from.clone(),
        }),
    };

    let state = match &config.database_url {
        Some(url) => {
            let pool = connect_with_retry(url).await?;

            // Run Migrations Automatically
            tracing::info!("Running migrations...");
            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Migrations applied successfully.");

            AppState::new(Arc::new(PgStore::new(pool)), mailer, config.clone())
        }
        None => {
            tracing::warn!("DATABASE_URL is not set, data will be kept in memory only");
            AppState::new(Arc::new(MemoryStore::new()), mailer, config.clone())
        }
    };

    if let Err(e) = accounts::seed_admin(&state).await {
        tracing::error!("Failed to seed admin user: {:?}", e);
    }

    let app = routes::create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Connect info feeds the per-IP rate limiter on the auth routes.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Initialize Database Pool with Retry
async fn connect_with_retry(url: &str) -> Result<PgPool, sqlx::Error> {
    let mut retry_count = 0;
    loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(url)
            .await
        {
            Ok(pool) => {
                tracing::info!("Database connected...");
                return Ok(pool);
            }
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    tracing::error!("Failed to connect to database after 5 retries: {}", e);
                    return Err(e);
                }
                tracing::warn!(
                    "Database not ready, retrying in 2s... (Attempt {})",
                    retry_count
                );
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
}
