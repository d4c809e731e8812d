use std::net::SocketAddr;
use std::sync::Arc;

use fonteval_api::auth::UserDirectory;
use fonteval_api::config::{FeedbackBackend, ServerConfig};
use fonteval_api::router::build_app_router;
use fonteval_api::state::AppState;
use fonteval_core::prompts::PromptCatalog;
use fonteval_db::file_store::FileFeedbackStore;
use fonteval_db::pg_store::PgFeedbackStore;
use fonteval_db::FeedbackStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fonteval_api=debug,fonteval_db=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        backend = ?config.backend,
        "Loaded server configuration",
    );

    let catalog = Arc::new(PromptCatalog::default());

    // --- Feedback store ---
    let (store, pool) = match config.backend {
        FeedbackBackend::File => {
            let store: Arc<dyn FeedbackStore> = Arc::new(
                FileFeedbackStore::open(config.feedback_file.clone())
                    .await
                    .expect("Failed to open feedback file"),
            );
            tracing::info!(path = %config.feedback_file.display(), "File feedback store ready");
            (store, None)
        }
        FeedbackBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .expect("DATABASE_URL must be set for the postgres backend");

            let pool = fonteval_db::create_pool(database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            fonteval_db::health_check(&pool)
                .await
                .expect("Database health check failed");
            tracing::info!("Database health check passed");

            fonteval_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");

            let store: Arc<dyn FeedbackStore> =
                Arc::new(PgFeedbackStore::new(pool.clone(), (*catalog).clone()));
            (store, Some(pool))
        }
    };

    // --- Users ---
    let users = UserDirectory::load(&config.users_file)
        .await
        .expect("Failed to load users file");
    if users.is_empty() {
        tracing::warn!(path = %config.users_file.display(), "User directory is empty; every login will fail");
    }

    // --- App state ---
    let state = AppState {
        store,
        users: Arc::new(users),
        catalog,
        pool,
        config: Arc::new(config.clone()),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
