use std::path::PathBuf;
use std::str::FromStr;

/// Which [`FeedbackStore`](fonteval_db::FeedbackStore) the service runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackBackend {
    /// One JSON document on local disk.
    File,
    /// The `font_scores` table; also enables the `/font-scores` routes.
    Postgres,
}

impl FromStr for FeedbackBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(format!("unknown feedback backend '{other}'")),
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3001`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub backend: FeedbackBackend,
    /// Feedback document for the file backend (default: `feedback.json`).
    pub feedback_file: PathBuf,
    /// Static credential file (default: `user.json`).
    pub users_file: PathBuf,
    /// Required when `backend` is [`FeedbackBackend::Postgres`].
    pub database_url: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3001`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:3000`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `FEEDBACK_BACKEND`     | `file`                     |
    /// | `FEEDBACK_FILE`        | `feedback.json`            |
    /// | `USERS_FILE`           | `user.json`                |
    /// | `DATABASE_URL`         | (none)                     |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3001".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let backend: FeedbackBackend = std::env::var("FEEDBACK_BACKEND")
            .unwrap_or_else(|_| "file".into())
            .parse()
            .unwrap_or_else(|e| panic!("FEEDBACK_BACKEND: {e}"));

        let feedback_file = std::env::var("FEEDBACK_FILE")
            .unwrap_or_else(|_| "feedback.json".into())
            .into();

        let users_file = std::env::var("USERS_FILE")
            .unwrap_or_else(|_| "user.json".into())
            .into();

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            backend,
            feedback_file,
            users_file,
            database_url,
        }
    }
}
