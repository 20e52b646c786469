use sqlx::PgPool;
use std::sync::Arc;

/// Application-wide dependencies, constructed once in `main` and handed to
/// handlers through axum state. Nothing in here is a process global.
pub struct AppState {
    pub pool: PgPool,
    pub session_key: Vec<u8>,
}

pub type SharedState = Arc<AppState>;
