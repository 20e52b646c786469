pub mod companies;
pub mod error;
pub mod issuers;
pub mod questionnaires;
pub mod questions;
pub mod reports;
pub mod responses;
pub mod scoring_configs;
pub mod session;
pub mod users;

use crate::state::SharedState;
use axum::{routing::get, Router};

async fn health() -> &'static str {
    "OK"
}

pub fn routes(state: SharedState) -> Router {
    let api = Router::new()
        .nest("/users", users::router(state.clone()))
        .nest("/issuers", issuers::router(state.clone()))
        .nest("/companies", companies::router(state.clone()))
        .nest("/questionnaires", questionnaires::router(state.clone()))
        .nest("/questions", questions::router(state.clone()))
        .nest("/responses", responses::router(state.clone()))
        .nest("/scoring-configs", scoring_configs::router(state.clone()))
        .nest("/reports", reports::router(state));

    Router::new().route("/health", get(health)).nest("/api/v1", api)
}
