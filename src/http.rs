//! Liveness endpoint.
//!
//! `GET /` only confirms the process is up. It does not look at the store
//! or at recent write outcomes.

use axum::{routing::get, Router};

pub const LIVENESS_BODY: &str = "log pusher is running";

async fn home() -> &'static str {
    LIVENESS_BODY
}

pub fn build_router() -> Router {
    Router::new().route("/", get(home))
}
