//! In-memory SpendSmart backend.
//!
//! Implements the same HTTP surface as the real backend, with data held in
//! memory. Integration tests bind it on an ephemeral port; the CLI can serve
//! it for local demos.

use api_types::UserId;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

pub use server::{router, router_at, run_with_listener, spawn_with_listener};
pub use state::{Route, StubState};

mod auth;
mod budget;
mod server;
mod state;
mod transactions;

#[derive(Debug, Deserialize)]
pub(crate) struct UserQuery {
    pub user_id: UserId,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Error answer of the stub. Without a message the body is left empty.
#[derive(Debug)]
pub struct StubError {
    status: StatusCode,
    message: Option<String>,
}

impl StubError {
    pub fn new(status: StatusCode, message: Option<String>) -> Self {
        Self { status, message }
    }

    fn with_message(status: StatusCode, message: &str) -> Self {
        Self::new(status, Some(message.to_string()))
    }

    pub(crate) fn unauthorized(message: &str) -> Self {
        Self::with_message(StatusCode::UNAUTHORIZED, message)
    }

    pub(crate) fn not_found(message: &str) -> Self {
        Self::with_message(StatusCode::NOT_FOUND, message)
    }

    pub(crate) fn conflict(message: &str) -> Self {
        Self::with_message(StatusCode::CONFLICT, message)
    }

    pub(crate) fn unprocessable(message: &str) -> Self {
        Self::with_message(StatusCode::UNPROCESSABLE_ENTITY, message)
    }
}

impl IntoResponse for StubError {
    fn into_response(self) -> Response {
        match self.message {
            Some(error) => (self.status, Json(ErrorBody { error })).into_response(),
            None => self.status.into_response(),
        }
    }
}
