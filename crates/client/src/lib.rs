//! SpendSmart client.
//!
//! Talks to the expense-tracking backend over HTTP and keeps an in-memory
//! mirror of the logged-in user's transactions and budget. Nothing is
//! persisted: a process restart starts from an empty session.

pub mod api;
pub mod error;
pub mod session;
pub mod summary;
pub mod sync;
pub mod validation;

pub use api::{ApiClient, ApiError};
pub use error::{Result, SyncError};
pub use session::Snapshot;
pub use summary::Summary;
pub use sync::{AddMode, FetchOutcome, RefreshReport, SyncController, SyncControllerBuilder};
pub use validation::{ValidationError, validate_sign_up};

pub mod types {
    pub use api_types::{
        TransactionId, UserId,
        auth::{AuthResponse, LoginRequest, RegisterRequest, User},
        budget::Budget,
        transaction::{Transaction, TransactionType},
    };
    pub use rust_decimal::Decimal;
}
