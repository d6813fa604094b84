//! The sync controller: every user intent becomes a remote call plus the
//! matching cache write.

use std::{collections::HashMap, fmt, time::Duration};

use api_types::{
    TransactionId, UserId,
    auth::{LoginRequest, RegisterRequest},
    budget::Budget,
    transaction::Transaction,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tokio::sync::{Mutex, MutexGuard, watch};

use crate::{
    api::{ApiClient, ApiError},
    error::{LOGIN_FAILED, MISSING_USER, Result, SyncError},
    session::{SessionState, Snapshot},
    summary::Summary,
    validation,
};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000/api/";

/// How `add_transaction` treats the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddMode {
    /// Create remotely and swap the placeholder for the server record.
    #[default]
    Remote,
    /// Keep the placeholder locally until the next refresh replaces it.
    LocalOnly,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// A newer write landed first; the response was dropped.
    Stale,
    Failed(String),
}

impl FetchOutcome {
    fn describe(&self, subject: &str) -> String {
        match self {
            Self::Applied => format!("{subject} loaded"),
            Self::Stale => format!("{subject} superseded"),
            Self::Failed(_) => format!("{subject} unavailable"),
        }
    }
}

/// Per-cache result of a refresh.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshReport {
    pub transactions: FetchOutcome,
    pub budget: FetchOutcome,
}

impl RefreshReport {
    pub fn is_complete(&self) -> bool {
        self.transactions == FetchOutcome::Applied && self.budget == FetchOutcome::Applied
    }

    pub fn has_failures(&self) -> bool {
        matches!(self.transactions, FetchOutcome::Failed(_))
            || matches!(self.budget, FetchOutcome::Failed(_))
    }
}

impl fmt::Display for RefreshReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}",
            self.transactions.describe("transactions"),
            self.budget.describe("budget")
        )
    }
}

pub struct SyncController {
    api: ApiClient,
    add_mode: AddMode,
    state: Mutex<SessionState>,
    snapshots: watch::Sender<Snapshot>,
}

impl SyncController {
    pub fn new(api: ApiClient, add_mode: AddMode) -> Self {
        let (snapshots, _) = watch::channel(Snapshot::default());
        Self {
            api,
            add_mode,
            state: Mutex::new(SessionState::default()),
            snapshots,
        }
    }

    pub fn builder() -> SyncControllerBuilder {
        SyncControllerBuilder::default()
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn add_mode(&self) -> AddMode {
        self.add_mode
    }

    /// Receives a fresh [`Snapshot`] after every cache write.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }

    fn publish(&self, state: &MutexGuard<'_, SessionState>) {
        self.snapshots.send_replace(state.snapshot());
    }

    async fn session_user(&self) -> Result<UserId> {
        self.state
            .lock()
            .await
            .user_id()
            .ok_or(SyncError::NotLoggedIn)
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        dob: &str,
    ) -> Result<HashMap<String, String>> {
        validation::validate_sign_up(name, email, password, dob)?;

        let payload = RegisterRequest {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
            dob: dob.to_string(),
        };
        match self.api.register(&payload).await {
            Ok(body) => {
                tracing::info!("registered {}", payload.email);
                Ok(body)
            }
            Err(err) => {
                tracing::warn!("registration failed: {err}");
                Err(err.into())
            }
        }
    }

    /// Authenticates, starts a new session and loads its caches.
    ///
    /// The session is only replaced once the backend accepted the
    /// credentials.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserId> {
        let payload = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };

        let response = match self.api.login(&payload).await {
            Ok(response) => response,
            Err(ApiError::Server { status, body }) => {
                tracing::warn!("login rejected with status {status}");
                return Err(SyncError::Rejected(
                    body.unwrap_or_else(|| LOGIN_FAILED.to_string()),
                ));
            }
            Err(err) => {
                tracing::warn!("login failed: {err}");
                return Err(err.into());
            }
        };

        let Some(user) = response.user else {
            tracing::warn!("login response without user record");
            return Err(SyncError::Rejected(MISSING_USER.to_string()));
        };

        {
            let mut state = self.state.lock().await;
            state.start_session(user.id);
            self.publish(&state);
        }
        tracing::info!("user {} logged in", user.id);

        let report = self.refresh().await?;
        if report.has_failures() {
            tracing::warn!("initial refresh incomplete: {report}");
        }
        Ok(user.id)
    }

    /// Reloads both caches for the current session.
    ///
    /// Fetch failures do not fail the call; they are logged and reported
    /// per cache in the returned [`RefreshReport`].
    pub async fn refresh(&self) -> Result<RefreshReport> {
        let ticket = self
            .state
            .lock()
            .await
            .ticket()
            .ok_or(SyncError::NotLoggedIn)?;

        let (transactions, budget) = tokio::join!(
            self.api.list_transactions(ticket.user_id),
            self.api.get_budget(ticket.user_id)
        );

        let mut state = self.state.lock().await;
        let transactions = match transactions {
            Ok(list) => {
                let count = list.len();
                if state.apply_transactions(&ticket, list) {
                    tracing::debug!("cached {count} transactions");
                    FetchOutcome::Applied
                } else {
                    tracing::debug!("discarded stale transaction list");
                    FetchOutcome::Stale
                }
            }
            Err(err) => {
                tracing::warn!("failed to fetch transactions: {err}");
                FetchOutcome::Failed(err.detail())
            }
        };
        let budget = match budget {
            Ok(budget) => {
                if state.apply_budget(&ticket, budget) {
                    FetchOutcome::Applied
                } else {
                    tracing::debug!("discarded stale budget");
                    FetchOutcome::Stale
                }
            }
            Err(err) => {
                tracing::warn!("failed to fetch budget: {err}");
                FetchOutcome::Failed(err.detail())
            }
        };
        self.publish(&state);

        Ok(RefreshReport {
            transactions,
            budget,
        })
    }

    /// Appends an Expense optimistically, then settles it according to the
    /// configured [`AddMode`].
    pub async fn add_transaction(
        &self,
        amount: Decimal,
        category_id: i32,
        description: &str,
        date: &str,
    ) -> Result<Transaction> {
        let (key, placeholder) = {
            let mut state = self.state.lock().await;
            let pushed = state
                .push_placeholder(amount, category_id, description, date)
                .ok_or(SyncError::NotLoggedIn)?;
            self.publish(&state);
            pushed
        };

        if self.add_mode == AddMode::LocalOnly {
            tracing::debug!("kept local transaction {}", placeholder.id);
            return Ok(placeholder);
        }

        match self.api.create_transaction(&placeholder).await {
            Ok(created) => {
                let mut state = self.state.lock().await;
                state.confirm_placeholder(key, created.clone());
                self.publish(&state);
                tracing::info!("created transaction {}", created.id);
                Ok(created)
            }
            Err(err) => {
                let mut state = self.state.lock().await;
                state.discard_placeholder(key);
                self.publish(&state);
                tracing::warn!("failed to create transaction: {err}");
                Err(err.into())
            }
        }
    }

    /// Sets the budget remotely; the cache only changes once confirmed.
    pub async fn set_budget(
        &self,
        amount: Decimal,
        start_date: &str,
        end_date: &str,
    ) -> Result<Budget> {
        let user_id = self.session_user().await?;
        let payload = Budget {
            user_id,
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
            amount,
        };

        match self.api.set_budget(&payload).await {
            Ok(budget) => {
                let mut state = self.state.lock().await;
                if state.user_id() == Some(user_id) {
                    state.set_budget(budget.clone());
                    self.publish(&state);
                }
                tracing::info!("budget set to {}", budget.amount);
                Ok(budget)
            }
            Err(err) => {
                tracing::warn!("failed to set budget: {err}");
                Err(err.into())
            }
        }
    }

    pub async fn edit_transaction(&self, transaction: Transaction) -> Result<Transaction> {
        self.session_user().await?;

        match self
            .api
            .update_transaction(transaction.id, &transaction)
            .await
        {
            Ok(updated) => {
                let mut state = self.state.lock().await;
                if !state.replace_transaction(updated.clone()) {
                    tracing::debug!("updated transaction {} is not cached", updated.id);
                }
                self.publish(&state);
                Ok(updated)
            }
            Err(err) => {
                tracing::warn!("failed to update transaction {}: {err}", transaction.id);
                Err(err.into())
            }
        }
    }

    pub async fn delete_transaction(&self, id: TransactionId) -> Result<()> {
        self.session_user().await?;

        match self.api.delete_transaction(id).await {
            Ok(()) => {
                let mut state = self.state.lock().await;
                if !state.remove_transaction(id) {
                    tracing::debug!("deleted transaction {id} was not cached");
                }
                self.publish(&state);
                Ok(())
            }
            Err(err) => {
                tracing::warn!("failed to delete transaction {id}: {err}");
                Err(err.into())
            }
        }
    }

    pub async fn user_id(&self) -> Option<UserId> {
        self.state.lock().await.user_id()
    }

    pub async fn transactions(&self) -> Vec<Transaction> {
        self.state.lock().await.transactions()
    }

    pub async fn budget(&self) -> Option<Budget> {
        self.state.lock().await.budget().cloned()
    }

    pub async fn summary(&self) -> Summary {
        self.state.lock().await.summary()
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.state.lock().await.snapshot()
    }
}

#[derive(Default, Debug)]
pub struct SyncControllerBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    add_mode: AddMode,
}

impl SyncControllerBuilder {
    pub fn base_url(mut self, base_url: &str) -> SyncControllerBuilder {
        self.base_url = Some(base_url.to_string());
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> SyncControllerBuilder {
        self.timeout = timeout;
        self
    }

    pub fn add_mode(mut self, add_mode: AddMode) -> SyncControllerBuilder {
        self.add_mode = add_mode;
        self
    }

    pub fn build(self) -> Result<SyncController> {
        let base_url = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        tracing::info!("Initializing sync controller against {base_url}...");
        let api = ApiClient::new(base_url, self.timeout)?;
        Ok(SyncController::new(api, self.add_mode))
    }
}
