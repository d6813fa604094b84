use std::{collections::HashMap, sync::Arc, time::Duration};

use api_types::{
    TransactionId, UserId,
    auth::User,
    budget::Budget,
    transaction::Transaction,
};
use axum::http::StatusCode;
use tokio::sync::{Mutex, MutexGuard};

use crate::StubError;

/// One entry per backend endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Register,
    Login,
    ListTransactions,
    GetBudget,
    CreateTransaction,
    SetBudget,
    UpdateTransaction,
    DeleteTransaction,
}

#[derive(Clone, Debug)]
struct Fault {
    status: StatusCode,
    body: Option<String>,
}

#[derive(Debug)]
pub(crate) struct Account {
    pub user: User,
    pub password: String,
}

#[derive(Debug, Default)]
pub(crate) struct Store {
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
    pub budgets: HashMap<UserId, Budget>,
    next_user_id: UserId,
    next_transaction_id: TransactionId,
    hits: HashMap<Route, usize>,
    faults: HashMap<Route, Fault>,
    delays: HashMap<Route, Duration>,
    pub hide_login_user: bool,
}

impl Store {
    pub fn next_user_id(&mut self) -> UserId {
        self.next_user_id += 1;
        self.next_user_id
    }

    pub fn next_transaction_id(&mut self) -> TransactionId {
        self.next_transaction_id += 1;
        self.next_transaction_id
    }
}

/// Shared handle on the in-memory backend.
///
/// Besides serving requests it lets a test seed data, count requests per
/// route and make a route fail or answer slowly.
#[derive(Clone, Debug, Default)]
pub struct StubState {
    inner: Arc<Mutex<Store>>,
}

impl StubState {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn store(&self) -> MutexGuard<'_, Store> {
        self.inner.lock().await
    }

    /// Records the hit, then applies the configured delay and fault.
    pub(crate) async fn enter(&self, route: Route) -> Result<(), StubError> {
        let (delay, fault) = {
            let mut store = self.inner.lock().await;
            *store.hits.entry(route).or_default() += 1;
            (
                store.delays.get(&route).copied(),
                store.faults.get(&route).cloned(),
            )
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match fault {
            Some(Fault { status, body }) => Err(StubError::new(status, body)),
            None => Ok(()),
        }
    }

    pub async fn hits(&self, route: Route) -> usize {
        self.inner
            .lock()
            .await
            .hits
            .get(&route)
            .copied()
            .unwrap_or(0)
    }

    /// Makes every request to `route` answer `status`. A `None` body yields
    /// an empty response body.
    pub async fn fail(&self, route: Route, status: StatusCode, body: Option<&str>) {
        self.inner.lock().await.faults.insert(
            route,
            Fault {
                status,
                body: body.map(str::to_string),
            },
        );
    }

    pub async fn recover(&self, route: Route) {
        self.inner.lock().await.faults.remove(&route);
    }

    pub async fn delay(&self, route: Route, delay: Duration) {
        self.inner.lock().await.delays.insert(route, delay);
    }

    /// Successful logins answer without the `user` record from now on.
    pub async fn hide_login_user(&self) {
        self.inner.lock().await.hide_login_user = true;
    }

    pub async fn seed_user(&self, name: &str, email: &str, password: &str, dob: &str) -> User {
        let mut store = self.inner.lock().await;
        let user = User {
            id: store.next_user_id(),
            name: name.to_string(),
            email: email.to_string(),
            dob: dob.to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
        };
        store.accounts.push(Account {
            user: user.clone(),
            password: password.to_string(),
        });
        user
    }

    /// Stores `transaction` under a freshly assigned id and returns it.
    pub async fn seed_transaction(&self, mut transaction: Transaction) -> Transaction {
        let mut store = self.inner.lock().await;
        transaction.id = store.next_transaction_id();
        store.transactions.push(transaction.clone());
        transaction
    }

    pub async fn seed_budget(&self, budget: Budget) {
        self.inner
            .lock()
            .await
            .budgets
            .insert(budget.user_id, budget);
    }

    pub async fn transactions_of(&self, user_id: UserId) -> Vec<Transaction> {
        self.inner
            .lock()
            .await
            .transactions
            .iter()
            .filter(|tx| tx.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn budget_of(&self, user_id: UserId) -> Option<Budget> {
        self.inner.lock().await.budgets.get(&user_id).cloned()
    }
}
