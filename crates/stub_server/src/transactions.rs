//! Transaction endpoints

use api_types::{TransactionId, transaction::Transaction};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    StubError, UserQuery,
    state::{Route, StubState},
};

pub async fn list(
    State(state): State<StubState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<Transaction>>, StubError> {
    state.enter(Route::ListTransactions).await?;

    let store = state.store().await;
    let transactions = store
        .transactions
        .iter()
        .filter(|tx| tx.user_id == query.user_id)
        .cloned()
        .collect();
    Ok(Json(transactions))
}

/// The id in the body is ignored; the stored record gets a fresh one.
pub async fn create(
    State(state): State<StubState>,
    Json(mut payload): Json<Transaction>,
) -> Result<(StatusCode, Json<Transaction>), StubError> {
    state.enter(Route::CreateTransaction).await?;

    let mut store = state.store().await;
    if !store
        .accounts
        .iter()
        .any(|account| account.user.id == payload.user_id)
    {
        return Err(StubError::not_found("user not found"));
    }
    payload.id = store.next_transaction_id();
    store.transactions.push(payload.clone());
    Ok((StatusCode::CREATED, Json(payload)))
}

pub async fn update(
    State(state): State<StubState>,
    Path(id): Path<TransactionId>,
    Json(mut payload): Json<Transaction>,
) -> Result<Json<Transaction>, StubError> {
    state.enter(Route::UpdateTransaction).await?;

    let mut store = state.store().await;
    let stored = store
        .transactions
        .iter_mut()
        .find(|tx| tx.id == id)
        .ok_or_else(|| StubError::not_found("transaction not found"))?;
    payload.id = id;
    *stored = payload.clone();
    Ok(Json(payload))
}

pub async fn delete(
    State(state): State<StubState>,
    Path(id): Path<TransactionId>,
) -> Result<StatusCode, StubError> {
    state.enter(Route::DeleteTransaction).await?;

    let mut store = state.store().await;
    let before = store.transactions.len();
    store.transactions.retain(|tx| tx.id != id);
    if store.transactions.len() == before {
        return Err(StubError::not_found("transaction not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
