//! Budget endpoints

use api_types::budget::Budget;
use axum::{
    Json,
    extract::{Query, State},
};

use crate::{
    StubError, UserQuery,
    state::{Route, StubState},
};

pub async fn get(
    State(state): State<StubState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Budget>, StubError> {
    state.enter(Route::GetBudget).await?;

    let store = state.store().await;
    store
        .budgets
        .get(&query.user_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| StubError::not_found("budget not set"))
}

/// Replaces the user's budget; only one is kept per user.
pub async fn set(
    State(state): State<StubState>,
    Json(payload): Json<Budget>,
) -> Result<Json<Budget>, StubError> {
    state.enter(Route::SetBudget).await?;

    if payload.amount.is_sign_negative() {
        return Err(StubError::unprocessable("budget amount must not be negative"));
    }
    let mut store = state.store().await;
    store.budgets.insert(payload.user_id, payload.clone());
    Ok(Json(payload))
}
