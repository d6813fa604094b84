//! Registration and login endpoints

use std::collections::HashMap;

use api_types::auth::{AuthResponse, LoginRequest, RegisterRequest, User};
use axum::{Json, extract::State, http::StatusCode};

use crate::{
    StubError,
    state::{Account, Route, StubState},
};

pub async fn register(
    State(state): State<StubState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<HashMap<String, String>>), StubError> {
    state.enter(Route::Register).await?;

    let mut store = state.store().await;
    if store
        .accounts
        .iter()
        .any(|account| account.user.email.eq_ignore_ascii_case(&payload.email))
    {
        return Err(StubError::conflict("email already registered"));
    }

    let user = User {
        id: store.next_user_id(),
        name: payload.name,
        email: payload.email,
        dob: payload.dob,
        created_at: "2024-01-01T00:00:00Z".to_string(),
    };
    tracing::info!("registered user {}", user.id);
    let user_id = user.id.to_string();
    store.accounts.push(Account {
        user,
        password: payload.password,
    });

    let body = HashMap::from([
        ("message".to_string(), "User registered successfully".to_string()),
        ("user_id".to_string(), user_id),
    ]);
    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn login(
    State(state): State<StubState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, StubError> {
    state.enter(Route::Login).await?;

    let store = state.store().await;
    let account = store
        .accounts
        .iter()
        .find(|account| {
            account.user.email.eq_ignore_ascii_case(&payload.email)
                && account.password == payload.password
        })
        .ok_or_else(|| StubError::unauthorized("invalid email or password"))?;

    Ok(Json(AuthResponse {
        token: format!("stub-token-{}", account.user.id),
        user: (!store.hide_login_user).then(|| account.user.clone()),
    }))
}
