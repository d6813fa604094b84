use axum::{
    Router,
    routing::{get, post, put},
};

use crate::{auth, budget, state::StubState, transactions};

/// Routes are mounted relative to the client's base URL, so a client
/// configured with `http://host:port/` reaches them unchanged.
pub fn router(state: StubState) -> Router {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/api/auth/transactions", get(transactions::list))
        .route(
            "/api/auth/transactions/{id}",
            axum::routing::delete(transactions::delete),
        )
        .route("/api/auth/transaction", post(transactions::create))
        .route("/api/auth/transaction/{id}", put(transactions::update))
        .route("/api/auth/budget", get(budget::get).post(budget::set))
        .with_state(state)
}

/// Nests [`router`] under `prefix`, e.g. `/api` for a client whose base URL
/// is `http://host:port/api/`. An empty or `/` prefix mounts at the root.
pub fn router_at(state: StubState, prefix: &str) -> Router {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return router(state);
    }
    Router::new().nest(prefix, router(state))
}

pub async fn run_with_listener(
    state: StubState,
    listener: tokio::net::TcpListener,
    prefix: &str,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Stub backend listening on {}{}/", addr, prefix.trim_end_matches('/'));

    axum::serve(listener, router_at(state, prefix)).await
}

pub fn spawn_with_listener(
    state: StubState,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(state, listener, "").await {
            tracing::error!("stub backend failed: {err}");
        }
    });

    Ok(addr)
}
