//! Stateless HTTP mapping of the backend operations.

use std::{collections::HashMap, time::Duration};

use api_types::{
    TransactionId, UserId,
    auth::{AuthResponse, LoginRequest, RegisterRequest},
    budget::Budget,
    transaction::Transaction,
};
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;

/// Message used when a non-2xx response carries no body.
pub const GENERIC_SERVER_ERROR: &str = "unexpected response status";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transport level failure: timeout, refused connection, undecodable body.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// The backend answered with a non-2xx status.
    #[error("{status}: {}", .body.as_deref().unwrap_or(GENERIC_SERVER_ERROR))]
    Server {
        status: StatusCode,
        body: Option<String>,
    },
    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl ApiError {
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Network(err) => err.status(),
            Self::Server { status, .. } => Some(*status),
            Self::Config(_) => None,
        }
    }

    /// Human readable detail: the raw response body for server errors.
    pub fn detail(&self) -> String {
        match self {
            Self::Server { body, .. } => body
                .clone()
                .unwrap_or_else(|| GENERIC_SERVER_ERROR.to_string()),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        // Without the trailing slash `Url::join` would replace the last segment.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&normalized)
            .map_err(|err| ApiError::Config(format!("invalid base_url: {err}")))?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|err| ApiError::Config(format!("failed to build http client: {err}")))?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| ApiError::Config(format!("invalid endpoint {path}: {err}")))
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        let res = req.send().await?;
        let status = res.status();
        if status.is_success() {
            return Ok(res.json::<T>().await?);
        }
        Err(server_error(res).await)
    }

    async fn send_empty(&self, req: RequestBuilder) -> Result<(), ApiError> {
        let res = req.send().await?;
        if res.status().is_success() {
            return Ok(());
        }
        Err(server_error(res).await)
    }

    pub async fn register(
        &self,
        payload: &RegisterRequest,
    ) -> Result<HashMap<String, String>, ApiError> {
        tracing::debug!("POST auth/register");
        let endpoint = self.endpoint("auth/register")?;
        self.send_json(self.http.post(endpoint).json(payload)).await
    }

    pub async fn login(&self, payload: &LoginRequest) -> Result<AuthResponse, ApiError> {
        tracing::debug!("POST auth/login");
        let endpoint = self.endpoint("auth/login")?;
        self.send_json(self.http.post(endpoint).json(payload)).await
    }

    pub async fn list_transactions(&self, user_id: UserId) -> Result<Vec<Transaction>, ApiError> {
        tracing::debug!("GET api/auth/transactions user_id={user_id}");
        let endpoint = self.endpoint("api/auth/transactions")?;
        self.send_json(self.http.get(endpoint).query(&[("user_id", user_id)]))
            .await
    }

    pub async fn get_budget(&self, user_id: UserId) -> Result<Budget, ApiError> {
        tracing::debug!("GET api/auth/budget user_id={user_id}");
        let endpoint = self.endpoint("api/auth/budget")?;
        self.send_json(self.http.get(endpoint).query(&[("user_id", user_id)]))
            .await
    }

    pub async fn create_transaction(&self, payload: &Transaction) -> Result<Transaction, ApiError> {
        tracing::debug!("POST api/auth/transaction");
        let endpoint = self.endpoint("api/auth/transaction")?;
        self.send_json(self.http.post(endpoint).json(payload)).await
    }

    pub async fn set_budget(&self, payload: &Budget) -> Result<Budget, ApiError> {
        tracing::debug!("POST api/auth/budget");
        let endpoint = self.endpoint("api/auth/budget")?;
        self.send_json(self.http.post(endpoint).json(payload)).await
    }

    pub async fn update_transaction(
        &self,
        id: TransactionId,
        payload: &Transaction,
    ) -> Result<Transaction, ApiError> {
        tracing::debug!("PUT api/auth/transaction/{id}");
        let endpoint = self.endpoint(&format!("api/auth/transaction/{id}"))?;
        self.send_json(self.http.put(endpoint).json(payload)).await
    }

    /// Note the plural `transactions` segment, unlike update.
    pub async fn delete_transaction(&self, id: TransactionId) -> Result<(), ApiError> {
        tracing::debug!("DELETE api/auth/transactions/{id}");
        let endpoint = self.endpoint(&format!("api/auth/transactions/{id}"))?;
        self.send_empty(self.http.delete(endpoint)).await
    }
}

async fn server_error(res: reqwest::Response) -> ApiError {
    let status = res.status();
    let body = match res.text().await {
        Ok(body) if !body.trim().is_empty() => Some(body),
        Ok(_) => None,
        Err(err) => {
            tracing::debug!("failed to read error body: {err}");
            None
        }
    };
    ApiError::Server { status, body }
}
