//! Client entry point, the dispatcher trait and error types.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use thiserror::Error;

use crate::completion::ChatGateway;
use crate::http::RestClient;
use crate::options::ClientOptions;
use crate::resources::{Datasources, Minds};

/// Errors that can occur during client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Mind name '{0}' is invalid. It must start with a letter, contain only letters, numbers, or underscores, and be 32 characters or less.")]
    InvalidMindName(String),

    #[error("Datasource name '{0}' is invalid. It must start with a letter, contain only letters, numbers, or underscores, and be 62 characters or less.")]
    InvalidDatasourceName(String),

    #[error("Resource not found: {body}")]
    ResourceNotFound { body: Value },

    #[error("Unsupported object: {0}")]
    UnsupportedObject(String),

    #[error("API error ({status}): {body}")]
    Api { status: StatusCode, body: Value },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Completion error: {0}")]
    Completion(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ClientError {
    /// Map a non-2xx status and its decoded body to a typed failure.
    pub fn from_status(status: StatusCode, body: Value) -> Self {
        if status == StatusCode::NOT_FOUND {
            ClientError::ResourceNotFound { body }
        } else {
            ClientError::Api { status, body }
        }
    }

    /// True for the 404 class, the only failure replace semantics and
    /// dependency resolution tolerate.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::ResourceNotFound { .. })
    }

    /// HTTP status carried by server-side failures.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::ResourceNotFound { .. } => Some(StatusCode::NOT_FOUND),
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status(),
            _ => None,
        }
    }
}

/// Shared request layer used by every resource manager.
///
/// Paths are logical resource paths (`datasources/sales`); implementations
/// resolve them against the configured endpoint and API version. Every method
/// returns the decoded JSON body, `Value::Null` when the body is empty.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Issue one request. Failures are returned exactly once, never retried.
    async fn send(&self, method: Method, path: &str, body: Option<Value>)
        -> Result<Value, ClientError>;

    async fn get(&self, path: &str) -> Result<Value, ClientError> {
        self.send(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, ClientError> {
        self.send(Method::POST, path, Some(body)).await
    }

    async fn patch(&self, path: &str, body: Value) -> Result<Value, ClientError> {
        self.send(Method::PATCH, path, Some(body)).await
    }

    async fn put(&self, path: &str, body: Value) -> Result<Value, ClientError> {
        self.send(Method::PUT, path, Some(body)).await
    }

    async fn delete(&self, path: &str, body: Option<Value>) -> Result<Value, ClientError> {
        self.send(Method::DELETE, path, body).await
    }
}

/// Entry point holding the endpoint, credentials and lazily created managers.
///
/// Managers are created on first access and cached for the lifetime of this
/// client; two clients never share them.
pub struct MindsClient {
    options: ClientOptions,
    dispatcher: Arc<dyn Dispatcher>,
    gateway: ChatGateway,
    datasources: OnceLock<Datasources>,
    minds: OnceLock<Minds>,
}

impl MindsClient {
    /// Create a client backed by the reqwest dispatcher.
    pub fn new(options: ClientOptions) -> Result<Self, ClientError> {
        let dispatcher = Arc::new(RestClient::new(&options)?);
        Self::with_dispatcher(options, dispatcher)
    }

    /// Create a client from `MINDS_*` environment variables.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(ClientOptions::from_env()?)
    }

    /// Create a client with a custom request layer.
    pub fn with_dispatcher(
        options: ClientOptions,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Result<Self, ClientError> {
        if options.api_key.trim().is_empty() {
            return Err(ClientError::Config("API key must be specified".to_string()));
        }

        let gateway = ChatGateway::new(&options)?;

        Ok(Self {
            options,
            dispatcher,
            gateway,
            datasources: OnceLock::new(),
            minds: OnceLock::new(),
        })
    }

    /// Datasource manager.
    pub fn datasources(&self) -> &Datasources {
        self.datasources
            .get_or_init(|| Datasources::new(self.dispatcher.clone()))
    }

    /// Mind manager.
    pub fn minds(&self) -> &Minds {
        self.minds
            .get_or_init(|| Minds::new(self.dispatcher.clone(), self.datasources().clone()))
    }

    /// Gateway used for mind completions.
    pub fn gateway(&self) -> &ChatGateway {
        &self.gateway
    }

    pub fn base_url(&self) -> &str {
        &self.options.base_url
    }

    pub fn api_version(&self) -> &str {
        &self.options.api_version
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }
}

impl std::fmt::Debug for MindsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MindsClient")
            .field("base_url", &self.options.base_url)
            .field("api_key", &"[FILTERED]")
            .field("api_version", &self.options.api_version)
            .field("log_errors", &self.options.log_errors)
            .finish()
    }
}
