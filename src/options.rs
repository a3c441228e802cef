//! Client configuration and transport options.

use std::collections::HashMap;
use std::time::Duration;

use crate::client::ClientError;

/// Public Minds endpoint used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://mdb.ai";

/// API version path segment prefixed to every resource path.
pub const DEFAULT_API_VERSION: &str = "api";

/// Configuration consumed by [`MindsClient`](crate::MindsClient).
///
/// Only the API key is required; everything else has a default matching the
/// public service.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Bearer token sent with every request.
    pub api_key: String,

    /// Base endpoint of the management API.
    pub base_url: String,

    /// Version path segment, `api` unless overridden.
    pub api_version: String,

    /// Emit an error event for every failed REST call.
    pub log_errors: bool,

    /// Explicit chat completion endpoint. When unset it is derived from
    /// `base_url`.
    pub chat_url: Option<String>,

    /// HTTP transport settings shared by the dispatcher and the chat gateway.
    pub transport: TransportOptions,
}

impl ClientOptions {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            log_errors: false,
            chat_url: None,
            transport: TransportOptions::default(),
        }
    }

    /// Build options from `MINDS_API_KEY`, `MINDS_BASE_URL`,
    /// `MINDS_API_VERSION` and `MINDS_LOG_ERRORS`.
    pub fn from_env() -> Result<Self, ClientError> {
        let api_key = std::env::var("MINDS_API_KEY")
            .map_err(|_| ClientError::Config("MINDS_API_KEY is not set".to_string()))?;

        let mut options = Self::new(api_key);
        if let Ok(base_url) = std::env::var("MINDS_BASE_URL") {
            options = options.with_base_url(base_url);
        }
        if let Ok(version) = std::env::var("MINDS_API_VERSION") {
            options = options.with_api_version(version);
        }
        if let Ok(flag) = std::env::var("MINDS_LOG_ERRORS") {
            options = options.with_log_errors(matches!(
                flag.to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            ));
        }
        Ok(options)
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the API version segment.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Toggle error logging.
    pub fn with_log_errors(mut self, log_errors: bool) -> Self {
        self.log_errors = log_errors;
        self
    }

    /// Override the derived chat completion endpoint.
    pub fn with_chat_url(mut self, chat_url: impl Into<String>) -> Self {
        self.chat_url = Some(chat_url.into());
        self
    }

    /// Replace the transport options.
    pub fn with_transport(mut self, transport: TransportOptions) -> Self {
        self.transport = transport;
        self
    }
}

/// Transport configuration options.
///
/// Controls how requests are sent over the network. Timeouts and proxies are
/// enforced by the underlying HTTP client; nothing here retries.
#[derive(Debug, Clone)]
pub enum TransportOptions {
    /// HTTP transport configuration
    Http {
        /// Request timeout. If None, default client timeout is used.
        timeout: Option<Duration>,
        /// HTTP proxy URL.
        proxy: Option<String>,
        /// Additional HTTP headers to send with every request.
        headers: Option<HashMap<String, String>>,
    },
}

impl Default for TransportOptions {
    fn default() -> Self {
        TransportOptions::Http {
            timeout: None,
            proxy: None,
            headers: None,
        }
    }
}

impl TransportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, duration: Duration) -> Self {
        match &mut self {
            TransportOptions::Http { timeout, .. } => *timeout = Some(duration),
        }
        self
    }

    pub fn with_proxy(mut self, proxy_url: impl Into<String>) -> Self {
        match &mut self {
            TransportOptions::Http { proxy, .. } => *proxy = Some(proxy_url.into()),
        }
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        match &mut self {
            TransportOptions::Http { headers, .. } => {
                headers
                    .get_or_insert_with(HashMap::new)
                    .insert(key.into(), value.into());
            }
        }
        self
    }
}
