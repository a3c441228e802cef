//! HTTP request layer: the reqwest-backed [`Dispatcher`].

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde_json::Value;

use crate::client::{ClientError, Dispatcher};
use crate::options::{ClientOptions, TransportOptions};

/// Build a configured HTTP client from transport options.
pub fn build_http_client(transport_options: &TransportOptions) -> Result<Client, ClientError> {
    let mut builder = Client::builder();

    match transport_options {
        TransportOptions::Http { timeout, proxy, .. } => {
            if let Some(t) = timeout {
                builder = builder.timeout(*t);
            }
            if let Some(proxy_url) = proxy {
                let p = reqwest::Proxy::all(proxy_url)
                    .map_err(|e| ClientError::Config(format!("invalid proxy '{proxy_url}': {e}")))?;
                builder = builder.proxy(p);
            }
        }
    }

    Ok(builder.build()?)
}

/// Add extra headers to a request if specified in transport options.
pub fn add_extra_headers(
    mut request: RequestBuilder,
    transport_options: &TransportOptions,
) -> RequestBuilder {
    match transport_options {
        TransportOptions::Http { headers, .. } => {
            if let Some(h) = headers {
                for (key, value) in h {
                    request = request.header(key, value);
                }
            }
        }
    }
    request
}

/// Attach the bearer token and JSON content type every Minds call carries.
pub fn authorize(request: RequestBuilder, api_key: &str) -> RequestBuilder {
    request
        .header(AUTHORIZATION, format!("Bearer {api_key}"))
        .header(CONTENT_TYPE, "application/json")
}

/// Parse a base URL and make sure its path ends with `/`, so relative paths
/// are joined underneath it instead of replacing its last segment.
pub fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| ClientError::Config(format!("invalid base URL '{raw}': {e}")))?;

    if url.cannot_be_a_base() {
        return Err(ClientError::Config(format!("base URL '{raw}' cannot be a base")));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Decode a response body. Empty bodies decode to `Value::Null`.
fn decode_body(text: &str) -> Result<Value, ClientError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(text)?)
}

/// Decode an error body, keeping non-JSON payloads (proxy error pages and the
/// like) as a JSON string.
pub fn decode_error_body(text: &str) -> Value {
    decode_body(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Emit the error line for a failed call: timestamp, library version and the
/// decoded error body. Only server-side failures carry a body to log.
pub fn log_failure(method: &Method, url: &Url, error: &ClientError) {
    let body = match error {
        ClientError::ResourceNotFound { body } | ClientError::Api { body, .. } => body,
        _ => return,
    };
    let rendered = serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string());
    let timestamp = chrono::Local::now()
        .format("%Y-%m-%d %H:%M:%S%.3f")
        .to_string();

    tracing::error!(
        version = crate::VERSION,
        timestamp = timestamp.as_str(),
        %method,
        %url,
        status = ?error.status(),
        "[Minds {}] Rest Client Error\n{}",
        crate::VERSION,
        rendered
    );
}

/// Extension trait for RequestBuilder that logs request body.
pub trait RequestBuilderExt {
    /// Set JSON request body and log it. Returns the RequestBuilder for chaining.
    fn json_logged<T: serde::Serialize + ?Sized>(self, json: &T) -> Self;
}

impl RequestBuilderExt for RequestBuilder {
    fn json_logged<T: serde::Serialize + ?Sized>(self, json: &T) -> Self {
        if let Ok(req_body) = serde_json::to_string_pretty(json) {
            tracing::debug!("API request body ({} bytes):\n{}", req_body.len(), req_body);
        }

        self.json(json)
    }
}

/// Extension trait for Response that logs response body.
#[async_trait]
pub trait ResponseExt {
    /// Get response text and log it. Consumes the response.
    async fn text_logged(self) -> Result<String, reqwest::Error>;
}

#[async_trait]
impl ResponseExt for reqwest::Response {
    async fn text_logged(self) -> Result<String, reqwest::Error> {
        let text = self.text().await?;
        tracing::debug!("API response ({} bytes):\n{}", text.len(), text);
        Ok(text)
    }
}

/// Versioned, authenticated REST dispatcher.
#[derive(Clone)]
pub struct RestClient {
    http: Client,
    base_url: Url,
    api_key: String,
    api_version: String,
    log_errors: bool,
    transport_options: TransportOptions,
}

impl RestClient {
    pub fn new(options: &ClientOptions) -> Result<Self, ClientError> {
        Ok(Self {
            http: build_http_client(&options.transport)?,
            base_url: parse_base_url(&options.base_url)?,
            api_key: options.api_key.clone(),
            api_version: options.api_version.clone(),
            log_errors: options.log_errors,
            transport_options: options.transport.clone(),
        })
    }

    /// Resolve a resource path against the API version.
    ///
    /// When one of the base URL's path segments already is the version, the
    /// path is returned unchanged; otherwise it is prefixed with
    /// `/{api_version}/`. The host never counts as a segment.
    pub fn uri(&self, path: &str) -> String {
        let versioned = self
            .base_url
            .path_segments()
            .map(|mut segments| segments.any(|segment| segment == self.api_version))
            .unwrap_or(false);

        if versioned {
            path.to_string()
        } else {
            format!("/{}/{}", self.api_version, path.trim_start_matches('/'))
        }
    }

    /// Fully-qualified URL for a resource path.
    pub fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(&self.uri(path))
            .map_err(|e| ClientError::Config(format!("invalid resource path '{path}': {e}")))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[FILTERED]")
            .field("api_version", &self.api_version)
            .field("log_errors", &self.log_errors)
            .finish()
    }
}

#[async_trait]
impl Dispatcher for RestClient {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ClientError> {
        let url = self.url(path)?;
        tracing::debug!("{} {}", method, url);

        let mut req = authorize(self.http.request(method.clone(), url.clone()), &self.api_key);
        req = add_extra_headers(req, &self.transport_options);
        if let Some(body) = &body {
            req = req.json_logged(body);
        }

        let response = req.send().await?;
        let status = response.status();
        let text = response.text_logged().await?;

        if !status.is_success() {
            let error = ClientError::from_status(status, decode_error_body(&text));
            if self.log_errors {
                log_failure(&method, &url, &error);
            }
            return Err(error);
        }

        decode_body(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rest_client(base_url: &str) -> RestClient {
        RestClient::new(&ClientOptions::new("test").with_base_url(base_url)).unwrap()
    }

    #[test]
    fn test_uri_prefixes_version_when_only_host_mentions_it() {
        let client = rest_client("https://api.example.com");
        assert_eq!(client.uri("datasources"), "/api/datasources");
    }

    #[test]
    fn test_uri_keeps_path_when_base_is_versioned() {
        let client = rest_client("https://example.com/api");
        assert_eq!(client.uri("datasources"), "datasources");

        let client = rest_client("https://example.com/api/");
        assert_eq!(client.uri("datasources"), "datasources");
    }

    #[test]
    fn test_uri_ignores_partial_segment_match() {
        let client = rest_client("https://example.com/apis");
        assert_eq!(client.uri("datasources"), "/api/datasources");
    }

    #[test]
    fn test_uri_custom_version() {
        let client = RestClient::new(
            &ClientOptions::new("test")
                .with_base_url("https://example.com")
                .with_api_version("v2"),
        )
        .unwrap();
        assert_eq!(client.uri("projects/mindsdb/minds"), "/v2/projects/mindsdb/minds");
    }

    #[test]
    fn test_url_join() {
        let client = rest_client("https://example.com/api");
        assert_eq!(
            client.url("datasources/sales").unwrap().as_str(),
            "https://example.com/api/datasources/sales"
        );

        let client = rest_client("https://mdb.ai");
        assert_eq!(
            client.url("datasources").unwrap().as_str(),
            "https://mdb.ai/api/datasources"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = RestClient::new(&ClientOptions::new("test").with_base_url("not a url")).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_decode_bodies() {
        assert_eq!(decode_body("").unwrap(), Value::Null);
        assert_eq!(decode_body("  \n").unwrap(), Value::Null);
        assert_eq!(decode_body("{\"a\": 1}").unwrap()["a"], 1);
        assert!(decode_body("<html>").is_err());
        assert_eq!(decode_error_body("<html>"), Value::String("<html>".to_string()));
    }
}
