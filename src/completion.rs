//! Completion gateway: OpenAI-compatible chat requests against a mind.
//!
//! The chat service lives on a sibling host of the management API, so the
//! endpoint is derived from the configured base URL rather than going through
//! the versioned [`Dispatcher`](crate::Dispatcher).

use std::pin::Pin;

use futures::{Stream, StreamExt};
use reqwest::{Client, Method, Url};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::client::ClientError;
use crate::http::{
    add_extra_headers, authorize, build_http_client, decode_error_body, log_failure,
    RequestBuilderExt, ResponseExt,
};
use crate::options::{ClientOptions, TransportOptions};
use crate::sse::SseResponseExt;

/// Public management host and its dedicated chat host.
const PUBLIC_HOST: &str = "mdb.ai";
const PUBLIC_CHAT_HOST: &str = "llm.mdb.ai";

/// Derive the chat endpoint for a management API base URL.
///
/// The public host maps to its chat subdomain; any other host gets an `ai.`
/// prefix. Path and query are dropped.
///
/// # Example
/// ```
/// use minds::completion::chat_endpoint;
///
/// assert_eq!(chat_endpoint("https://mdb.ai").unwrap().as_str(), "https://llm.mdb.ai/");
/// assert_eq!(
///     chat_endpoint("https://minds.example.com/api?x=1").unwrap().as_str(),
///     "https://ai.minds.example.com/"
/// );
/// ```
pub fn chat_endpoint(base_url: &str) -> Result<Url, ClientError> {
    let mut url = Url::parse(base_url.trim())
        .map_err(|e| ClientError::Config(format!("invalid base URL '{base_url}': {e}")))?;

    let host = url
        .host_str()
        .ok_or_else(|| ClientError::Config(format!("base URL '{base_url}' has no host")))?;

    let chat_host = if host == PUBLIC_HOST {
        PUBLIC_CHAT_HOST.to_string()
    } else {
        format!("ai.{host}")
    };

    url.set_host(Some(&chat_host))
        .map_err(|e| ClientError::Config(format!("cannot derive chat host '{chat_host}': {e}")))?;
    url.set_path("");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// One incremental piece of a streamed answer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChatDelta {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Sends chat completions to the derived chat endpoint.
///
/// A base URL whose chat host cannot be derived (an IP address, say) does not
/// fail construction; the error surfaces from the first completion call.
#[derive(Clone)]
pub struct ChatGateway {
    http: Client,
    api_key: String,
    endpoint: Result<Url, String>,
    log_errors: bool,
    transport_options: TransportOptions,
}

impl ChatGateway {
    pub fn new(options: &ClientOptions) -> Result<Self, ClientError> {
        let endpoint = match &options.chat_url {
            Some(url) => Ok(Url::parse(url)
                .map_err(|e| ClientError::Config(format!("invalid chat URL '{url}': {e}")))?),
            None => chat_endpoint(&options.base_url).map_err(|e| match e {
                ClientError::Config(msg) => msg,
                other => other.to_string(),
            }),
        };

        Ok(Self {
            http: build_http_client(&options.transport)?,
            api_key: options.api_key.clone(),
            endpoint,
            log_errors: options.log_errors,
            transport_options: options.transport.clone(),
        })
    }

    /// The chat endpoint, or the reason it could not be derived.
    pub fn endpoint(&self) -> Result<&Url, ClientError> {
        self.endpoint
            .as_ref()
            .map_err(|msg| ClientError::Config(msg.clone()))
    }

    fn completions_url(&self) -> Result<Url, ClientError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.endpoint()?.as_str().trim_end_matches('/')
        );
        Url::parse(&url).map_err(|e| ClientError::Config(format!("invalid chat URL '{url}': {e}")))
    }

    async fn send(&self, request: &ChatRequest<'_>) -> Result<reqwest::Response, ClientError> {
        let url = self.completions_url()?;
        let mut req = authorize(self.http.post(url.clone()), &self.api_key);
        req = add_extra_headers(req, &self.transport_options);

        let response = req.json_logged(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text_logged().await.unwrap_or_default();
            let error = ClientError::from_status(status, decode_error_body(&body));
            if self.log_errors {
                log_failure(&Method::POST, &url, &error);
            }
            return Err(error);
        }
        Ok(response)
    }

    /// Unary completion: the first choice's message content.
    pub async fn complete(&self, model: &str, message: &str) -> Result<String, ClientError> {
        let request = ChatRequest::new(model, message, false);
        let response = self.send(&request).await?;

        let text = response.text_logged().await?;
        let chat: ChatResponse = serde_json::from_str(&text)?;

        let choice = chat
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::Completion("response contained no choices".to_string()))?;
        Ok(choice.message.content.unwrap_or_default())
    }

    /// Streaming completion: deltas of the first choice in arrival order.
    pub async fn complete_stream(
        &self,
        model: &str,
        message: &str,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<ChatDelta, ClientError>> + Send>>, ClientError> {
        let request = ChatRequest::new(model, message, true);
        let response = self.send(&request).await?;

        let deltas = response.sse().filter_map(|line| async move {
            match line.and_then(|data| serde_json::from_str::<ChatStreamChunk>(&data).map_err(ClientError::from)) {
                Ok(chunk) => chunk.choices.into_iter().next().and_then(|c| c.delta).map(Ok),
                Err(e) => Some(Err(e)),
            }
        });

        Ok(Box::pin(deltas))
    }
}

impl std::fmt::Debug for ChatGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatGateway")
            .field("endpoint", &self.endpoint.as_ref().map(Url::as_str))
            .field("api_key", &"[FILTERED]")
            .finish()
    }
}

// --- Chat Completions API Types ---

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    stream: Option<bool>,
}

impl<'a> ChatRequest<'a> {
    fn new(model: &'a str, message: &'a str, stream: bool) -> Self {
        Self {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: message,
            }],
            temperature: 0.0,
            stream: stream.then_some(true),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatStreamChunk {
    #[serde(default)]
    choices: Vec<ChatStreamChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatStreamChoice {
    delta: Option<ChatDelta>,
}
