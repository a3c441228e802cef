#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use minds::client::{ClientError, Dispatcher};
use minds::{ClientOptions, MindsClient};
use reqwest::Method;
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

/// Dispatcher that replays scripted responses in order and records every call.
#[derive(Clone, Default)]
pub struct MockDispatcher {
    responses: Arc<Mutex<VecDeque<Result<Value, ClientError>>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockDispatcher {
    pub fn new(responses: Vec<Result<Value, ClientError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<(Method, String)> {
        self.requests()
            .into_iter()
            .map(|r| (r.method, r.path))
            .collect()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait]
impl Dispatcher for MockDispatcher {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ClientError> {
        self.requests.lock().unwrap().push(Recorded {
            method,
            path: path.to_string(),
            body,
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::InvalidArgument("No more mock responses".to_string())))
    }
}

pub fn client_with(mock: &MockDispatcher) -> MindsClient {
    MindsClient::with_dispatcher(ClientOptions::new("test-key"), Arc::new(mock.clone())).unwrap()
}

pub fn not_found() -> Result<Value, ClientError> {
    Err(ClientError::ResourceNotFound {
        body: json!({"detail": "Not found"}),
    })
}

pub fn datasource_json(name: &str) -> Value {
    json!({
        "name": name,
        "engine": "postgres",
        "description": "Sales data",
        "connection_data": {"host": "localhost"},
        "tables": ["orders"],
        "created_at": "2024-10-01 10:00:00"
    })
}

pub fn mind_json(name: &str, datasources: &[&str]) -> Value {
    json!({
        "name": name,
        "model_name": "gpt-4o",
        "provider": "openai",
        "parameters": {"prompt_template": "Use your database tools to answer the user's question: {{question}}"},
        "created_at": "2024-10-01 10:00:00",
        "updated_at": "2024-10-01 10:00:00",
        "datasources": datasources
    })
}
