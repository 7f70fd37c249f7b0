//! JSON-RPC 2.0 over HTTP.
//!
//! One call is one round trip. The transport never retries; see
//! [`super::retry`] for the opt-in layer above it.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::error::{CeloError, CeloResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    pub method: String,
    pub params: Vec<Value>,
    pub id: u64,
}

impl RpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
            id,
        }
    }
}

/// Moves one request to a node and hands back the raw response body.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    async fn send(&self, endpoint: &str, request: &RpcRequest) -> CeloResult<Value>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, endpoint: &str, request: &RpcRequest) -> CeloResult<Value> {
        let response = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(CeloError::Transport(format!("HTTP {} from {}", status, endpoint)));
        }
        let body = response.bytes().await?;
        let parsed = serde_json::from_slice::<Value>(&body);

        if !status.is_success() {
            return match parsed {
                // A complete JSON-RPC error envelope behind a non-2xx status is the node's answer.
                Ok(value) if value.get("error").is_some() && value.get("id").is_some() => Ok(value),
                _ => Err(CeloError::Transport(format!("HTTP {} from {}", status, endpoint))),
            };
        }

        parsed.map_err(|e| CeloError::RpcProtocol(format!("response body is not JSON: {}", e)))
    }
}

/// Issues JSON-RPC calls and normalizes their envelopes.
#[derive(Debug)]
pub struct JsonRpcClient {
    transport: Arc<dyn Transport>,
    next_id: AtomicU64,
    timeout: Option<Duration>,
}

impl JsonRpcClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            next_id: AtomicU64::new(1),
            timeout: None,
        }
    }

    pub fn http() -> Self {
        Self::new(Arc::new(HttpTransport::new()))
    }

    /// Default deadline applied to every call; `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub async fn call(&self, endpoint: &str, method: &str, params: Vec<Value>) -> CeloResult<Value> {
        self.call_with_timeout(endpoint, method, params, self.timeout)
            .await
    }

    /// Performs the call, aborting the in-flight request once `timeout` elapses.
    pub async fn call_with_timeout(
        &self,
        endpoint: &str,
        method: &str,
        params: Vec<Value>,
        timeout: Option<Duration>,
    ) -> CeloResult<Value> {
        let request = RpcRequest::new(self.next_id.fetch_add(1, Ordering::Relaxed), method, params);
        debug!(method = %request.method, id = request.id, "JSON-RPC request");

        let send = self.transport.send(endpoint, &request);
        let body = match timeout {
            Some(limit) => tokio::time::timeout(limit, send)
                .await
                .map_err(|_| CeloError::Timeout(limit))??,
            None => send.await?,
        };

        let result = normalize_response(request.id, body);
        if let Err(e) = &result {
            debug!(method = %request.method, id = request.id, "JSON-RPC call failed: {}", e);
        }
        result
    }

    pub async fn call_as<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        method: &str,
        params: Vec<Value>,
    ) -> CeloResult<T> {
        let value = self.call(endpoint, method, params).await?;
        serde_json::from_value(value).map_err(|e| {
            CeloError::RpcProtocol(format!("unexpected result shape for {}: {}", method, e))
        })
    }
}

/// Turns a response body into the call's result or its error.
///
/// The id must echo `request_id`; a `null` id is only accepted alongside an
/// error, as nodes use it when the request itself could not be parsed.
pub fn normalize_response(request_id: u64, body: Value) -> CeloResult<Value> {
    let mut envelope: Map<String, Value> = match body {
        Value::Object(map) => map,
        other => {
            return Err(CeloError::RpcProtocol(format!(
                "expected a JSON object, got {}",
                other
            )))
        }
    };

    let error = envelope.remove("error").filter(|e| !e.is_null());
    let result = envelope.remove("result");

    match envelope.get("id") {
        Some(Value::Number(id)) if id.as_u64() == Some(request_id) => {}
        Some(Value::Null) | None if error.is_some() => {}
        Some(other) => {
            return Err(CeloError::RpcProtocol(format!(
                "response id {} does not match request id {}",
                other, request_id
            )))
        }
        None => {
            return Err(CeloError::RpcProtocol(format!(
                "response to request {} carries no id",
                request_id
            )))
        }
    }

    match (result, error) {
        (Some(_), Some(_)) => Err(CeloError::RpcProtocol(
            "response carries both result and error".into(),
        )),
        (Some(result), None) => Ok(result),
        (None, Some(error)) => Err(parse_error_object(error)),
        (None, None) => Err(CeloError::RpcProtocol(
            "response carries neither result nor error".into(),
        )),
    }
}

fn parse_error_object(error: Value) -> CeloError {
    let code = error.get("code").and_then(Value::as_i64);
    let message = error.get("message").and_then(Value::as_str);
    match (code, message) {
        (Some(code), Some(message)) => CeloError::Rpc {
            code,
            message: message.to_string(),
            data: error.get("data").cloned(),
        },
        _ => CeloError::RpcProtocol(format!("malformed error object: {}", error)),
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::sync::Mutex;

    type Handler = dyn Fn(&RpcRequest) -> CeloResult<Value> + Send + Sync;

    /// In-memory transport that records every request it sees.
    pub struct MockTransport {
        handler: Box<Handler>,
        requests: Mutex<Vec<(String, RpcRequest)>>,
    }

    impl fmt::Debug for MockTransport {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("MockTransport")
                .field("calls", &self.call_count())
                .finish()
        }
    }

    impl MockTransport {
        /// Answers with raw response bodies.
        pub fn raw<F>(handler: F) -> Self
        where
            F: Fn(&RpcRequest) -> CeloResult<Value> + Send + Sync + 'static,
        {
            Self {
                handler: Box::new(handler),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Answers every request with a well-formed success envelope.
        pub fn results<F>(handler: F) -> Self
        where
            F: Fn(&str, &[Value]) -> Value + Send + Sync + 'static,
        {
            Self::raw(move |request| {
                Ok(serde_json::json!({
                    "jsonrpc": "2.0",
                    "id": request.id,
                    "result": handler(&request.method, &request.params),
                }))
            })
        }

        pub fn call_count(&self) -> usize {
            self.requests.lock().map(|r| r.len()).unwrap_or_default()
        }

        pub fn requests(&self) -> Vec<(String, RpcRequest)> {
            self.requests.lock().map(|r| r.clone()).unwrap_or_default()
        }

        pub fn methods(&self) -> Vec<String> {
            self.requests()
                .into_iter()
                .map(|(_, request)| request.method)
                .collect()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&self, endpoint: &str, request: &RpcRequest) -> CeloResult<Value> {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push((endpoint.to_string(), request.clone()));
            }
            (self.handler)(request)
        }
    }
}
