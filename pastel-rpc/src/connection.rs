// Copyright (C) 2025 Pastel Network
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! The HTTP transport shared by a root [`RpcClient`](crate::RpcClient) and
//! every namespaced client derived from it.
//!
//! A [`Connection`] owns one keep-alive HTTP(S) client pinned to a single
//! `host:port`, the request timeout, and the request id counter of its client
//! group. It posts serialized JSON-RPC bodies and hands back the parsed JSON
//! response, turning transport-level problems into [`RpcError`]s.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::blocking::Client as ReqwestClient;
use reqwest::blocking::Response;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use reqwest::Error as ReqwestError;
use serde_json::Value;

use crate::endpoint::Endpoint;
use crate::error::{RpcError, RpcResult};

/// Default time to wait for a response
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// The `User-Agent` sent with every request
pub const CLIENT_USER_AGENT: &str = concat!("pastel-rpc/", env!("CARGO_PKG_VERSION"));

const JSON_CONTENT_TYPE: &str = "application/json";

/// A persistent connection to one JSON-RPC server.
pub struct Connection {
    /// `scheme://host:port` this connection talks to
    origin: String,
    /// Time allowed for each request, including reading the response
    timeout: Duration,
    /// Last request id handed out; the first call gets id 1
    last_id: AtomicU64,
    /// The reqwest http client
    client: ReqwestClient,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("origin", &self.origin)
            .field("timeout", &self.timeout)
            .field("last_id", &self.last_id())
            .finish()
    }
}

impl Connection {
    /// Opens a connection to the endpoint's `host:port`, over TLS for `https`.
    ///
    /// # Errors
    ///
    /// Returns `RpcError::Network` if the HTTP client could not be built.
    pub fn open(endpoint: &Endpoint, timeout: Duration) -> RpcResult<Self> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(1)
            .build()
            .map_err(|e| RpcError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Connection {
            origin: origin_of(endpoint),
            timeout,
            last_id: AtomicU64::new(0),
            client,
        })
    }

    /// The `scheme://host:port` this connection is bound to
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Can requests for this endpoint travel over this connection?
    pub fn serves(&self, endpoint: &Endpoint) -> bool {
        self.origin == origin_of(endpoint)
    }

    /// The configured request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The id of the most recently issued call, 0 if none was issued yet
    pub fn last_id(&self) -> u64 {
        self.last_id.load(Ordering::SeqCst)
    }

    /// Reserve the id for a new call.
    pub fn next_id(&self) -> u64 {
        self.last_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// POST a serialized JSON-RPC body to the endpoint and parse the JSON reply.
    ///
    /// Numbers in the reply keep their literal text, so amounts can be read
    /// back as [`Decimal`](crate::Decimal) without going through `f64`.
    ///
    /// # Errors
    ///
    /// Returns:
    /// * `RpcError::Network` on connection failures and timeouts,
    /// * `RpcError::MissingResponse` if the server hung up without answering,
    /// * `RpcError::NonJsonResponse` if the reply is not `application/json`,
    /// * `RpcError::Parsing` if the reply body is not valid JSON.
    pub fn post(&self, endpoint: &Endpoint, body: String) -> RpcResult<Value> {
        let mut request_builder = self
            .client
            .post(endpoint.request_url())
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body);

        if let Some(auth_header) = endpoint.auth_header() {
            request_builder = request_builder.header(AUTHORIZATION, auth_header);
        }

        let response = request_builder.send().map_err(Self::classify_send_error)?;
        Self::read_json(response)
    }

    fn read_json(response: Response) -> RpcResult<Value> {
        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(is_json_media_type)
            .unwrap_or(false);

        if !is_json {
            return Err(RpcError::NonJsonResponse {
                status: status.as_u16(),
                reason: reason_phrase(status),
            });
        }

        let body = response.bytes().map_err(Self::classify_read_error)?;
        let parsed: Value = serde_json::from_slice(&body).map_err(|e| {
            RpcError::Parsing(format!("Failed to parse RPC response: {e}"))
        })?;

        log_response(&parsed, &body);
        Ok(parsed)
    }

    /// Classify errors raised while sending the request and awaiting the status line
    fn classify_send_error(e: ReqwestError) -> RpcError {
        if e.is_timeout() {
            RpcError::Network("Request timed out".to_string())
        } else if e.is_connect() {
            RpcError::Network(format!("Network error: {e}"))
        } else if e.is_request() {
            debug!("Server closed the connection without a response: {}", e);
            RpcError::MissingResponse
        } else {
            RpcError::Network(format!("Network error: {e}"))
        }
    }

    /// Classify errors raised while reading the response body
    fn classify_read_error(e: ReqwestError) -> RpcError {
        if e.is_timeout() {
            RpcError::Network("Request timed out".to_string())
        } else if e.is_decode() {
            RpcError::Parsing(format!("Failed to parse RPC response: {e}"))
        } else {
            RpcError::Network(format!("Network error: {e}"))
        }
    }
}

fn origin_of(endpoint: &Endpoint) -> String {
    format!(
        "{}://{}:{}",
        endpoint.scheme(),
        endpoint.host(),
        endpoint.port()
    )
}

/// The standard phrase for `status`; the one the server sent is not available
fn reason_phrase(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("Unknown Status")
        .to_string()
}

/// `application/json`, optionally followed by parameters such as `charset`
fn is_json_media_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|essence| essence.trim().eq_ignore_ascii_case(JSON_CONTENT_TYPE))
        .unwrap_or(false)
}

fn log_response(parsed: &Value, raw: &[u8]) {
    match parsed {
        Value::Object(obj) if obj.get("error").map_or(false, Value::is_null) => {
            let id = obj.get("id").cloned().unwrap_or(Value::Null);
            let result = obj.get("result").cloned().unwrap_or(Value::Null);
            debug!("<-{}- {}", id, result);
        }
        _ => debug!("<-- {}", String::from_utf8_lossy(raw)),
    }
}
