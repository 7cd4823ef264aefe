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

//! An authenticated JSON-RPC client for the Pastel daemon.
//!
//! A root [`RpcClient`] is created from a connection URL. Method names are
//! built by chaining [`RpcClient::namespace`], so `client.namespace("masternode")`
//! invokes `masternode`, and a further `.namespace("list")` invokes
//! `masternode.list`. Every client derived from a root shares its
//! [`Connection`] and therefore its request id counter.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::batch::{
    unpack_batch, unpack_single, BatchCall, JsonRpcBatchEntry, JsonRpcRequest,
    BATCH_CALL_VERSION, SINGLE_CALL_VERSION,
};
use crate::connection::{Connection, DEFAULT_TIMEOUT};
use crate::endpoint::Endpoint;
use crate::error::{RpcError, RpcResult};

/// A JSON-RPC client bound to one endpoint and one (possibly empty) method name.
#[derive(Debug, Clone)]
pub struct RpcClient {
    endpoint: Arc<Endpoint>,
    connection: Arc<Connection>,
    service_name: Option<String>,
}

impl RpcClient {
    /// Create a root client for `service_url` with the default 30 second timeout.
    ///
    /// # Errors
    ///
    /// Returns `RpcError::InvalidUrl` if the URL cannot be used, or
    /// `RpcError::Network` if the HTTP client could not be built.
    pub fn new(service_url: &str) -> RpcResult<Self> {
        Self::with_timeout(service_url, DEFAULT_TIMEOUT)
    }

    /// Create a root client for `service_url` with a custom request timeout.
    pub fn with_timeout(service_url: &str, timeout: Duration) -> RpcResult<Self> {
        let endpoint = Endpoint::parse(service_url)?;
        let connection = Connection::open(&endpoint, timeout)?;
        Ok(RpcClient {
            endpoint: Arc::new(endpoint),
            connection: Arc::new(connection),
            service_name: None,
        })
    }

    /// Create a root client that reuses an already open connection.
    ///
    /// The new client shares the id counter of every other client on `connection`.
    ///
    /// # Errors
    ///
    /// Returns `RpcError::InvalidUrl` if the URL cannot be used or points at a
    /// different `scheme://host:port` than the one `connection` is bound to.
    pub fn with_connection(service_url: &str, connection: Arc<Connection>) -> RpcResult<Self> {
        let endpoint = Endpoint::parse(service_url)?;
        if !connection.serves(&endpoint) {
            return Err(RpcError::InvalidUrl(format!(
                "connection to {} cannot serve {}",
                connection.origin(),
                endpoint
            )));
        }
        Ok(RpcClient {
            endpoint: Arc::new(endpoint),
            connection,
            service_name: None,
        })
    }

    /// A client for `name` under this client's namespace.
    ///
    /// The returned client shares this client's endpoint and connection.
    pub fn namespace(&self, name: &str) -> RpcClient {
        let service_name = match &self.service_name {
            Some(parent) => format!("{parent}.{name}"),
            None => name.to_string(),
        };
        RpcClient {
            endpoint: Arc::clone(&self.endpoint),
            connection: Arc::clone(&self.connection),
            service_name: Some(service_name),
        }
    }

    /// The dotted method name this client invokes, `None` for a root client
    pub fn service_name(&self) -> Option<&str> {
        self.service_name.as_deref()
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The connection this client sends its requests over
    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    /// Do both clients send their requests over the same connection?
    pub fn shares_connection(&self, other: &RpcClient) -> bool {
        Arc::ptr_eq(&self.connection, &other.connection)
    }

    /// Invoke `method` under this client's namespace.
    ///
    /// # Errors
    ///
    /// See [`RpcClient::invoke`].
    pub fn call(&self, method: &str, params: Vec<Value>) -> RpcResult<Value> {
        self.namespace(method).invoke(params)
    }

    /// Invoke `method` and deserialize its result into `T`.
    ///
    /// # Errors
    ///
    /// Besides the errors of [`RpcClient::invoke`], returns `RpcError::Parsing`
    /// if the result does not have the shape of `T`.
    pub fn call_as<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> RpcResult<T> {
        let result = self.call(method, params)?;
        serde_json::from_value(result).map_err(|e| {
            RpcError::Parsing(format!("Failed to parse result of '{method}': {e}"))
        })
    }

    /// Invoke the method this client is named after.
    ///
    /// # Errors
    ///
    /// Returns:
    /// * `RpcError::Serialization` when called on a root client,
    /// * `RpcError::Remote` if the server answered with an error object,
    /// * `RpcError::MissingResult` if the reply has neither `result` nor `error`,
    /// * `RpcError::Parsing` for malformed replies or a mismatched `id`,
    /// * the transport errors of [`Connection::post`].
    pub fn invoke(&self, params: Vec<Value>) -> RpcResult<Value> {
        let method = self.service_name.as_deref().ok_or_else(|| {
            RpcError::Serialization("cannot invoke a client without a method name".to_string())
        })?;

        let id = self.connection.next_id();
        let request = JsonRpcRequest {
            version: SINGLE_CALL_VERSION,
            method,
            params: &params,
            id,
        };
        let body = serde_json::to_string(&request)
            .map_err(|e| RpcError::Serialization(e.to_string()))?;

        debug!("-{}-> {}", id, body);

        let response = self.connection.post(&self.endpoint, body)?;
        unpack_single(response, id)
    }

    /// Send several calls in one request and return their results in call order.
    ///
    /// Ids are taken from the shared counter in call order. The first failing
    /// call fails the whole batch with `RpcError::Batch`, which carries its
    /// position and the results of the calls before it.
    ///
    /// # Errors
    ///
    /// Returns `RpcError::Batch` for a failing call, or the parse and transport
    /// errors of [`RpcClient::invoke`] for problems with the response as a whole.
    pub fn batch<I>(&self, calls: I) -> RpcResult<Vec<Value>>
    where
        I: IntoIterator<Item = BatchCall>,
    {
        let calls: Vec<BatchCall> = calls.into_iter().collect();
        if calls.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<u64> = calls.iter().map(|_| self.connection.next_id()).collect();
        let entries: Vec<JsonRpcBatchEntry> = calls
            .iter()
            .zip(&ids)
            .map(|(call, id)| JsonRpcBatchEntry {
                jsonrpc: BATCH_CALL_VERSION,
                method: &call.method,
                params: &call.params,
                id: *id,
            })
            .collect();
        let body = serde_json::to_string(&entries)
            .map_err(|e| RpcError::Serialization(e.to_string()))?;

        debug!("--> {}", body);

        let response = self.connection.post(&self.endpoint, body)?;
        unpack_batch(response, &ids)
    }
}

/// Convert a call argument to JSON.
///
/// [`Decimal`](crate::Decimal) arguments become numbers rounded to 8 decimal places.
///
/// # Errors
///
/// Returns `RpcError::Serialization` if the value has no JSON representation,
/// such as a map with non-string keys.
pub fn to_param<T: Serialize + ?Sized>(value: &T) -> RpcResult<Value> {
    serde_json::to_value(value).map_err(|e| RpcError::Serialization(e.to_string()))
}
