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

use serde_json::Value;

/// Response carried neither a `result` nor an `error`
pub const RPC_MISSING_RESULT: i64 = -343;
/// Transport-level fault: no response, non-JSON response, network failure
pub const RPC_TRANSPORT_ERROR: i64 = -342;
/// The JSON-RPC "Parse error" code
pub const RPC_PARSE_ERROR: i64 = -32700;
/// The JSON-RPC "Invalid Request" code
pub const RPC_INVALID_REQUEST: i64 = -32600;
/// The JSON-RPC "Invalid params" code
pub const RPC_INVALID_PARAMS: i64 = -32602;

/// The `error` member of a JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RpcErrorObject {
    /// Numeric error code chosen by the server
    #[serde(default)]
    pub code: i64,
    /// Human readable description
    #[serde(default)]
    pub message: String,
}

/// Represents a JSON-RPC error encountered while issuing a call.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RpcError {
    /// The server answered with a non-null `error` object
    #[error("{code}: {message}")]
    Remote {
        /// Code taken verbatim from the response
        code: i64,
        /// Message taken verbatim from the response
        message: String,
    },
    /// The response had neither a `result` nor an `error`
    #[error("missing JSON-RPC result")]
    MissingResult,
    /// The server closed the connection without sending a response
    #[error("missing HTTP response from server")]
    MissingResponse,
    /// The server answered with something other than `application/json`
    #[error("non-JSON HTTP response with '{status} {reason}' from server")]
    NonJsonResponse {
        /// HTTP status code
        status: u16,
        /// HTTP reason phrase
        reason: String,
    },
    /// Connection failures and timeouts
    #[error("{0}")]
    Network(String),
    /// The response body could not be parsed or was malformed
    #[error("{0}")]
    Parsing(String),
    /// A call argument could not be converted to JSON
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The connection URL could not be used
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),
    /// One call of a batch failed; `completed` holds the results of the calls before it
    #[error("batch call #{index} failed: {source}")]
    Batch {
        /// Position of the failing call in the request
        index: usize,
        /// Results of the calls that preceded the failure, in request order
        completed: Vec<Value>,
        /// The failure itself
        source: Box<RpcError>,
    },
}

/// Alias for results returned from RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;

impl RpcError {
    /// The numeric JSON-RPC code for this error.
    pub fn code(&self) -> i64 {
        match self {
            RpcError::Remote { code, .. } => *code,
            RpcError::MissingResult => RPC_MISSING_RESULT,
            RpcError::MissingResponse
            | RpcError::NonJsonResponse { .. }
            | RpcError::Network(_) => RPC_TRANSPORT_ERROR,
            RpcError::Parsing(_) => RPC_PARSE_ERROR,
            RpcError::Serialization(_) => RPC_INVALID_PARAMS,
            RpcError::InvalidUrl(_) => RPC_INVALID_REQUEST,
            RpcError::Batch { source, .. } => source.code(),
        }
    }

    /// The error message, without the code.
    pub fn message(&self) -> String {
        match self {
            RpcError::Remote { message, .. } => message.clone(),
            RpcError::Batch { source, .. } => source.message(),
            other => other.to_string(),
        }
    }

    /// The innermost error, looking through a batch failure.
    pub fn root(&self) -> &RpcError {
        match self {
            RpcError::Batch { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<RpcErrorObject> for RpcError {
    fn from(err: RpcErrorObject) -> Self {
        RpcError::Remote {
            code: err.code,
            message: err.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_remote_error_displays_code_and_message() {
        let err = RpcError::from(RpcErrorObject {
            code: -5,
            message: "Invalid address".into(),
        });
        assert_eq!(err.to_string(), "-5: Invalid address");
        assert_eq!(err.code(), -5);
        assert_eq!(err.message(), "Invalid address");
    }

    #[test]
    fn test_local_codes() {
        assert_eq!(RpcError::MissingResult.code(), -343);
        assert_eq!(RpcError::MissingResponse.code(), -342);
        assert_eq!(
            RpcError::NonJsonResponse {
                status: 500,
                reason: "Internal Server Error".into()
            }
            .code(),
            -342
        );
        assert_eq!(RpcError::Parsing("Parse error".into()).code(), -32700);
        assert_eq!(RpcError::Serialization("bad".into()).code(), -32602);
    }

    #[test]
    fn test_non_json_message_mentions_status_and_reason() {
        let err = RpcError::NonJsonResponse {
            status: 500,
            reason: "Internal Server Error".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("500"));
        assert!(msg.contains("Internal Server Error"));
    }

    #[test]
    fn test_batch_error_delegates_to_source() {
        let err = RpcError::Batch {
            index: 2,
            completed: vec![json!(1), json!(2)],
            source: Box::new(RpcError::Remote {
                code: -1,
                message: "bad".into(),
            }),
        };
        assert_eq!(err.code(), -1);
        assert_eq!(err.message(), "bad");
        assert_eq!(
            err.root(),
            &RpcError::Remote {
                code: -1,
                message: "bad".into()
            }
        );
    }

    #[test]
    fn test_error_object_tolerates_missing_fields() {
        let obj: RpcErrorObject = serde_json::from_value(json!({"message": "oops"})).unwrap();
        assert_eq!(obj.code, 0);
        assert_eq!(obj.message, "oops");
    }
}
