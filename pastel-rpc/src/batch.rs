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

//! JSON-RPC envelopes and response unpacking.
//!
//! Single calls use the `"version": "1.1"` envelope; batches use
//! `"jsonrpc": "2.0"` objects. Both are what the daemon accepts.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::{RpcError, RpcErrorObject, RpcResult};

/// Envelope version of single calls
pub const SINGLE_CALL_VERSION: &str = "1.1";
/// Envelope version of batch entries
pub const BATCH_CALL_VERSION: &str = "2.0";

/// Represents a single JSON-RPC call payload.
#[derive(Serialize)]
pub(crate) struct JsonRpcRequest<'a> {
    /// JSON-RPC protocol version.
    pub version: &'static str,
    /// Name of the RPC method to invoke.
    pub method: &'a str,
    /// Parameters to be passed to the RPC method.
    pub params: &'a [Value],
    /// Identifier for this request, echoed back by the server.
    pub id: u64,
}

/// One entry of a batch payload.
#[derive(Serialize)]
pub(crate) struct JsonRpcBatchEntry<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: &'a [Value],
    pub id: u64,
}

/// A call to include in a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchCall {
    /// Name of the RPC method to invoke
    pub method: String,
    /// Positional parameters
    pub params: Vec<Value>,
}

impl BatchCall {
    /// A call of `method` with positional `params`.
    pub fn new(method: impl Into<String>, params: Vec<Value>) -> Self {
        BatchCall {
            method: method.into(),
            params,
        }
    }

    /// Build a call from `[method, params...]`; the method name is taken from the front.
    ///
    /// # Errors
    ///
    /// Returns `RpcError::Serialization` if the list is empty or does not start with a string.
    pub fn from_values(mut values: Vec<Value>) -> RpcResult<Self> {
        if values.is_empty() {
            return Err(RpcError::Serialization(
                "batch entry is missing a method name".to_string(),
            ));
        }
        match values.remove(0) {
            Value::String(method) => Ok(BatchCall {
                method,
                params: values,
            }),
            other => Err(RpcError::Serialization(format!(
                "batch entry method name must be a string, got {other}"
            ))),
        }
    }
}

impl TryFrom<Vec<Value>> for BatchCall {
    type Error = RpcError;

    fn try_from(values: Vec<Value>) -> Result<Self, Self::Error> {
        BatchCall::from_values(values)
    }
}

/// Extract `result` from a single-call response object.
///
/// A non-null `error` wins over any `result`; an object with neither is
/// `RpcError::MissingResult`. A non-null `id` must match `expected_id`.
pub(crate) fn unpack_single(response: Value, expected_id: u64) -> RpcResult<Value> {
    let Value::Object(mut obj) = response else {
        return Err(RpcError::Parsing(
            "Invalid response: expected a JSON object".to_string(),
        ));
    };

    if let Some(id) = obj.get("id").filter(|id| !id.is_null()) {
        if id.as_u64() != Some(expected_id) {
            return Err(RpcError::Parsing(format!(
                "Invalid response: mismatched 'id': expected '{}', got '{}'",
                expected_id, id
            )));
        }
    }

    take_result(&mut obj)
}

/// Match a batch response against the request ids and collect the results in request order.
///
/// If every response carries an id, responses are matched by id; otherwise
/// they are matched by position. The first failing call (in request order)
/// aborts the whole batch.
pub(crate) fn unpack_batch(response: Value, ids: &[u64]) -> RpcResult<Vec<Value>> {
    let responses = match response {
        Value::Array(responses) => responses,
        Value::Object(mut obj) => {
            if let Some(err) = take_error(&mut obj) {
                return Err(err);
            }
            return Err(RpcError::Parsing("Parse error".to_string()));
        }
        _ => return Err(RpcError::Parsing("Parse error".to_string())),
    };

    if responses.len() != ids.len() {
        return Err(RpcError::Parsing(format!(
            "Invalid response: expected {} batch responses, got {}",
            ids.len(),
            responses.len()
        )));
    }

    let ordered = order_by_id(responses, ids)?;

    let mut results = Vec::with_capacity(ordered.len());
    for (index, response) in ordered.into_iter().enumerate() {
        let outcome = match response {
            Value::Object(mut obj) => take_result(&mut obj),
            _ => Err(RpcError::Parsing(
                "Invalid response: batch entry is not a JSON object".to_string(),
            )),
        };
        match outcome {
            Ok(result) => results.push(result),
            Err(err) => {
                return Err(RpcError::Batch {
                    index,
                    completed: results,
                    source: Box::new(err),
                })
            }
        }
    }
    Ok(results)
}

/// Put id-carrying responses into request order; leave anonymous ones positional.
fn order_by_id(responses: Vec<Value>, ids: &[u64]) -> RpcResult<Vec<Value>> {
    let response_ids: Option<Vec<u64>> = responses
        .iter()
        .map(|response| response.get("id").and_then(Value::as_u64))
        .collect();
    let all_identified = responses
        .iter()
        .all(|response| response.get("id").map_or(false, |id| !id.is_null()));

    if !all_identified {
        return Ok(responses);
    }
    let Some(response_ids) = response_ids else {
        return Err(RpcError::Parsing(
            "Invalid response: batch response ids must be integers".to_string(),
        ));
    };
    if response_ids == ids {
        return Ok(responses);
    }

    let positions: HashMap<u64, usize> = ids
        .iter()
        .enumerate()
        .map(|(position, id)| (*id, position))
        .collect();
    let mut slots: Vec<Option<Value>> = vec![None; ids.len()];
    for (response_id, response) in response_ids.into_iter().zip(responses) {
        let slot = positions
            .get(&response_id)
            .and_then(|position| slots.get_mut(*position))
            .filter(|slot| slot.is_none())
            .ok_or_else(|| {
                RpcError::Parsing(format!(
                    "Invalid response: unexpected or duplicated batch id '{response_id}'"
                ))
            })?;
        *slot = Some(response);
    }
    // every id was matched exactly once, so no slot is left empty
    Ok(slots.into_iter().flatten().collect())
}

fn take_error(obj: &mut Map<String, Value>) -> Option<RpcError> {
    match obj.remove("error") {
        None | Some(Value::Null) => None,
        Some(Value::String(message)) => Some(RpcError::Remote { code: 0, message }),
        Some(err) => Some(
            serde_json::from_value::<RpcErrorObject>(err.clone())
                .map(RpcError::from)
                .unwrap_or_else(|_| RpcError::Remote {
                    code: 0,
                    message: err.to_string(),
                }),
        ),
    }
}

fn take_result(obj: &mut Map<String, Value>) -> RpcResult<Value> {
    if let Some(err) = take_error(obj) {
        return Err(err);
    }
    obj.remove("result").ok_or(RpcError::MissingResult)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_single_envelope_shape() {
        let params = vec![json!("abc"), json!(1)];
        let request = JsonRpcRequest {
            version: SINGLE_CALL_VERSION,
            method: "getblock",
            params: &params,
            id: 7,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"version": "1.1", "method": "getblock", "params": ["abc", 1], "id": 7})
        );
    }

    #[test]
    fn test_batch_envelope_shape() {
        let entry = JsonRpcBatchEntry {
            jsonrpc: BATCH_CALL_VERSION,
            method: "getblockhash",
            params: &[json!(10)],
            id: 3,
        };
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({"jsonrpc": "2.0", "method": "getblockhash", "params": [10], "id": 3})
        );
    }

    #[test]
    fn test_batch_call_from_values() {
        let call = BatchCall::from_values(vec![json!("getblock"), json!("hash"), json!(1)]).unwrap();
        assert_eq!(call, BatchCall::new("getblock", vec![json!("hash"), json!(1)]));

        assert!(matches!(
            BatchCall::from_values(vec![]),
            Err(RpcError::Serialization(_))
        ));
        assert!(matches!(
            BatchCall::try_from(vec![json!(12), json!("x")]),
            Err(RpcError::Serialization(_))
        ));
    }

    #[test]
    fn test_unpack_single_result() {
        let result = unpack_single(json!({"result": {"height": 5}, "error": null, "id": 4}), 4);
        assert_eq!(result.unwrap(), json!({"height": 5}));
    }

    #[test]
    fn test_unpack_single_null_result_is_a_result() {
        let result = unpack_single(json!({"result": null, "error": null, "id": 1}), 1);
        assert_eq!(result.unwrap(), Value::Null);
    }

    #[test]
    fn test_unpack_single_remote_error() {
        let err = unpack_single(
            json!({"result": null, "error": {"code": -8, "message": "Block height out of range"}, "id": 2}),
            2,
        )
        .unwrap_err();
        assert_eq!(
            err,
            RpcError::Remote {
                code: -8,
                message: "Block height out of range".into()
            }
        );
    }

    #[test]
    fn test_unpack_single_missing_result() {
        let err = unpack_single(json!({"id": 1, "foo": "bar"}), 1).unwrap_err();
        assert_eq!(err, RpcError::MissingResult);
        assert_eq!(err.code(), -343);
    }

    #[test]
    fn test_unpack_single_mismatched_id() {
        let err = unpack_single(json!({"result": true, "error": null, "id": 9}), 1).unwrap_err();
        match err {
            RpcError::Parsing(msg) => assert_eq!(
                "Invalid response: mismatched 'id': expected '1', got '9'",
                msg
            ),
            other => panic!("Expected parse error, got: {:?}", other),
        }
    }

    #[test]
    fn test_unpack_batch_positional_fail_fast() {
        let response = json!([
            {"result": 1},
            {"result": 2},
            {"error": {"code": -1, "message": "bad"}}
        ]);
        let err = unpack_batch(response, &[1, 2, 3]).unwrap_err();
        match &err {
            RpcError::Batch {
                index,
                completed,
                source,
            } => {
                assert_eq!(*index, 2);
                assert_eq!(completed, &vec![json!(1), json!(2)]);
                assert_eq!(
                    **source,
                    RpcError::Remote {
                        code: -1,
                        message: "bad".into()
                    }
                );
            }
            other => panic!("Expected batch error, got: {:?}", other),
        }
        assert_eq!(err.code(), -1);
        assert_eq!(err.message(), "bad");
    }

    #[test]
    fn test_unpack_batch_stops_at_first_failure() {
        let response = json!([
            {"error": {"code": -5, "message": "first"}},
            {"error": {"code": -6, "message": "second"}}
        ]);
        let err = unpack_batch(response, &[1, 2]).unwrap_err();
        assert_eq!(err.code(), -5);
        assert_eq!(err.message(), "first");
    }

    #[test]
    fn test_unpack_batch_reorders_by_id() {
        let response = json!([
            {"result": "c", "error": null, "id": 12},
            {"result": "a", "error": null, "id": 10},
            {"result": "b", "error": null, "id": 11}
        ]);
        let results = unpack_batch(response, &[10, 11, 12]).unwrap();
        assert_eq!(results, vec![json!("a"), json!("b"), json!("c")]);
    }

    #[test]
    fn test_unpack_batch_rejects_unknown_and_duplicate_ids() {
        let unknown = json!([{"result": 1, "id": 1}, {"result": 2, "id": 99}]);
        assert!(matches!(
            unpack_batch(unknown, &[1, 2]),
            Err(RpcError::Parsing(_))
        ));

        let duplicate = json!([{"result": 1, "id": 1}, {"result": 2, "id": 1}]);
        assert!(matches!(
            unpack_batch(duplicate, &[1, 2]),
            Err(RpcError::Parsing(_))
        ));
    }

    #[test]
    fn test_unpack_batch_single_object_response() {
        let err = unpack_batch(
            json!({"result": null, "error": {"code": -32600, "message": "Invalid Request"}}),
            &[1],
        )
        .unwrap_err();
        assert_eq!(err.code(), -32600);

        let err = unpack_batch(json!({"result": null, "error": null}), &[1]).unwrap_err();
        assert_eq!(err, RpcError::Parsing("Parse error".into()));
        assert_eq!(err.code(), -32700);
    }

    #[test]
    fn test_unpack_batch_missing_result() {
        let err = unpack_batch(json!([{"result": 1}, {"id": null}]), &[1, 2]).unwrap_err();
        assert_eq!(err.root(), &RpcError::MissingResult);
        assert_eq!(err.code(), -343);
    }

    #[test]
    fn test_unpack_batch_length_mismatch() {
        let err = unpack_batch(json!([{"result": 1}]), &[1, 2]).unwrap_err();
        assert!(matches!(err, RpcError::Parsing(_)));
    }
}
