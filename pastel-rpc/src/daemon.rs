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

//! Typed wrappers around the Pastel daemon RPC methods this crate's users need most.

use std::time::Duration;

use serde_json::{json, Value};

use crate::client::RpcClient;
use crate::config::DaemonConfig;
use crate::decimal::Decimal;
use crate::error::RpcResult;

/// Selects a block by hash or by height.
///
/// Both forms are sent as strings, which is how `getblock` takes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockRef {
    Hash(String),
    Height(u64),
}

impl serde::Serialize for BlockRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            BlockRef::Hash(hash) => serializer.serialize_str(hash),
            BlockRef::Height(height) => serializer.serialize_str(&height.to_string()),
        }
    }
}

impl From<u64> for BlockRef {
    fn from(height: u64) -> Self {
        BlockRef::Height(height)
    }
}

impl From<&str> for BlockRef {
    fn from(hash: &str) -> Self {
        BlockRef::Hash(hash.to_string())
    }
}

/// Block header fields returned by `getblock`.
///
/// # Note
/// This struct supports a subset of available fields to match current usage.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlockInfo {
    pub hash: String,
    pub height: u64,
    /// -1 when the block is not on the main chain
    pub confirmations: i64,
    pub merkleroot: String,
    /// Absent for the genesis block
    #[serde(default)]
    pub previousblockhash: Option<String>,
    pub time: u64,
}

/// A single unspent output returned by `listunspent`.
///
/// # Note
/// This struct supports a subset of available fields to match current usage.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UnspentOutput {
    pub txid: String,
    pub vout: u32,
    #[serde(default)]
    pub address: Option<String>,
    /// Amount in PSL, exactly as reported
    pub amount: Decimal,
    pub confirmations: u64,
}

/// Wallet balances returned by `z_gettotalbalance`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TotalBalance {
    pub transparent: Decimal,
    pub private: Decimal,
    pub total: Decimal,
}

/// A client exposing the daemon's RPC methods with typed arguments and results.
#[derive(Debug, Clone)]
pub struct PastelRpcClient {
    rpc: RpcClient,
}

impl From<RpcClient> for PastelRpcClient {
    fn from(rpc: RpcClient) -> Self {
        PastelRpcClient { rpc }
    }
}

impl PastelRpcClient {
    pub fn new(service_url: &str) -> RpcResult<Self> {
        Ok(RpcClient::new(service_url)?.into())
    }

    /// Connect with the settings of a `pastel.conf`.
    pub fn from_config(config: &DaemonConfig, timeout: Duration) -> RpcResult<Self> {
        Ok(RpcClient::with_timeout(&config.rpc_url(), timeout)?.into())
    }

    /// The underlying untyped client, for methods without a wrapper
    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    /// Hash of the tip of the best chain.
    pub fn get_best_block_hash(&self) -> RpcResult<String> {
        self.rpc.call_as("getbestblockhash", vec![])
    }

    /// Number of blocks in the best chain.
    pub fn get_block_count(&self) -> RpcResult<u64> {
        self.rpc.call_as("getblockcount", vec![])
    }

    /// Hash of the best-chain block at `height`.
    ///
    /// # Errors
    /// The daemon answers with error -8 if `height` is out of range.
    pub fn get_block_hash(&self, height: u64) -> RpcResult<String> {
        self.rpc.call_as("getblockhash", vec![height.into()])
    }

    /// Header information for a block given by hash or height.
    pub fn get_block(&self, block: impl Into<BlockRef>) -> RpcResult<BlockInfo> {
        let block = crate::client::to_param(&block.into())?;
        self.rpc.call_as("getblock", vec![block, json!(1)])
    }

    /// The decoded transaction `txid`, as the daemon's verbose JSON.
    ///
    /// # Notes
    /// Transactions outside the mempool are only found with `txindex=1`.
    pub fn get_raw_transaction(&self, txid: &str) -> RpcResult<Value> {
        self.rpc
            .call("getrawtransaction", vec![txid.into(), json!(1)])
    }

    /// Every unspent output of the wallet.
    pub fn list_unspent(&self) -> RpcResult<Vec<UnspentOutput>> {
        self.rpc.call_as("listunspent", vec![])
    }

    /// Transparent, shielded and total wallet balance.
    pub fn z_get_total_balance(&self) -> RpcResult<TotalBalance> {
        self.rpc.call_as("z_gettotalbalance", vec![])
    }

    /// Results of finished asynchronous operations, removing them from the daemon's memory.
    ///
    /// An empty `opids` asks for every finished operation.
    pub fn z_get_operation_result(&self, opids: &[String]) -> RpcResult<Vec<Value>> {
        let params = if opids.is_empty() {
            vec![]
        } else {
            vec![crate::client::to_param(opids)?]
        };
        self.rpc.call_as("z_getoperationresult", params)
    }

    /// `masternode list <mode>`, e.g. `full`, `extra` or `status`.
    pub fn masternode_list(&self, mode: &str) -> RpcResult<Value> {
        self.rpc.call("masternode", vec!["list".into(), mode.into()])
    }

    /// `tickets list <kind>`, e.g. `id`, `nft` or `act`.
    pub fn tickets_list(&self, kind: &str) -> RpcResult<Value> {
        self.rpc.call("tickets", vec!["list".into(), kind.into()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RpcError;

    fn setup_client(server: &mockito::ServerGuard) -> PastelRpcClient {
        let parsed = url::Url::parse(&server.url()).unwrap();
        let url = format!(
            "http://user:pass@{}:{}/",
            parsed.host_str().unwrap(),
            parsed.port_or_known_default().unwrap()
        );
        PastelRpcClient::new(&url).unwrap()
    }

    fn mock_call(
        server: &mut mockito::ServerGuard,
        expected_request: Value,
        mock_response: Value,
    ) -> mockito::Mock {
        server
            .mock("POST", "/")
            .match_header("authorization", "Basic dXNlcjpwYXNz")
            .match_body(mockito::Matcher::PartialJson(expected_request))
            .with_status(200)
            .with_header("Content-Type", "application/json")
            .with_body(mock_response.to_string())
            .create()
    }

    #[test]
    fn test_get_block_count_ok() {
        let mut server = mockito::Server::new();
        let _m = mock_call(
            &mut server,
            json!({"version": "1.1", "method": "getblockcount", "params": [], "id": 1}),
            json!({"result": 123456, "error": null, "id": 1}),
        );

        let client = setup_client(&server);
        assert_eq!(client.get_block_count().unwrap(), 123456);
    }

    #[test]
    fn test_get_block_hash_out_of_range() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::PartialJson(
                json!({"method": "getblockhash", "params": [99999999]}),
            ))
            .with_status(500)
            .with_header("Content-Type", "application/json")
            .with_body(
                json!({"result": null, "error": {"code": -8, "message": "Block height out of range"}, "id": 1})
                    .to_string(),
            )
            .create();

        let client = setup_client(&server);
        let err = client.get_block_hash(99999999).unwrap_err();
        assert_eq!(
            err,
            RpcError::Remote {
                code: -8,
                message: "Block height out of range".into()
            }
        );
    }

    #[test]
    fn test_get_block_by_height_ok() {
        let mut server = mockito::Server::new();
        let _m = mock_call(
            &mut server,
            json!({"method": "getblock", "params": ["100", 1]}),
            json!({
                "result": {
                    "hash": "00aa",
                    "height": 100,
                    "confirmations": 5,
                    "merkleroot": "bb11",
                    "previousblockhash": "00a9",
                    "time": 1700000000,
                    "tx": ["cc22"]
                },
                "error": null,
                "id": 1
            }),
        );

        let client = setup_client(&server);
        let block = client.get_block(100u64).unwrap();
        assert_eq!(block.hash, "00aa");
        assert_eq!(block.height, 100);
        assert_eq!(block.previousblockhash.as_deref(), Some("00a9"));
    }

    #[test]
    fn test_list_unspent_keeps_exact_amounts() {
        let mut server = mockito::Server::new();
        let _m = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::PartialJson(json!({"method": "listunspent"})))
            .with_status(200)
            .with_header("Content-Type", "application/json")
            .with_body(
                r#"{"result":[{"txid":"aabb","vout":0,"address":"PtAddr","amount":12.34567891,"confirmations":6}],"error":null,"id":1}"#,
            )
            .create();

        let client = setup_client(&server);
        let utxos = client.list_unspent().unwrap();
        assert_eq!(utxos.len(), 1);
        assert_eq!(utxos[0].amount.to_string(), "12.34567891");
        assert_eq!(utxos[0].amount.to_base_units(), Some(1234567891));
    }

    #[test]
    fn test_z_get_total_balance_ok() {
        let mut server = mockito::Server::new();
        let _m = mock_call(
            &mut server,
            json!({"method": "z_gettotalbalance"}),
            json!({
                "result": {"transparent": "1.50", "private": "0.25", "total": "1.75"},
                "error": null,
                "id": 1
            }),
        );

        let client = setup_client(&server);
        let balance = client.z_get_total_balance().unwrap();
        assert_eq!(balance.total, "1.75".parse::<Decimal>().unwrap());
        assert_eq!(
            balance.transparent.checked_add(&balance.private),
            Some(balance.total)
        );
    }

    #[test]
    fn test_subcommand_wrappers_send_positional_words() {
        let mut server = mockito::Server::new();
        let _m = mock_call(
            &mut server,
            json!({"method": "tickets", "params": ["list", "id"]}),
            json!({"result": [], "error": null, "id": 1}),
        );
        let _n = mock_call(
            &mut server,
            json!({"method": "masternode", "params": ["list", "full"]}),
            json!({"result": {"aabb-0": "ENABLED"}, "error": null, "id": 2}),
        );

        let client = setup_client(&server);
        assert_eq!(client.tickets_list("id").unwrap(), json!([]));
        assert_eq!(
            client.masternode_list("full").unwrap(),
            json!({"aabb-0": "ENABLED"})
        );
    }

    #[test]
    fn test_z_get_operation_result_params() {
        let mut server = mockito::Server::new();
        let _m = mock_call(
            &mut server,
            json!({"method": "z_getoperationresult", "params": [["opid-1"]]}),
            json!({"result": [{"id": "opid-1", "status": "success"}], "error": null, "id": 1}),
        );

        let client = setup_client(&server);
        let results = client
            .z_get_operation_result(&["opid-1".to_string()])
            .unwrap();
        assert_eq!(results[0]["status"], json!("success"));
    }

    #[test]
    fn test_block_ref_serialization() {
        assert_eq!(
            serde_json::to_value(BlockRef::from(7u64)).unwrap(),
            json!("7")
        );
        assert_eq!(
            serde_json::to_value(BlockRef::from("00ff")).unwrap(),
            json!("00ff")
        );
    }
}
