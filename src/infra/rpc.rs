//! JSON-RPC transport to a Substrate node running pallet-contracts.
//!
//! Dry runs go through `state_call` with the `ContractsApi` runtime API; the
//! payloads are SCALE, hex-encoded on the wire.

use std::time::Duration;

use async_trait::async_trait;
use parity_scale_codec::{Decode, Encode};
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::domain::encoding::{from_hex, from_hex_32, to_hex};
use crate::domain::{
    AccountId, AppError, CallRequest, ChainParams, CodecError, ContractExecResult,
    ContractInstantiateResult, ContractRpc, DEFAULT_SS58_PREFIX, H256, InstantiateRequest,
    RpcError, SignedExtrinsic,
};

const CONTRACTS_API_CALL: &str = "ContractsApi_call";
const CONTRACTS_API_INSTANTIATE: &str = "ContractsApi_instantiate";

/// Decode a `ContractsApi_*` result. Newer runtimes append
/// `events: Option<Vec<EventRecord>>`, which is `None` unless event
/// collection was requested.
fn decode_contract_result<T: Decode>(bytes: &[u8]) -> Result<T, CodecError> {
    let mut input = bytes;
    let value = T::decode(&mut input)?;
    match input {
        [] | [0x00] => Ok(value),
        rest => Err(CodecError::TrailingBytes {
            remaining: rest.len(),
        }),
    }
}

/// Configuration for the RPC client
#[derive(Debug, Clone)]
pub struct RpcClientConfig {
    pub timeout: Duration,
    /// Prefix used when the node expects SS58 account ids
    pub ss58_prefix: u16,
}

impl Default for RpcClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            ss58_prefix: DEFAULT_SS58_PREFIX,
        }
    }
}

/// Raw JSON-RPC exchange, abstracted so the client can run against a stub.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn send_request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, AppError>;
}

/// HTTP JSON-RPC transport
pub struct HttpRpcTransport {
    http_client: Client,
    rpc_url: String,
}

impl HttpRpcTransport {
    pub fn new(rpc_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Rpc(RpcError::Connection(e.to_string())))?;

        Ok(Self {
            http_client,
            rpc_url: rpc_url.to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<T: Serialize> {
    jsonrpc: &'static str,
    id: u64,
    method: String,
    params: T,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

#[async_trait]
impl RpcTransport for HttpRpcTransport {
    async fn send_request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, AppError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: method.to_string(),
            params,
        };

        let response = self
            .http_client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Rpc(RpcError::Timeout(e.to_string()))
                } else {
                    AppError::Rpc(RpcError::Connection(e.to_string()))
                }
            })?;

        let rpc_response: JsonRpcResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| AppError::Rpc(RpcError::InvalidResponse(e.to_string())))?;

        if let Some(error) = rpc_response.error {
            let message = match error.data {
                Some(data) => format!("{} ({})", error.message, data),
                None => error.message,
            };
            return Err(AppError::Rpc(RpcError::Node {
                code: error.code,
                message,
            }));
        }

        rpc_response
            .result
            .ok_or_else(|| AppError::Rpc(RpcError::EmptyResponse(method.to_string())))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuntimeVersion {
    spec_version: u32,
    transaction_version: u32,
}

/// `ContractRpc` over Substrate JSON-RPC.
pub struct HttpContractRpc {
    transport: Box<dyn RpcTransport>,
    config: RpcClientConfig,
}

impl HttpContractRpc {
    pub fn new(rpc_url: &str, config: RpcClientConfig) -> Result<Self, AppError> {
        let transport = HttpRpcTransport::new(rpc_url, config.timeout)?;
        info!(rpc_url = %rpc_url, "Created contract RPC client");
        Ok(Self {
            transport: Box::new(transport),
            config,
        })
    }

    pub fn with_defaults(rpc_url: &str) -> Result<Self, AppError> {
        Self::new(rpc_url, RpcClientConfig::default())
    }

    /// Create a client over a specific transport (useful for testing)
    pub fn with_transport(transport: Box<dyn RpcTransport>, config: RpcClientConfig) -> Self {
        Self { transport, config }
    }

    #[instrument(skip(self, params))]
    async fn rpc_call<P: Serialize + Send + Sync, R: DeserializeOwned + Send>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, AppError> {
        let params_value = serde_json::to_value(params).map_err(|e| {
            AppError::Rpc(RpcError::InvalidResponse(format!(
                "Serialization error: {}",
                e
            )))
        })?;

        let result_value = self
            .transport
            .send_request(method, params_value)
            .await
            .inspect_err(|e| warn!(error = ?e, method = %method, "RPC call failed"))?;

        serde_json::from_value(result_value).map_err(|e| {
            AppError::Rpc(RpcError::InvalidResponse(format!(
                "Deserialization error: {}",
                e
            )))
        })
    }

    /// `state_call` a runtime API and return the raw SCALE result.
    async fn state_call(&self, api: &str, payload: &[u8]) -> Result<Vec<u8>, AppError> {
        let result: String = self
            .rpc_call("state_call", json!([api, to_hex(payload)]))
            .await?;
        Ok(from_hex(&result)?)
    }
}

#[async_trait]
impl ContractRpc for HttpContractRpc {
    async fn health_check(&self) -> Result<(), AppError> {
        let _: serde_json::Value = self.rpc_call("system_health", json!([])).await?;
        Ok(())
    }

    #[instrument(skip(self, request), fields(dest = %request.dest))]
    async fn call(&self, request: &CallRequest) -> Result<ContractExecResult, AppError> {
        let bytes = self.state_call(CONTRACTS_API_CALL, &request.encode()).await?;
        let result: ContractExecResult = decode_contract_result(&bytes)?;
        debug!(
            gas_consumed = result.gas_consumed.ref_time,
            ok = result.result.is_ok(),
            "Contract call dry run completed"
        );
        Ok(result)
    }

    #[instrument(skip(self, request), fields(code_hash = %request.code_hash))]
    async fn instantiate(
        &self,
        request: &InstantiateRequest,
    ) -> Result<ContractInstantiateResult, AppError> {
        let bytes = self
            .state_call(CONTRACTS_API_INSTANTIATE, &request.encode())
            .await?;
        Ok(decode_contract_result(&bytes)?)
    }

    async fn account_nonce(&self, account: &AccountId) -> Result<u64, AppError> {
        self.rpc_call(
            "system_accountNextIndex",
            json!([account.to_ss58(self.config.ss58_prefix)]),
        )
        .await
    }

    async fn chain_params(&self) -> Result<ChainParams, AppError> {
        let version: RuntimeVersion = self.rpc_call("state_getRuntimeVersion", json!([])).await?;
        let genesis: String = self.rpc_call("chain_getBlockHash", json!([0])).await?;

        Ok(ChainParams {
            spec_version: version.spec_version,
            transaction_version: version.transaction_version,
            genesis_hash: H256(from_hex_32(&genesis)?),
        })
    }

    #[instrument(skip(self, extrinsic), fields(signer = %extrinsic.signer))]
    async fn submit_extrinsic(&self, extrinsic: &SignedExtrinsic) -> Result<H256, AppError> {
        let hash: String = self
            .rpc_call("author_submitExtrinsic", json!([extrinsic.to_hex()]))
            .await?;
        let hash: H256 = hash.parse()?;
        info!(tx_hash = %hash, "Extrinsic accepted by node");
        Ok(hash)
    }
}
