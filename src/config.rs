//! Client configuration loaded from `SPECTRE_*` environment variables.

use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use crate::app::{ContractFactory, SpectrePse};
use crate::domain::{
    AccountId, AppError, ConfigError, ContractRpc, ContractVersion, DEFAULT_SS58_PREFIX, H256,
    MAX_SS58_PREFIX, TxOptions, Weight,
};
use crate::infra::{Ed25519ExtrinsicSigner, HttpContractRpc, RpcClientConfig};

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9944";
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;
/// Index of the `Contracts` pallet in the target runtime.
pub const DEFAULT_CONTRACTS_PALLET_INDEX: u8 = 7;

#[derive(Debug)]
pub struct ClientConfig {
    pub rpc_url: String,
    pub contract_address: Option<AccountId>,
    pub code_hash: Option<H256>,
    pub version: ContractVersion,
    pub rpc: RpcClientConfig,
    pub pallet_index: u8,
    /// Gas limit for submitted transactions
    pub gas_limit: Weight,
    /// Caller used for dry runs when no signer is configured
    pub origin: Option<AccountId>,
    pub signer_seed: Option<SecretString>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            contract_address: None,
            code_hash: None,
            version: ContractVersion::default(),
            rpc: RpcClientConfig::default(),
            pallet_index: DEFAULT_CONTRACTS_PALLET_INDEX,
            gas_limit: Weight::DEFAULT_TX_LIMIT,
            origin: None,
            signer_seed: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let rpc_url = get("SPECTRE_RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string());
        let contract_address: Option<AccountId> = parse_opt(&get, "SPECTRE_CONTRACT_ADDRESS")?;
        let code_hash: Option<H256> = parse_opt(&get, "SPECTRE_CODE_HASH")?;
        let version: ContractVersion =
            parse_opt(&get, "SPECTRE_CONTRACT_VERSION")?.unwrap_or_default();

        let timeout_secs =
            parse_opt(&get, "SPECTRE_RPC_TIMEOUT_SECS")?.unwrap_or(DEFAULT_RPC_TIMEOUT_SECS);
        let ss58_prefix = parse_opt(&get, "SPECTRE_SS58_PREFIX")?.unwrap_or(DEFAULT_SS58_PREFIX);
        if ss58_prefix > MAX_SS58_PREFIX {
            return Err(ConfigError::Invalid {
                key: "SPECTRE_SS58_PREFIX".to_string(),
                message: format!("{ss58_prefix} exceeds the SS58 maximum {MAX_SS58_PREFIX}"),
            });
        }
        let pallet_index = parse_opt(&get, "SPECTRE_CONTRACTS_PALLET_INDEX")?
            .unwrap_or(DEFAULT_CONTRACTS_PALLET_INDEX);

        let gas_limit = Weight::from_parts(
            parse_opt(&get, "SPECTRE_GAS_REF_TIME")?
                .unwrap_or(Weight::DEFAULT_TX_LIMIT.ref_time),
            parse_opt(&get, "SPECTRE_GAS_PROOF_SIZE")?
                .unwrap_or(Weight::DEFAULT_TX_LIMIT.proof_size),
        );

        let origin: Option<AccountId> = parse_opt(&get, "SPECTRE_ORIGIN")?;
        let signer_seed = get("SPECTRE_SIGNER_SEED").map(SecretString::from);

        Ok(Self {
            rpc_url,
            contract_address,
            code_hash,
            version,
            rpc: RpcClientConfig {
                timeout: Duration::from_secs(timeout_secs),
                ss58_prefix,
            },
            pallet_index,
            gas_limit,
            origin,
            signer_seed,
        })
    }

    pub fn require_contract_address(&self) -> Result<AccountId, ConfigError> {
        self.contract_address
            .ok_or_else(|| ConfigError::Missing("SPECTRE_CONTRACT_ADDRESS".to_string()))
    }

    pub fn require_code_hash(&self) -> Result<H256, ConfigError> {
        self.code_hash
            .ok_or_else(|| ConfigError::Missing("SPECTRE_CODE_HASH".to_string()))
    }

    pub fn tx_options(&self) -> TxOptions {
        TxOptions {
            gas_limit: self.gas_limit,
            ..TxOptions::default()
        }
    }

    pub fn rpc_client(&self) -> Result<HttpContractRpc, AppError> {
        HttpContractRpc::new(&self.rpc_url, self.rpc.clone())
    }

    /// Signer from `SPECTRE_SIGNER_SEED`, if one is configured.
    pub fn signer(&self) -> Result<Option<Ed25519ExtrinsicSigner>, AppError> {
        self.signer_seed
            .as_ref()
            .map(Ed25519ExtrinsicSigner::from_secret)
            .transpose()
    }

    /// Client bound to the configured contract address.
    pub fn contract(&self, rpc: Arc<dyn ContractRpc>) -> Result<SpectrePse, AppError> {
        Ok(SpectrePse::new(
            self.require_contract_address()?,
            self.version,
            rpc,
            self.pallet_index,
        ))
    }

    /// Factory for the configured code hash.
    pub fn factory(&self, rpc: Arc<dyn ContractRpc>) -> Result<ContractFactory, AppError> {
        Ok(ContractFactory::new(
            rpc,
            self.version,
            self.require_code_hash()?,
            self.pallet_index,
        ))
    }
}

fn parse_opt<T, G>(get: &G, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                key: key.to_string(),
                message: e.to_string(),
            })
        })
        .transpose()
}
