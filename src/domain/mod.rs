//! Domain layer containing contract value types, traits, and error definitions.

pub mod encoding;
pub mod error;
pub mod hashing;
pub mod traits;
pub mod types;

pub use error::{AppError, CodecError, ConfigError, ContractCallError, RpcError, SigningError};
pub use traits::{ContractRpc, ExtrinsicSigner};
pub use types::{
    AccountId, CallOptions, CallOutcome, CallRequest, ChainParams, ContractError,
    ContractExecResult, ContractInstantiateResult, ContractVersion, DispatchError,
    ExecReturnValue, H256, InstantiateOptions, InstantiateRequest, InstantiateReturnValue,
    LangError, MessageResult, ModuleError, Network, OnchainTradingAccounts,
    OnchainTradingPublicKeys, RawCallOutcome, SignedExtrinsic, SigningContext, SigningResult,
    StorageDeposit, Submittable, TradingKeys, TxOptions, Weight, DEFAULT_SS58_PREFIX,
    MAX_SS58_PREFIX,
};
