//! Domain traits defining contracts for external systems.

use async_trait::async_trait;

use super::error::AppError;
use super::types::{
    AccountId, CallRequest, ChainParams, ContractExecResult, ContractInstantiateResult, H256,
    InstantiateRequest, SignedExtrinsic, SigningContext,
};

/// Chain node RPC endpoint hosting the contract.
#[async_trait]
pub trait ContractRpc: Send + Sync {
    /// Check node connectivity
    async fn health_check(&self) -> Result<(), AppError>;

    /// Dry-run a contract message. Never changes chain state.
    async fn call(&self, request: &CallRequest) -> Result<ContractExecResult, AppError>;

    /// Dry-run a constructor against uploaded code
    async fn instantiate(
        &self,
        request: &InstantiateRequest,
    ) -> Result<ContractInstantiateResult, AppError> {
        let _ = request;
        Err(AppError::NotSupported(
            "instantiate not implemented".to_string(),
        ))
    }

    /// Next transaction index for `account`
    async fn account_nonce(&self, account: &AccountId) -> Result<u64, AppError>;

    /// Runtime versions and genesis hash for the signed payload
    async fn chain_params(&self) -> Result<ChainParams, AppError>;

    /// Broadcast a signed extrinsic, returning its hash
    async fn submit_extrinsic(&self, extrinsic: &SignedExtrinsic) -> Result<H256, AppError>;
}

/// Signing subsystem that turns an unsigned call into a signed extrinsic.
#[async_trait]
pub trait ExtrinsicSigner: Send + Sync {
    /// Account that pays for and originates the extrinsic
    fn account_id(&self) -> AccountId;

    /// Sign `call` under `context`
    async fn sign(
        &self,
        call: &[u8],
        context: &SigningContext,
    ) -> Result<SignedExtrinsic, AppError>;
}
