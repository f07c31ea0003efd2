//! Mock implementations for testing.

use async_trait::async_trait;
use parity_scale_codec::Encode;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::abi::{ContractsCall, derive_contract_address};
use crate::domain::hashing::blake2_256;
use crate::domain::{
    AccountId, AppError, CallRequest, ChainParams, ContractExecResult, ContractInstantiateResult,
    ContractRpc, ContractVersion, DispatchError, ExecReturnValue, ExtrinsicSigner, H256,
    InstantiateRequest, InstantiateReturnValue, LangError, ModuleError, Network, RpcError,
    SignedExtrinsic, SigningContext, SigningError, StorageDeposit, Weight,
};

use super::contract_sim::SimulatedContract;

/// pallet-contracts `Error::CodeNotFound`
pub const CODE_NOT_FOUND: u8 = 7;
/// pallet-contracts `Error::ContractNotFound`
pub const CONTRACT_NOT_FOUND: u8 = 8;
/// pallet-contracts `Error::DuplicateContract`
pub const DUPLICATE_CONTRACT: u8 = 19;

/// Configuration for mock behavior
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    pub should_fail: bool,
    pub error_message: Option<String>,
}

impl MockConfig {
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            should_fail: true,
            error_message: Some(message.into()),
        }
    }
}

#[derive(Default)]
struct ChainState {
    contracts: HashMap<AccountId, SimulatedContract>,
    codes: HashMap<H256, ContractVersion>,
    nonces: HashMap<AccountId, u64>,
    submitted: Vec<SignedExtrinsic>,
}

/// Mock chain node hosting simulated Spectre PSE instances.
///
/// Dry runs execute without committing; submitted extrinsics are decoded as
/// `Contracts` calls and applied.
pub struct MockContractRpc {
    state: Arc<Mutex<ChainState>>,
    config: MockConfig,
    is_healthy: AtomicBool,
    pallet_index: u8,
}

impl MockContractRpc {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(ChainState::default())),
            config,
            is_healthy: AtomicBool::new(true),
            pallet_index: crate::config::DEFAULT_CONTRACTS_PALLET_INDEX,
        }
    }

    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(MockConfig::failure(message))
    }

    /// Decode submissions against a different `Contracts` pallet index.
    #[must_use]
    pub fn with_pallet_index(mut self, pallet_index: u8) -> Self {
        self.pallet_index = pallet_index;
        self
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.is_healthy.store(healthy, Ordering::Relaxed);
    }

    /// Make `code_hash` available for instantiation as `version`.
    pub fn register_code(&self, code_hash: H256, version: ContractVersion) {
        self.state.lock().unwrap().codes.insert(code_hash, version);
    }

    /// Place an instance at `address` directly, bypassing instantiation.
    pub fn deploy(&self, address: AccountId, version: ContractVersion, seed: Vec<u8>) {
        self.state
            .lock()
            .unwrap()
            .contracts
            .insert(address, SimulatedContract::new(version, seed));
    }

    pub fn set_keys_available(&self, address: &AccountId, available: bool) {
        if let Some(contract) = self.state.lock().unwrap().contracts.get_mut(address) {
            contract.set_keys_available(available);
        }
    }

    pub fn is_deployed(&self, address: &AccountId) -> bool {
        self.state.lock().unwrap().contracts.contains_key(address)
    }

    pub fn has_trader(&self, address: &AccountId, caller: &AccountId) -> bool {
        self.state
            .lock()
            .unwrap()
            .contracts
            .get(address)
            .is_some_and(|c| c.has_trader(caller))
    }

    /// Seed the instance at `address` was constructed with.
    pub fn contract_seed(&self, address: &AccountId) -> Option<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .contracts
            .get(address)
            .map(|c| c.seed().to_vec())
    }

    /// Raw public key backing `caller`'s trading key on `network`.
    pub fn trader_public_key(
        &self,
        address: &AccountId,
        caller: &AccountId,
        network: Network,
    ) -> Option<[u8; 32]> {
        self.state
            .lock()
            .unwrap()
            .contracts
            .get(address)
            .and_then(|c| c.trader_verifying_key(caller, network))
            .map(|key| key.to_bytes())
    }

    pub fn relayer_public_key(&self, address: &AccountId) -> Option<[u8; 32]> {
        self.state
            .lock()
            .unwrap()
            .contracts
            .get(address)
            .map(|c| c.relayer_public_key().to_bytes())
    }

    /// Get all submitted extrinsics (for testing)
    pub fn submitted(&self) -> Vec<SignedExtrinsic> {
        self.state.lock().unwrap().submitted.clone()
    }

    fn check_should_fail(&self) -> Result<(), AppError> {
        if self.config.should_fail {
            let msg = self
                .config
                .error_message
                .clone()
                .unwrap_or_else(|| "Mock error".to_string());
            return Err(AppError::Rpc(RpcError::Connection(msg)));
        }
        Ok(())
    }

    fn module_error(&self, error: u8) -> DispatchError {
        DispatchError::Module(ModuleError {
            index: self.pallet_index,
            error: [error, 0, 0, 0],
        })
    }

    fn apply(&self, state: &mut ChainState, signer: &AccountId, call: ContractsCall) {
        match call {
            ContractsCall::Call { dest, data, .. } => {
                if let Some(contract) = state.contracts.get_mut(&dest) {
                    contract.execute(signer, &data, true);
                }
            }
            ContractsCall::Instantiate {
                code_hash,
                data,
                salt,
                ..
            } => {
                let Some(version) = state.codes.get(&code_hash).copied() else {
                    return;
                };
                let address = derive_contract_address(signer, &code_hash, &data, &salt);
                if state.contracts.contains_key(&address) {
                    return;
                }
                if let Some(contract) = SimulatedContract::construct(version, &data) {
                    state.contracts.insert(address, contract);
                }
            }
        }
    }
}

impl Default for MockContractRpc {
    fn default() -> Self {
        Self::new()
    }
}

fn dry_run_weight(input: &[u8]) -> Weight {
    Weight::from_parts(1_000_000 + input.len() as u64 * 1_000, 4_096)
}

#[async_trait]
impl ContractRpc for MockContractRpc {
    async fn health_check(&self) -> Result<(), AppError> {
        if !self.is_healthy.load(Ordering::Relaxed) {
            return Err(AppError::Rpc(RpcError::Connection("Unhealthy".to_string())));
        }
        self.check_should_fail()
    }

    async fn call(&self, request: &CallRequest) -> Result<ContractExecResult, AppError> {
        self.check_should_fail()?;
        let mut state = self.state.lock().unwrap();
        let weight = dry_run_weight(&request.input_data);

        let result = match state.contracts.get_mut(&request.dest) {
            Some(contract) => Ok(contract.execute(&request.origin, &request.input_data, false)),
            None => Err(self.module_error(CONTRACT_NOT_FOUND)),
        };

        Ok(ContractExecResult {
            gas_consumed: weight,
            gas_required: weight,
            storage_deposit: StorageDeposit::Charge(0),
            debug_message: vec![],
            result,
        })
    }

    async fn instantiate(
        &self,
        request: &InstantiateRequest,
    ) -> Result<ContractInstantiateResult, AppError> {
        self.check_should_fail()?;
        let state = self.state.lock().unwrap();
        let weight = dry_run_weight(&request.data);

        let result = match state.codes.get(&request.code_hash) {
            None => Err(self.module_error(CODE_NOT_FOUND)),
            Some(version) => {
                let account_id = derive_contract_address(
                    &request.origin,
                    &request.code_hash,
                    &request.data,
                    &request.salt,
                );
                if state.contracts.contains_key(&account_id) {
                    Err(self.module_error(DUPLICATE_CONTRACT))
                } else {
                    let result = match SimulatedContract::construct(*version, &request.data) {
                        Some(_) => ExecReturnValue {
                            flags: 0,
                            data: Ok::<(), LangError>(()).encode(),
                        },
                        None => ExecReturnValue {
                            flags: ExecReturnValue::REVERT_FLAG,
                            data: Err::<(), _>(LangError::CouldNotReadInput).encode(),
                        },
                    };
                    Ok(InstantiateReturnValue { result, account_id })
                }
            }
        };

        Ok(ContractInstantiateResult {
            gas_consumed: weight,
            gas_required: weight,
            storage_deposit: StorageDeposit::Charge(0),
            debug_message: vec![],
            result,
        })
    }

    async fn account_nonce(&self, account: &AccountId) -> Result<u64, AppError> {
        self.check_should_fail()?;
        let state = self.state.lock().unwrap();
        Ok(state.nonces.get(account).copied().unwrap_or(0))
    }

    async fn chain_params(&self) -> Result<ChainParams, AppError> {
        self.check_should_fail()?;
        Ok(ChainParams {
            spec_version: 100,
            transaction_version: 1,
            genesis_hash: H256([0x42; 32]),
        })
    }

    async fn submit_extrinsic(&self, extrinsic: &SignedExtrinsic) -> Result<H256, AppError> {
        self.check_should_fail()?;
        let call = ContractsCall::decode_for(self.pallet_index, &extrinsic.call).map_err(|e| {
            AppError::Rpc(RpcError::Node {
                code: 1010,
                message: format!("Invalid Transaction: {e}"),
            })
        })?;

        let mut state = self.state.lock().unwrap();
        self.apply(&mut state, &extrinsic.signer, call);
        *state.nonces.entry(extrinsic.signer).or_insert(0) += 1;
        state.submitted.push(extrinsic.clone());

        Ok(H256(blake2_256(&extrinsic.encoded)))
    }
}

/// Mock signer for testing
pub struct MockSigner {
    account: AccountId,
    config: MockConfig,
    contexts: Mutex<Vec<SigningContext>>,
}

impl MockSigner {
    #[must_use]
    pub fn new(account: AccountId) -> Self {
        Self::with_config(account, MockConfig::success())
    }

    #[must_use]
    pub fn with_config(account: AccountId, config: MockConfig) -> Self {
        Self {
            account,
            config,
            contexts: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn failing(account: AccountId, message: impl Into<String>) -> Self {
        Self::with_config(account, MockConfig::failure(message))
    }

    /// Signing contexts seen so far (for testing)
    pub fn contexts(&self) -> Vec<SigningContext> {
        self.contexts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExtrinsicSigner for MockSigner {
    fn account_id(&self) -> AccountId {
        self.account
    }

    async fn sign(
        &self,
        call: &[u8],
        context: &SigningContext,
    ) -> Result<SignedExtrinsic, AppError> {
        if self.config.should_fail {
            let msg = self
                .config
                .error_message
                .clone()
                .unwrap_or_else(|| "Mock error".to_string());
            return Err(AppError::Signing(SigningError::Rejected(msg)));
        }
        self.contexts.lock().unwrap().push(*context);

        Ok(SignedExtrinsic {
            signer: self.account,
            call: call.to_vec(),
            encoded: (self.account, context.nonce, call).encode(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::{Selector, encode_call_data};

    #[tokio::test]
    async fn test_mock_rpc_health() {
        let rpc = MockContractRpc::new();
        assert!(rpc.health_check().await.is_ok());
        rpc.set_healthy(false);
        assert!(rpc.health_check().await.is_err());
    }

    #[tokio::test]
    async fn test_mock_rpc_failure() {
        let rpc = MockContractRpc::failing("node down");
        let result = rpc.account_nonce(&AccountId::default()).await;
        assert!(matches!(result, Err(AppError::Rpc(RpcError::Connection(m))) if m == "node down"));
    }

    #[tokio::test]
    async fn test_call_to_missing_contract_is_dispatch_error() {
        let rpc = MockContractRpc::new();
        let request = CallRequest {
            origin: AccountId::default(),
            dest: AccountId::new([1; 32]),
            value: 0,
            gas_limit: None,
            storage_deposit_limit: None,
            input_data: encode_call_data(Selector::from_label("test"), &()),
        };
        let exec = rpc.call(&request).await.unwrap();
        assert!(matches!(exec.result, Err(DispatchError::Module(_))));
    }

    #[tokio::test]
    async fn test_submit_bumps_nonce() {
        let rpc = MockContractRpc::new();
        let signer = MockSigner::new(AccountId::new([3; 32]));
        let call = ContractsCall::Call {
            dest: AccountId::new([1; 32]),
            value: 0,
            gas_limit: Weight::DEFAULT_TX_LIMIT,
            storage_deposit_limit: None,
            data: vec![],
        }
        .encode_for(7);
        let context = SigningContext {
            nonce: 0,
            tip: 0,
            chain: rpc.chain_params().await.unwrap(),
        };
        let extrinsic = signer.sign(&call, &context).await.unwrap();
        rpc.submit_extrinsic(&extrinsic).await.unwrap();

        assert_eq!(rpc.account_nonce(&signer.account_id()).await.unwrap(), 1);
        assert_eq!(rpc.submitted().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_rejects_foreign_call() {
        let rpc = MockContractRpc::new();
        let extrinsic = SignedExtrinsic {
            signer: AccountId::default(),
            call: vec![0, 0],
            encoded: vec![],
        };
        assert!(matches!(
            rpc.submit_extrinsic(&extrinsic).await,
            Err(AppError::Rpc(RpcError::Node { code: 1010, .. }))
        ));
    }
}
