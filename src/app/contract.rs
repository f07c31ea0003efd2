//! Typed client for a deployed Spectre PSE contract.
//!
//! `SpectrePse::query()` dry-runs messages and decodes their two-layer
//! results; `SpectrePse::tx()` builds unsigned submittables for the
//! state-changing messages. Nothing here retries, caches or reorders calls.

use std::sync::Arc;

use parity_scale_codec::{Decode, Encode};
use tracing::{debug, info, instrument, warn};

use crate::abi::{
    ArgType, ContractSchema, ContractsCall, MessageSpec, ReturnShape, SigningPayload,
    decode_exact, encode_call_data,
};
use crate::domain::{
    AccountId, AppError, CallOptions, CallOutcome, CallRequest, ContractCallError, ContractRpc,
    ContractVersion, ExtrinsicSigner, H256, MessageResult, Network, OnchainTradingAccounts,
    OnchainTradingPublicKeys, RawCallOutcome, SigningContext, SigningResult, Submittable,
    TradingKeys, TxOptions,
};

/// Client bound to one contract address and ABI revision.
pub struct SpectrePse {
    address: AccountId,
    schema: &'static ContractSchema,
    rpc: Arc<dyn ContractRpc>,
    pallet_index: u8,
}

impl SpectrePse {
    #[must_use]
    pub fn new(
        address: AccountId,
        version: ContractVersion,
        rpc: Arc<dyn ContractRpc>,
        pallet_index: u8,
    ) -> Self {
        Self {
            address,
            schema: ContractSchema::for_version(version),
            rpc,
            pallet_index,
        }
    }

    pub fn address(&self) -> &AccountId {
        &self.address
    }

    pub fn version(&self) -> ContractVersion {
        self.schema.version
    }

    pub fn schema(&self) -> &'static ContractSchema {
        self.schema
    }

    /// Read-only, simulated calls.
    pub fn query(&self) -> ContractQuery<'_> {
        ContractQuery { contract: self }
    }

    /// Builders for state-changing calls.
    pub fn tx(&self) -> ContractTx<'_> {
        ContractTx { contract: self }
    }

    /// Check the node behind this client is reachable.
    pub async fn health_check(&self) -> Result<(), AppError> {
        self.rpc.health_check().await
    }

    /// Sign `submittable` with `signer` and broadcast it.
    #[instrument(skip(self, submittable, signer), fields(message = %submittable.message, contract = %self.address))]
    pub async fn submit(
        &self,
        submittable: &Submittable,
        signer: &dyn ExtrinsicSigner,
    ) -> Result<H256, AppError> {
        sign_and_submit(self.rpc.as_ref(), signer, &submittable.call).await
    }
}

/// Fetch nonce and chain parameters, sign `call` and submit it.
pub(crate) async fn sign_and_submit(
    rpc: &dyn ContractRpc,
    signer: &dyn ExtrinsicSigner,
    call: &[u8],
) -> Result<H256, AppError> {
    let account = signer.account_id();
    let nonce = rpc.account_nonce(&account).await?;
    let chain = rpc.chain_params().await?;
    let context = SigningContext {
        nonce,
        tip: 0,
        chain,
    };

    let extrinsic = signer.sign(call, &context).await?;
    let hash = rpc.submit_extrinsic(&extrinsic).await?;
    info!(signer = %account, nonce, tx_hash = %hash, "Extrinsic submitted");
    Ok(hash)
}

/// Query accessor returned by [`SpectrePse::query`].
pub struct ContractQuery<'a> {
    contract: &'a SpectrePse,
}

impl ContractQuery<'_> {
    async fn dry_run<A: Encode>(
        &self,
        origin: &AccountId,
        options: &CallOptions,
        spec: &MessageSpec,
        args: &A,
    ) -> Result<RawCallOutcome, AppError> {
        let request = CallRequest {
            origin: *origin,
            dest: self.contract.address,
            value: options.value,
            gas_limit: options.gas_limit,
            storage_deposit_limit: options.storage_deposit_limit,
            input_data: encode_call_data(spec.selector(), args),
        };

        debug!(
            message = spec.label,
            selector = %spec.selector(),
            contract = %self.contract.address,
            "Dry-running contract message"
        );
        let exec = self.contract.rpc.call(&request).await?;
        Ok(RawCallOutcome { exec })
    }

    /// Dry-run `spec` and decode its output as `T`.
    async fn dispatch<T: Decode, A: Encode>(
        &self,
        origin: &AccountId,
        options: &CallOptions,
        spec: &MessageSpec,
        args: &A,
    ) -> Result<CallOutcome<T>, AppError> {
        let raw = self.dry_run(origin, options, spec, args).await?;
        let value = raw.return_value().inspect_err(|e| {
            warn!(message = spec.label, error = %e, "Contract dispatch failed");
        })?;
        let output: T = decode_exact(&value.data)?;

        Ok(CallOutcome {
            output,
            gas_consumed: raw.exec.gas_consumed,
            gas_required: raw.exec.gas_required,
            storage_deposit: raw.exec.storage_deposit,
            debug_message: String::from_utf8_lossy(&raw.exec.debug_message).into_owned(),
            reverted: value.did_revert(),
        })
    }

    fn require(&self, label: &str, args: &[ArgType]) -> Result<&'static MessageSpec, AppError> {
        self.contract.schema.require_message(label, args)
    }

    /// v1 `sign(message: String)`: contract-wide signature over a text message.
    #[instrument(skip(self, options, message), fields(contract = %self.contract.address))]
    pub async fn sign_text(
        &self,
        origin: &AccountId,
        options: &CallOptions,
        message: &str,
    ) -> Result<CallOutcome<MessageResult<Vec<u8>>>, AppError> {
        let spec = self.require("sign", &[ArgType::Text])?;
        self.dispatch(origin, options, spec, &message).await
    }

    /// v1 `verify(message, signature)`.
    #[instrument(skip(self, options, message, signature), fields(contract = %self.contract.address))]
    pub async fn verify(
        &self,
        origin: &AccountId,
        options: &CallOptions,
        message: &str,
        signature: &[u8],
    ) -> Result<CallOutcome<MessageResult<bool>>, AppError> {
        let spec = self.require("verify", &[ArgType::Text, ArgType::Bytes])?;
        self.dispatch(origin, options, spec, &(message, signature))
            .await
    }

    /// Liveness check; the contract returns unit.
    #[instrument(skip(self, options), fields(contract = %self.contract.address))]
    pub async fn test(
        &self,
        origin: &AccountId,
        options: &CallOptions,
    ) -> Result<CallOutcome<MessageResult<()>>, AppError> {
        let spec = self.require("test", &[])?;
        self.dispatch(origin, options, spec, &()).await
    }

    /// Sign `message` with the caller's trading key for `network`.
    #[instrument(skip(self, options, message), fields(contract = %self.contract.address, network = %network))]
    pub async fn sign(
        &self,
        origin: &AccountId,
        options: &CallOptions,
        network: Network,
        message: &[u8],
    ) -> Result<CallOutcome<MessageResult<SigningResult<Vec<u8>>>>, AppError> {
        let spec = self.require("sign", &[ArgType::Network, ArgType::Bytes])?;
        self.dispatch(origin, options, spec, &(network, message))
            .await
    }

    /// The caller's trading keys: raw accounts on v2, account ids on v3.
    #[instrument(skip(self, options), fields(contract = %self.contract.address))]
    pub async fn get_public_keys(
        &self,
        origin: &AccountId,
        options: &CallOptions,
    ) -> Result<CallOutcome<MessageResult<SigningResult<TradingKeys>>>, AppError> {
        let spec = self.require("get_public_keys", &[])?;
        match spec.returns {
            ReturnShape::Signing(SigningPayload::TradingAccounts) => {
                let outcome: CallOutcome<MessageResult<SigningResult<OnchainTradingAccounts>>> =
                    self.dispatch(origin, options, spec, &()).await?;
                Ok(outcome.map(|r| r.map(|inner| inner.map(TradingKeys::Accounts))))
            }
            ReturnShape::Signing(SigningPayload::TradingPublicKeys) => {
                let outcome: CallOutcome<MessageResult<SigningResult<OnchainTradingPublicKeys>>> =
                    self.dispatch(origin, options, spec, &()).await?;
                Ok(outcome.map(|r| r.map(|inner| inner.map(TradingKeys::PublicKeys))))
            }
            _ => Err(AppError::UnsupportedMessage {
                label: spec.label.to_string(),
                version: self.contract.version(),
            }),
        }
    }

    /// Have the relayer counter-sign `message` for the caller's trading account.
    #[instrument(skip(self, options, message), fields(contract = %self.contract.address))]
    pub async fn register_trading_account_to_spectre(
        &self,
        origin: &AccountId,
        options: &CallOptions,
        message: &[u8],
    ) -> Result<CallOutcome<MessageResult<SigningResult<Vec<u8>>>>, AppError> {
        let spec = self.require("register_trading_account_to_spectre", &[ArgType::Bytes])?;
        self.dispatch(origin, options, spec, &message).await
    }

    /// v2 key generation, dry-run. Decode the outcome with [`RawCallOutcome::decode`].
    #[instrument(skip(self, options), fields(contract = %self.contract.address))]
    pub async fn generate_onchain_trader_keys(
        &self,
        origin: &AccountId,
        options: &CallOptions,
    ) -> Result<RawCallOutcome, AppError> {
        let spec = self.require("generate_onchain_trader_keys", &[])?;
        self.dry_run(origin, options, spec, &()).await
    }

    /// v3 key generation, dry-run. Decode the outcome with [`RawCallOutcome::decode`].
    #[instrument(skip(self, options), fields(contract = %self.contract.address))]
    pub async fn generate_onchain_trading_account(
        &self,
        origin: &AccountId,
        options: &CallOptions,
    ) -> Result<RawCallOutcome, AppError> {
        let spec = self.require("generate_onchain_trading_account", &[])?;
        self.dry_run(origin, options, spec, &()).await
    }
}

/// Transaction accessor returned by [`SpectrePse::tx`].
pub struct ContractTx<'a> {
    contract: &'a SpectrePse,
}

impl ContractTx<'_> {
    fn build(&self, label: &str, options: &TxOptions) -> Result<Submittable, AppError> {
        let spec = self.contract.schema.require_message(label, &[])?;
        if !spec.mutates {
            return Err(ContractCallError::NotMutating(label.to_string()).into());
        }

        let call = ContractsCall::Call {
            dest: self.contract.address,
            value: options.value,
            gas_limit: options.gas_limit,
            storage_deposit_limit: options.storage_deposit_limit,
            data: encode_call_data(spec.selector(), &()),
        };

        Ok(Submittable {
            message: spec.label.to_string(),
            dest: self.contract.address,
            call: call.encode_for(self.contract.pallet_index),
        })
    }

    /// v2 `generate_onchain_trader_keys` as an unsigned submittable.
    pub fn generate_onchain_trader_keys(
        &self,
        options: &TxOptions,
    ) -> Result<Submittable, AppError> {
        self.build("generate_onchain_trader_keys", options)
    }

    /// v3 `generate_onchain_trading_account` as an unsigned submittable.
    pub fn generate_onchain_trading_account(
        &self,
        options: &TxOptions,
    ) -> Result<Submittable, AppError> {
        self.build("generate_onchain_trading_account", options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockContractRpc;

    fn client(version: ContractVersion) -> SpectrePse {
        let rpc = Arc::new(MockContractRpc::new());
        SpectrePse::new(AccountId::new([5; 32]), version, rpc, 7)
    }

    #[tokio::test]
    async fn test_verify_unsupported_on_v3() {
        let contract = client(ContractVersion::V3);
        let result = contract
            .query()
            .verify(&AccountId::default(), &CallOptions::default(), "m", &[])
            .await;
        assert!(matches!(result, Err(AppError::UnsupportedMessage { .. })));
    }

    #[test]
    fn test_tx_builds_contracts_call() {
        let contract = client(ContractVersion::V3);
        let submittable = contract
            .tx()
            .generate_onchain_trading_account(&TxOptions::default())
            .unwrap();
        assert_eq!(submittable.message, "generate_onchain_trading_account");
        assert_eq!(submittable.dest, AccountId::new([5; 32]));

        match ContractsCall::decode_for(7, &submittable.call).unwrap() {
            ContractsCall::Call { dest, data, .. } => {
                assert_eq!(dest, AccountId::new([5; 32]));
                assert_eq!(data, vec![0x9b, 0xd2, 0xaa, 0x35]);
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[test]
    fn test_tx_rejects_read_only_message() {
        let contract = client(ContractVersion::V3);
        let result = contract
            .tx()
            .build("get_public_keys", &TxOptions::default());
        assert!(matches!(
            result,
            Err(AppError::Contract(ContractCallError::NotMutating(label))) if label == "get_public_keys"
        ));
    }

    #[test]
    fn test_tx_wrong_version() {
        let contract = client(ContractVersion::V3);
        let result = contract
            .tx()
            .generate_onchain_trader_keys(&TxOptions::default());
        assert!(matches!(result, Err(AppError::UnsupportedMessage { .. })));
    }
}
