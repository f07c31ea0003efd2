//! Deploys new Spectre PSE instances from code already uploaded on chain.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::abi::{ArgType, ContractSchema, ContractsCall, derive_contract_address, encode_call_data};
use crate::domain::{
    AccountId, AppError, ContractCallError, ContractRpc, ContractVersion, ExtrinsicSigner, H256,
    InstantiateOptions, InstantiateRequest, Weight,
};

use super::contract::{SpectrePse, sign_and_submit};

/// Constructor to run on deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constructor {
    /// `default()` on v1 and v2
    Default,
    /// `seeding(key)` on v3
    Seeding { seed: Vec<u8> },
}

impl Constructor {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Seeding { .. } => "seeding",
        }
    }

    fn arg_types(&self) -> &'static [ArgType] {
        match self {
            Self::Default => &[],
            Self::Seeding { .. } => &[ArgType::Bytes],
        }
    }
}

pub struct ContractFactory {
    rpc: Arc<dyn ContractRpc>,
    schema: &'static ContractSchema,
    code_hash: H256,
    pallet_index: u8,
}

impl ContractFactory {
    #[must_use]
    pub fn new(
        rpc: Arc<dyn ContractRpc>,
        version: ContractVersion,
        code_hash: H256,
        pallet_index: u8,
    ) -> Self {
        Self {
            rpc,
            schema: ContractSchema::for_version(version),
            code_hash,
            pallet_index,
        }
    }

    pub fn version(&self) -> ContractVersion {
        self.schema.version
    }

    pub fn code_hash(&self) -> &H256 {
        &self.code_hash
    }

    /// Constructor call data, checked against the version catalog.
    pub fn input_data(&self, constructor: &Constructor) -> Result<Vec<u8>, AppError> {
        let spec = self
            .schema
            .require_constructor(constructor.label(), constructor.arg_types())?;
        Ok(match constructor {
            Constructor::Default => encode_call_data(spec.selector(), &()),
            Constructor::Seeding { seed } => encode_call_data(spec.selector(), seed),
        })
    }

    /// Address `deployer` would get for `constructor` and `salt`.
    pub fn address_for(
        &self,
        deployer: &AccountId,
        constructor: &Constructor,
        salt: &[u8],
    ) -> Result<AccountId, AppError> {
        let input = self.input_data(constructor)?;
        Ok(derive_contract_address(
            deployer,
            &self.code_hash,
            &input,
            salt,
        ))
    }

    /// Dry-run the constructor, then submit the instantiation and bind a
    /// client to the new address.
    #[instrument(skip(self, signer, options), fields(constructor = constructor.label(), code_hash = %self.code_hash))]
    pub async fn instantiate(
        &self,
        signer: &dyn ExtrinsicSigner,
        constructor: Constructor,
        options: InstantiateOptions,
    ) -> Result<SpectrePse, AppError> {
        let deployer = signer.account_id();
        let data = self.input_data(&constructor)?;

        let request = InstantiateRequest {
            origin: deployer,
            value: options.value,
            gas_limit: options.gas_limit,
            storage_deposit_limit: options.storage_deposit_limit,
            code_hash: self.code_hash,
            data: data.clone(),
            salt: options.salt.clone(),
        };
        let dry_run = self.rpc.instantiate(&request).await?;

        let returned = dry_run.result.map_err(|e| {
            warn!(error = ?e, "Instantiation dry run failed");
            ContractCallError::InstantiationFailed(format!("dispatch error: {e:?}"))
        })?;
        if returned.result.did_revert() {
            return Err(ContractCallError::InstantiationFailed(
                "constructor reverted".to_string(),
            )
            .into());
        }

        let expected = derive_contract_address(&deployer, &self.code_hash, &data, &options.salt);
        if expected != returned.account_id {
            return Err(ContractCallError::AddressMismatch {
                expected,
                actual: returned.account_id,
            }
            .into());
        }

        let gas_limit = options
            .gas_limit
            .unwrap_or(if dry_run.gas_required == Weight::default() {
                Weight::DEFAULT_TX_LIMIT
            } else {
                dry_run.gas_required
            });
        let call = ContractsCall::Instantiate {
            value: options.value,
            gas_limit,
            storage_deposit_limit: options.storage_deposit_limit,
            code_hash: self.code_hash,
            data,
            salt: options.salt,
        };

        let tx_hash =
            sign_and_submit(self.rpc.as_ref(), signer, &call.encode_for(self.pallet_index))
                .await?;
        info!(address = %expected, tx_hash = %tx_hash, "Contract instantiated");

        Ok(SpectrePse::new(
            expected,
            self.schema.version,
            Arc::clone(&self.rpc),
            self.pallet_index,
        ))
    }
}
