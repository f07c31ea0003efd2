//! Deployment tests: constructor dry run, address derivation and submission.

use std::sync::Arc;

use async_trait::async_trait;

use spectre_pse_client::app::{Constructor, ContractFactory};
use spectre_pse_client::domain::{
    AccountId, AppError, CallOptions, CallRequest, ChainParams, ContractCallError,
    ContractExecResult, ContractInstantiateResult, ContractRpc, ContractVersion,
    InstantiateOptions, InstantiateRequest, SignedExtrinsic, TradingKeys, TxOptions, H256,
};
use spectre_pse_client::test_utils::{MockContractRpc, MockSigner};

const CODE_V2: H256 = H256([0x22; 32]);
const CODE_V3: H256 = H256([0x33; 32]);
const DEPLOYER: AccountId = AccountId::new([0xd0; 32]);
const PALLET: u8 = 7;

fn chain() -> Arc<MockContractRpc> {
    let rpc = Arc::new(MockContractRpc::new());
    rpc.register_code(CODE_V2, ContractVersion::V2);
    rpc.register_code(CODE_V3, ContractVersion::V3);
    rpc
}

fn seeding(seed: &[u8]) -> Constructor {
    Constructor::Seeding {
        seed: seed.to_vec(),
    }
}

// ============================================================================
// INSTANTIATION
// ============================================================================

#[tokio::test]
async fn test_instantiate_seeded_v3() {
    let rpc = chain();
    let factory = ContractFactory::new(rpc.clone(), ContractVersion::V3, CODE_V3, PALLET);
    let signer = MockSigner::new(DEPLOYER);

    let expected = factory
        .address_for(&DEPLOYER, &seeding(b"alpha"), &[])
        .unwrap();
    let contract = factory
        .instantiate(&signer, seeding(b"alpha"), InstantiateOptions::default())
        .await
        .unwrap();

    assert_eq!(*contract.address(), expected);
    assert_eq!(contract.version(), ContractVersion::V3);
    assert!(rpc.is_deployed(&expected));
    assert_eq!(rpc.contract_seed(&expected), Some(b"alpha".to_vec()));
    assert_eq!(rpc.submitted().len(), 1);
}

#[tokio::test]
async fn test_instantiate_default_v2() {
    let rpc = chain();
    let factory = ContractFactory::new(rpc.clone(), ContractVersion::V2, CODE_V2, PALLET);
    let contract = factory
        .instantiate(
            &MockSigner::new(DEPLOYER),
            Constructor::Default,
            InstantiateOptions::default(),
        )
        .await
        .unwrap();
    assert!(rpc.is_deployed(contract.address()));
    assert_eq!(contract.version(), ContractVersion::V2);
}

#[tokio::test]
async fn test_deployed_client_is_usable() {
    let rpc = chain();
    let factory = ContractFactory::new(rpc.clone(), ContractVersion::V3, CODE_V3, PALLET);
    let signer = MockSigner::new(DEPLOYER);
    let contract = factory
        .instantiate(&signer, seeding(b"live"), InstantiateOptions::default())
        .await
        .unwrap();

    let submittable = contract
        .tx()
        .generate_onchain_trading_account(&TxOptions::default())
        .unwrap();
    contract.submit(&submittable, &signer).await.unwrap();

    let outcome = contract
        .query()
        .get_public_keys(&DEPLOYER, &CallOptions::default())
        .await
        .unwrap();
    assert!(matches!(
        outcome.output,
        Ok(Ok(ref keys @ TradingKeys::PublicKeys(_))) if keys.is_populated()
    ));

    let nonces: Vec<u64> = signer.contexts().iter().map(|c| c.nonce).collect();
    assert_eq!(nonces, vec![0, 1]);
}

// ============================================================================
// ADDRESS DERIVATION
// ============================================================================

#[tokio::test]
async fn test_same_seed_same_address() {
    let factory = ContractFactory::new(chain(), ContractVersion::V3, CODE_V3, PALLET);
    let a = factory.address_for(&DEPLOYER, &seeding(b"s"), &[]).unwrap();
    let b = factory.address_for(&DEPLOYER, &seeding(b"s"), &[]).unwrap();
    let other_seed = factory.address_for(&DEPLOYER, &seeding(b"t"), &[]).unwrap();
    let other_salt = factory.address_for(&DEPLOYER, &seeding(b"s"), &[1]).unwrap();
    let other_deployer = factory
        .address_for(&AccountId::new([0xd1; 32]), &seeding(b"s"), &[])
        .unwrap();

    assert_eq!(a, b);
    assert_ne!(a, other_seed);
    assert_ne!(a, other_salt);
    assert_ne!(a, other_deployer);
}

#[tokio::test]
async fn test_redeploy_same_seed_fails() {
    let rpc = chain();
    let factory = ContractFactory::new(rpc.clone(), ContractVersion::V3, CODE_V3, PALLET);
    let signer = MockSigner::new(DEPLOYER);

    factory
        .instantiate(&signer, seeding(b"once"), InstantiateOptions::default())
        .await
        .unwrap();
    let again = factory
        .instantiate(&signer, seeding(b"once"), InstantiateOptions::default())
        .await;
    assert!(matches!(
        again,
        Err(AppError::Contract(ContractCallError::InstantiationFailed(_)))
    ));

    let salted = factory
        .instantiate(
            &signer,
            seeding(b"once"),
            InstantiateOptions {
                salt: vec![1],
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(rpc.is_deployed(salted.address()));
}

// ============================================================================
// FAILURES
// ============================================================================

#[tokio::test]
async fn test_missing_code_fails() {
    let rpc = Arc::new(MockContractRpc::new());
    let factory = ContractFactory::new(rpc.clone(), ContractVersion::V3, CODE_V3, PALLET);
    let result = factory
        .instantiate(
            &MockSigner::new(DEPLOYER),
            seeding(b"x"),
            InstantiateOptions::default(),
        )
        .await;
    assert!(matches!(
        result,
        Err(AppError::Contract(ContractCallError::InstantiationFailed(_)))
    ));
    assert!(rpc.submitted().is_empty());
}

#[tokio::test]
async fn test_constructor_from_other_version_is_rejected_locally() {
    let rpc = chain();
    let v3 = ContractFactory::new(rpc.clone(), ContractVersion::V3, CODE_V3, PALLET);
    let v2 = ContractFactory::new(rpc.clone(), ContractVersion::V2, CODE_V2, PALLET);
    let signer = MockSigner::new(DEPLOYER);

    let default_on_v3 = v3
        .instantiate(&signer, Constructor::Default, InstantiateOptions::default())
        .await;
    let seeding_on_v2 = v2
        .instantiate(&signer, seeding(b"x"), InstantiateOptions::default())
        .await;

    assert!(matches!(
        default_on_v3,
        Err(AppError::UnsupportedMessage { .. })
    ));
    assert!(matches!(
        seeding_on_v2,
        Err(AppError::UnsupportedMessage { .. })
    ));
    assert!(rpc.submitted().is_empty());
}

#[tokio::test]
async fn test_code_of_wrong_version_reverts() {
    // v2 code cannot decode the v3 seeding selector.
    let rpc = Arc::new(MockContractRpc::new());
    rpc.register_code(CODE_V3, ContractVersion::V2);
    let factory = ContractFactory::new(rpc.clone(), ContractVersion::V3, CODE_V3, PALLET);
    let result = factory
        .instantiate(
            &MockSigner::new(DEPLOYER),
            seeding(b"x"),
            InstantiateOptions::default(),
        )
        .await;
    assert!(matches!(
        result,
        Err(AppError::Contract(ContractCallError::InstantiationFailed(m))) if m.contains("reverted")
    ));
}

/// Node that reports a different address than the one derived locally.
struct MisreportingRpc(MockContractRpc);

#[async_trait]
impl ContractRpc for MisreportingRpc {
    async fn health_check(&self) -> Result<(), AppError> {
        self.0.health_check().await
    }

    async fn call(&self, request: &CallRequest) -> Result<ContractExecResult, AppError> {
        self.0.call(request).await
    }

    async fn instantiate(
        &self,
        request: &InstantiateRequest,
    ) -> Result<ContractInstantiateResult, AppError> {
        let mut result = self.0.instantiate(request).await?;
        if let Ok(returned) = result.result.as_mut() {
            returned.account_id = AccountId::new([0xee; 32]);
        }
        Ok(result)
    }

    async fn account_nonce(&self, account: &AccountId) -> Result<u64, AppError> {
        self.0.account_nonce(account).await
    }

    async fn chain_params(&self) -> Result<ChainParams, AppError> {
        self.0.chain_params().await
    }

    async fn submit_extrinsic(&self, extrinsic: &SignedExtrinsic) -> Result<H256, AppError> {
        self.0.submit_extrinsic(extrinsic).await
    }
}

#[tokio::test]
async fn test_address_mismatch_aborts_before_submit() {
    let inner = MockContractRpc::new();
    inner.register_code(CODE_V3, ContractVersion::V3);
    let rpc = Arc::new(MisreportingRpc(inner));
    let factory = ContractFactory::new(rpc.clone(), ContractVersion::V3, CODE_V3, PALLET);

    let result = factory
        .instantiate(
            &MockSigner::new(DEPLOYER),
            seeding(b"x"),
            InstantiateOptions::default(),
        )
        .await;
    assert!(matches!(
        result,
        Err(AppError::Contract(ContractCallError::AddressMismatch { actual, .. }))
            if actual == AccountId::new([0xee; 32])
    ));
    assert!(rpc.0.submitted().is_empty());
}
