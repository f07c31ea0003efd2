//! Infrastructure layer implementations.

pub mod rpc;
pub mod signer;

pub use rpc::{HttpContractRpc, HttpRpcTransport, RpcClientConfig, RpcTransport};
pub use signer::{Ed25519ExtrinsicSigner, signing_key_from_secret};
