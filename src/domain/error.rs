//! Client-side error types.
//!
//! These cover failures of the client itself (transport, codec, signing,
//! configuration, misuse of a contract version). Contract results are never
//! mapped into these: `LangError` and `ContractError` travel back to the caller
//! as values inside the call outcome.

use thiserror::Error;

use super::types::{AccountId, ContractVersion, DispatchError};

/// Top-level error returned by every fallible client operation.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Contract error: {0}")]
    Contract(#[from] ContractCallError),

    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Message `{label}` is not part of the {version} contract ABI")]
    UnsupportedMessage {
        label: String,
        version: ContractVersion,
    },

    #[error("Not supported: {0}")]
    NotSupported(String),
}

/// Errors talking to the chain node.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Node returned error {code}: {message}")]
    Node { code: i64, message: String },

    #[error("Empty response for {0}")]
    EmptyResponse(String),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

/// Errors encoding or decoding ABI payloads.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("SCALE decode failed: {0}")]
    Scale(String),

    #[error("Invalid hex payload: {0}")]
    Hex(String),

    #[error("{remaining} trailing bytes after decoding")]
    TrailingBytes { remaining: usize },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

/// The node executed the request but the contract layer did not produce a
/// message result.
#[derive(Debug, Error)]
pub enum ContractCallError {
    #[error("Dispatch failed: {0:?}")]
    DispatchFailed(DispatchError),

    #[error("Instantiation failed: {0}")]
    InstantiationFailed(String),

    #[error("Derived address {expected} does not match node address {actual}")]
    AddressMismatch {
        expected: AccountId,
        actual: AccountId,
    },

    #[error("Message `{0}` cannot be submitted as a transaction")]
    NotMutating(String),
}

/// Errors in the signing subsystem.
#[derive(Debug, Error)]
pub enum SigningError {
    #[error("Invalid signing key: {0}")]
    InvalidKey(String),

    #[error("Signer rejected payload: {0}")]
    Rejected(String),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(String),

    #[error("{key} is invalid: {message}")]
    Invalid { key: String, message: String },
}

impl From<parity_scale_codec::Error> for CodecError {
    fn from(err: parity_scale_codec::Error) -> Self {
        CodecError::Scale(err.to_string())
    }
}

impl From<parity_scale_codec::Error> for AppError {
    fn from(err: parity_scale_codec::Error) -> Self {
        AppError::Codec(err.into())
    }
}

impl From<hex::FromHexError> for CodecError {
    fn from(err: hex::FromHexError) -> Self {
        CodecError::Hex(err.to_string())
    }
}
