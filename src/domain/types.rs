//! Domain value types for the Spectre PSE contract ABI.
//!
//! Every type that crosses the contract boundary derives SCALE `Encode`/`Decode`
//! so its wire form matches the ink! metadata bit for bit. Variant order of the
//! enums is part of that wire form and must not change.

use std::fmt;
use std::str::FromStr;

use parity_scale_codec::{Decode, Encode, Output};
use serde::{Deserialize, Serialize};

use super::encoding::{decode_exact, from_hex_32, serde_hex, to_hex};
use super::error::{AppError, CodecError, ContractCallError};
use super::hashing::blake2_512;

/// Generic Substrate SS58 prefix.
pub const DEFAULT_SS58_PREFIX: u16 = 42;
/// Largest prefix the two-byte SS58 format can carry.
pub const MAX_SS58_PREFIX: u16 = 16_383;

const SS58_CHECKSUM_PREFIX: &[u8] = b"SS58PRE";
const SS58_CHECKSUM_LEN: usize = 2;

// ============================================================================
// ADDRESSES AND HASHES
// ============================================================================

/// 32-byte account identifier (ink! `AccountId`).
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Encode, Decode, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }

    /// Render as an SS58 address with the given network prefix.
    pub fn to_ss58(&self, prefix: u16) -> String {
        let mut data = ss58_prefix_bytes(prefix);
        data.extend_from_slice(&self.0);
        let checksum = ss58_checksum(&data);
        data.extend_from_slice(&checksum[..SS58_CHECKSUM_LEN]);
        bs58::encode(data).into_string()
    }

    /// Parse an SS58 address, returning the account and its network prefix.
    pub fn from_ss58(address: &str) -> Result<(Self, u16), CodecError> {
        let data = bs58::decode(address)
            .into_vec()
            .map_err(|e| CodecError::InvalidAddress(e.to_string()))?;
        if data.len() < 2 {
            return Err(CodecError::InvalidAddress("address too short".to_string()));
        }

        let (prefix_len, prefix) = match data[0] {
            0..=63 => (1, u16::from(data[0])),
            64..=127 => {
                let lower = (data[0] << 2) | (data[1] >> 6);
                let upper = data[1] & 0b0011_1111;
                (2, u16::from(lower) | (u16::from(upper) << 8))
            }
            other => {
                return Err(CodecError::InvalidAddress(format!(
                    "unsupported prefix byte {other}"
                )));
            }
        };

        if data.len() != prefix_len + 32 + SS58_CHECKSUM_LEN {
            return Err(CodecError::InvalidAddress(format!(
                "unexpected length {}",
                data.len()
            )));
        }

        let body_end = prefix_len + 32;
        let checksum = ss58_checksum(&data[..body_end]);
        if data[body_end..] != checksum[..SS58_CHECKSUM_LEN] {
            return Err(CodecError::InvalidAddress("checksum mismatch".to_string()));
        }

        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&data[prefix_len..body_end]);
        Ok((Self(bytes), prefix))
    }
}

fn ss58_prefix_bytes(prefix: u16) -> Vec<u8> {
    if prefix < 64 {
        vec![prefix as u8]
    } else {
        let ident = prefix & 0b0011_1111_1111_1111;
        let first = ((ident & 0b0000_0000_1111_1100) as u8) >> 2;
        let second = ((ident >> 8) as u8) | (((ident & 0b0000_0000_0000_0011) as u8) << 6);
        vec![first | 0b0100_0000, second]
    }
}

fn ss58_checksum(data: &[u8]) -> [u8; 64] {
    let mut preimage = Vec::with_capacity(SS58_CHECKSUM_PREFIX.len() + data.len());
    preimage.extend_from_slice(SS58_CHECKSUM_PREFIX);
    preimage.extend_from_slice(data);
    blake2_512(&preimage)
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_ss58(DEFAULT_SS58_PREFIX))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.to_hex())
    }
}

/// Accepts either a `0x` hex string or an SS58 address of any prefix.
impl FromStr for AccountId {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("0x") {
            Ok(Self(from_hex_32(s)?))
        } else {
            Self::from_ss58(s).map(|(account, _)| account)
        }
    }
}

impl TryFrom<String> for AccountId {
    type Error = CodecError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccountId> for String {
    fn from(account: AccountId) -> Self {
        account.to_string()
    }
}

impl From<[u8; 32]> for AccountId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// 32-byte hash (code hashes, block hashes, extrinsic hashes).
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, Default, Encode, Decode, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct H256(pub [u8; 32]);

impl H256 {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for H256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", to_hex(&self.0))
    }
}

impl fmt::Debug for H256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H256({})", to_hex(&self.0))
    }
}

impl FromStr for H256 {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(from_hex_32(s)?))
    }
}

impl TryFrom<String> for H256 {
    type Error = CodecError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<H256> for String {
    fn from(hash: H256) -> Self {
        hash.to_string()
    }
}

// ============================================================================
// CONTRACT VERSION
// ============================================================================

/// Released revisions of the Spectre PSE contract. Each one is a distinct ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractVersion {
    /// `sign(text)` / `verify` / `test`
    V1,
    /// Per-network trader keys, `generate_onchain_trader_keys`
    V2,
    /// Seeded relayer, `generate_onchain_trading_account`, registration
    #[default]
    V3,
}

impl ContractVersion {
    pub const ALL: [ContractVersion; 3] = [Self::V1, Self::V2, Self::V3];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
            Self::V3 => "v3",
        }
    }
}

impl FromStr for ContractVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(Self::V1),
            "v2" | "2" => Ok(Self::V2),
            "v3" | "3" => Ok(Self::V3),
            _ => Err(format!("Invalid contract version: {}", s)),
        }
    }
}

impl fmt::Display for ContractVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// CONTRACT VALUES
// ============================================================================

/// Chains the contract manages trading keys for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Substrate,
    Ethereum,
    Solana,
}

impl Network {
    pub const ALL: [Network; 3] = [Self::Substrate, Self::Ethereum, Self::Solana];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Substrate => "substrate",
            Self::Ethereum => "ethereum",
            Self::Solana => "solana",
        }
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "substrate" => Ok(Self::Substrate),
            "ethereum" => Ok(Self::Ethereum),
            "solana" => Ok(Self::Solana),
            _ => Err(format!("Invalid network: {}", s)),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Domain error returned by the contract (`Error` in the ink! metadata).
///
/// Variants are appended as the contract evolves; `FailedToConvertPubKey`
/// exists from v3 on.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Encode,
    Decode,
    Serialize,
    Deserialize,
    thiserror::Error,
)]
pub enum ContractError {
    #[error("trader account is not registered")]
    UnregisteredTraderAccount,
    #[error("a private key of that network is already registered")]
    PrivateKeyOfThatNetworkAlreadyRegistered,
    #[error("trading keys are unavailable")]
    KeysUnavailable,
    #[error("failed to convert public key")]
    FailedToConvertPubKey,
}

/// Dispatch-level error produced by the ink! entry point.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Encode,
    Decode,
    Serialize,
    Deserialize,
    thiserror::Error,
)]
pub enum LangError {
    #[error("contract could not read its input")]
    CouldNotReadInput,
}

/// Outer layer of every message return value.
pub type MessageResult<T> = Result<T, LangError>;

/// Inner layer for messages that can fail with a domain error.
pub type SigningResult<T> = Result<T, ContractError>;

/// Trading accounts as raw key bytes, one per network (v2).
#[derive(Debug, Clone, PartialEq, Eq, Default, Encode, Decode, Serialize, Deserialize)]
pub struct OnchainTradingAccounts {
    #[serde(with = "serde_hex")]
    pub substrate: Vec<u8>,
    #[serde(with = "serde_hex")]
    pub ethereum: Vec<u8>,
    #[serde(with = "serde_hex")]
    pub solana: Vec<u8>,
}

impl OnchainTradingAccounts {
    pub fn get(&self, network: Network) -> &[u8] {
        match network {
            Network::Substrate => &self.substrate,
            Network::Ethereum => &self.ethereum,
            Network::Solana => &self.solana,
        }
    }
}

/// Trading public keys as account ids, one per network (v3).
#[derive(Debug, Clone, PartialEq, Eq, Default, Encode, Decode, Serialize, Deserialize)]
pub struct OnchainTradingPublicKeys {
    pub substrate: AccountId,
    pub ethereum: AccountId,
    pub solana: AccountId,
}

impl OnchainTradingPublicKeys {
    pub fn get(&self, network: Network) -> &AccountId {
        match network {
            Network::Substrate => &self.substrate,
            Network::Ethereum => &self.ethereum,
            Network::Solana => &self.solana,
        }
    }

    /// Base58 form of the Solana key, as wallets display it.
    pub fn solana_address(&self) -> String {
        bs58::encode(self.solana.as_bytes()).into_string()
    }
}

/// Payload of `get_public_keys`, shaped by the contract version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "keys", rename_all = "snake_case")]
pub enum TradingKeys {
    Accounts(OnchainTradingAccounts),
    PublicKeys(OnchainTradingPublicKeys),
}

impl TradingKeys {
    /// Key material registered for `network`.
    pub fn key_bytes(&self, network: Network) -> Vec<u8> {
        match self {
            Self::Accounts(accounts) => accounts.get(network).to_vec(),
            Self::PublicKeys(keys) => keys.get(network).as_bytes().to_vec(),
        }
    }

    /// True when every network has a non-empty, non-zero key.
    pub fn is_populated(&self) -> bool {
        Network::ALL.iter().all(|network| {
            let key = self.key_bytes(*network);
            !key.is_empty() && key.iter().any(|b| *b != 0)
        })
    }
}

// ============================================================================
// PALLET-CONTRACTS EXECUTION RESULTS
// ============================================================================

/// Two-dimensional weight. Both components are compact-encoded.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode, Serialize, Deserialize,
)]
pub struct Weight {
    #[codec(compact)]
    pub ref_time: u64,
    #[codec(compact)]
    pub proof_size: u64,
}

impl Weight {
    /// Gas limit used for transactions when the caller does not pick one.
    pub const DEFAULT_TX_LIMIT: Weight = Weight::from_parts(10_000_000_000, 1_048_576);

    #[must_use]
    pub const fn from_parts(ref_time: u64, proof_size: u64) -> Self {
        Self {
            ref_time,
            proof_size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageDeposit {
    Refund(u128),
    Charge(u128),
}

impl Default for StorageDeposit {
    fn default() -> Self {
        Self::Charge(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ModuleError {
    pub index: u8,
    pub error: [u8; 4],
}

/// Substrate runtime `DispatchError`. Nested token/arithmetic/transactional
/// reasons are kept as their raw variant index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum DispatchError {
    Other,
    CannotLookup,
    BadOrigin,
    Module(ModuleError),
    ConsumerRemaining,
    NoProviders,
    TooManyConsumers,
    Token(u8),
    Arithmetic(u8),
    Transactional(u8),
    Exhausted,
    Corruption,
    Unavailable,
    RootNotAllowed,
}

/// Raw output of a contract entry point.
#[derive(Debug, Clone, PartialEq, Eq, Default, Encode, Decode, Serialize, Deserialize)]
pub struct ExecReturnValue {
    pub flags: u32,
    #[serde(with = "serde_hex")]
    pub data: Vec<u8>,
}

impl ExecReturnValue {
    pub const REVERT_FLAG: u32 = 0b0000_0001;

    pub fn did_revert(&self) -> bool {
        self.flags & Self::REVERT_FLAG != 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ContractExecResult {
    pub gas_consumed: Weight,
    pub gas_required: Weight,
    pub storage_deposit: StorageDeposit,
    #[serde(with = "serde_hex")]
    pub debug_message: Vec<u8>,
    pub result: Result<ExecReturnValue, DispatchError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct InstantiateReturnValue {
    pub result: ExecReturnValue,
    pub account_id: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ContractInstantiateResult {
    pub gas_consumed: Weight,
    pub gas_required: Weight,
    pub storage_deposit: StorageDeposit,
    #[serde(with = "serde_hex")]
    pub debug_message: Vec<u8>,
    pub result: Result<InstantiateReturnValue, DispatchError>,
}

// ============================================================================
// CALL OPTIONS AND REQUESTS
// ============================================================================

/// Options for a dry-run query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CallOptions {
    pub value: u128,
    /// `None` lets the node apply its maximum
    pub gas_limit: Option<Weight>,
    pub storage_deposit_limit: Option<u128>,
}

/// Options for a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOptions {
    pub value: u128,
    pub gas_limit: Weight,
    pub storage_deposit_limit: Option<u128>,
}

impl Default for TxOptions {
    fn default() -> Self {
        Self {
            value: 0,
            gas_limit: Weight::DEFAULT_TX_LIMIT,
            storage_deposit_limit: None,
        }
    }
}

/// Options for contract instantiation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstantiateOptions {
    pub value: u128,
    /// `None` uses the gas the dry run reported as required
    pub gas_limit: Option<Weight>,
    pub storage_deposit_limit: Option<u128>,
    pub salt: Vec<u8>,
}

/// Arguments of the `ContractsApi_call` runtime API, in wire order.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct CallRequest {
    pub origin: AccountId,
    pub dest: AccountId,
    pub value: u128,
    pub gas_limit: Option<Weight>,
    pub storage_deposit_limit: Option<u128>,
    pub input_data: Vec<u8>,
}

/// Arguments of the `ContractsApi_instantiate` runtime API for code that is
/// already on chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstantiateRequest {
    pub origin: AccountId,
    pub value: u128,
    pub gas_limit: Option<Weight>,
    pub storage_deposit_limit: Option<u128>,
    pub code_hash: H256,
    pub data: Vec<u8>,
    pub salt: Vec<u8>,
}

/// `Code::Existing` discriminant in the runtime API.
const CODE_EXISTING: u8 = 1;

impl Encode for InstantiateRequest {
    fn encode_to<T: Output + ?Sized>(&self, dest: &mut T) {
        self.origin.encode_to(dest);
        self.value.encode_to(dest);
        self.gas_limit.encode_to(dest);
        self.storage_deposit_limit.encode_to(dest);
        CODE_EXISTING.encode_to(dest);
        self.code_hash.encode_to(dest);
        self.data.encode_to(dest);
        self.salt.encode_to(dest);
    }
}

// ============================================================================
// EXTRINSICS
// ============================================================================

/// Chain parameters that go into the signed payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParams {
    pub spec_version: u32,
    pub transaction_version: u32,
    pub genesis_hash: H256,
}

/// Everything a signer needs besides the call itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigningContext {
    pub nonce: u64,
    pub tip: u128,
    pub chain: ChainParams,
}

/// Unsigned unit of work: an encoded `Contracts` runtime call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submittable {
    pub message: String,
    pub dest: AccountId,
    #[serde(with = "serde_hex")]
    pub call: Vec<u8>,
}

/// A signed extrinsic ready for `author_submitExtrinsic`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedExtrinsic {
    pub signer: AccountId,
    pub call: Vec<u8>,
    pub encoded: Vec<u8>,
}

impl SignedExtrinsic {
    pub fn to_hex(&self) -> String {
        to_hex(&self.encoded)
    }
}

// ============================================================================
// CALL OUTCOMES
// ============================================================================

/// Decoded result of a dry-run query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallOutcome<T> {
    pub output: T,
    pub gas_consumed: Weight,
    pub gas_required: Weight,
    pub storage_deposit: StorageDeposit,
    pub debug_message: String,
    pub reverted: bool,
}

impl<T> CallOutcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CallOutcome<U> {
        CallOutcome {
            output: f(self.output),
            gas_consumed: self.gas_consumed,
            gas_required: self.gas_required,
            storage_deposit: self.storage_deposit,
            debug_message: self.debug_message,
            reverted: self.reverted,
        }
    }
}

/// Execution result of a message whose return value needs contract-specific
/// decoding (the key-generation messages).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawCallOutcome {
    pub exec: ContractExecResult,
}

impl RawCallOutcome {
    pub fn did_revert(&self) -> bool {
        matches!(&self.exec.result, Ok(value) if value.did_revert())
    }

    pub fn return_value(&self) -> Result<&ExecReturnValue, AppError> {
        self.exec
            .result
            .as_ref()
            .map_err(|e| AppError::Contract(ContractCallError::DispatchFailed(*e)))
    }

    /// Decode the returned bytes as `T`.
    pub fn decode<T: Decode>(&self) -> Result<T, AppError> {
        let value = self.return_value()?;
        Ok(decode_exact(&value.data)?)
    }
}
