//! In-memory stand-in for a deployed Spectre PSE instance.
//!
//! Executes call data against the version catalog and produces the same
//! SCALE return values the contract does. Trading keys are ed25519 keys
//! derived from the contract seed, the caller and the network.

use std::collections::{HashMap, HashSet};

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use parity_scale_codec::{Decode, Encode};

use crate::abi::{ContractSchema, Selector, decode_exact};
use crate::domain::hashing::blake2_256;
use crate::domain::{
    AccountId, ContractError, ContractVersion, ExecReturnValue, LangError, MessageResult, Network,
    OnchainTradingAccounts, OnchainTradingPublicKeys, SigningResult,
};

/// Trading keys generated for one caller.
#[derive(Clone)]
struct TraderKeys {
    substrate: SigningKey,
    ethereum: SigningKey,
    solana: SigningKey,
}

impl TraderKeys {
    fn derive(seed: &[u8], caller: &AccountId) -> Self {
        let key = |network: Network| {
            let preimage = (seed, caller, network).encode();
            SigningKey::from_bytes(&blake2_256(&preimage))
        };
        Self {
            substrate: key(Network::Substrate),
            ethereum: key(Network::Ethereum),
            solana: key(Network::Solana),
        }
    }

    fn get(&self, network: Network) -> &SigningKey {
        match network {
            Network::Substrate => &self.substrate,
            Network::Ethereum => &self.ethereum,
            Network::Solana => &self.solana,
        }
    }

    /// Account id published for `network`. Ethereum ids are hashed public keys.
    fn account_id(&self, network: Network) -> AccountId {
        let public = self.get(network).verifying_key().to_bytes();
        match network {
            Network::Ethereum => AccountId::new(blake2_256(&public)),
            _ => AccountId::new(public),
        }
    }

    fn public_keys(&self) -> OnchainTradingPublicKeys {
        OnchainTradingPublicKeys {
            substrate: self.account_id(Network::Substrate),
            ethereum: self.account_id(Network::Ethereum),
            solana: self.account_id(Network::Solana),
        }
    }

    fn accounts(&self) -> OnchainTradingAccounts {
        OnchainTradingAccounts {
            substrate: self.account_id(Network::Substrate).0.to_vec(),
            ethereum: self.account_id(Network::Ethereum).0.to_vec(),
            solana: self.account_id(Network::Solana).0.to_vec(),
        }
    }
}

/// State of one simulated instance.
pub struct SimulatedContract {
    version: ContractVersion,
    seed: Vec<u8>,
    relayer: SigningKey,
    traders: HashMap<AccountId, TraderKeys>,
    /// Off-chain registration cache. Survives dry runs.
    registrations: HashSet<(AccountId, Vec<u8>)>,
    keys_available: bool,
}

impl SimulatedContract {
    pub fn new(version: ContractVersion, seed: Vec<u8>) -> Self {
        let relayer = SigningKey::from_bytes(&blake2_256(&(b"relayer", &seed).encode()));
        Self {
            version,
            seed,
            relayer,
            traders: HashMap::new(),
            registrations: HashSet::new(),
            keys_available: true,
        }
    }

    /// Run a constructor's call data. `None` when it does not match the catalog.
    pub fn construct(version: ContractVersion, input: &[u8]) -> Option<Self> {
        let schema = ContractSchema::for_version(version);
        let (selector, args) = Selector::split(input)?;
        let spec = schema.constructor_by_selector(selector)?;
        match spec.label {
            "seeding" => decode_exact::<Vec<u8>>(args)
                .ok()
                .map(|seed| Self::new(version, seed)),
            _ if args.is_empty() => Some(Self::new(version, b"default".to_vec())),
            _ => None,
        }
    }

    pub fn version(&self) -> ContractVersion {
        self.version
    }

    pub fn seed(&self) -> &[u8] {
        &self.seed
    }

    pub fn set_keys_available(&mut self, available: bool) {
        self.keys_available = available;
    }

    pub fn has_trader(&self, caller: &AccountId) -> bool {
        self.traders.contains_key(caller)
    }

    /// Public key the v3 relayer signs registrations with.
    pub fn relayer_public_key(&self) -> VerifyingKey {
        self.relayer.verifying_key()
    }

    /// Published key for `caller` on `network`, if generated.
    pub fn trader_verifying_key(&self, caller: &AccountId, network: Network) -> Option<VerifyingKey> {
        self.traders
            .get(caller)
            .map(|keys| keys.get(network).verifying_key())
    }

    /// Execute `input` as `caller`. State changes persist only when `commit`.
    pub fn execute(&mut self, caller: &AccountId, input: &[u8], commit: bool) -> ExecReturnValue {
        let (data, reverted) = match self.dispatch(caller, input, commit) {
            Ok((data, reverted)) => (data, reverted),
            Err(lang) => (MessageResult::<()>::Err(lang).encode(), true),
        };
        ExecReturnValue {
            flags: if reverted {
                ExecReturnValue::REVERT_FLAG
            } else {
                0
            },
            data,
        }
    }

    fn dispatch(
        &mut self,
        caller: &AccountId,
        input: &[u8],
        commit: bool,
    ) -> Result<(Vec<u8>, bool), LangError> {
        let schema = ContractSchema::for_version(self.version);
        let (selector, args) = Selector::split(input).ok_or(LangError::CouldNotReadInput)?;
        let spec = schema
            .message_by_selector(selector)
            .ok_or(LangError::CouldNotReadInput)?;

        Ok(match (self.version, spec.label) {
            (_, "test") => {
                read_args::<()>(args)?;
                (MessageResult::Ok(()).encode(), false)
            }
            (ContractVersion::V1, "sign") => {
                let message: String = read_args(args)?;
                let signature = self.relayer.sign(message.as_bytes()).to_bytes().to_vec();
                (MessageResult::Ok(signature).encode(), false)
            }
            (ContractVersion::V1, "verify") => {
                let (message, signature): (String, Vec<u8>) = read_args(args)?;
                let valid = Signature::from_slice(&signature)
                    .map(|sig| {
                        self.relayer
                            .verifying_key()
                            .verify(message.as_bytes(), &sig)
                            .is_ok()
                    })
                    .unwrap_or(false);
                (MessageResult::Ok(valid).encode(), false)
            }
            (_, "generate_onchain_trader_keys" | "generate_onchain_trading_account") => {
                read_args::<()>(args)?;
                reply(self.generate(caller, commit))
            }
            (_, "sign") => {
                let (network, message): (Network, Vec<u8>) = read_args(args)?;
                reply(
                    self.trader(caller)
                        .map(|keys| keys.get(network).sign(&message).to_bytes().to_vec()),
                )
            }
            (ContractVersion::V2, "get_public_keys") => {
                read_args::<()>(args)?;
                reply(self.trader(caller).map(TraderKeys::accounts))
            }
            (_, "get_public_keys") => {
                read_args::<()>(args)?;
                reply(self.trader(caller).map(TraderKeys::public_keys))
            }
            (_, "register_trading_account_to_spectre") => {
                let message: Vec<u8> = read_args(args)?;
                reply(self.register(caller, message))
            }
            _ => return Err(LangError::CouldNotReadInput),
        })
    }

    fn trader(&self, caller: &AccountId) -> SigningResult<&TraderKeys> {
        if !self.keys_available {
            return Err(ContractError::KeysUnavailable);
        }
        self.traders
            .get(caller)
            .ok_or(ContractError::UnregisteredTraderAccount)
    }

    fn generate(&mut self, caller: &AccountId, commit: bool) -> SigningResult<()> {
        if !self.keys_available {
            return Err(ContractError::KeysUnavailable);
        }
        if self.traders.contains_key(caller) {
            return Err(ContractError::PrivateKeyOfThatNetworkAlreadyRegistered);
        }
        if commit {
            self.traders
                .insert(*caller, TraderKeys::derive(&self.seed, caller));
        }
        Ok(())
    }

    fn register(&mut self, caller: &AccountId, message: Vec<u8>) -> SigningResult<Vec<u8>> {
        self.trader(caller)?;
        let signature = self.relayer.sign(&message).to_bytes().to_vec();
        if !self.registrations.insert((*caller, message)) {
            return Err(ContractError::PrivateKeyOfThatNetworkAlreadyRegistered);
        }
        Ok(signature)
    }
}

fn read_args<T: Decode>(args: &[u8]) -> Result<T, LangError> {
    decode_exact(args).map_err(|_| LangError::CouldNotReadInput)
}

/// Encode a domain result; ink! reverts state when a message returns `Err`.
fn reply<T: Encode>(result: SigningResult<T>) -> (Vec<u8>, bool) {
    let failed = result.is_err();
    (MessageResult::Ok(result).encode(), failed)
}
