//! `pallet-contracts` runtime calls and address derivation.

use parity_scale_codec::{Compact, Decode, Encode};

use crate::domain::hashing::blake2_256;
use crate::domain::{AccountId, CodecError, H256, Weight};

/// Call index of `Contracts::call`.
pub const CONTRACTS_CALL_INDEX: u8 = 6;

/// Call index of `Contracts::instantiate` (code already on chain).
pub const CONTRACTS_INSTANTIATE_INDEX: u8 = 8;

/// `MultiAddress::Id` discriminant.
const MULTI_ADDRESS_ID: u8 = 0;

const CONTRACT_ADDRESS_PREFIX: &[u8; 16] = b"contract_addr_v1";

/// The two `Contracts` pallet calls this client submits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractsCall {
    Call {
        dest: AccountId,
        value: u128,
        gas_limit: Weight,
        storage_deposit_limit: Option<u128>,
        data: Vec<u8>,
    },
    Instantiate {
        value: u128,
        gas_limit: Weight,
        storage_deposit_limit: Option<u128>,
        code_hash: H256,
        data: Vec<u8>,
        salt: Vec<u8>,
    },
}

impl ContractsCall {
    /// Encode as a runtime call of the pallet at `pallet_index`.
    pub fn encode_for(&self, pallet_index: u8) -> Vec<u8> {
        let mut out = vec![pallet_index];
        match self {
            Self::Call {
                dest,
                value,
                gas_limit,
                storage_deposit_limit,
                data,
            } => {
                CONTRACTS_CALL_INDEX.encode_to(&mut out);
                MULTI_ADDRESS_ID.encode_to(&mut out);
                dest.encode_to(&mut out);
                Compact(*value).encode_to(&mut out);
                gas_limit.encode_to(&mut out);
                storage_deposit_limit.map(Compact).encode_to(&mut out);
                data.encode_to(&mut out);
            }
            Self::Instantiate {
                value,
                gas_limit,
                storage_deposit_limit,
                code_hash,
                data,
                salt,
            } => {
                CONTRACTS_INSTANTIATE_INDEX.encode_to(&mut out);
                Compact(*value).encode_to(&mut out);
                gas_limit.encode_to(&mut out);
                storage_deposit_limit.map(Compact).encode_to(&mut out);
                code_hash.encode_to(&mut out);
                data.encode_to(&mut out);
                salt.encode_to(&mut out);
            }
        }
        out
    }

    /// Decode a runtime call produced by [`ContractsCall::encode_for`].
    pub fn decode_for(pallet_index: u8, bytes: &[u8]) -> Result<Self, CodecError> {
        let mut input = bytes;
        let pallet = u8::decode(&mut input)?;
        if pallet != pallet_index {
            return Err(CodecError::Scale(format!(
                "expected pallet {pallet_index}, got {pallet}"
            )));
        }

        let call = match u8::decode(&mut input)? {
            CONTRACTS_CALL_INDEX => {
                let address_kind = u8::decode(&mut input)?;
                if address_kind != MULTI_ADDRESS_ID {
                    return Err(CodecError::InvalidAddress(format!(
                        "unsupported MultiAddress variant {address_kind}"
                    )));
                }
                Self::Call {
                    dest: AccountId::decode(&mut input)?,
                    value: Compact::<u128>::decode(&mut input)?.0,
                    gas_limit: Weight::decode(&mut input)?,
                    storage_deposit_limit: Option::<Compact<u128>>::decode(&mut input)?
                        .map(|c| c.0),
                    data: Vec::<u8>::decode(&mut input)?,
                }
            }
            CONTRACTS_INSTANTIATE_INDEX => Self::Instantiate {
                value: Compact::<u128>::decode(&mut input)?.0,
                gas_limit: Weight::decode(&mut input)?,
                storage_deposit_limit: Option::<Compact<u128>>::decode(&mut input)?.map(|c| c.0),
                code_hash: H256::decode(&mut input)?,
                data: Vec::<u8>::decode(&mut input)?,
                salt: Vec::<u8>::decode(&mut input)?,
            },
            other => {
                return Err(CodecError::Scale(format!("unknown call index {other}")));
            }
        };

        if !input.is_empty() {
            return Err(CodecError::TrailingBytes {
                remaining: input.len(),
            });
        }
        Ok(call)
    }
}

/// Address pallet-contracts assigns to an instantiation.
///
/// `blake2_256(b"contract_addr_v1" ++ deployer ++ code_hash ++ enc(input) ++ enc(salt))`
pub fn derive_contract_address(
    deployer: &AccountId,
    code_hash: &H256,
    input_data: &[u8],
    salt: &[u8],
) -> AccountId {
    let entropy = (CONTRACT_ADDRESS_PREFIX, deployer, code_hash, input_data, salt).encode();
    AccountId::new(blake2_256(&entropy))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call() -> ContractsCall {
        ContractsCall::Call {
            dest: AccountId::new([7; 32]),
            value: 0,
            gas_limit: Weight::from_parts(1, 2),
            storage_deposit_limit: None,
            data: vec![0xde, 0xad],
        }
    }

    #[test]
    fn test_call_layout() {
        let encoded = call().encode_for(7);
        assert_eq!(&encoded[..3], &[7, CONTRACTS_CALL_INDEX, 0]);
        assert_eq!(&encoded[3..35], &[7; 32]);
        // compact(0), weight(1, 2), None, compact_len(2), data
        assert_eq!(&encoded[35..], &[0, 4, 8, 0, 8, 0xde, 0xad]);
        assert_eq!(ContractsCall::decode_for(7, &encoded).unwrap(), call());
    }

    #[test]
    fn test_instantiate_roundtrip_with_deposit_limit() {
        let call = ContractsCall::Instantiate {
            value: 1_000_000_000_000,
            gas_limit: Weight::DEFAULT_TX_LIMIT,
            storage_deposit_limit: Some(5),
            code_hash: H256([1; 32]),
            data: vec![1, 2, 3],
            salt: vec![9],
        };
        let encoded = call.encode_for(40);
        assert_eq!(encoded[1], CONTRACTS_INSTANTIATE_INDEX);
        assert_eq!(ContractsCall::decode_for(40, &encoded).unwrap(), call);
    }

    #[test]
    fn test_decode_rejects_other_pallet() {
        let encoded = call().encode_for(7);
        assert!(ContractsCall::decode_for(8, &encoded).is_err());
    }

    #[test]
    fn test_address_derivation_is_deterministic() {
        let deployer = AccountId::new([1; 32]);
        let code_hash = H256([2; 32]);
        let a = derive_contract_address(&deployer, &code_hash, b"seed", &[]);
        let b = derive_contract_address(&deployer, &code_hash, b"seed", &[]);
        let c = derive_contract_address(&deployer, &code_hash, b"other", &[]);
        let d = derive_contract_address(&deployer, &code_hash, b"seed", b"salt");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_address_preimage_layout() {
        let deployer = AccountId::new([1; 32]);
        let code_hash = H256([2; 32]);
        let mut preimage = b"contract_addr_v1".to_vec();
        preimage.extend_from_slice(&[1; 32]);
        preimage.extend_from_slice(&[2; 32]);
        preimage.extend_from_slice(&[4, 0xaa]);
        preimage.push(0);
        assert_eq!(
            derive_contract_address(&deployer, &code_hash, &[0xaa], &[]),
            AccountId::new(blake2_256(&preimage))
        );
    }
}
