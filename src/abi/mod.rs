//! Contract ABI: selectors, the versioned message catalog, call-data encoding
//! and pallet-contracts runtime calls.

pub mod runtime;
pub mod schema;
pub mod selector;

use parity_scale_codec::Encode;

pub use runtime::{
    CONTRACTS_CALL_INDEX, CONTRACTS_INSTANTIATE_INDEX, ContractsCall, derive_contract_address,
};
pub use schema::{
    ArgSpec, ArgType, ConstructorSpec, ContractSchema, MessageSpec, ReturnShape, SigningPayload,
};
pub use selector::Selector;

pub use crate::domain::encoding::{decode_exact, from_hex, to_hex};

/// Call data for a message or constructor: `selector ++ SCALE(args)`.
pub fn encode_call_data<A: Encode>(selector: Selector, args: &A) -> Vec<u8> {
    let mut data = selector.to_bytes().to_vec();
    args.encode_to(&mut data);
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Network;

    #[test]
    fn test_encode_sign_call_data() {
        let data = encode_call_data(
            Selector::from_label("sign"),
            &(Network::Ethereum, &b"hi"[..]),
        );
        assert_eq!(data, vec![0x81, 0xca, 0x8f, 0xa1, 1, 8, b'h', b'i']);
    }

    #[test]
    fn test_encode_no_args() {
        let data = encode_call_data(Selector::from_label("test"), &());
        assert_eq!(data, vec![0x92, 0x8b, 0x20, 0x36]);
    }

    #[test]
    fn test_text_encodes_like_bytes() {
        let text = encode_call_data(Selector::from_label("sign"), &"abc");
        let bytes = encode_call_data(Selector::from_label("sign"), &b"abc".to_vec());
        assert_eq!(text, bytes);
    }
}
