//! ink! message and constructor selectors.

use std::fmt;

use parity_scale_codec::{Decode, Encode};

use crate::domain::encoding::to_hex;
use crate::domain::hashing::blake2_256;

/// First four bytes of BLAKE2b-256 over the message label.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Encode, Decode)]
pub struct Selector(pub [u8; 4]);

impl Selector {
    pub fn from_label(label: &str) -> Self {
        let hash = blake2_256(label.as_bytes());
        Self([hash[0], hash[1], hash[2], hash[3]])
    }

    pub fn to_bytes(self) -> [u8; 4] {
        self.0
    }

    /// Split call data into its selector and argument bytes.
    pub fn split(input: &[u8]) -> Option<(Self, &[u8])> {
        if input.len() < 4 {
            return None;
        }
        let (head, rest) = input.split_at(4);
        Some((Self([head[0], head[1], head[2], head[3]]), rest))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", to_hex(&self.0))
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Selector({})", to_hex(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_matches_ink_flipper() {
        assert_eq!(Selector::from_label("new").to_string(), "0x9bae9d5e");
        assert_eq!(Selector::from_label("flip").to_string(), "0x633aa551");
    }

    #[test]
    fn test_selector_for_contract_messages() {
        assert_eq!(Selector::from_label("sign").0, [0x81, 0xca, 0x8f, 0xa1]);
        assert_eq!(Selector::from_label("seeding").0, [0x11, 0x5d, 0x8b, 0xa8]);
        assert_eq!(Selector::from_label("default").0, [0xed, 0x4b, 0x9d, 0x1b]);
    }

    #[test]
    fn test_split_requires_four_bytes() {
        assert!(Selector::split(&[1, 2, 3]).is_none());
        let (selector, rest) = Selector::split(&[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(selector.0, [1, 2, 3, 4]);
        assert_eq!(rest, &[5]);
    }
}
