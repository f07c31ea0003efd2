//! BLAKE2b helpers shared by selectors, SS58 checksums and address derivation.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Blake2b512, Digest};

type Blake2b256 = Blake2b<U32>;

/// BLAKE2b with a 32-byte output (Substrate `blake2_256`).
pub fn blake2_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// BLAKE2b with a 64-byte output.
pub fn blake2_512(data: &[u8]) -> [u8; 64] {
    let mut hasher = Blake2b512::new();
    hasher.update(data);
    let mut out = [0u8; 64];
    out.copy_from_slice(&hasher.finalize());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blake2_256_empty_input() {
        // Known vector for BLAKE2b-256("")
        assert_eq!(
            hex::encode(blake2_256(b"")),
            "0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8"
        );
    }

    #[test]
    fn test_blake2_outputs_differ_by_width() {
        let short = blake2_256(b"spectre");
        let long = blake2_512(b"spectre");
        assert_ne!(&long[..32], &short[..]);
    }
}
