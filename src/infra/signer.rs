//! Ed25519 signer producing Substrate v4 signed extrinsics.

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use parity_scale_codec::{Compact, Encode};
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::domain::encoding::from_hex;
use crate::domain::hashing::blake2_256;
use crate::domain::{
    AccountId, AppError, ExtrinsicSigner, SignedExtrinsic, SigningContext, SigningError,
};

/// Signed bit set on the v4 extrinsic version byte.
const SIGNED_EXTRINSIC_V4: u8 = 0b1000_0100;
const MULTI_ADDRESS_ID: u8 = 0;
const MULTI_SIGNATURE_ED25519: u8 = 0;
const IMMORTAL_ERA: u8 = 0;

/// Payloads longer than this are hashed before signing.
const MAX_UNHASHED_PAYLOAD: usize = 256;

pub struct Ed25519ExtrinsicSigner {
    signing_key: SigningKey,
}

impl Ed25519ExtrinsicSigner {
    #[must_use]
    pub fn new(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }

    /// Fresh random key
    pub fn generate() -> Self {
        Self::new(SigningKey::generate(&mut OsRng))
    }

    /// Load a 32-byte seed (or 64-byte keypair) given as `0x` hex or base58.
    pub fn from_secret(secret: &SecretString) -> Result<Self, AppError> {
        Ok(Self::new(signing_key_from_secret(secret)?))
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }
}

/// Parse a signing key from a hex or base58 secret.
pub fn signing_key_from_secret(secret: &SecretString) -> Result<SigningKey, AppError> {
    let raw = secret.expose_secret().trim();
    let key_bytes = if raw.starts_with("0x") {
        from_hex(raw).map_err(|e| SigningError::InvalidKey(e.to_string()))?
    } else {
        bs58::decode(raw)
            .into_vec()
            .map_err(|e| SigningError::InvalidKey(e.to_string()))?
    };

    // Accept both a bare seed and a seed ++ public key pair
    let key_array: [u8; 32] = match key_bytes.len() {
        32 | 64 => {
            let mut seed = [0u8; 32];
            seed.copy_from_slice(&key_bytes[..32]);
            seed
        }
        other => {
            return Err(SigningError::InvalidKey(format!(
                "Key must be 32 or 64 bytes, got {}",
                other
            ))
            .into());
        }
    };

    Ok(SigningKey::from_bytes(&key_array))
}

/// Bytes covered by the signature: `call ++ extra ++ additional`.
fn signing_payload(call: &[u8], extra: &[u8], context: &SigningContext) -> Vec<u8> {
    let mut payload = Vec::with_capacity(call.len() + extra.len() + 72);
    payload.extend_from_slice(call);
    payload.extend_from_slice(extra);
    context.chain.spec_version.encode_to(&mut payload);
    context.chain.transaction_version.encode_to(&mut payload);
    // Immortal transactions use the genesis hash as checkpoint block
    context.chain.genesis_hash.encode_to(&mut payload);
    context.chain.genesis_hash.encode_to(&mut payload);
    payload
}

#[async_trait]
impl ExtrinsicSigner for Ed25519ExtrinsicSigner {
    fn account_id(&self) -> AccountId {
        AccountId::new(self.public_key())
    }

    async fn sign(
        &self,
        call: &[u8],
        context: &SigningContext,
    ) -> Result<SignedExtrinsic, AppError> {
        let mut extra = vec![IMMORTAL_ERA];
        Compact(context.nonce).encode_to(&mut extra);
        Compact(context.tip).encode_to(&mut extra);

        let payload = signing_payload(call, &extra, context);
        let signature = if payload.len() > MAX_UNHASHED_PAYLOAD {
            self.signing_key.sign(&blake2_256(&payload))
        } else {
            self.signing_key.sign(&payload)
        };

        let signer = self.account_id();
        let mut body = vec![SIGNED_EXTRINSIC_V4, MULTI_ADDRESS_ID];
        body.extend_from_slice(signer.as_bytes());
        body.push(MULTI_SIGNATURE_ED25519);
        body.extend_from_slice(&signature.to_bytes());
        body.extend_from_slice(&extra);
        body.extend_from_slice(call);

        // Vec<u8> encodes as compact length ++ bytes
        let encoded = body.encode();
        debug!(signer = %signer, nonce = context.nonce, len = encoded.len(), "Extrinsic signed");

        Ok(SignedExtrinsic {
            signer,
            call: call.to_vec(),
            encoded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier};
    use parity_scale_codec::Decode;

    use crate::domain::{ChainParams, H256};

    fn context(nonce: u64) -> SigningContext {
        SigningContext {
            nonce,
            tip: 0,
            chain: ChainParams {
                spec_version: 100,
                transaction_version: 1,
                genesis_hash: H256([9; 32]),
            },
        }
    }

    #[test]
    fn test_from_secret_hex_and_base58_agree() {
        let key = SigningKey::generate(&mut OsRng);
        let hex_secret = SecretString::from(format!("0x{}", hex::encode(key.to_bytes())));
        let b58_secret = SecretString::from(bs58::encode(key.to_bytes()).into_string());

        let a = Ed25519ExtrinsicSigner::from_secret(&hex_secret).unwrap();
        let b = Ed25519ExtrinsicSigner::from_secret(&b58_secret).unwrap();
        assert_eq!(a.public_key(), b.public_key());
        assert_eq!(a.public_key(), key.verifying_key().to_bytes());
    }

    #[test]
    fn test_from_secret_accepts_keypair_bytes() {
        let key = SigningKey::generate(&mut OsRng);
        let mut keypair = key.to_bytes().to_vec();
        keypair.extend_from_slice(key.verifying_key().as_bytes());
        let secret = SecretString::from(bs58::encode(&keypair).into_string());
        let signer = Ed25519ExtrinsicSigner::from_secret(&secret).unwrap();
        assert_eq!(signer.public_key(), key.verifying_key().to_bytes());
    }

    #[test]
    fn test_from_secret_rejects_wrong_length() {
        let secret = SecretString::from("0x0102".to_string());
        assert!(matches!(
            Ed25519ExtrinsicSigner::from_secret(&secret),
            Err(AppError::Signing(SigningError::InvalidKey(_)))
        ));
    }

    #[tokio::test]
    async fn test_extrinsic_layout_and_signature() {
        let signer = Ed25519ExtrinsicSigner::generate();
        let call = vec![7, 6, 0xaa];
        let ctx = context(3);
        let extrinsic = signer.sign(&call, &ctx).await.unwrap();

        let body: Vec<u8> = Decode::decode(&mut extrinsic.encoded.as_slice()).unwrap();
        assert_eq!(body.len(), 105);
        assert_eq!(body[0], 0x84);
        assert_eq!(body[1], 0);
        assert_eq!(&body[2..34], &signer.public_key());
        assert_eq!(body[34], 0);

        let signature = Signature::from_slice(&body[35..99]).unwrap();
        // era, compact(3), compact(0)
        assert_eq!(&body[99..102], &[0, 12, 0]);
        assert_eq!(&body[102..], call.as_slice());

        let payload = signing_payload(&call, &[0, 12, 0], &ctx);
        signer
            .signing_key
            .verifying_key()
            .verify(&payload, &signature)
            .unwrap();
    }

    #[tokio::test]
    async fn test_long_payload_is_hashed_before_signing() {
        let signer = Ed25519ExtrinsicSigner::generate();
        let call = vec![1u8; 300];
        let ctx = context(0);
        let extrinsic = signer.sign(&call, &ctx).await.unwrap();

        let sig_start = extrinsic.encoded.len() - call.len() - 3 - 64;
        let signature =
            Signature::from_slice(&extrinsic.encoded[sig_start..sig_start + 64]).unwrap();
        let payload = signing_payload(&call, &[0, 0, 0], &ctx);
        signer
            .signing_key
            .verifying_key()
            .verify(&blake2_256(&payload), &signature)
            .unwrap();
    }
}
