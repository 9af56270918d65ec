use anastasis_core::types::{AccountPublicKey, AccountSignature};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use thiserror::Error;

/// Errors from the signature layer. Kept separate from
/// [`anastasis_core::AnastasisError`] so callers decide whether a bad
/// signature is a hard error or just "request rejected".
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("account public key is not a valid Ed25519 point")]
    MalformedPublicKey,
    #[error("signature failed verification")]
    InvalidSignature,
}

/// Verify that `sig` is `account_pub`'s signature over `recovery_data_hash`.
///
/// spec.md §3: "the account's signature covers `recovery_data_hash`, not
/// `recovery_data` itself" — callers are expected to have hashed the
/// document first (see [`crate::hash::sha512`]).
pub fn verify_account_signature(
    account_pub: &AccountPublicKey,
    recovery_data_hash: &[u8; 64],
    sig: &AccountSignature,
) -> Result<(), CryptoError> {
    let verifying_key =
        VerifyingKey::from_bytes(account_pub.as_bytes()).map_err(|_| CryptoError::MalformedPublicKey)?;
    let signature = Signature::from_bytes(&sig.0);
    verifying_key
        .verify(recovery_data_hash, &signature)
        .map_err(|_| CryptoError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    fn keypair() -> (SigningKey, AccountPublicKey) {
        let signing_key = SigningKey::from_bytes(&[7u8; 32]);
        let pub_key = AccountPublicKey::from_bytes(signing_key.verifying_key().to_bytes());
        (signing_key, pub_key)
    }

    #[test]
    fn accepts_a_genuine_signature() {
        let (signing_key, pub_key) = keypair();
        let hash = [9u8; 64];
        let sig = AccountSignature(signing_key.sign(&hash).to_bytes());
        assert!(verify_account_signature(&pub_key, &hash, &sig).is_ok());
    }

    #[test]
    fn rejects_a_signature_over_a_different_hash() {
        let (signing_key, pub_key) = keypair();
        let sig = AccountSignature(signing_key.sign(&[9u8; 64]).to_bytes());
        let other_hash = [1u8; 64];
        assert!(verify_account_signature(&pub_key, &other_hash, &sig).is_err());
    }

    #[test]
    fn rejects_a_signature_from_a_different_key() {
        let (_signing_key, pub_key) = keypair();
        let other_signing_key = SigningKey::from_bytes(&[8u8; 32]);
        let hash = [9u8; 64];
        let sig = AccountSignature(other_signing_key.sign(&hash).to_bytes());
        assert!(verify_account_signature(&pub_key, &hash, &sig).is_err());
    }
}
