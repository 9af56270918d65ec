//! Opaque identifiers used throughout the provider core.
//!
//! Newtype-over-fixed-size-array for everything: base58 for keys meant
//! to be copy-pasted, hex for ones that are usually only logged.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 32-byte Ed25519 public key identifying an account. The account owns
/// zero or more recovery document versions.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountPublicKey(pub [u8; 32]);

impl AccountPublicKey {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_b58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    pub fn from_b58(s: &str) -> Result<Self, bs58::decode::Error> {
        let bytes = bs58::decode(s).into_vec()?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes[..32.min(bytes.len())]);
        Ok(Self(arr))
    }
}

impl fmt::Display for AccountPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_b58())
    }
}

impl fmt::Debug for AccountPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountPublicKey({}…)", &self.to_b58()[..8.min(self.to_b58().len())])
    }
}

/// 64-byte Ed25519 signature over `recovery_data_hash` by `account_pub`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSignature(pub [u8; 64]);

impl fmt::Debug for AccountSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountSignature({}b)", self.0.len())
    }
}

/// 32-byte identifier of one `Truth` record (one authentication method
/// instance). Chosen by the client at upload time.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TruthUuid(pub [u8; 32]);

impl TruthUuid {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes[..32.min(bytes.len())]);
        Ok(Self(arr))
    }
}

impl fmt::Display for TruthUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for TruthUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TruthUuid({}…)", &self.to_hex()[..16])
    }
}

/// 32-byte nonce identifying one billing unit: "so many uploads" or "one
/// challenge issuance".
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PaymentIdentifier(pub [u8; 32]);

impl PaymentIdentifier {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for PaymentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for PaymentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PaymentIdentifier({}…)", &self.to_hex()[..16])
    }
}

/// A challenge code: a 52-bit numeric nonce (the protocol caps it at
/// `2^52` so it round-trips through the client's JSON number type
/// without precision loss).
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeCode(pub u64);

/// Upper bound for a challenge code: `2^52 - 1`.
pub const CHALLENGE_CODE_MAX: u64 = (1u64 << 52) - 1;

impl ChallengeCode {
    /// Construct a code, masking it into the 52-bit range.
    pub fn new(raw: u64) -> Self {
        Self(raw & CHALLENGE_CODE_MAX)
    }
}

impl fmt::Display for ChallengeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ChallengeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChallengeCode({})", self.0)
    }
}
