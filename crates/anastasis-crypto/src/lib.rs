//! Cryptographic primitives used by the provider core.
//!
//! Kept deliberately small and I/O-free: hashing helpers plus one
//! signature scheme, nothing more.

pub mod code;
pub mod hash;
pub mod sig;

pub use code::hash_challenge_code;
pub use hash::{blake3_32, sha512};
pub use sig::{verify_account_signature, CryptoError};
