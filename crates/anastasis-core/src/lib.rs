//! Shared, I/O-free types for the Anastasis provider core.
//!
//! Opaque identifiers, the error taxonomy, and constants that every
//! other crate in the workspace depends on.

pub mod amount;
pub mod constants;
pub mod error;
pub mod status;
pub mod time;
pub mod types;

pub use amount::Amount;
pub use error::AnastasisError;
pub use status::{
    AccountLookup, AccountStatus, ChallengeCodeCreated, ChallengeCodeStatus, PaymentCheck,
    StoreOutcome, WireTransferCheck,
};
pub use time::Timestamp;
pub use types::{
    AccountPublicKey, AccountSignature, ChallengeCode, PaymentIdentifier, TruthUuid,
};
