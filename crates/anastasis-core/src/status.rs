//! Business-status outcomes returned by storage operations.
//!
//! Genuinely exceptional conditions (serialization conflicts, integrity
//! violations) go through `Result<_, AnastasisError>`; these enums carry
//! the deterministic, expected-to-happen outcomes spec.md §4.1/§7 name
//! (`SUCCESS`, `NO_RESULTS`, `PAYMENT_REQUIRED`, …) so callers match on
//! them exhaustively instead of string-typing a status code.

use crate::amount::Amount;
use crate::time::Timestamp;
use crate::types::ChallengeCode;

/// Outcome of `store_recovery_document` (spec.md §4.1).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreOutcome {
    /// Row written; carries the assigned version.
    Success { version: u32 },
    /// Identical hash as the latest existing version; no-op. Carries the
    /// existing version number.
    NoResults { version: u32 },
    /// No account, or no payment record for the supplied identifier.
    PaymentRequired,
    /// `post_counter` for the payment identifier is already zero.
    StoreLimitExceeded,
}

/// Outcome of `lookup_account` (spec.md §4.1).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccountStatus {
    Valid(AccountLookup),
    PaymentRequired,
    NoResults,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountLookup {
    pub paid_until: Timestamp,
    pub recovery_data_hash: [u8; 64],
    pub version: u32,
}

/// Outcome of `verify_challenge_code` (spec.md §4.1, §7).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChallengeCodeStatus {
    /// The hashed code matched a stored candidate.
    Valid { code: ChallengeCode, satisfied: bool },
    /// At least one unexpired candidate existed but none matched; the
    /// matched candidate's `retry_counter` (if any were decremented) is
    /// not exposed here — callers only see the outcome.
    Mismatch,
    /// No unexpired candidate with `retry_counter > 0` existed at all.
    NoResults,
}

/// Outcome of `create_challenge_code` (spec.md §4.1, §8).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChallengeCodeCreated {
    /// An existing, still-live code was returned (idempotent re-mint).
    Existing { code: ChallengeCode, retransmission_date: Timestamp },
    /// A code exists but is dead (`retry_counter == 0`); client must wait
    /// for it to expire.
    Exhausted,
    /// A fresh code was minted.
    Fresh { code: ChallengeCode, retransmission_date: Timestamp },
}

/// Result of testing a single wire transfer against a pending IBAN
/// challenge (spec.md §4.2's `test_auth_iban_payment` callback contract).
#[derive(Clone, Debug)]
pub struct WireTransferCheck {
    pub amount: Amount,
    pub wire_subject: String,
}

/// Outcome of checking a `payment_identifier` against a recdoc- or
/// challenge-payment record (spec.md §4.4's `check_payment_identifier` /
/// `check_challenge_payment`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentCheck {
    /// Paid, with `counter` issuances/uploads remaining.
    Paid { counter: u32 },
    /// Paid, but the counter has been exhausted; caller must pay again.
    PaidExhausted,
    /// No payment record for this identifier exists yet.
    NoResults,
}
