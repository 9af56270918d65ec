use thiserror::Error;

/// Error taxonomy for the provider core (spec.md §7).
///
/// `HardError` carries a genuine integrity violation from the storage
/// engine; everything else is a typed condition the caller (gate,
/// plugin, ingester) maps to a deterministic outcome. There is no
/// `SoftError`/serialization-conflict variant: the backing store
/// (`sled`) resolves write conflicts by rerunning the transaction
/// closure itself, without bound, so no caller-visible "retry me"
/// condition is ever produced (see `anastasis_store::retry`).
#[derive(Debug, Error)]
pub enum AnastasisError {
    /// Integrity violation or unexpected row count; not retryable.
    #[error("storage integrity error: {0}")]
    HardError(String),

    #[error("storage backend error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("unknown account: {0}")]
    UnknownAccount(String),

    #[error("unknown truth: {0}")]
    UnknownTruth(String),

    #[error("unknown payment identifier: {0}")]
    UnknownPaymentIdentifier(String),

    #[error("payment required")]
    PaymentRequired,

    #[error("upload quota exceeded for this payment identifier")]
    StoreLimitExceeded,

    #[error("challenge code mismatch")]
    ChallengeCodeMismatch,

    #[error("invalid truth payload for method {method}: {reason}")]
    InvalidTruth { method: String, reason: String },

    #[error("plugin I/O failure: {0}")]
    PluginIoFailure(String),

    #[error("wire transfer row-id monotonicity violated: saw {got}, expected > {last}")]
    RowMonotonicityViolation { last: u64, got: u64 },

    #[error("bank client error: {0}")]
    BankClient(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}
