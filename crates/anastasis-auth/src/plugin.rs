//! Challenge authorization plugin framework (spec.md §4.2).

use anastasis_core::{AnastasisError, Amount, ChallengeCode, TruthUuid};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Fixed per-method configuration, set once at plugin construction.
#[derive(Clone, Debug)]
pub struct PluginMetadata {
    pub method_name: &'static str,
    /// Price per challenge issuance; zero for methods with no generic
    /// payment gate (e.g. IBAN, which is payment-managed itself).
    pub cost: Amount,
    /// If true, the payment gate in §4.4 is bypassed; the plugin decides
    /// for itself when the user has paid.
    pub payment_plugin_managed: bool,
    pub retry_counter: u32,
    pub code_validity_period: anastasis_core::time::Duration,
    pub code_rotation_period: anastasis_core::time::Duration,
    pub code_retransmission_frequency: anastasis_core::time::Duration,
    /// If true (TOTP), `start` is called with `code = 0` and `process`
    /// checks a user-supplied response instead of a stored code.
    pub user_provided_code: bool,
}

/// Outcome of a syntactic check on a truth payload, run before payment is
/// charged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidateResult {
    Ok,
    Invalid(String),
}

/// Outcome of [`ChallengePlugin::process`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessResult {
    /// Challenge was transmitted, reply queued; caller returns 403 with a
    /// plugin-specific body.
    Success,
    /// Transmission failed, error response queued; caller returns the
    /// queued reply.
    Failed,
    /// Plugin suspended the connection; it will resume via `trigger_cb`.
    /// A suspension that times out without resuming surfaces here too
    /// (spec.md §6: "202 with wait (SUSPENDED timed out)").
    Suspended,
    /// Challenge already satisfied; caller releases the key share.
    Finished,
    /// Semantically a success, but the reply could not be queued; caller
    /// closes the connection.
    SuccessReplyFailed,
    /// Semantically a failure, but the reply could not be queued either.
    FailedReplyFailed,
}

/// Per-request state created by `start` and destroyed by `cleanup`. A
/// trait object needs one shape shared across all seven methods; each
/// plugin only populates the variant it understands.
pub enum PluginState {
    /// question / file: no background work, nothing to clean up.
    None,
    /// command-backed methods (sms/email/post): the spawned helper
    /// process, reaped on `cleanup` if still running.
    Command(tokio::process::Child),
    /// totp: the acceptable codes computed at `start` time.
    Totp { acceptable: Vec<u64> },
    /// iban: the event subscription plus what we're waiting for.
    Iban {
        listen_handle: anastasis_store::ListenHandle,
        receiver: mpsc::Receiver<Vec<u8>>,
        debit_account: String,
        truth_uuid: TruthUuid,
        code: ChallengeCode,
        subscribed_at: anastasis_core::Timestamp,
    },
}

/// A callback the plugin invokes when its asynchronous work progresses,
/// so the HTTP surface knows to resume a suspended connection. The actual
/// connection object is outside this crate's scope; only the wake-up
/// signal is modeled here.
pub type TriggerCb = std::sync::Arc<dyn Fn() + Send + Sync>;

#[async_trait]
pub trait ChallengePlugin: Send + Sync {
    fn metadata(&self) -> &PluginMetadata;

    /// Cheap syntactic check on the truth payload (phone number, e-mail,
    /// IBAN, TOTP secret length, …), called before payment is charged.
    fn validate(&self, mime: &str, data: &[u8]) -> ValidateResult;

    /// Create per-request state. `code` is `0` when
    /// `metadata().user_provided_code` is true.
    async fn start(
        &self,
        trigger_cb: TriggerCb,
        truth_uuid: TruthUuid,
        code: ChallengeCode,
        data: &[u8],
    ) -> Result<PluginState, AnastasisError>;

    /// Progress the authentication, consuming/mutating `state`.
    /// `response` is the user-supplied `response=CODE` query parameter,
    /// only meaningful for `user_provided_code` plugins.
    async fn process(
        &self,
        state: &mut PluginState,
        timeout: anastasis_core::time::Duration,
        response: Option<&str>,
    ) -> ProcessResult;

    /// Release state; cancel child processes or event listeners. Must be
    /// safe to call in every state, including after suspension.
    async fn cleanup(&self, state: PluginState);
}
