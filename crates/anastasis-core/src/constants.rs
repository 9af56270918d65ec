//! Protocol-wide constants, grounded in the original C implementation's
//! `#define`s (see SPEC_FULL.md "Supplemented features").

use crate::time::Duration;

/// A freshly created (unpaid) account's lifetime: long enough for the
/// client to complete payment, per spec.md §3 ("Account").
pub const TRANSIENT_ACCOUNT_LIFETIME: Duration = Duration(7 * 86_400 * 1_000_000);

/// How long an unpaid challenge-payment offer remains valid before a new
/// `payment_identifier` must be minted. Grounded in
/// `ANASTASIS_CHALLENGE_OFFER_LIFETIME` (one hour) in
/// `anastasis_database_plugin.h`.
pub const CHALLENGE_OFFER_LIFETIME: Duration = Duration(3600 * 1_000_000);

/// Default initial `retry_counter` placed in a freshly minted challenge
/// code (spec.md §3, "typically 3").
pub const DEFAULT_RETRY_COUNTER: u32 = 3;

/// Counter value used for payment-plugin-managed challenge codes, so that
/// a long-poll against e.g. the IBAN plugin can continue indefinitely
/// while waiting for the wire transfer (spec.md §4.4).
pub const UNLIMITED_RETRY_COUNTER: u32 = u32::MAX;

/// How long the wire-transfer ingester long-polls the bank for new
/// history before treating the call as "nothing pending" (spec.md §4.3).
pub const WIRE_LONGPOLL_TIMEOUT: Duration = Duration(3600 * 1_000_000);

/// How long the ingester sleeps between polls once the bank call returns
/// empty (spec.md §4.3).
pub const WIRE_IDLE_SLEEP_INTERVAL: Duration = Duration(60 * 1_000_000);

/// Batch size requested from the bank's credit-history call.
pub const WIRE_HISTORY_BATCH: u32 = 1024;

/// `k`: half-width (in time steps) of the TOTP acceptance window. The
/// plugin accepts any of `2k+1` codes centered on "now".
pub const TOTP_WINDOW_HALF_WIDTH: i64 = 2;

/// TOTP time-step duration (RFC 6238 default).
pub const TOTP_STEP_SECONDS: i64 = 30;

/// `dbinit -g` default GC cutoff for expired accounts/backups: six months,
/// grounded in `anastasis-dbinit.c`'s `expire_backups` computation.
pub const GC_EXPIRE_BACKUPS_AFTER: Duration = Duration(183 * 86_400 * 1_000_000);

/// `dbinit -g` default GC cutoff for stale unpaid payment records: ten
/// years, grounded in `anastasis-dbinit.c`'s `expire_payments` computation.
pub const GC_EXPIRE_PAYMENTS_AFTER: Duration = Duration(3650 * 86_400 * 1_000_000);
