//! Payment gate (spec.md §4.4): composes storage and plugin behaviour so
//! upload and challenge endpoints demand payment per the rules below,
//! without needing to know anything about HTTP.

use anastasis_core::{Amount, AnastasisError, PaymentCheck, PaymentIdentifier, Timestamp, TruthUuid};
use anastasis_store::Store;
use rand::RngCore;

/// What the (out-of-scope) HTTP surface should do in response to a
/// gated request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateDecision {
    /// Admit the request; `counter` issuances/uploads remain after this
    /// one is consumed.
    Admit,
    /// The presented identifier is paid out but exhausted; caller
    /// responds 402 instructing the client to pay again with the same
    /// identifier's successor.
    PayAgain,
    /// No payment record existed for the presented identifier (or none
    /// was presented); a fresh one was minted and recorded at `price`.
    /// Caller responds 402 with a bill naming `payment_identifier`.
    FreshBill { payment_identifier: PaymentIdentifier, price: Amount },
}

fn fresh_payment_identifier() -> PaymentIdentifier {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    PaymentIdentifier::from_bytes(bytes)
}

/// Gate a recovery-document upload. `presented` is the `payment_identifier`
/// from the request's payment header, if any.
pub fn gate_recdoc_upload(
    store: &Store,
    account_pub: anastasis_core::AccountPublicKey,
    presented: Option<PaymentIdentifier>,
    price: Amount,
    post_counter: u32,
    now: Timestamp,
) -> Result<GateDecision, AnastasisError> {
    let Some(pid) = presented else {
        let pid = fresh_payment_identifier();
        store.record_recdoc_payment(account_pub, pid, price.clone(), post_counter, now)?;
        return Ok(GateDecision::FreshBill { payment_identifier: pid, price });
    };

    match store.check_recdoc_payment(pid)? {
        PaymentCheck::Paid { .. } => Ok(GateDecision::Admit),
        PaymentCheck::PaidExhausted => Ok(GateDecision::PayAgain),
        PaymentCheck::NoResults => {
            let pid = fresh_payment_identifier();
            store.record_recdoc_payment(account_pub, pid, price.clone(), post_counter, now)?;
            Ok(GateDecision::FreshBill { payment_identifier: pid, price })
        }
    }
}

/// Gate a challenge issuance for `truth_uuid`. Plugins with
/// `payment_plugin_managed = true` (e.g. IBAN) must never call this —
/// they decide for themselves when the user has paid (spec.md §4.4).
pub fn gate_challenge_issuance(
    store: &Store,
    truth_uuid: TruthUuid,
    presented: Option<PaymentIdentifier>,
    price: Amount,
    counter: u32,
    now: Timestamp,
) -> Result<GateDecision, AnastasisError> {
    if price.is_zero() {
        return Ok(GateDecision::Admit);
    }

    let Some(pid) = presented else {
        let pid = fresh_payment_identifier();
        store.record_challenge_payment(truth_uuid, pid, price.clone(), counter, now)?;
        return Ok(GateDecision::FreshBill { payment_identifier: pid, price });
    };

    match store.check_challenge_payment(truth_uuid, pid)? {
        PaymentCheck::Paid { .. } => Ok(GateDecision::Admit),
        PaymentCheck::PaidExhausted => Ok(GateDecision::PayAgain),
        PaymentCheck::NoResults => {
            let pid = fresh_payment_identifier();
            store.record_challenge_payment(truth_uuid, pid, price.clone(), counter, now)?;
            Ok(GateDecision::FreshBill { payment_identifier: pid, price })
        }
    }
}
