//! The "iban" method: payment-managed. A wire transfer carrying the
//! challenge code in its subject line both pays for and satisfies the
//! challenge (spec.md §4.2, §4.4).

use std::time::Duration as StdDuration;

use anastasis_core::{
    constants::{CHALLENGE_OFFER_LIFETIME, UNLIMITED_RETRY_COUNTER},
    time::Duration,
    AnastasisError, ChallengeCode, Timestamp, TruthUuid,
};
use anastasis_store::{EventSpec, Store};
use anastasis_wire::subject::{extract_code, iban_from_payto};
use async_trait::async_trait;
use std::sync::Arc;

use crate::plugin::{ChallengePlugin, PluginMetadata, PluginState, ProcessResult, TriggerCb, ValidateResult};

pub struct IbanPlugin {
    store: Arc<Store>,
    metadata: PluginMetadata,
}

impl IbanPlugin {
    pub fn new(store: Arc<Store>, cost: anastasis_core::Amount) -> Self {
        Self {
            store,
            metadata: PluginMetadata {
                method_name: "iban",
                cost,
                payment_plugin_managed: true,
                retry_counter: UNLIMITED_RETRY_COUNTER,
                code_validity_period: Duration::from_days(2),
                code_rotation_period: CHALLENGE_OFFER_LIFETIME,
                code_retransmission_frequency: Duration::from_secs(0),
                user_provided_code: false,
            },
        }
    }
}

#[async_trait]
impl ChallengePlugin for IbanPlugin {
    fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    fn validate(&self, _mime: &str, data: &[u8]) -> ValidateResult {
        match std::str::from_utf8(data).ok().and_then(iban_from_payto) {
            Some(_) => ValidateResult::Ok,
            None => ValidateResult::Invalid("truth payload is not a payto://iban/ URI".into()),
        }
    }

    async fn start(
        &self,
        _trigger_cb: TriggerCb,
        truth_uuid: TruthUuid,
        code: ChallengeCode,
        data: &[u8],
    ) -> Result<PluginState, AnastasisError> {
        let debit_account = std::str::from_utf8(data)
            .ok()
            .filter(|s| iban_from_payto(s).is_some())
            .ok_or_else(|| AnastasisError::InvalidTruth {
                method: "iban".into(),
                reason: "debit account is not a payto://iban/ URI".into(),
            })?
            .to_string();
        let debit_iban = iban_from_payto(&debit_account).expect("checked above");
        let debit_iban_hash = anastasis_crypto::blake3_32(debit_iban.as_bytes());

        let subscribed_at = Timestamp::now();
        let (listen_handle, receiver) =
            self.store.event_listen(EventSpec::iban_transfer(code.0, debit_iban_hash));

        Ok(PluginState::Iban { listen_handle, receiver, debit_account, truth_uuid, code, subscribed_at })
    }

    async fn process(
        &self,
        state: &mut PluginState,
        timeout: Duration,
        _response: Option<&str>,
    ) -> ProcessResult {
        let PluginState::Iban { receiver, debit_account, truth_uuid, code, subscribed_at, .. } = state
        else {
            return ProcessResult::FailedReplyFailed;
        };

        // A matching transfer may have landed before we subscribed; check
        // the ledger directly first (spec.md §4.2, §8 scenario 4). Only a
        // transfer whose subject carries this exact challenge code and
        // whose amount covers the method's cost satisfies it — otherwise
        // any incoming transfer from the debit IBAN would satisfy every
        // pending challenge tied to that account.
        let expected_code = code.0;
        let cost = &self.metadata.cost;
        match self.store.test_auth_iban_payment(debit_account.as_str(), *subscribed_at, |amount, subject| {
            extract_code(subject) == Some(expected_code) && amount.at_least(cost)
        }) {
            Ok(true) => return self.finish(*truth_uuid, *code),
            Ok(false) => {}
            Err(_) => return ProcessResult::FailedReplyFailed,
        }

        let wait = StdDuration::from_micros(timeout.0.max(0) as u64);
        match tokio::time::timeout(wait, receiver.recv()).await {
            Ok(Some(_payload)) => self.finish(*truth_uuid, *code),
            Ok(None) => ProcessResult::FailedReplyFailed,
            Err(_) => ProcessResult::Suspended,
        }
    }

    async fn cleanup(&self, state: PluginState) {
        if let PluginState::Iban { listen_handle, .. } = state {
            self.store.event_listen_cancel(listen_handle);
        }
    }
}

impl IbanPlugin {
    fn finish(&self, truth_uuid: TruthUuid, code: ChallengeCode) -> ProcessResult {
        match self.store.mark_challenge_code_satisfied(truth_uuid, code) {
            Ok(()) => ProcessResult::Finished,
            Err(_) => ProcessResult::FailedReplyFailed,
        }
    }
}
