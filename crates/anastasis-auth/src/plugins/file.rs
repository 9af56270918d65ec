//! The "file" method: used for testing. No challenge-code round trip at
//! all — `start` mints and immediately satisfies the code, `process`
//! reports `Finished` on its first call (spec.md §4.2's explicit example
//! of a method needing no side channel).

use anastasis_core::{
    constants::{CHALLENGE_OFFER_LIFETIME, DEFAULT_RETRY_COUNTER},
    time::Duration,
    AnastasisError, ChallengeCode, TruthUuid,
};
use anastasis_store::Store;
use async_trait::async_trait;
use std::sync::Arc;

use crate::plugin::{ChallengePlugin, PluginMetadata, PluginState, ProcessResult, TriggerCb, ValidateResult};

pub struct FilePlugin {
    store: Arc<Store>,
    metadata: PluginMetadata,
}

impl FilePlugin {
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            store,
            metadata: PluginMetadata {
                method_name: "file",
                cost: anastasis_core::Amount::new("KUDOS", 0, 0),
                payment_plugin_managed: false,
                retry_counter: DEFAULT_RETRY_COUNTER,
                code_validity_period: Duration::from_days(1),
                code_rotation_period: CHALLENGE_OFFER_LIFETIME,
                code_retransmission_frequency: Duration::from_secs(0),
                user_provided_code: false,
            },
        }
    }
}

#[async_trait]
impl ChallengePlugin for FilePlugin {
    fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    fn validate(&self, _mime: &str, _data: &[u8]) -> ValidateResult {
        ValidateResult::Ok
    }

    async fn start(
        &self,
        _trigger_cb: TriggerCb,
        truth_uuid: TruthUuid,
        code: ChallengeCode,
        _data: &[u8],
    ) -> Result<PluginState, AnastasisError> {
        self.store.mark_challenge_code_satisfied(truth_uuid, code)?;
        Ok(PluginState::None)
    }

    async fn process(
        &self,
        _state: &mut PluginState,
        _timeout: Duration,
        _response: Option<&str>,
    ) -> ProcessResult {
        ProcessResult::Finished
    }

    async fn cleanup(&self, _state: PluginState) {}
}
