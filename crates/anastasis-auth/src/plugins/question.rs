//! The "question" method: a free-text question, answered by submitting
//! the (hashed) answer as the challenge code. No side channel to
//! transmit anything over, so `process` always reports `Success`
//! immediately (the "transmission" is the 403 body itself).

use anastasis_core::{
    constants::{CHALLENGE_OFFER_LIFETIME, DEFAULT_RETRY_COUNTER},
    time::Duration,
    AnastasisError, ChallengeCode, TruthUuid,
};
use async_trait::async_trait;

use crate::plugin::{ChallengePlugin, PluginMetadata, PluginState, ProcessResult, TriggerCb, ValidateResult};

pub struct QuestionPlugin {
    metadata: PluginMetadata,
}

impl QuestionPlugin {
    pub fn new() -> Self {
        Self {
            metadata: PluginMetadata {
                method_name: "question",
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

impl Default for QuestionPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChallengePlugin for QuestionPlugin {
    fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    fn validate(&self, _mime: &str, data: &[u8]) -> ValidateResult {
        if data.is_empty() {
            ValidateResult::Invalid("question text must not be empty".into())
        } else {
            ValidateResult::Ok
        }
    }

    async fn start(
        &self,
        _trigger_cb: TriggerCb,
        _truth_uuid: TruthUuid,
        _code: ChallengeCode,
        _data: &[u8],
    ) -> Result<PluginState, AnastasisError> {
        Ok(PluginState::None)
    }

    async fn process(
        &self,
        _state: &mut PluginState,
        _timeout: Duration,
        _response: Option<&str>,
    ) -> ProcessResult {
        ProcessResult::Success
    }

    async fn cleanup(&self, _state: PluginState) {}
}
