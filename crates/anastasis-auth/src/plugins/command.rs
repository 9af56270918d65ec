//! Generic helper-process plugin backing "sms", "email", and "post".
//! Keeps the original contract (address on argv, body on stdin, exit
//! code carries status) but waits for the child via the async runtime's
//! process facility instead of a manual SIGCHLD handler (spec.md §9).

use std::process::Stdio;

use anastasis_core::{
    constants::{CHALLENGE_OFFER_LIFETIME, DEFAULT_RETRY_COUNTER},
    time::Duration,
    AnastasisError, ChallengeCode, TruthUuid,
};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::plugin::{ChallengePlugin, PluginMetadata, PluginState, ProcessResult, TriggerCb, ValidateResult};

/// One instance per configured method (`sms`, `email`, `post`); `command`
/// is the `COMMAND` configuration key pointing at the helper program.
pub struct CommandPlugin {
    command: String,
    metadata: PluginMetadata,
}

impl CommandPlugin {
    pub fn new(method_name: &'static str, command: String, cost: anastasis_core::Amount) -> Self {
        Self {
            command,
            metadata: PluginMetadata {
                method_name,
                cost,
                payment_plugin_managed: false,
                retry_counter: DEFAULT_RETRY_COUNTER,
                code_validity_period: Duration::from_days(1),
                code_rotation_period: CHALLENGE_OFFER_LIFETIME,
                code_retransmission_frequency: Duration::from_secs(60),
                user_provided_code: false,
            },
        }
    }
}

#[async_trait]
impl ChallengePlugin for CommandPlugin {
    fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    fn validate(&self, _mime: &str, data: &[u8]) -> ValidateResult {
        if std::str::from_utf8(data).map(|s| s.trim().is_empty()).unwrap_or(true) {
            ValidateResult::Invalid(format!("{} address must not be empty", self.metadata.method_name))
        } else {
            ValidateResult::Ok
        }
    }

    async fn start(
        &self,
        _trigger_cb: TriggerCb,
        _truth_uuid: TruthUuid,
        code: ChallengeCode,
        data: &[u8],
    ) -> Result<PluginState, AnastasisError> {
        let address = std::str::from_utf8(data)
            .map_err(|e| AnastasisError::InvalidTruth {
                method: self.metadata.method_name.into(),
                reason: e.to_string(),
            })?
            .trim()
            .to_string();

        let mut child = Command::new(&self.command)
            .arg(&address)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| AnastasisError::PluginIoFailure(e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            let body = format!("Your Anastasis authentication code is: {}\n", code.0);
            stdin
                .write_all(body.as_bytes())
                .await
                .map_err(|e| AnastasisError::PluginIoFailure(e.to_string()))?;
        }

        Ok(PluginState::Command(child))
    }

    async fn process(
        &self,
        state: &mut PluginState,
        timeout: Duration,
        _response: Option<&str>,
    ) -> ProcessResult {
        let PluginState::Command(child) = state else {
            return ProcessResult::FailedReplyFailed;
        };

        let wait = std::time::Duration::from_micros(timeout.0.max(0) as u64);
        match tokio::time::timeout(wait, child.wait()).await {
            Ok(Ok(status)) if status.success() => ProcessResult::Success,
            Ok(Ok(_)) => ProcessResult::Failed,
            Ok(Err(_)) => ProcessResult::FailedReplyFailed,
            Err(_) => ProcessResult::Suspended,
        }
    }

    async fn cleanup(&self, state: PluginState) {
        if let PluginState::Command(mut child) = state {
            let _ = child.start_kill();
            let _ = child.wait().await;
        }
    }
}
