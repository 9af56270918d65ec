//! The "totp" method: the user proves possession of a shared secret
//! independently (their authenticator app), so the server never mints a
//! database challenge code. `start` is invoked with `code = 0` per
//! spec.md §4.2 and precomputes the acceptance window; `process` checks
//! a user-supplied response against it.

use anastasis_core::{
    constants::{CHALLENGE_OFFER_LIFETIME, DEFAULT_RETRY_COUNTER, TOTP_STEP_SECONDS, TOTP_WINDOW_HALF_WIDTH},
    time::Duration,
    AnastasisError, ChallengeCode, Timestamp, TruthUuid,
};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::plugin::{ChallengePlugin, PluginMetadata, PluginState, ProcessResult, TriggerCb, ValidateResult};

type HmacSha1 = Hmac<Sha1>;

const CODE_DIGITS: u32 = 8;

/// RFC 4226 HOTP value for one time-step counter.
fn hotp(secret: &[u8], counter: u64) -> u64 {
    let mut mac = HmacSha1::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = ((digest[offset] as u32 & 0x7f) << 24)
        | ((digest[offset + 1] as u32) << 16)
        | ((digest[offset + 2] as u32) << 8)
        | (digest[offset + 3] as u32);

    (binary as u64) % 10u64.pow(CODE_DIGITS)
}

fn acceptable_codes(secret: &[u8], now: Timestamp) -> Vec<u64> {
    let step = now.0 / (TOTP_STEP_SECONDS * 1_000_000);
    let counter = if step < 0 { 0 } else { step as u64 };
    (-TOTP_WINDOW_HALF_WIDTH..=TOTP_WINDOW_HALF_WIDTH)
        .map(|offset| hotp(secret, counter.saturating_add_signed(offset)))
        .collect()
}

pub struct TotpPlugin {
    metadata: PluginMetadata,
}

impl TotpPlugin {
    pub fn new() -> Self {
        Self {
            metadata: PluginMetadata {
                method_name: "totp",
                cost: anastasis_core::Amount::new("KUDOS", 0, 0),
                payment_plugin_managed: false,
                retry_counter: DEFAULT_RETRY_COUNTER,
                code_validity_period: Duration::from_secs(TOTP_STEP_SECONDS * (2 * TOTP_WINDOW_HALF_WIDTH + 1)),
                code_rotation_period: CHALLENGE_OFFER_LIFETIME,
                code_retransmission_frequency: Duration::from_secs(0),
                user_provided_code: true,
            },
        }
    }
}

impl Default for TotpPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChallengePlugin for TotpPlugin {
    fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    fn validate(&self, _mime: &str, data: &[u8]) -> ValidateResult {
        if data.len() < 10 {
            ValidateResult::Invalid("TOTP secret too short".into())
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
        debug_assert_eq!(code.0, 0, "totp start is always called with code = 0");
        Ok(PluginState::Totp { acceptable: acceptable_codes(data, Timestamp::now()) })
    }

    async fn process(
        &self,
        state: &mut PluginState,
        _timeout: Duration,
        response: Option<&str>,
    ) -> ProcessResult {
        let PluginState::Totp { acceptable } = state else {
            return ProcessResult::FailedReplyFailed;
        };
        match response.and_then(|r| r.parse::<u64>().ok()) {
            Some(guess) if acceptable.contains(&guess) => ProcessResult::Finished,
            _ => ProcessResult::Failed,
        }
    }

    async fn cleanup(&self, _state: PluginState) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hotp_is_deterministic_for_the_same_counter() {
        assert_eq!(hotp(b"supersecretvalue", 7), hotp(b"supersecretvalue", 7));
    }

    #[test]
    fn hotp_differs_across_counters() {
        assert_ne!(hotp(b"supersecretvalue", 1), hotp(b"supersecretvalue", 2));
    }

    #[test]
    fn acceptable_codes_has_2k_plus_1_entries() {
        let codes = acceptable_codes(b"supersecretvalue", Timestamp::from_secs(1_000_000));
        assert_eq!(codes.len(), (2 * TOTP_WINDOW_HALF_WIDTH + 1) as usize);
    }

    #[test]
    fn current_step_code_is_always_accepted() {
        let now = Timestamp::from_secs(1_700_000_000);
        let step = now.0 / (TOTP_STEP_SECONDS * 1_000_000);
        let current = hotp(b"supersecretvalue", step as u64);
        assert!(acceptable_codes(b"supersecretvalue", now).contains(&current));
    }
}
