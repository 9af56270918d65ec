use std::sync::Arc;

use anastasis_auth::plugin::{ChallengePlugin, PluginState, ProcessResult, ValidateResult};
use anastasis_auth::plugins::{CommandPlugin, FilePlugin, QuestionPlugin, TotpPlugin};
use anastasis_core::time::Duration;
use anastasis_core::{Amount, ChallengeCode, TruthUuid};
use anastasis_store::{StateDb, Store};

fn truth(byte: u8) -> TruthUuid {
    TruthUuid::from_bytes([byte; 32])
}

fn noop_trigger() -> anastasis_auth::TriggerCb {
    Arc::new(|| {})
}

#[tokio::test]
async fn question_plugin_reports_success_immediately() {
    let plugin = QuestionPlugin::new();
    assert_eq!(plugin.validate("text/plain", b"what is your pet's name?"), ValidateResult::Ok);
    assert_eq!(plugin.validate("text/plain", b""), ValidateResult::Invalid("question text must not be empty".into()));

    let mut state = plugin
        .start(noop_trigger(), truth(1), ChallengeCode::new(42), b"data")
        .await
        .unwrap();
    assert_eq!(plugin.process(&mut state, Duration::from_secs(1), None).await, ProcessResult::Success);
    plugin.cleanup(state).await;
}

#[tokio::test]
async fn file_plugin_satisfies_the_code_in_start_and_finishes_immediately() {
    let store = Arc::new(Store::new(Arc::new(StateDb::open_temporary().unwrap())));
    let plugin = FilePlugin::new(store.clone());
    let truth_uuid = truth(2);
    let code = ChallengeCode::new(7);

    let mut state = plugin.start(noop_trigger(), truth_uuid, code, b"").await.unwrap();
    assert_eq!(plugin.process(&mut state, Duration::from_secs(1), None).await, ProcessResult::Finished);
    assert!(store.test_challenge_code_satisfied(truth_uuid, code, anastasis_core::Timestamp::ZERO).unwrap());
    plugin.cleanup(state).await;
}

#[tokio::test]
async fn totp_plugin_accepts_a_code_within_the_window_and_rejects_outside_it() {
    let plugin = TotpPlugin::new();
    let secret = b"0123456789abcdef";
    assert_eq!(plugin.validate("application/octet-stream", secret), ValidateResult::Ok);
    assert_eq!(
        plugin.validate("application/octet-stream", b"short"),
        ValidateResult::Invalid("TOTP secret too short".into())
    );

    let mut state = plugin.start(noop_trigger(), truth(3), ChallengeCode::new(0), secret).await.unwrap();
    let PluginState::Totp { acceptable } = &state else { panic!("expected totp state") };
    let correct = acceptable[0].to_string();

    assert_eq!(
        plugin.process(&mut state, Duration::from_secs(1), Some(&correct)).await,
        ProcessResult::Finished
    );
    assert_eq!(
        plugin.process(&mut state, Duration::from_secs(1), Some("00000000")).await,
        ProcessResult::Failed
    );
    plugin.cleanup(state).await;
}

#[tokio::test]
async fn command_plugin_reports_success_when_the_helper_exits_zero() {
    let plugin = CommandPlugin::new("sms", "/bin/true".into(), Amount::new("KUDOS", 0, 0));
    let mut state = plugin
        .start(noop_trigger(), truth(4), ChallengeCode::new(5), b"+15555550123")
        .await
        .unwrap();
    assert_eq!(
        plugin.process(&mut state, Duration::from_secs(5), None).await,
        ProcessResult::Success
    );
    plugin.cleanup(state).await;
}

#[tokio::test]
async fn command_plugin_reports_failed_when_the_helper_exits_nonzero() {
    let plugin = CommandPlugin::new("sms", "/bin/false".into(), Amount::new("KUDOS", 0, 0));
    let mut state = plugin
        .start(noop_trigger(), truth(5), ChallengeCode::new(6), b"+15555550123")
        .await
        .unwrap();
    assert_eq!(
        plugin.process(&mut state, Duration::from_secs(5), None).await,
        ProcessResult::Failed
    );
    plugin.cleanup(state).await;
}
