use std::sync::Arc;

use anastasis_auth::plugin::{ChallengePlugin, ProcessResult};
use anastasis_auth::plugins::IbanPlugin;
use anastasis_core::time::Duration;
use anastasis_core::{Amount, ChallengeCode, Timestamp, TruthUuid};
use anastasis_store::{StateDb, Store};

fn noop_trigger() -> anastasis_auth::TriggerCb {
    Arc::new(|| {})
}

/// spec.md §8 scenario 4: the wire transfer lands and is recorded before
/// `process()` is first entered — the initial `test_auth_iban_payment`
/// poll must catch it without ever suspending.
#[tokio::test]
async fn finishes_immediately_when_the_transfer_already_landed() {
    let store = Arc::new(Store::new(Arc::new(StateDb::open_temporary().unwrap())));
    let plugin = IbanPlugin::new(store.clone(), Amount::new("KUDOS", 1, 0));
    let truth_uuid = TruthUuid::from_bytes([9; 32]);
    let code = ChallengeCode::new(1234);

    store
        .record_auth_iban_payment(
            1,
            "anastasis 1234 thanks".into(),
            Amount::new("KUDOS", 1, 0),
            "payto://iban/DE1234567890".into(),
            "payto://iban/MYCREDITIBAN".into(),
            Timestamp::now(),
        )
        .unwrap();

    let mut state = plugin
        .start(noop_trigger(), truth_uuid, code, b"payto://iban/DE1234567890")
        .await
        .unwrap();
    assert_eq!(
        plugin.process(&mut state, Duration::from_secs(1), None).await,
        ProcessResult::Finished
    );
    plugin.cleanup(state).await;
}

/// spec.md §8 scenario 3: the transfer arrives after `process()` is
/// already suspended, delivered via the event bus.
#[tokio::test]
async fn finishes_once_the_wire_transfer_event_fires() {
    let store = Arc::new(Store::new(Arc::new(StateDb::open_temporary().unwrap())));
    let plugin = Arc::new(IbanPlugin::new(store.clone(), Amount::new("KUDOS", 1, 0)));
    let truth_uuid = TruthUuid::from_bytes([10; 32]);
    let code = ChallengeCode::new(4321);

    let mut state = plugin
        .start(noop_trigger(), truth_uuid, code, b"payto://iban/DE1234567890")
        .await
        .unwrap();

    let plugin_for_task = plugin.clone();
    let process_task = tokio::spawn(async move {
        plugin_for_task.process(&mut state, Duration::from_secs(5), None).await
    });

    // Give process() a moment to reach the suspend point before the
    // transfer lands.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    store
        .record_auth_iban_payment(
            1,
            "anastasis 4321 thanks".into(),
            Amount::new("KUDOS", 1, 0),
            "payto://iban/DE1234567890".into(),
            "payto://iban/MYCREDITIBAN".into(),
            Timestamp::now(),
        )
        .unwrap();
    let hash = anastasis_crypto::blake3_32(b"DE1234567890");
    store.event_notify(&anastasis_store::EventSpec::iban_transfer(4321, hash), b"KUDOS:1");

    let result = process_task.await.unwrap();
    assert_eq!(result, ProcessResult::Finished);
}
