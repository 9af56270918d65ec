use std::sync::Arc;

use anastasis_core::time::Duration;
use anastasis_core::{
    AccountPublicKey, AccountSignature, AccountStatus, Amount, ChallengeCode, ChallengeCodeCreated,
    ChallengeCodeStatus, PaymentCheck, PaymentIdentifier, StoreOutcome, Timestamp, TruthUuid,
};
use anastasis_crypto::hash_challenge_code;
use anastasis_store::{StateDb, Store};

fn store() -> Store {
    Store::new(Arc::new(StateDb::open_temporary().unwrap()))
}

fn account(byte: u8) -> AccountPublicKey {
    AccountPublicKey::from_bytes([byte; 32])
}

fn pid(byte: u8) -> PaymentIdentifier {
    PaymentIdentifier::from_bytes([byte; 32])
}

fn truth(byte: u8) -> TruthUuid {
    TruthUuid::from_bytes([byte; 32])
}

/// spec.md §8 scenario 1: fresh backup, quota exhaustion.
#[test]
fn fresh_backup_quota_and_dedup() {
    let s = store();
    let now = Timestamp::from_secs(1_000_000);
    let a = account(1);
    let p = pid(1);
    let amount = Amount::new("EUR", 1, 0);

    s.record_recdoc_payment(a, p, amount, 3, now).unwrap();
    let paid_until = s.increment_lifetime(a, p, Duration::from_days(365), now).unwrap();
    assert_eq!(paid_until, now + Duration::from_days(365));

    let sig = AccountSignature([0u8; 64]);
    let h1 = [1u8; 64];
    let h2 = [2u8; 64];
    let h3 = [3u8; 64];

    assert_eq!(
        s.store_recovery_document(a, sig.clone(), h1, b"blob1".to_vec(), p, now).unwrap(),
        StoreOutcome::Success { version: 1 }
    );
    assert_eq!(
        s.store_recovery_document(a, sig.clone(), h2, b"blob2".to_vec(), p, now).unwrap(),
        StoreOutcome::Success { version: 2 }
    );
    assert_eq!(
        s.store_recovery_document(a, sig.clone(), h2, b"blob2".to_vec(), p, now).unwrap(),
        StoreOutcome::NoResults { version: 2 }
    );
    assert_eq!(
        s.store_recovery_document(a, sig.clone(), h3, b"blob3".to_vec(), p, now).unwrap(),
        StoreOutcome::Success { version: 3 }
    );
    assert_eq!(
        s.store_recovery_document(a, sig, h3, b"blob4".to_vec(), p, now).unwrap(),
        StoreOutcome::StoreLimitExceeded
    );
}

/// spec.md §8 scenario 2: question challenge, wrong guess then right one.
#[test]
fn question_challenge_wrong_then_right_guess() {
    let s = store();
    let now = Timestamp::from_secs(2_000_000);
    let u = truth(7);

    s.store_truth(u, b"key-share".to_vec(), "text/plain".into(), b"enc".to_vec(), "question".into(), now + Duration::from_days(365))
        .unwrap();

    let created = s
        .create_challenge_code(u, Duration::from_hours(1), Duration::from_days(1), 3, now)
        .unwrap();
    let code = match created {
        ChallengeCodeCreated::Fresh { code, .. } => code,
        other => panic!("expected Fresh, got {other:?}"),
    };

    let wrong = ChallengeCode::new(code.0 ^ 1);
    let wrong_hash = hash_challenge_code(wrong);
    assert_eq!(
        s.verify_challenge_code(u, wrong_hash, now).unwrap(),
        ChallengeCodeStatus::Mismatch
    );

    let right_hash = hash_challenge_code(code);
    assert_eq!(
        s.verify_challenge_code(u, right_hash, now).unwrap(),
        ChallengeCodeStatus::Valid { code, satisfied: false }
    );

    s.mark_challenge_code_satisfied(u, code).unwrap();
    s.mark_challenge_code_satisfied(u, code).unwrap(); // idempotent

    assert_eq!(
        s.verify_challenge_code(u, right_hash, now).unwrap(),
        ChallengeCodeStatus::Valid { code, satisfied: true }
    );

    assert_eq!(s.get_key_share(u).unwrap(), Some(b"key-share".to_vec()));
}

/// spec.md §8 scenario 6: create_challenge_code rotation idempotency.
#[test]
fn rotation_idempotency_then_fresh_code_after_expiry() {
    let s = store();
    let u = truth(9);
    let t0 = Timestamp::from_secs(3_000_000);
    let rotation = Duration::from_hours(1);
    let validity = Duration::from_days(1);

    let first = s.create_challenge_code(u, rotation, validity, 3, t0).unwrap();
    let (code_x, retransmission_x) = match first {
        ChallengeCodeCreated::Fresh { code, retransmission_date } => (code, retransmission_date),
        other => panic!("expected Fresh, got {other:?}"),
    };

    let t_plus_30m = t0 + Duration::from_secs(30 * 60);
    let second = s.create_challenge_code(u, rotation, validity, 3, t_plus_30m).unwrap();
    assert_eq!(
        second,
        ChallengeCodeCreated::Existing { code: code_x, retransmission_date: retransmission_x }
    );

    let t_after_validity = t0 + validity + Duration::from_secs(1);
    let third = s.create_challenge_code(u, rotation, validity, 3, t_after_validity).unwrap();
    match third {
        ChallengeCodeCreated::Fresh { code, .. } => assert_ne!(code, code_x),
        other => panic!("expected a fresh code, got {other:?}"),
    }
}

/// spec.md §8 scenario 5: ingester restart resumes from the last row.
#[test]
fn ingester_cursor_survives_restart_and_rejects_duplicates() {
    let s = store();
    let now = Timestamp::from_secs(4_000_000);
    let amount = Amount::new("EUR", 5, 0);

    for wire_ref in 10..=12u64 {
        s.record_auth_iban_payment(
            wire_ref,
            format!("Anastasis {wire_ref} thanks"),
            amount.clone(),
            "payto://iban/DEBITOR".into(),
            "payto://iban/CREDITOR".into(),
            now,
        )
        .unwrap();
    }

    assert_eq!(s.get_last_auth_iban_payment_row("payto://iban/CREDITOR").unwrap(), 12);

    let err = s
        .record_auth_iban_payment(
            12,
            "Anastasis 12 dup".into(),
            amount,
            "payto://iban/DEBITOR".into(),
            "payto://iban/CREDITOR".into(),
            now,
        )
        .unwrap_err();
    assert!(matches!(err, anastasis_core::AnastasisError::HardError(_)));
}

#[test]
fn test_auth_iban_payment_rejects_transfers_before_earliest() {
    let s = store();
    let now = Timestamp::from_secs(5_000_000);
    s.record_auth_iban_payment(
        1,
        "Anastasis 555".into(),
        Amount::new("EUR", 1, 0),
        "payto://iban/D".into(),
        "payto://iban/C".into(),
        now,
    )
    .unwrap();

    let found = s
        .test_auth_iban_payment("payto://iban/D", now + Duration::from_secs(1), |_, _| true)
        .unwrap();
    assert!(!found);

    let found = s.test_auth_iban_payment("payto://iban/D", now, |_, _| true).unwrap();
    assert!(found);
}

#[test]
fn increment_lifetime_is_idempotent_per_payment_identifier() {
    let s = store();
    let now = Timestamp::from_secs(6_000_000);
    let a = account(2);
    let p = pid(2);
    s.record_recdoc_payment(a, p, Amount::new("EUR", 1, 0), 1, now).unwrap();

    let first = s.increment_lifetime(a, p, Duration::from_days(30), now).unwrap();
    let second = s.increment_lifetime(a, p, Duration::from_days(30), now + Duration::from_secs(10)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn gc_deletes_expired_accounts_and_keeps_live_ones() {
    let s = store();
    let now = Timestamp::from_secs(7_000_000);
    let expired = account(3);
    let live = account(4);
    let p1 = pid(3);
    let p2 = pid(4);

    s.record_recdoc_payment(expired, p1, Amount::new("EUR", 1, 0), 1, now).unwrap();
    s.increment_lifetime(expired, p1, Duration::from_secs(1), now).unwrap();

    s.record_recdoc_payment(live, p2, Amount::new("EUR", 1, 0), 1, now).unwrap();
    s.increment_lifetime(live, p2, Duration::from_days(365), now).unwrap();

    let gc_cutoff = now + Duration::from_secs(1000);
    s.gc(gc_cutoff, gc_cutoff).unwrap();

    assert_eq!(s.lookup_account(expired, gc_cutoff).unwrap(), AccountStatus::NoResults);
    assert!(matches!(s.lookup_account(live, gc_cutoff).unwrap(), AccountStatus::NoResults | AccountStatus::PaymentRequired));
}

#[test]
fn store_truth_is_immutable_and_idempotent() {
    let s = store();
    let u = truth(11);
    let exp = Timestamp::from_secs(8_000_000);
    s.store_truth(u, b"ks1".to_vec(), "text/plain".into(), b"ct1".to_vec(), "question".into(), exp).unwrap();
    // A second call with different payload is ignored; the original wins.
    s.store_truth(u, b"ks2".to_vec(), "text/plain".into(), b"ct2".to_vec(), "question".into(), exp).unwrap();
    assert_eq!(s.get_key_share(u).unwrap(), Some(b"ks1".to_vec()));
}

#[test]
fn check_challenge_payment_tracks_paid_and_counter_exhaustion() {
    let s = store();
    let now = Timestamp::from_secs(9_000_000);
    let u = truth(12);
    let p = pid(12);

    assert_eq!(s.check_challenge_payment(u, p).unwrap(), PaymentCheck::NoResults);

    s.record_challenge_payment(u, p, Amount::new("EUR", 1, 0), 2, now).unwrap();
    // Recorded but not yet confirmed paid.
    assert_eq!(s.check_challenge_payment(u, p).unwrap(), PaymentCheck::NoResults);

    s.confirm_challenge_payment(u, p).unwrap();
    assert_eq!(s.check_challenge_payment(u, p).unwrap(), PaymentCheck::Paid { counter: 2 });

    // Idempotent: confirming again doesn't reset anything.
    s.confirm_challenge_payment(u, p).unwrap();
    assert_eq!(s.check_challenge_payment(u, p).unwrap(), PaymentCheck::Paid { counter: 2 });

    s.mark_challenge_sent(u, ChallengeCode::new(1), Some(p), now).unwrap();
    s.mark_challenge_sent(u, ChallengeCode::new(1), Some(p), now).unwrap();
    assert_eq!(s.check_challenge_payment(u, p).unwrap(), PaymentCheck::PaidExhausted);
}

#[test]
fn check_recdoc_payment_tracks_paid_and_counter_exhaustion() {
    let s = store();
    let now = Timestamp::from_secs(9_500_000);
    let a = account(12);
    let p = pid(13);

    assert_eq!(s.check_recdoc_payment(p).unwrap(), PaymentCheck::NoResults);

    s.record_recdoc_payment(a, p, Amount::new("EUR", 1, 0), 1, now).unwrap();
    assert_eq!(s.check_recdoc_payment(p).unwrap(), PaymentCheck::NoResults);

    s.increment_lifetime(a, p, Duration::from_days(1), now).unwrap();
    assert_eq!(s.check_recdoc_payment(p).unwrap(), PaymentCheck::Paid { counter: 1 });

    let sig = AccountSignature([0u8; 64]);
    s.store_recovery_document(a, sig, [9u8; 64], b"blob".to_vec(), p, now).unwrap();
    assert_eq!(s.check_recdoc_payment(p).unwrap(), PaymentCheck::PaidExhausted);
}
