use std::sync::Arc;

use rand::RngCore;
use sled::transaction::{ConflictableTransactionError, Transactional};
use tokio::sync::mpsc;
use tracing::warn;

use anastasis_core::{
    AccountLookup, AccountPublicKey, AccountSignature, AccountStatus, Amount, AnastasisError,
    ChallengeCode, ChallengeCodeCreated, ChallengeCodeStatus, PaymentIdentifier, StoreOutcome,
    Timestamp, TruthUuid,
};
use anastasis_crypto::hash_challenge_code;

use crate::db::{challenge_payment_key, recovery_document_key, StateDb};
use crate::events::{EventBus, EventSpec, ListenHandle};
use crate::records::{
    AccountRecord, ChallengeCodeRecord, ChallengePaymentRecord, InboundWireRecord,
    RecdocPaymentRecord, RecoveryDocumentRecord, TruthRecord, TruthUploadPaymentRecord,
};
use crate::retry::map_transaction_error;

type Abort = ConflictableTransactionError<AnastasisError>;

fn abort(e: AnastasisError) -> Abort {
    ConflictableTransactionError::Abort(e)
}

fn ser<T: serde::Serialize>(v: &T) -> Result<Vec<u8>, Abort> {
    bincode::serialize(v).map_err(|e| abort(AnastasisError::Serialization(e.to_string())))
}

fn de<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, Abort> {
    bincode::deserialize(bytes).map_err(|e| abort(AnastasisError::Serialization(e.to_string())))
}

/// Typed facade over [`StateDb`]: every operation from spec.md §4.1.
/// Composite (multi-tree) operations run inside a `sled` transaction,
/// which already reruns its closure on a write conflict until it
/// commits (see `retry` module doc); single-row lookups run outside any
/// transaction, per spec.md §4.1 ("read-only single-statement queries
/// run outside an explicit transaction").
pub struct Store {
    db: Arc<StateDb>,
    events: EventBus,
}

impl Store {
    pub fn new(db: Arc<StateDb>) -> Self {
        Self { db, events: EventBus::new() }
    }

    pub fn db(&self) -> &Arc<StateDb> {
        &self.db
    }

    // ── Recovery documents ────────────────────────────────────────────────

    pub fn store_recovery_document(
        &self,
        account_pub: AccountPublicKey,
        account_sig: AccountSignature,
        recovery_data_hash: [u8; 64],
        recovery_data: Vec<u8>,
        payment_identifier: PaymentIdentifier,
        now: Timestamp,
    ) -> Result<StoreOutcome, AnastasisError> {
        let trees = (&self.db.accounts, &self.db.recovery_documents, &self.db.recdoc_payments);
        trees
            .transaction(|(accounts, docs, payments)| {
                let account: Option<AccountRecord> = match accounts.get(account_pub.as_bytes())? {
                    Some(b) => Some(de(&b)?),
                    None => None,
                };

                let account = match account {
                    None => return Ok(StoreOutcome::PaymentRequired),
                    Some(a) => a,
                };

                if account.latest_version > 0 {
                    let key = recovery_document_key(account_pub.as_bytes(), account.latest_version);
                    if let Some(b) = docs.get(&key[..])? {
                        let latest: RecoveryDocumentRecord = de(&b)?;
                        if latest.recovery_data_hash == recovery_data_hash {
                            return Ok(StoreOutcome::NoResults { version: account.latest_version });
                        }
                    }
                }

                let payment: Option<RecdocPaymentRecord> =
                    match payments.get(payment_identifier.as_bytes())? {
                        Some(b) => Some(de(&b)?),
                        None => None,
                    };
                let mut payment = match payment {
                    None => return Ok(StoreOutcome::PaymentRequired),
                    Some(p) => p,
                };
                if payment.post_counter == 0 {
                    return Ok(StoreOutcome::StoreLimitExceeded);
                }

                payment.post_counter -= 1;
                payments.insert(payment_identifier.as_bytes().as_slice(), ser(&payment)?)?;

                let version = account.latest_version + 1;
                let record = RecoveryDocumentRecord {
                    account_pub: *account_pub.as_bytes(),
                    version,
                    account_sig: account_sig.0,
                    recovery_data_hash,
                    recovery_data: recovery_data.clone(),
                };
                let key = recovery_document_key(account_pub.as_bytes(), version);
                docs.insert(&key[..], ser(&record)?)?;

                let mut updated = account;
                updated.latest_version = version;
                accounts.insert(account_pub.as_bytes().as_slice(), ser(&updated)?)?;

                Ok(StoreOutcome::Success { version })
            })
            .map_err(map_transaction_error)
    }

    pub fn get_recovery_document(
        &self,
        account_pub: AccountPublicKey,
        version: Option<u32>,
    ) -> Result<Option<RecoveryDocumentRecord>, AnastasisError> {
        let version = match version {
            Some(v) => v,
            None => {
                let Some(account) = self.get_account_record(&account_pub)? else {
                    return Ok(None);
                };
                if account.latest_version == 0 {
                    return Ok(None);
                }
                account.latest_version
            }
        };
        let key = recovery_document_key(account_pub.as_bytes(), version);
        match self
            .db
            .recovery_documents
            .get(&key[..])
            .map_err(|e| AnastasisError::Storage(e.to_string()))?
        {
            Some(b) => Ok(Some(
                bincode::deserialize(&b).map_err(|e| AnastasisError::Serialization(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    fn get_account_record(&self, account_pub: &AccountPublicKey) -> Result<Option<AccountRecord>, AnastasisError> {
        match self
            .db
            .accounts
            .get(account_pub.as_bytes())
            .map_err(|e| AnastasisError::Storage(e.to_string()))?
        {
            Some(b) => Ok(Some(
                bincode::deserialize(&b).map_err(|e| AnastasisError::Serialization(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    pub fn lookup_account(
        &self,
        account_pub: AccountPublicKey,
        now: Timestamp,
    ) -> Result<AccountStatus, AnastasisError> {
        let Some(account) = self.get_account_record(&account_pub)? else {
            return Ok(AccountStatus::NoResults);
        };
        if account.expiration_date.is_past(now) {
            return Ok(AccountStatus::PaymentRequired);
        }
        if account.latest_version == 0 {
            return Ok(AccountStatus::NoResults);
        }
        let Some(doc) = self.get_recovery_document(account_pub, Some(account.latest_version))? else {
            return Ok(AccountStatus::NoResults);
        };
        Ok(AccountStatus::Valid(AccountLookup {
            paid_until: account.expiration_date,
            recovery_data_hash: doc.recovery_data_hash,
            version: doc.version,
        }))
    }

    // ── Truths ────────────────────────────────────────────────────────────

    /// Truths are immutable once stored; a repeat `store_truth` for the
    /// same `truth_uuid` is a silent no-op.
    pub fn store_truth(
        &self,
        truth_uuid: TruthUuid,
        key_share: Vec<u8>,
        mime_type: String,
        encrypted_truth: Vec<u8>,
        method_name: String,
        expiration: Timestamp,
    ) -> Result<(), AnastasisError> {
        if self
            .db
            .truths
            .contains_key(truth_uuid.as_bytes())
            .map_err(|e| AnastasisError::Storage(e.to_string()))?
        {
            return Ok(());
        }
        let record = TruthRecord {
            truth_uuid: *truth_uuid.as_bytes(),
            key_share,
            method_name,
            mime_type,
            encrypted_truth,
            expiration,
        };
        let bytes = bincode::serialize(&record).map_err(|e| AnastasisError::Serialization(e.to_string()))?;
        self.db
            .truths
            .insert(truth_uuid.as_bytes(), bytes)
            .map_err(|e| AnastasisError::Storage(e.to_string()))?;
        Ok(())
    }

    fn get_truth_record(&self, truth_uuid: TruthUuid) -> Result<Option<TruthRecord>, AnastasisError> {
        match self
            .db
            .truths
            .get(truth_uuid.as_bytes())
            .map_err(|e| AnastasisError::Storage(e.to_string()))?
        {
            Some(b) => Ok(Some(
                bincode::deserialize(&b).map_err(|e| AnastasisError::Serialization(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    pub fn get_escrow_challenge(
        &self,
        truth_uuid: TruthUuid,
    ) -> Result<Option<(Vec<u8>, String, String)>, AnastasisError> {
        Ok(self
            .get_truth_record(truth_uuid)?
            .map(|t| (t.encrypted_truth, t.mime_type, t.method_name)))
    }

    pub fn get_key_share(&self, truth_uuid: TruthUuid) -> Result<Option<Vec<u8>>, AnastasisError> {
        Ok(self.get_truth_record(truth_uuid)?.map(|t| t.key_share))
    }

    // ── Payment records ──────────────────────────────────────────────────

    pub fn record_recdoc_payment(
        &self,
        account_pub: AccountPublicKey,
        payment_identifier: PaymentIdentifier,
        amount: Amount,
        post_counter: u32,
        now: Timestamp,
    ) -> Result<(), AnastasisError> {
        (&self.db.accounts, &self.db.recdoc_payments)
            .transaction(|(accounts, payments)| {
                if payments.get(payment_identifier.as_bytes())?.is_some() {
                    return Ok(());
                }
                if accounts.get(account_pub.as_bytes())?.is_none() {
                    let transient = AccountRecord {
                        account_pub: *account_pub.as_bytes(),
                        expiration_date: now + anastasis_core::constants::TRANSIENT_ACCOUNT_LIFETIME,
                        latest_version: 0,
                    };
                    accounts.insert(account_pub.as_bytes().as_slice(), ser(&transient)?)?;
                }
                let record = RecdocPaymentRecord {
                    payment_identifier: *payment_identifier.as_bytes(),
                    account_pub: *account_pub.as_bytes(),
                    amount: amount.clone(),
                    post_counter,
                    creation_date: now,
                    paid: false,
                };
                payments.insert(payment_identifier.as_bytes().as_slice(), ser(&record)?)?;
                Ok(())
            })
            .map_err(map_transaction_error)
    }

    pub fn record_challenge_payment(
        &self,
        truth_uuid: TruthUuid,
        payment_identifier: PaymentIdentifier,
        amount: Amount,
        counter: u32,
        now: Timestamp,
    ) -> Result<(), AnastasisError> {
        let key = challenge_payment_key(truth_uuid.as_bytes(), payment_identifier.as_bytes());
        if self
            .db
            .challenge_payments
            .contains_key(&key[..])
            .map_err(|e| AnastasisError::Storage(e.to_string()))?
        {
            return Ok(());
        }
        let record = ChallengePaymentRecord {
            truth_uuid: *truth_uuid.as_bytes(),
            payment_identifier: *payment_identifier.as_bytes(),
            amount,
            counter,
            creation_date: now,
            paid: false,
            refunded: false,
        };
        let bytes = bincode::serialize(&record).map_err(|e| AnastasisError::Serialization(e.to_string()))?;
        self.db
            .challenge_payments
            .insert(&key[..], bytes)
            .map_err(|e| AnastasisError::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn record_truth_upload_payment(
        &self,
        truth_uuid: TruthUuid,
        amount: Amount,
        expiration: Timestamp,
    ) -> Result<(), AnastasisError> {
        let record = TruthUploadPaymentRecord { truth_uuid: *truth_uuid.as_bytes(), amount, expiration };
        let bytes = bincode::serialize(&record).map_err(|e| AnastasisError::Serialization(e.to_string()))?;
        self.db
            .truth_payments
            .insert(truth_uuid.as_bytes(), bytes)
            .map_err(|e| AnastasisError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Read-only check behind the payment gate's `check_payment_identifier`
    /// (spec.md §4.4): whether a recdoc-payment identifier is paid and,
    /// if so, how many uploads remain.
    pub fn check_recdoc_payment(
        &self,
        payment_identifier: PaymentIdentifier,
    ) -> Result<anastasis_core::PaymentCheck, AnastasisError> {
        let record: Option<RecdocPaymentRecord> = match self
            .db
            .recdoc_payments
            .get(payment_identifier.as_bytes())
            .map_err(|e| AnastasisError::Storage(e.to_string()))?
        {
            Some(b) => Some(bincode::deserialize(&b).map_err(|e| AnastasisError::Serialization(e.to_string()))?),
            None => None,
        };
        Ok(match record {
            None => anastasis_core::PaymentCheck::NoResults,
            Some(r) if !r.paid => anastasis_core::PaymentCheck::NoResults,
            Some(r) if r.post_counter > 0 => anastasis_core::PaymentCheck::Paid { counter: r.post_counter },
            Some(_) => anastasis_core::PaymentCheck::PaidExhausted,
        })
    }

    /// Read-only check behind the payment gate's `check_challenge_payment`
    /// (spec.md §4.4).
    pub fn check_challenge_payment(
        &self,
        truth_uuid: TruthUuid,
        payment_identifier: PaymentIdentifier,
    ) -> Result<anastasis_core::PaymentCheck, AnastasisError> {
        let key = challenge_payment_key(truth_uuid.as_bytes(), payment_identifier.as_bytes());
        let record: Option<ChallengePaymentRecord> = match self
            .db
            .challenge_payments
            .get(&key[..])
            .map_err(|e| AnastasisError::Storage(e.to_string()))?
        {
            Some(b) => Some(bincode::deserialize(&b).map_err(|e| AnastasisError::Serialization(e.to_string()))?),
            None => None,
        };
        Ok(match record {
            None => anastasis_core::PaymentCheck::NoResults,
            Some(r) if !r.paid => anastasis_core::PaymentCheck::NoResults,
            Some(r) if r.counter > 0 => anastasis_core::PaymentCheck::Paid { counter: r.counter },
            Some(_) => anastasis_core::PaymentCheck::PaidExhausted,
        })
    }

    /// Marks a pending challenge payment as paid, idempotently. The
    /// actual proof-of-payment verification (the Taler merchant backend
    /// confirming the wire/coin payment) is outside this core's scope;
    /// the gate calls this once that confirmation has happened.
    pub fn confirm_challenge_payment(
        &self,
        truth_uuid: TruthUuid,
        payment_identifier: PaymentIdentifier,
    ) -> Result<(), AnastasisError> {
        let key = challenge_payment_key(truth_uuid.as_bytes(), payment_identifier.as_bytes());
        (&self.db.challenge_payments,)
            .transaction(|(payments,)| {
                let mut record: ChallengePaymentRecord = match payments.get(&key[..])? {
                    Some(b) => de(&b)?,
                    None => {
                        return Err(abort(AnastasisError::UnknownPaymentIdentifier(
                            payment_identifier.to_hex(),
                        )))
                    }
                };
                if !record.paid {
                    record.paid = true;
                    payments.insert(&key[..], ser(&record)?)?;
                }
                Ok(())
            })
            .map_err(map_transaction_error)
    }

    // ── Account lifetime ─────────────────────────────────────────────────

    pub fn increment_lifetime(
        &self,
        account_pub: AccountPublicKey,
        payment_identifier: PaymentIdentifier,
        lifetime: anastasis_core::time::Duration,
        now: Timestamp,
    ) -> Result<Timestamp, AnastasisError> {
        (&self.db.accounts, &self.db.recdoc_payments)
            .transaction(|(accounts, payments)| {
                let mut payment: RecdocPaymentRecord = match payments.get(payment_identifier.as_bytes())? {
                    Some(b) => de(&b)?,
                    None => {
                        return Err(abort(AnastasisError::UnknownPaymentIdentifier(
                            payment_identifier.to_hex(),
                        )))
                    }
                };

                let account: Option<AccountRecord> = match accounts.get(account_pub.as_bytes())? {
                    Some(b) => Some(de(&b)?),
                    None => None,
                };

                if payment.paid {
                    let paid_until = account.map(|a| a.expiration_date).unwrap_or(now);
                    return Ok(paid_until);
                }

                payment.paid = true;
                payments.insert(payment_identifier.as_bytes().as_slice(), ser(&payment)?)?;

                let updated = match account {
                    Some(mut a) => {
                        a.expiration_date = a.expiration_date + lifetime;
                        a
                    }
                    None => AccountRecord {
                        account_pub: *account_pub.as_bytes(),
                        expiration_date: now + lifetime,
                        latest_version: 0,
                    },
                };
                let paid_until = updated.expiration_date;
                accounts.insert(account_pub.as_bytes().as_slice(), ser(&updated)?)?;
                Ok(paid_until)
            })
            .map_err(map_transaction_error)
    }

    pub fn update_lifetime(
        &self,
        account_pub: AccountPublicKey,
        payment_identifier: PaymentIdentifier,
        eol: Timestamp,
        now: Timestamp,
    ) -> Result<Timestamp, AnastasisError> {
        (&self.db.accounts, &self.db.recdoc_payments)
            .transaction(|(accounts, payments)| {
                let mut payment: RecdocPaymentRecord = match payments.get(payment_identifier.as_bytes())? {
                    Some(b) => de(&b)?,
                    None => {
                        return Err(abort(AnastasisError::UnknownPaymentIdentifier(
                            payment_identifier.to_hex(),
                        )))
                    }
                };
                let account: Option<AccountRecord> = match accounts.get(account_pub.as_bytes())? {
                    Some(b) => Some(de(&b)?),
                    None => None,
                };

                if payment.paid {
                    let paid_until = account.map(|a| a.expiration_date).unwrap_or(now);
                    return Ok(paid_until);
                }

                payment.paid = true;
                payments.insert(payment_identifier.as_bytes().as_slice(), ser(&payment)?)?;

                let updated = match account {
                    Some(mut a) => {
                        if eol > a.expiration_date {
                            a.expiration_date = eol;
                        }
                        a
                    }
                    None => AccountRecord {
                        account_pub: *account_pub.as_bytes(),
                        expiration_date: eol,
                        latest_version: 0,
                    },
                };
                let paid_until = updated.expiration_date;
                accounts.insert(account_pub.as_bytes().as_slice(), ser(&updated)?)?;
                Ok(paid_until)
            })
            .map_err(map_transaction_error)
    }

    // ── Challenge codes ──────────────────────────────────────────────────

    fn get_challenge_codes(&self, truth_uuid: TruthUuid) -> Result<Vec<ChallengeCodeRecord>, AnastasisError> {
        match self
            .db
            .challenge_codes
            .get(truth_uuid.as_bytes())
            .map_err(|e| AnastasisError::Storage(e.to_string()))?
        {
            Some(b) => bincode::deserialize(&b).map_err(|e| AnastasisError::Serialization(e.to_string())),
            None => Ok(Vec::new()),
        }
    }

    pub fn verify_challenge_code(
        &self,
        truth_uuid: TruthUuid,
        hashed_code: [u8; 32],
        now: Timestamp,
    ) -> Result<ChallengeCodeStatus, AnastasisError> {
        (&self.db.challenge_codes,)
            .transaction(|(codes,)| {
                let mut list: Vec<ChallengeCodeRecord> = match codes.get(truth_uuid.as_bytes())? {
                    Some(b) => de(&b)?,
                    None => Vec::new(),
                };

                let mut eligible_seen = false;
                let mut matched: Option<(usize, ChallengeCodeRecord)> = None;
                let mut dirty = false;

                for (idx, rec) in list.iter().enumerate() {
                    if rec.expiration_date.is_past(now) || rec.retry_counter == 0 {
                        continue;
                    }
                    eligible_seen = true;
                    if hash_challenge_code(ChallengeCode::new(rec.code)) == hashed_code {
                        matched = Some((idx, rec.clone()));
                        break;
                    }
                }

                if let Some((_, rec)) = &matched {
                    return Ok(ChallengeCodeStatus::Valid {
                        code: ChallengeCode::new(rec.code),
                        satisfied: rec.satisfied,
                    });
                }

                if !eligible_seen {
                    return Ok(ChallengeCodeStatus::NoResults);
                }

                for rec in list.iter_mut() {
                    if !rec.expiration_date.is_past(now) && rec.retry_counter > 0 {
                        rec.retry_counter -= 1;
                        dirty = true;
                    }
                }
                if dirty {
                    codes.insert(truth_uuid.as_bytes().as_slice(), ser(&list)?)?;
                }
                Ok(ChallengeCodeStatus::Mismatch)
            })
            .map_err(map_transaction_error)
    }

    pub fn mark_challenge_code_satisfied(
        &self,
        truth_uuid: TruthUuid,
        code: ChallengeCode,
    ) -> Result<(), AnastasisError> {
        (&self.db.challenge_codes,)
            .transaction(|(codes,)| {
                let mut list: Vec<ChallengeCodeRecord> = match codes.get(truth_uuid.as_bytes())? {
                    Some(b) => de(&b)?,
                    None => return Ok(()),
                };
                let latest = list
                    .iter_mut()
                    .filter(|r| r.code == code.0)
                    .max_by_key(|r| r.creation_date.0);
                if let Some(rec) = latest {
                    if !rec.satisfied {
                        rec.satisfied = true;
                        codes.insert(truth_uuid.as_bytes().as_slice(), ser(&list)?)?;
                    }
                }
                Ok(())
            })
            .map_err(map_transaction_error)
    }

    pub fn test_challenge_code_satisfied(
        &self,
        truth_uuid: TruthUuid,
        code: ChallengeCode,
        after_ts: Timestamp,
    ) -> Result<bool, AnastasisError> {
        let list = self.get_challenge_codes(truth_uuid)?;
        Ok(list
            .iter()
            .any(|r| r.code == code.0 && r.satisfied && r.creation_date > after_ts))
    }

    pub fn create_challenge_code(
        &self,
        truth_uuid: TruthUuid,
        rotation_period: anastasis_core::time::Duration,
        validity_period: anastasis_core::time::Duration,
        retry_counter: u32,
        now: Timestamp,
    ) -> Result<ChallengeCodeCreated, AnastasisError> {
        (&self.db.challenge_codes,)
            .transaction(|(codes,)| {
                let mut list: Vec<ChallengeCodeRecord> = match codes.get(truth_uuid.as_bytes())? {
                    Some(b) => de(&b)?,
                    None => Vec::new(),
                };

                let rotation_floor = now - rotation_period;
                let live = list
                    .iter()
                    .filter(|r| r.creation_date > rotation_floor && !r.expiration_date.is_past(now))
                    .max_by_key(|r| r.creation_date.0)
                    .cloned();

                if let Some(rec) = live {
                    return Ok(if rec.retry_counter > 0 {
                        ChallengeCodeCreated::Existing {
                            code: ChallengeCode::new(rec.code),
                            retransmission_date: rec.retransmission_date,
                        }
                    } else {
                        ChallengeCodeCreated::Exhausted
                    });
                }

                // Drop dead weight: candidates both expired and exhausted
                // will never be selected again.
                list.retain(|r| !(r.expiration_date.is_past(now) && r.retry_counter == 0));

                let mut raw = [0u8; 8];
                rand::thread_rng().fill_bytes(&mut raw);
                let code = ChallengeCode::new(u64::from_be_bytes(raw));

                let record = ChallengeCodeRecord {
                    truth_uuid: *truth_uuid.as_bytes(),
                    code: code.0,
                    creation_date: now,
                    expiration_date: now + validity_period,
                    retry_counter,
                    retransmission_date: Timestamp::ZERO,
                    satisfied: false,
                };
                list.push(record);
                codes.insert(truth_uuid.as_bytes().as_slice(), ser(&list)?)?;

                Ok(ChallengeCodeCreated::Fresh { code, retransmission_date: Timestamp::ZERO })
            })
            .map_err(map_transaction_error)
    }

    /// `payment_identifier = None` marks a free method's code as sent
    /// without touching any counter; `Some(pid)` decrements the matching
    /// challenge-payment counter if one exists. spec.md §9 flags the
    /// original's `challengepayment_dec_counter` for conflating these two
    /// cases; this split is the rewrite's resolution.
    pub fn mark_challenge_sent(
        &self,
        truth_uuid: TruthUuid,
        code: ChallengeCode,
        payment_identifier: Option<PaymentIdentifier>,
        now: Timestamp,
    ) -> Result<(), AnastasisError> {
        (&self.db.challenge_codes,)
            .transaction(|(codes,)| {
                let mut list: Vec<ChallengeCodeRecord> = match codes.get(truth_uuid.as_bytes())? {
                    Some(b) => de(&b)?,
                    None => return Ok(()),
                };
                let latest = list
                    .iter_mut()
                    .filter(|r| r.code == code.0)
                    .max_by_key(|r| r.creation_date.0);
                if let Some(rec) = latest {
                    rec.retransmission_date = now;
                    codes.insert(truth_uuid.as_bytes().as_slice(), ser(&list)?)?;
                }
                Ok(())
            })
            .map_err(map_transaction_error)?;

        let Some(pid) = payment_identifier else {
            return Ok(());
        };

        let key = challenge_payment_key(truth_uuid.as_bytes(), pid.as_bytes());
        (&self.db.challenge_payments,)
            .transaction(|(payments,)| {
                let mut payment: ChallengePaymentRecord = match payments.get(&key[..])? {
                    Some(b) => de(&b)?,
                    None => return Ok(()),
                };
                if payment.counter > 0 {
                    payment.counter -= 1;
                    payments.insert(&key[..], ser(&payment)?)?;
                }
                Ok(())
            })
            .map_err(map_transaction_error)
    }

    // ── Wire-transfer ingest ─────────────────────────────────────────────

    pub fn record_auth_iban_payment(
        &self,
        wire_reference: u64,
        subject: String,
        amount: Amount,
        debit_account: String,
        credit_account: String,
        execution_date: Timestamp,
    ) -> Result<(), AnastasisError> {
        let key = wire_reference.to_be_bytes();
        let cursor_key = format!("wire_cursor:{}", anastasis_crypto::blake3_32(credit_account.as_bytes())
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<String>());

        (&self.db.inbound_wire,)
            .transaction(|(wire,)| {
                if wire.get(&key[..])?.is_some() {
                    return Err(abort(AnastasisError::HardError(format!(
                        "duplicate wire_reference {wire_reference}"
                    ))));
                }
                let record = InboundWireRecord {
                    wire_reference,
                    wire_subject: subject.clone(),
                    amount: amount.clone(),
                    debit_account: debit_account.clone(),
                    credit_account: credit_account.clone(),
                    execution_date,
                };
                wire.insert(&key[..], ser(&record)?)?;
                Ok(())
            })
            .map_err(map_transaction_error)?;

        self.db.put_meta(&cursor_key, &wire_reference.to_be_bytes())
    }

    pub fn get_last_auth_iban_payment_row(&self, credit_account: &str) -> Result<u64, AnastasisError> {
        let cursor_key = format!("wire_cursor:{}", anastasis_crypto::blake3_32(credit_account.as_bytes())
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<String>());
        match self.db.get_meta(&cursor_key)? {
            Some(bytes) if bytes.len() == 8 => {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&bytes);
                Ok(u64::from_be_bytes(arr))
            }
            _ => Ok(0),
        }
    }

    /// Iterate committed transfers to `debit_account` with
    /// `execution_date >= earliest`, calling `cb(amount, subject)` until
    /// it returns `true`. Read-only: the inbound-wire tree never needs a
    /// scan-capable transaction since this is the one caller that scans.
    pub fn test_auth_iban_payment(
        &self,
        debit_account: &str,
        earliest: Timestamp,
        mut cb: impl FnMut(&Amount, &str) -> bool,
    ) -> Result<bool, AnastasisError> {
        for item in self.db.inbound_wire.iter() {
            let (_, bytes) = item.map_err(|e| AnastasisError::Storage(e.to_string()))?;
            let record: InboundWireRecord =
                bincode::deserialize(&bytes).map_err(|e| AnastasisError::Serialization(e.to_string()))?;
            if record.debit_account != debit_account {
                continue;
            }
            if record.execution_date < earliest {
                continue;
            }
            if cb(&record.amount, &record.wire_subject) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    // ── Garbage collection ───────────────────────────────────────────────

    /// Deletes accounts past `expire_backups_before` (cascading to their
    /// recovery documents and pending payments), stale unpaid payment
    /// records, and expired challenge codes. Not run under a single
    /// SERIALIZABLE transaction: GC is maintenance, not a client-facing
    /// operation, and each deletion is independently idempotent.
    pub fn gc(
        &self,
        expire_backups_before: Timestamp,
        expire_payments_before: Timestamp,
    ) -> Result<(), AnastasisError> {
        let mut dead_accounts = Vec::new();
        for item in self.db.accounts.iter() {
            let (key, bytes) = item.map_err(|e| AnastasisError::Storage(e.to_string()))?;
            let account: AccountRecord =
                bincode::deserialize(&bytes).map_err(|e| AnastasisError::Serialization(e.to_string()))?;
            if account.expiration_date.is_past(expire_backups_before) {
                dead_accounts.push((key.to_vec(), account));
            }
        }
        for (key, account) in &dead_accounts {
            self.db.accounts.remove(&key[..]).map_err(|e| AnastasisError::Storage(e.to_string()))?;
            let prefix = account.account_pub;
            let doc_keys: Vec<_> = self
                .db
                .recovery_documents
                .scan_prefix(prefix)
                .keys()
                .filter_map(|k| k.ok())
                .collect();
            for k in doc_keys {
                self.db
                    .recovery_documents
                    .remove(k)
                    .map_err(|e| AnastasisError::Storage(e.to_string()))?;
            }
        }

        let mut dead_payments = Vec::new();
        for item in self.db.recdoc_payments.iter() {
            let (key, bytes) = item.map_err(|e| AnastasisError::Storage(e.to_string()))?;
            let payment: RecdocPaymentRecord =
                bincode::deserialize(&bytes).map_err(|e| AnastasisError::Serialization(e.to_string()))?;
            if !payment.paid && payment.creation_date.is_past(expire_payments_before) {
                dead_payments.push(key.to_vec());
            }
        }
        for key in dead_payments {
            self.db
                .recdoc_payments
                .remove(key)
                .map_err(|e| AnastasisError::Storage(e.to_string()))?;
        }

        let mut dead_challenge_payments = Vec::new();
        for item in self.db.challenge_payments.iter() {
            let (key, bytes) = item.map_err(|e| AnastasisError::Storage(e.to_string()))?;
            let payment: ChallengePaymentRecord =
                bincode::deserialize(&bytes).map_err(|e| AnastasisError::Serialization(e.to_string()))?;
            if (!payment.paid || payment.refunded) && payment.creation_date.is_past(expire_payments_before) {
                dead_challenge_payments.push(key.to_vec());
            }
        }
        for key in dead_challenge_payments {
            self.db
                .challenge_payments
                .remove(key)
                .map_err(|e| AnastasisError::Storage(e.to_string()))?;
        }

        let mut updates = Vec::new();
        for item in self.db.challenge_codes.iter() {
            let (key, bytes) = item.map_err(|e| AnastasisError::Storage(e.to_string()))?;
            let list: Vec<ChallengeCodeRecord> =
                bincode::deserialize(&bytes).map_err(|e| AnastasisError::Serialization(e.to_string()))?;
            let retained: Vec<_> = list
                .into_iter()
                .filter(|r| !r.expiration_date.is_past(expire_backups_before))
                .collect();
            updates.push((key.to_vec(), retained));
        }
        for (key, retained) in updates {
            if retained.is_empty() {
                self.db
                    .challenge_codes
                    .remove(&key[..])
                    .map_err(|e| AnastasisError::Storage(e.to_string()))?;
            } else {
                let bytes =
                    bincode::serialize(&retained).map_err(|e| AnastasisError::Serialization(e.to_string()))?;
                self.db
                    .challenge_codes
                    .insert(&key[..], bytes)
                    .map_err(|e| AnastasisError::Storage(e.to_string()))?;
            }
        }

        warn!(
            accounts_deleted = dead_accounts.len(),
            "garbage collection pass complete"
        );
        Ok(())
    }

    // ── Events ────────────────────────────────────────────────────────────

    pub fn event_listen(&self, spec: EventSpec) -> (ListenHandle, mpsc::Receiver<Vec<u8>>) {
        self.events.listen(spec)
    }

    pub fn event_listen_cancel(&self, handle: ListenHandle) {
        self.events.cancel(handle)
    }

    pub fn event_notify(&self, spec: &EventSpec, extra: &[u8]) {
        self.events.notify(spec, extra)
    }
}
