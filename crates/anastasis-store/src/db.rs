use std::path::Path;

use anastasis_core::AnastasisError;

/// Persistent state database backed by sled (pure-Rust, no C dependencies):
/// one named tree per entity, bincode-serialized values.
///
/// Named trees:
///   accounts            — account_pub (32B)            → bincode(AccountRecord)
///   recovery_documents   — account_pub || version_be(4) → bincode(RecoveryDocumentRecord)
///   truths               — truth_uuid (32B)             → bincode(TruthRecord)
///   truth_payments       — truth_uuid (32B)             → bincode(TruthUploadPaymentRecord)
///   recdoc_payments      — payment_identifier (32B)     → bincode(RecdocPaymentRecord)
///   challenge_payments   — truth_uuid || payment_identifier (64B) → bincode(ChallengePaymentRecord)
///   challenge_codes      — truth_uuid (32B)             → bincode(Vec<ChallengeCodeRecord>)
///   inbound_wire         — wire_reference_be(8)         → bincode(InboundWireRecord)
///   meta                 — utf8 key bytes               → raw bytes (cursors, counters)
///
/// `challenge_codes` denormalizes every live candidate for a truth into a
/// single row (a small `Vec`) instead of one row per code. spec.md's
/// read pattern for that entity is always "all candidates for this
/// truth_uuid", never a point lookup by code, and `sled`'s transactional
/// trees only support point operations (`get`/`insert`/`remove`, no
/// range scan) — so a per-truth list is both what every caller wants and
/// the only shape usable from inside a multi-tree transaction.
pub struct StateDb {
    db: sled::Db,
    pub(crate) accounts: sled::Tree,
    pub(crate) recovery_documents: sled::Tree,
    pub(crate) truths: sled::Tree,
    pub(crate) truth_payments: sled::Tree,
    pub(crate) recdoc_payments: sled::Tree,
    pub(crate) challenge_payments: sled::Tree,
    pub(crate) challenge_codes: sled::Tree,
    pub(crate) inbound_wire: sled::Tree,
    pub(crate) meta: sled::Tree,
}

impl StateDb {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AnastasisError> {
        let db = sled::open(path).map_err(|e| AnastasisError::Storage(e.to_string()))?;
        Self::from_db(db)
    }

    /// Open a temporary, in-memory database. Used by tests and by
    /// `dbinit`'s `-r` (drop-then-recreate) path.
    pub fn open_temporary() -> Result<Self, AnastasisError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| AnastasisError::Storage(e.to_string()))?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self, AnastasisError> {
        let open = |name: &str| {
            db.open_tree(name)
                .map_err(|e| AnastasisError::Storage(e.to_string()))
        };
        Ok(Self {
            accounts: open("accounts")?,
            recovery_documents: open("recovery_documents")?,
            truths: open("truths")?,
            truth_payments: open("truth_payments")?,
            recdoc_payments: open("recdoc_payments")?,
            challenge_payments: open("challenge_payments")?,
            challenge_codes: open("challenge_codes")?,
            inbound_wire: open("inbound_wire")?,
            meta: open("meta")?,
            db,
        })
    }

    /// Drop every named tree's contents. Backs `dbinit -r`.
    pub fn drop_tables(&self) -> Result<(), AnastasisError> {
        for tree in [
            &self.accounts,
            &self.recovery_documents,
            &self.truths,
            &self.truth_payments,
            &self.recdoc_payments,
            &self.challenge_payments,
            &self.challenge_codes,
            &self.inbound_wire,
            &self.meta,
        ] {
            tree.clear().map_err(|e| AnastasisError::Storage(e.to_string()))?;
        }
        Ok(())
    }

    pub fn flush(&self) -> Result<(), AnastasisError> {
        self.db.flush().map_err(|e| AnastasisError::Storage(e.to_string()))?;
        Ok(())
    }

    pub(crate) fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, AnastasisError> {
        self.meta
            .get(key.as_bytes())
            .map(|v| v.map(|iv| iv.to_vec()))
            .map_err(|e| AnastasisError::Storage(e.to_string()))
    }

    pub(crate) fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), AnastasisError> {
        self.meta
            .insert(key.as_bytes(), value)
            .map_err(|e| AnastasisError::Storage(e.to_string()))?;
        Ok(())
    }
}

pub(crate) fn recovery_document_key(account_pub: &[u8; 32], version: u32) -> [u8; 36] {
    let mut key = [0u8; 36];
    key[..32].copy_from_slice(account_pub);
    key[32..].copy_from_slice(&version.to_be_bytes());
    key
}

pub(crate) fn challenge_payment_key(truth_uuid: &[u8; 32], payment_identifier: &[u8; 32]) -> [u8; 64] {
    let mut key = [0u8; 64];
    key[..32].copy_from_slice(truth_uuid);
    key[32..].copy_from_slice(payment_identifier);
    key
}
