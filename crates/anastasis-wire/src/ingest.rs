//! Wire-transfer ingestion loop (spec.md §4.3).

use std::sync::Arc;

use anastasis_core::constants::{WIRE_HISTORY_BATCH, WIRE_IDLE_SLEEP_INTERVAL, WIRE_LONGPOLL_TIMEOUT};
use anastasis_core::AnastasisError;
use anastasis_store::{EventSpec, Store};
use tracing::{info, warn};

use crate::bank::BankClient;
use crate::subject::{extract_code, iban_from_payto};

pub struct WireIngester {
    store: Arc<Store>,
    bank: Arc<dyn BankClient>,
    credit_account: String,
    /// `-t`: import whatever is currently pending, then return instead of
    /// looping forever (spec.md §6's `helper-authorization-iban -t`).
    test_mode: bool,
}

impl WireIngester {
    pub fn new(store: Arc<Store>, bank: Arc<dyn BankClient>, credit_account: String, test_mode: bool) -> Self {
        Self { store, bank, credit_account, test_mode }
    }

    /// Runs the ingest loop to completion (test mode) or forever
    /// (production mode) until a fatal error occurs.
    pub async fn run(&self) -> Result<(), AnastasisError> {
        let mut latest_row_off = self.store.get_last_auth_iban_payment_row(&self.credit_account)?;

        loop {
            let transfers = self
                .bank
                .credit_history(latest_row_off, WIRE_HISTORY_BATCH, WIRE_LONGPOLL_TIMEOUT)
                .await?;

            if transfers.is_empty() {
                if self.test_mode {
                    info!("ingest: caught up, exiting (-t mode)");
                    return Ok(());
                }
                tokio::time::sleep(std::time::Duration::from_micros(
                    WIRE_IDLE_SLEEP_INTERVAL.0.max(0) as u64,
                ))
                .await;
                continue;
            }

            for transfer in transfers {
                if transfer.wire_reference <= latest_row_off {
                    return Err(AnastasisError::RowMonotonicityViolation {
                        last: latest_row_off,
                        got: transfer.wire_reference,
                    });
                }

                self.store.record_auth_iban_payment(
                    transfer.wire_reference,
                    transfer.subject.clone(),
                    transfer.amount.clone(),
                    transfer.debit_account.clone(),
                    transfer.credit_account.clone(),
                    transfer.execution_date,
                )?;
                latest_row_off = transfer.wire_reference;

                let Some(code) = extract_code(&transfer.subject) else {
                    warn!(wire_reference = transfer.wire_reference, "no anastasis code in subject, skipping notify");
                    continue;
                };
                let Some(debit_iban) = iban_from_payto(&transfer.debit_account) else {
                    warn!(wire_reference = transfer.wire_reference, "debit account is not an IBAN payto URI, skipping notify");
                    continue;
                };
                let debit_iban_hash = anastasis_crypto::blake3_32(debit_iban.as_bytes());
                let spec = EventSpec::iban_transfer(code, debit_iban_hash);
                self.store.event_notify(&spec, transfer.amount.to_string().as_bytes());
            }
        }
    }

    /// Cursor as of the last persisted transfer; exposed for startup
    /// logging and tests.
    pub fn last_row(&self) -> Result<u64, AnastasisError> {
        self.store.get_last_auth_iban_payment_row(&self.credit_account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::{CreditTransfer, FixtureBankClient};
    use anastasis_core::{Amount, Timestamp};
    use anastasis_store::StateDb;

    fn store() -> Arc<Store> {
        Arc::new(Store::new(Arc::new(StateDb::open_temporary().unwrap())))
    }

    fn transfer(wire_reference: u64, subject: &str, debit: &str) -> CreditTransfer {
        CreditTransfer {
            wire_reference,
            subject: subject.to_string(),
            amount: Amount::new("KUDOS", 10, 0),
            debit_account: debit.to_string(),
            credit_account: "payto://iban/MYCREDITIBAN".to_string(),
            execution_date: Timestamp::now(),
        }
    }

    #[tokio::test]
    async fn ingests_transfers_and_notifies_the_matching_listener() {
        let store = store();
        let debit_iban_hash = anastasis_crypto::blake3_32(b"DE1234567890");
        let (_handle, mut rx) = store.event_listen(EventSpec::iban_transfer(99, debit_iban_hash));

        let bank = Arc::new(FixtureBankClient::new(vec![transfer(
            1,
            "anastasis 99 payment",
            "payto://iban/DE1234567890",
        )]));
        let ingester = WireIngester::new(store.clone(), bank, "payto://iban/MYCREDITIBAN".into(), true);
        ingester.run().await.unwrap();

        assert_eq!(ingester.last_row().unwrap(), 1);
        let notified = rx.try_recv().expect("listener should have been notified");
        assert_eq!(notified, b"KUDOS:10".to_vec());
    }

    #[tokio::test]
    async fn test_mode_exits_once_caught_up_with_no_transfers() {
        let store = store();
        let bank = Arc::new(FixtureBankClient::new(vec![]));
        let ingester = WireIngester::new(store, bank, "payto://iban/MYCREDITIBAN".into(), true);
        ingester.run().await.unwrap();
    }

    #[tokio::test]
    async fn skips_notify_but_still_records_when_subject_has_no_code() {
        let store = store();
        let bank = Arc::new(FixtureBankClient::new(vec![transfer(
            1,
            "thanks",
            "payto://iban/DE1234567890",
        )]));
        let ingester = WireIngester::new(store.clone(), bank, "payto://iban/MYCREDITIBAN".into(), true);
        ingester.run().await.unwrap();
        assert_eq!(ingester.last_row().unwrap(), 1);
    }
}
