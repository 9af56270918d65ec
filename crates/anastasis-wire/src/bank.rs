//! Abstract bank API client (spec.md §1: "bank API adapter beyond the
//! abstract 'credit history' call" is explicitly out of scope — this
//! crate only defines the contract the ingester drives).

use anastasis_core::{AnastasisError, Amount, Timestamp};
use async_trait::async_trait;

/// One inbound credit as reported by the bank.
#[derive(Clone, Debug)]
pub struct CreditTransfer {
    pub wire_reference: u64,
    pub subject: String,
    pub amount: Amount,
    pub debit_account: String,
    pub credit_account: String,
    pub execution_date: Timestamp,
}

/// The abstract bank collaborator the ingester polls. Concrete
/// implementations (a real bank's REST API, a test double) live outside
/// this crate's scope; this trait is the seam.
#[async_trait]
pub trait BankClient: Send + Sync {
    /// Fetch up to `batch` transfers credited to this account strictly
    /// after `after_row`, in ascending `wire_reference` order, long-polling
    /// up to `timeout` if none are immediately available. An empty
    /// result means "caught up" (possibly returned early, before
    /// `timeout`, if the backend doesn't support long polling).
    async fn credit_history(
        &self,
        after_row: u64,
        batch: u32,
        timeout: anastasis_core::time::Duration,
    ) -> Result<Vec<CreditTransfer>, AnastasisError>;
}

/// Serves a fixed, pre-seeded transfer list. Used by the ingester's own
/// tests and by `helper-authorization-iban -t` against a canned fixture;
/// a real deployment would supply a `BankClient` backed by `reqwest`
/// (already a workspace dependency) talking to the operator's bank.
pub struct FixtureBankClient {
    transfers: Vec<CreditTransfer>,
}

impl FixtureBankClient {
    pub fn new(mut transfers: Vec<CreditTransfer>) -> Self {
        transfers.sort_by_key(|t| t.wire_reference);
        Self { transfers }
    }
}

#[async_trait]
impl BankClient for FixtureBankClient {
    async fn credit_history(
        &self,
        after_row: u64,
        batch: u32,
        _timeout: anastasis_core::time::Duration,
    ) -> Result<Vec<CreditTransfer>, AnastasisError> {
        Ok(self
            .transfers
            .iter()
            .filter(|t| t.wire_reference > after_row)
            .take(batch as usize)
            .cloned()
            .collect())
    }
}
