//! A `reqwest`-backed `BankClient`, the concrete collaborator
//! `anastasis_wire::BankClient` leaves abstract (spec.md §1: "bank API
//! adapter beyond the abstract 'credit history' call" is out of scope).
//! Talks to a libeufin-style bank access API: `GET
//! {base_url}/accounts/{account}/transactions?delta=...&start=...`.

use std::str::FromStr;

use anastasis_core::{AnastasisError, Amount, Timestamp};
use anastasis_wire::{BankClient, CreditTransfer};
use async_trait::async_trait;
use serde::Deserialize;

pub struct ReqwestBankClient {
    client: reqwest::Client,
    base_url: String,
    credit_account: String,
    basic_auth: Option<(String, Option<String>)>,
}

impl ReqwestBankClient {
    pub fn new(base_url: String, credit_account: String, username: Option<String>, password: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            credit_account,
            basic_auth: username.map(|u| (u, password)),
        }
    }
}

#[derive(Deserialize)]
struct TransactionsResponse {
    transactions: Vec<WireTransactionDto>,
}

#[derive(Deserialize)]
struct WireTransactionDto {
    row_id: u64,
    subject: String,
    amount: String,
    debit_account: String,
    credit_account: String,
    date_s: i64,
}

#[async_trait]
impl BankClient for ReqwestBankClient {
    async fn credit_history(
        &self,
        after_row: u64,
        batch: u32,
        timeout: anastasis_core::time::Duration,
    ) -> Result<Vec<CreditTransfer>, AnastasisError> {
        let url = format!(
            "{}/accounts/{}/transactions?delta={}&start={}&long_poll_ms={}",
            self.base_url.trim_end_matches('/'),
            self.credit_account,
            batch,
            after_row,
            timeout.0 / 1000,
        );
        let mut req = self.client.get(&url);
        if let Some((user, pass)) = &self.basic_auth {
            req = req.basic_auth(user, pass.as_ref());
        }
        let resp = req
            .send()
            .await
            .map_err(|e| AnastasisError::BankClient(e.to_string()))?
            .error_for_status()
            .map_err(|e| AnastasisError::BankClient(e.to_string()))?
            .json::<TransactionsResponse>()
            .await
            .map_err(|e| AnastasisError::BankClient(e.to_string()))?;

        resp.transactions
            .into_iter()
            .map(|t| {
                Ok(CreditTransfer {
                    wire_reference: t.row_id,
                    subject: t.subject,
                    amount: Amount::from_str(&t.amount)?,
                    debit_account: t.debit_account,
                    credit_account: t.credit_account,
                    execution_date: Timestamp::from_secs(t.date_s),
                })
            })
            .collect()
    }
}
