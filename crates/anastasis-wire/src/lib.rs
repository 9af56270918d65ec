pub mod bank;
pub mod ingest;
pub mod subject;

pub use bank::{BankClient, CreditTransfer, FixtureBankClient};
pub use ingest::WireIngester;
