//! On-disk record shapes. Each mirrors one entity from the data model,
//! serialized with bincode.

use serde::{Deserialize, Serialize};

use anastasis_core::{Amount, Timestamp};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccountRecord {
    pub account_pub: [u8; 32],
    pub expiration_date: Timestamp,
    pub latest_version: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecoveryDocumentRecord {
    pub account_pub: [u8; 32],
    pub version: u32,
    pub account_sig: [u8; 64],
    pub recovery_data_hash: [u8; 64],
    pub recovery_data: Vec<u8>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TruthRecord {
    pub truth_uuid: [u8; 32],
    pub key_share: Vec<u8>,
    pub method_name: String,
    pub mime_type: String,
    pub encrypted_truth: Vec<u8>,
    pub expiration: Timestamp,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TruthUploadPaymentRecord {
    pub truth_uuid: [u8; 32],
    pub amount: Amount,
    pub expiration: Timestamp,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecdocPaymentRecord {
    pub payment_identifier: [u8; 32],
    pub account_pub: [u8; 32],
    pub amount: Amount,
    pub post_counter: u32,
    pub creation_date: Timestamp,
    pub paid: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChallengePaymentRecord {
    pub truth_uuid: [u8; 32],
    pub payment_identifier: [u8; 32],
    pub amount: Amount,
    pub counter: u32,
    pub creation_date: Timestamp,
    pub paid: bool,
    pub refunded: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChallengeCodeRecord {
    pub truth_uuid: [u8; 32],
    pub code: u64,
    pub creation_date: Timestamp,
    pub expiration_date: Timestamp,
    pub retry_counter: u32,
    pub retransmission_date: Timestamp,
    pub satisfied: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InboundWireRecord {
    pub wire_reference: u64,
    pub wire_subject: String,
    pub amount: Amount,
    pub debit_account: String,
    pub credit_account: String,
    pub execution_date: Timestamp,
}
