//! Values returned by [`ChainClient`](crate::ChainClient).

use bumo_core::{Address, Amount, Hash, Keypair};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A freshly generated account in its text encodings.
#[derive(Clone, Serialize)]
pub struct AccountKeys {
    pub private_key: String,
    pub public_key: String,
    pub address: String,
}

impl AccountKeys {
    pub fn from_keypair(keypair: &Keypair) -> Self {
        Self {
            private_key: keypair.private_key().encode(),
            public_key: keypair.public_key.encode(),
            address: keypair.address().to_string(),
        }
    }
}

impl fmt::Debug for AccountKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountKeys")
            .field("private_key", &"<redacted>")
            .field("public_key", &self.public_key)
            .field("address", &self.address)
            .finish()
    }
}

/// Balance of one issued asset held by an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBalance {
    pub code: String,
    pub issuer: Address,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub address: Address,
    pub balance: Amount,
    /// Nonce of the last transaction this account sent; zero if none.
    pub nonce: u64,
    pub assets: Vec<AssetBalance>,
    pub is_activated: bool,
}

/// Result of a nonce query. The nonce is rendered as a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceInfo {
    #[serde(with = "u64_string")]
    pub nonce: u64,
}

impl NonceInfo {
    /// Nonce the account's next transaction must carry.
    pub fn next(&self) -> u64 {
        self.nonce.saturating_add(1)
    }
}

mod u64_string {
    use super::*;

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Which ledger to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockRef {
    #[default]
    Latest,
    Number(u64),
}

impl From<u64> for BlockRef {
    fn from(n: u64) -> Self {
        BlockRef::Number(n)
    }
}

impl From<Option<u64>> for BlockRef {
    fn from(n: Option<u64>) -> Self {
        n.map_or(BlockRef::Latest, BlockRef::Number)
    }
}

impl fmt::Display for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockRef::Latest => f.write_str("latest"),
            BlockRef::Number(n) => write!(f, "{}", n),
        }
    }
}

/// A closed ledger header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub number: u64,
    pub hash: String,
    pub previous_hash: String,
    /// Close time in microseconds since the Unix epoch.
    pub close_time: i64,
    pub tx_count: u64,
    pub version: u64,
}

impl BlockInfo {
    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_micros(self.close_time)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorInfo {
    pub address: String,
    pub pledge_coin_amount: Amount,
}

/// Block reward and its split across validators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardInfo {
    pub block_reward: Amount,
    pub validators_reward: BTreeMap<String, Amount>,
}

/// Fee parameters in effect at a ledger. Units are defined by the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeInfo {
    pub base_reserve: Amount,
    pub gas_price: Amount,
}

/// A transaction as recorded in a closed ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInfo {
    pub hash: String,
    pub ledger_seq: u64,
    pub close_time: i64,
    /// Zero if the transaction applied; otherwise the chain's failure code.
    pub error_code: i64,
    pub error_desc: String,
    pub actual_fee: Amount,
    pub source_address: String,
    pub nonce: u64,
    pub fee_limit: Amount,
    pub gas_price: Amount,
    pub metadata: Option<String>,
    pub operation_count: usize,
}

/// What the node said when a transaction was handed to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Accepted into the node's pending set. Not yet confirmed.
    Accepted { hash: String },
    /// Refused outright; it will never be included.
    Rejected {
        hash: String,
        code: i64,
        desc: String,
    },
    /// No answer within the timeout. The transaction may or may not have
    /// reached the network; query by hash before resubmitting.
    Unknown { hash: String },
}

impl SubmissionStatus {
    pub fn hash(&self) -> &str {
        match self {
            SubmissionStatus::Accepted { hash }
            | SubmissionStatus::Rejected { hash, .. }
            | SubmissionStatus::Unknown { hash } => hash,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmissionStatus::Accepted { .. })
    }
}

/// A signed transaction that has been handed to the node. Produced only by
/// [`ChainClient::submit`](crate::ChainClient::submit).
#[derive(Debug, Clone)]
pub struct SubmittedTransaction {
    pub(crate) hash: Hash,
    pub(crate) status: SubmissionStatus,
}

impl SubmittedTransaction {
    pub fn hash(&self) -> &Hash {
        &self.hash
    }

    pub fn status(&self) -> &SubmissionStatus {
        &self.status
    }
}

/// Final state of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransactionOutcome {
    Confirmed(TransactionInfo),
    Rejected {
        hash: String,
        code: i64,
        desc: String,
    },
}
