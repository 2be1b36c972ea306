//! Network side of the BUMO client SDK.
//!
//! [`ChainClient`] talks JSON over HTTP to a single BUMO node. Offline work
//! (keys, operations, blobs, signing) lives in `bumo_core`.

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod types;

pub use client::ChainClient;
pub use config::{ClientConfig, ConfigError};
pub use envelope::Envelope;
pub use error::{ClientError, ErrorTier, SdkError};
pub use types::{
    AccountInfo, AccountKeys, AssetBalance, BlockInfo, BlockRef, FeeInfo, NonceInfo, RewardInfo,
    SubmissionStatus, SubmittedTransaction, TransactionInfo, TransactionOutcome, ValidatorInfo,
};
