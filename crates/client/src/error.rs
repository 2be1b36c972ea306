//! Client errors and the SDK-wide error type.
//!
//! Failures fall into three tiers that are never merged: local input
//! problems (validation, encoding, malformed keys), signing problems, and
//! network or chain problems. [`SdkError`] carries any of them and reports
//! which tier it came from.

use crate::config::ConfigError;
use bumo_core::{CryptoError, EncodingError, SigningError, ValidationError};
use std::time::Duration;
use thiserror::Error;

/// Numeric codes reported by BUMO nodes and by the client itself.
pub mod codes {
    pub const SUCCESS: i64 = 0;
    /// Node: account, block or transaction does not exist.
    pub const NOT_EXIST: i64 = 4;
    /// Node: nonce is not the account's current nonce plus one.
    pub const BAD_SEQUENCE: i64 = 99;
    /// Node: source balance would fall below the base reserve.
    pub const ACCOUNT_LOW_RESERVE: i64 = 100;
    /// Node: fee limit below the transaction's actual cost.
    pub const FEE_NOT_ENOUGH: i64 = 111;

    pub const INVALID_ADDRESS: i64 = 11006;
    pub const NETWORK_FAILED: i64 = 11007;
    pub const INVALID_HASH: i64 = 11055;
    pub const TIMEOUT: i64 = 11060;
    pub const INVALID_CONFIG: i64 = 11061;
    pub const SYSTEM_ERROR: i64 = 20000;
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("account {0} does not exist")]
    AccountNotFound(String),

    #[error("block {0} does not exist")]
    BlockNotFound(String),

    #[error("transaction {0} does not exist")]
    TransactionNotFound(String),

    #[error("invalid address {0:?}")]
    InvalidAddress(String),

    #[error("invalid transaction hash {0:?}")]
    InvalidHash(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("node responded with HTTP {0}")]
    HttpStatus(u16),

    #[error("unexpected response from node: {0}")]
    Decode(String),

    #[error("node error {code}: {desc}")]
    Node { code: i64, desc: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ClientError {
    pub fn code(&self) -> i64 {
        match self {
            ClientError::AccountNotFound(_)
            | ClientError::BlockNotFound(_)
            | ClientError::TransactionNotFound(_) => codes::NOT_EXIST,
            ClientError::InvalidAddress(_) => codes::INVALID_ADDRESS,
            ClientError::InvalidHash(_) => codes::INVALID_HASH,
            ClientError::Timeout(_) => codes::TIMEOUT,
            ClientError::Http(_) | ClientError::HttpStatus(_) => codes::NETWORK_FAILED,
            ClientError::Decode(_) => codes::SYSTEM_ERROR,
            ClientError::Node { code, .. } => *code,
            ClientError::Config(_) => codes::INVALID_CONFIG,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Which stage of the pipeline an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorTier {
    /// Rejected before anything was signed or sent.
    Local,
    Signing,
    /// Network failure or a rejection by the chain.
    Remote,
}

/// Any error the SDK can produce.
#[derive(Debug, Error)]
pub enum SdkError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl SdkError {
    pub fn tier(&self) -> ErrorTier {
        match self {
            SdkError::Validation(_) | SdkError::Encoding(_) | SdkError::Crypto(_) => {
                ErrorTier::Local
            }
            SdkError::Signing(_) => ErrorTier::Signing,
            SdkError::Client(_) => ErrorTier::Remote,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            SdkError::Validation(e) => e.code(),
            SdkError::Encoding(e) => e.code(),
            SdkError::Crypto(e) => e.code(),
            SdkError::Signing(e) => e.code(),
            SdkError::Client(e) => e.code(),
        }
    }
}
