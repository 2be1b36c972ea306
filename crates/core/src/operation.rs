//! Operation builders.
//!
//! Each builder takes caller-supplied strings, validates them and returns a
//! strongly typed [`Operation`]. A builder either returns a complete
//! operation or a [`ValidationError`]; nothing is partially populated.
//!
//! Builders only check what can be known locally. Whether an asset exists,
//! whether the source can afford the amount, and whether a capped asset has
//! room left are decided by the network at submission time.

use crate::amount::{Amount, AmountError};
use crate::crypto::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length of an asset code.
pub const MAX_ASSET_CODE_LEN: usize = 64;
/// Maximum number of decimals an asset may declare.
pub const MAX_DECIMALS: u8 = 8;
/// Maximum size of any metadata string, in bytes.
pub const MAX_METADATA_LEN: usize = 256 * 1024;
/// Maximum size of an asset description, in bytes.
pub const MAX_DESCRIPTION_LEN: usize = 1024;

/// Errors raised by builders before anything touches the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid source address {0:?}")]
    InvalidSourceAddress(String),

    #[error("invalid destination address {0:?}")]
    InvalidDestAddress(String),

    #[error("invalid issuer address {0:?}")]
    InvalidIssuerAddress(String),

    #[error("source address equals destination address")]
    SourceEqualsDest,

    #[error("invalid {field}: {source}")]
    InvalidAmount {
        field: &'static str,
        source: AmountError,
    },

    #[error("invalid asset code {0:?}: expected 1-{max} ASCII letters or digits", max = MAX_ASSET_CODE_LEN)]
    InvalidAssetCode(String),

    #[error("decimals {0} out of range 0-{max}", max = MAX_DECIMALS)]
    InvalidDecimals(u8),

    #[error("issued amount {amount} exceeds total supply {total_supply}")]
    ExceedsTotalSupply { amount: Amount, total_supply: Amount },

    #[error("{field} is {len} bytes, limit is {max}")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

impl ValidationError {
    /// SDK-local numeric code reported in the response envelope.
    pub fn code(&self) -> i64 {
        match self {
            ValidationError::InvalidSourceAddress(_) => 11002,
            ValidationError::InvalidDestAddress(_) => 11003,
            ValidationError::SourceEqualsDest => 11005,
            ValidationError::InvalidAssetCode(_) => 11023,
            ValidationError::InvalidAmount { .. } => 11024,
            ValidationError::InvalidDecimals(_) => 11025,
            ValidationError::ExceedsTotalSupply { .. } => 11026,
            ValidationError::InvalidIssuerAddress(_) => 11027,
            ValidationError::TooLong { .. } => 11028,
        }
    }
}

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Parameters for [`Operation::transfer`].
#[derive(Debug, Clone, Default)]
pub struct TransferParams {
    pub source_address: Option<String>,
    pub dest_address: String,
    pub amount: String,
    pub metadata: Option<String>,
}

/// Parameters for [`Operation::asset_issue`].
#[derive(Debug, Clone, Default)]
pub struct AssetIssueParams {
    pub source_address: Option<String>,
    pub code: String,
    /// `"0"` issues an unlimited asset; anything larger caps the supply.
    pub total_supply: String,
    pub amount: String,
    pub decimals: u8,
    pub description: String,
    pub metadata: Option<String>,
}

/// Parameters for [`Operation::asset_transfer`].
#[derive(Debug, Clone, Default)]
pub struct AssetTransferParams {
    pub source_address: Option<String>,
    pub dest_address: String,
    pub code: String,
    pub issuer: String,
    pub amount: String,
    pub metadata: Option<String>,
}

/// Parameters for [`Operation::account_activate`].
#[derive(Debug, Clone, Default)]
pub struct AccountActivateParams {
    pub source_address: Option<String>,
    pub dest_address: String,
    pub init_balance: String,
}

/// Native currency payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub source_address: Option<Address>,
    pub dest_address: Address,
    pub amount: Amount,
    pub metadata: Option<String>,
}

/// Issuance of a custom asset by its source account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetIssue {
    pub source_address: Option<Address>,
    pub code: String,
    pub total_supply: Amount,
    pub amount: Amount,
    pub decimals: u8,
    pub description: String,
    pub metadata: Option<String>,
}

impl AssetIssue {
    /// A zero total supply means issuance is not capped.
    pub fn is_unlimited(&self) -> bool {
        self.total_supply.is_zero()
    }

    /// The ATP 1.0 token descriptor attached as transaction metadata when
    /// issuing a token.
    pub fn atp10_metadata(&self) -> String {
        let total_supply = match self.total_supply.to_u64() {
            Some(n) => serde_json::Value::from(n),
            None => serde_json::Value::from(self.total_supply.as_str()),
        };
        serde_json::json!({
            "version": "1.0",
            "name": self.code,
            "totalSupply": total_supply,
            "decimals": self.decimals,
            "description": self.description,
        })
        .to_string()
    }
}

/// Transfer of an issued asset, identified by `(code, issuer)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetTransfer {
    pub source_address: Option<Address>,
    pub dest_address: Address,
    pub code: String,
    pub issuer: Address,
    pub amount: Amount,
    pub metadata: Option<String>,
}

/// Creation of a previously unseen account with an initial balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountActivate {
    pub source_address: Option<Address>,
    pub dest_address: Address,
    pub init_balance: Amount,
}

/// A single ledger operation.
///
/// The variant order is part of the blob format: the encoder writes the
/// declaration index as the operation's type tag. Append new variants, never
/// reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Transfer(Transfer),
    AssetIssue(AssetIssue),
    AssetTransfer(AssetTransfer),
    AccountActivate(AccountActivate),
}

fn parse_source(source: Option<&str>) -> Result<Option<Address>> {
    source
        .map(|s| Address::parse(s).map_err(|_| ValidationError::InvalidSourceAddress(s.to_string())))
        .transpose()
}

fn parse_dest(dest: &str) -> Result<Address> {
    Address::parse(dest).map_err(|_| ValidationError::InvalidDestAddress(dest.to_string()))
}

fn parse_amount(field: &'static str, value: &str) -> Result<Amount> {
    Amount::parse(value).map_err(|source| ValidationError::InvalidAmount { field, source })
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<()> {
    if value.len() > max {
        return Err(ValidationError::TooLong {
            field,
            len: value.len(),
            max,
        });
    }
    Ok(())
}

fn check_metadata(metadata: Option<&str>) -> Result<()> {
    metadata.map_or(Ok(()), |m| check_len("metadata", m, MAX_METADATA_LEN))
}

fn check_asset_code(code: &str) -> Result<()> {
    let valid = !code.is_empty()
        && code.len() <= MAX_ASSET_CODE_LEN
        && code.bytes().all(|b| b.is_ascii_alphanumeric());
    if !valid {
        return Err(ValidationError::InvalidAssetCode(code.to_string()));
    }
    Ok(())
}

fn check_distinct(source: Option<&Address>, dest: &Address) -> Result<()> {
    if source == Some(dest) {
        return Err(ValidationError::SourceEqualsDest);
    }
    Ok(())
}

impl Operation {
    /// Build a native currency transfer.
    pub fn transfer(params: TransferParams) -> Result<Self> {
        let op = Operation::Transfer(Transfer {
            source_address: parse_source(params.source_address.as_deref())?,
            dest_address: parse_dest(&params.dest_address)?,
            amount: parse_amount("amount", &params.amount)?,
            metadata: params.metadata,
        });
        op.validate()?;
        Ok(op)
    }

    /// Build an asset issuance.
    pub fn asset_issue(params: AssetIssueParams) -> Result<Self> {
        let op = Operation::AssetIssue(AssetIssue {
            source_address: parse_source(params.source_address.as_deref())?,
            code: params.code,
            total_supply: parse_amount("total supply", &params.total_supply)?,
            amount: parse_amount("amount", &params.amount)?,
            decimals: params.decimals,
            description: params.description,
            metadata: params.metadata,
        });
        op.validate()?;
        Ok(op)
    }

    /// Build an asset transfer.
    pub fn asset_transfer(params: AssetTransferParams) -> Result<Self> {
        let issuer = Address::parse(&params.issuer)
            .map_err(|_| ValidationError::InvalidIssuerAddress(params.issuer.clone()))?;
        let op = Operation::AssetTransfer(AssetTransfer {
            source_address: parse_source(params.source_address.as_deref())?,
            dest_address: parse_dest(&params.dest_address)?,
            code: params.code,
            issuer,
            amount: parse_amount("amount", &params.amount)?,
            metadata: params.metadata,
        });
        op.validate()?;
        Ok(op)
    }

    /// Build an account activation.
    pub fn account_activate(params: AccountActivateParams) -> Result<Self> {
        let op = Operation::AccountActivate(AccountActivate {
            source_address: parse_source(params.source_address.as_deref())?,
            dest_address: parse_dest(&params.dest_address)?,
            init_balance: parse_amount("init balance", &params.init_balance)?,
        });
        op.validate()?;
        Ok(op)
    }

    /// Check the invariants that typed fields alone do not guarantee.
    ///
    /// Builders call this before returning; the blob encoder calls it again
    /// because the variant structs can also be constructed directly.
    pub fn validate(&self) -> Result<()> {
        match self {
            Operation::Transfer(t) => {
                check_distinct(t.source_address.as_ref(), &t.dest_address)?;
                check_metadata(t.metadata.as_deref())
            }
            Operation::AssetIssue(issue) => {
                check_asset_code(&issue.code)?;
                if issue.decimals > MAX_DECIMALS {
                    return Err(ValidationError::InvalidDecimals(issue.decimals));
                }
                if !issue.is_unlimited() && issue.amount > issue.total_supply {
                    return Err(ValidationError::ExceedsTotalSupply {
                        amount: issue.amount.clone(),
                        total_supply: issue.total_supply.clone(),
                    });
                }
                check_len("description", &issue.description, MAX_DESCRIPTION_LEN)?;
                check_metadata(issue.metadata.as_deref())
            }
            Operation::AssetTransfer(t) => {
                check_distinct(t.source_address.as_ref(), &t.dest_address)?;
                check_asset_code(&t.code)?;
                check_metadata(t.metadata.as_deref())
            }
            Operation::AccountActivate(a) => {
                check_distinct(a.source_address.as_ref(), &a.dest_address)
            }
        }
    }

    /// Short name of the operation kind, for logs and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Transfer(_) => "transfer",
            Operation::AssetIssue(_) => "asset_issue",
            Operation::AssetTransfer(_) => "asset_transfer",
            Operation::AccountActivate(_) => "account_activate",
        }
    }
}
