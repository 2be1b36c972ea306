//! Transaction requests, canonical blob encoding and the signing lifecycle.
//!
//! A blob is one version byte followed by the bincode encoding of a
//! fixed-order wire struct:
//!
//! ```text
//! version: u8
//! source_address: len(u64) + utf8
//! nonce: u64
//! gas_price: len(u64) + decimal digits
//! fee_limit: len(u64) + decimal digits
//! metadata: tag(u8: 0 = none, 1 = some) [+ len(u64) + utf8]
//! operations: count(u64), then per operation:
//!     type tag(u32, declaration index of `Operation`) + variant fields in order
//! ```
//!
//! All integers are little endian. Nothing is keyed by a map, so equal
//! requests always produce byte-identical blobs.
//!
//! The lifecycle is expressed as a chain of consuming conversions:
//! [`TransactionRequest`] → [`EncodedTransaction`] → [`SignedTransaction`],
//! after which the chain client takes ownership for submission.

use crate::amount::Amount;
use crate::crypto::{Address, PrivateKey};
use crate::hash::{sha256, Hash};
use crate::operation::{Operation, ValidationError, MAX_METADATA_LEN};
use crate::signer::{self, Signature, SigningError};
use bincode::Options;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Current blob layout version.
pub const BLOB_VERSION: u8 = 1;
/// Maximum number of operations in one transaction.
pub const MAX_OPERATIONS: usize = 100;
/// Upper bound on an encoded blob, enforced in both directions.
pub const MAX_BLOB_LEN: u64 = 32 * 1024 * 1024;

/// Errors that can occur while building or decoding a blob.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("transaction has no operations")]
    EmptyOperations,

    #[error("transaction has {0} operations, limit is {max}", max = MAX_OPERATIONS)]
    TooManyOperations(usize),

    #[error("invalid source address {0:?}")]
    InvalidSourceAddress(String),

    #[error("invalid {field} {value:?}: expected a non-negative integer")]
    InvalidNumber { field: &'static str, value: String },

    #[error("metadata is {len} bytes, limit is {max}", max = MAX_METADATA_LEN)]
    MetadataTooLong { len: usize },

    #[error("operation {index} is invalid: {source}")]
    InvalidOperation {
        index: usize,
        source: ValidationError,
    },

    #[error("unsupported blob version {0}")]
    UnsupportedVersion(u8),

    #[error("malformed blob: {0}")]
    Malformed(String),
}

impl EncodingError {
    /// SDK-local numeric code reported in the response envelope.
    pub fn code(&self) -> i64 {
        match self {
            EncodingError::InvalidSourceAddress(_) => 11002,
            EncodingError::MetadataTooLong { .. } => 11028,
            EncodingError::InvalidNumber { field: "nonce", .. } => 11048,
            EncodingError::InvalidNumber { field: "gas price", .. } => 11049,
            EncodingError::InvalidNumber { .. } => 11050,
            EncodingError::EmptyOperations => 11051,
            EncodingError::TooManyOperations(_) => 11052,
            EncodingError::InvalidOperation { source, .. } => source.code(),
            EncodingError::UnsupportedVersion(_) | EncodingError::Malformed(_) => 11056,
        }
    }
}

pub type Result<T> = std::result::Result<T, EncodingError>;

/// Everything needed to encode one transaction.
///
/// Numeric header fields are decimal strings; they are validated when the
/// blob is built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransactionRequest {
    pub source_address: String,
    pub gas_price: String,
    pub fee_limit: String,
    /// Must be the source account's current on-chain nonce plus one.
    pub nonce: String,
    pub operations: Vec<Operation>,
    pub metadata: Option<String>,
}

/// Fixed-order wire form. Field order is the blob layout.
#[derive(Serialize, Deserialize)]
struct WireTransaction {
    source_address: Address,
    nonce: u64,
    gas_price: Amount,
    fee_limit: Amount,
    metadata: Option<String>,
    operations: Vec<Operation>,
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .with_limit(MAX_BLOB_LEN)
        .reject_trailing_bytes()
}

fn parse_number(field: &'static str, value: &str) -> Result<Amount> {
    Amount::parse(value).map_err(|_| EncodingError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

fn check_operations(operations: &[Operation]) -> Result<()> {
    if operations.is_empty() {
        return Err(EncodingError::EmptyOperations);
    }
    if operations.len() > MAX_OPERATIONS {
        return Err(EncodingError::TooManyOperations(operations.len()));
    }
    for (index, op) in operations.iter().enumerate() {
        op.validate()
            .map_err(|source| EncodingError::InvalidOperation { index, source })?;
    }
    Ok(())
}

fn check_metadata(metadata: Option<&str>) -> Result<()> {
    match metadata {
        Some(m) if m.len() > MAX_METADATA_LEN => {
            Err(EncodingError::MetadataTooLong { len: m.len() })
        }
        _ => Ok(()),
    }
}

impl TransactionRequest {
    fn to_wire(&self) -> Result<WireTransaction> {
        check_operations(&self.operations)?;
        let source_address = Address::parse(&self.source_address)
            .map_err(|_| EncodingError::InvalidSourceAddress(self.source_address.clone()))?;
        let nonce = parse_number("nonce", &self.nonce)?
            .to_u64()
            .ok_or_else(|| EncodingError::InvalidNumber {
                field: "nonce",
                value: self.nonce.clone(),
            })?;
        let gas_price = parse_number("gas price", &self.gas_price)?;
        let fee_limit = parse_number("fee limit", &self.fee_limit)?;
        check_metadata(self.metadata.as_deref())?;

        Ok(WireTransaction {
            source_address,
            nonce,
            gas_price,
            fee_limit,
            metadata: self.metadata.clone(),
            operations: self.operations.clone(),
        })
    }

    /// Encode this request as a canonical blob.
    ///
    /// Either the whole request is valid and a complete blob is returned, or
    /// nothing is emitted.
    pub fn build_blob(&self) -> Result<TransactionBlob> {
        let wire = self.to_wire()?;
        let mut bytes = vec![BLOB_VERSION];
        codec()
            .serialize_into(&mut bytes, &wire)
            .map_err(|e| EncodingError::Malformed(e.to_string()))?;
        Ok(TransactionBlob(bytes))
    }

    /// Move from the built stage to the encoded stage.
    pub fn encode(self) -> Result<EncodedTransaction> {
        let blob = self.build_blob()?;
        Ok(EncodedTransaction {
            request: self,
            blob,
        })
    }
}

/// Encode `request` as a canonical blob.
pub fn build_blob(request: &TransactionRequest) -> Result<TransactionBlob> {
    request.build_blob()
}

/// The canonical byte encoding of a transaction: exactly what is signed and
/// broadcast.
#[derive(Clone, PartialEq, Eq)]
pub struct TransactionBlob(Vec<u8>);

impl TransactionBlob {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Hex form used on the wire.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Parse the hex form. The bytes are not decoded; see [`Self::decode`].
    pub fn from_hex(s: &str) -> Result<Self> {
        hex::decode(s)
            .map(Self)
            .map_err(|e| EncodingError::Malformed(e.to_string()))
    }

    /// The transaction hash: SHA-256 of the blob bytes.
    pub fn hash(&self) -> Hash {
        sha256(&self.0)
    }

    /// Decode back into the canonical request.
    ///
    /// Numeric fields come back in canonical form (no leading zeros).
    pub fn decode(&self) -> Result<TransactionRequest> {
        let (&version, body) = self
            .0
            .split_first()
            .ok_or_else(|| EncodingError::Malformed("empty blob".into()))?;
        if version != BLOB_VERSION {
            return Err(EncodingError::UnsupportedVersion(version));
        }
        let wire: WireTransaction = codec()
            .deserialize(body)
            .map_err(|e| EncodingError::Malformed(e.to_string()))?;
        check_operations(&wire.operations)?;
        check_metadata(wire.metadata.as_deref())?;

        Ok(TransactionRequest {
            source_address: wire.source_address.to_string(),
            gas_price: wire.gas_price.to_string(),
            fee_limit: wire.fee_limit.to_string(),
            nonce: wire.nonce.to_string(),
            operations: wire.operations,
            metadata: wire.metadata,
        })
    }
}

impl fmt::Debug for TransactionBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionBlob({} bytes, {:?})", self.0.len(), self.hash())
    }
}

impl AsRef<[u8]> for TransactionBlob {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A request together with its encoded blob.
#[derive(Debug, Clone)]
pub struct EncodedTransaction {
    request: TransactionRequest,
    blob: TransactionBlob,
}

impl EncodedTransaction {
    pub fn request(&self) -> &TransactionRequest {
        &self.request
    }

    pub fn blob(&self) -> &TransactionBlob {
        &self.blob
    }

    pub fn hash(&self) -> Hash {
        self.blob.hash()
    }

    /// Sign with encoded private keys, in order.
    pub fn sign<K: AsRef<str>>(self, private_keys: &[K]) -> std::result::Result<SignedTransaction, SigningError> {
        let signatures = signer::sign(&self.blob, private_keys)?;
        Ok(SignedTransaction {
            blob: self.blob,
            signatures,
        })
    }

    /// Sign with already parsed keys, in order.
    pub fn sign_with_keys(
        self,
        keys: &[PrivateKey],
    ) -> std::result::Result<SignedTransaction, SigningError> {
        let signatures = signer::sign_with_keys(&self.blob, keys)?;
        Ok(SignedTransaction {
            blob: self.blob,
            signatures,
        })
    }
}

/// A blob and the signatures over it, ready for submission.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    blob: TransactionBlob,
    signatures: Vec<Signature>,
}

impl SignedTransaction {
    /// Assemble from parts produced separately, e.g. by co-signers.
    pub fn from_parts(blob: TransactionBlob, signatures: Vec<Signature>) -> Self {
        Self { blob, signatures }
    }

    pub fn blob(&self) -> &TransactionBlob {
        &self.blob
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    pub fn hash(&self) -> Hash {
        self.blob.hash()
    }

    /// Verify every signature against the blob.
    pub fn verify(&self) -> std::result::Result<(), crate::crypto::CryptoError> {
        self.signatures
            .iter()
            .try_for_each(|sig| sig.verify(self.blob.as_bytes()))
    }

    pub fn into_parts(self) -> (TransactionBlob, Vec<Signature>) {
        (self.blob, self.signatures)
    }
}
