//! Offline primitives for the BUMO client SDK.
//!
//! Everything here works without a node:
//! - Keys, addresses and signatures
//! - Arbitrary-size amounts
//! - Operation builders
//! - Canonical transaction blobs
//! - Blob signing and nonce allocation

pub mod amount;
pub mod crypto;
pub mod hash;
pub mod nonce;
pub mod operation;
pub mod signer;
pub mod transaction;

// Re-export commonly used types at the crate root
pub use amount::{Amount, AmountError};
pub use crypto::{
    derive_address, derive_public_key, is_valid_address, Address, CryptoError, KeyType, Keypair,
    PrivateKey, PublicKey, SignatureScheme,
};
pub use hash::{sha256, Hash, H256};
pub use nonce::NonceSequencer;
pub use operation::{
    AccountActivateParams, AssetIssueParams, AssetTransferParams, Operation, TransferParams,
    ValidationError,
};
pub use signer::{sign, Signature, SigningError};
pub use transaction::{
    build_blob, EncodedTransaction, EncodingError, SignedTransaction, TransactionBlob,
    TransactionRequest,
};
