//! Blob signing.
//!
//! Each private key produces one [`Signature`] over the exact blob bytes.
//! Signatures come back in the same order as the keys were supplied, and a
//! single bad key fails the whole call before anything is signed.

use crate::crypto::{CryptoError, PrivateKey, PublicKey};
use crate::transaction::TransactionBlob;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigningError {
    #[error("no private keys supplied")]
    NoKeys,

    #[error("private key #{index} is invalid: {source}")]
    InvalidKey { index: usize, source: CryptoError },

    #[error("signing failed: {0}")]
    Failed(CryptoError),
}

impl SigningError {
    /// SDK-local numeric code reported in the response envelope.
    pub fn code(&self) -> i64 {
        match self {
            SigningError::NoKeys => 11057,
            SigningError::InvalidKey { .. } => 11058,
            SigningError::Failed(_) => 11059,
        }
    }
}

pub type Result<T> = std::result::Result<T, SigningError>;

/// One signature over a blob, as the node expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    #[serde(with = "hex_bytes")]
    pub sign_data: Vec<u8>,
    pub public_key: PublicKey,
}

impl Signature {
    /// Check this signature against `blob`.
    pub fn verify(&self, blob: &[u8]) -> std::result::Result<(), CryptoError> {
        self.public_key.verify(blob, &self.sign_data)
    }
}

/// Sign `blob` with each encoded private key, in order.
pub fn sign<K: AsRef<str>>(blob: &TransactionBlob, private_keys: &[K]) -> Result<Vec<Signature>> {
    if private_keys.is_empty() {
        return Err(SigningError::NoKeys);
    }
    let keys = private_keys
        .iter()
        .enumerate()
        .map(|(index, key)| {
            PrivateKey::parse(key.as_ref())
                .map_err(|source| SigningError::InvalidKey { index, source })
        })
        .collect::<Result<Vec<_>>>()?;
    sign_with_keys(blob, &keys)
}

/// Sign `blob` with already parsed keys, in order.
pub fn sign_with_keys(blob: &TransactionBlob, keys: &[PrivateKey]) -> Result<Vec<Signature>> {
    if keys.is_empty() {
        return Err(SigningError::NoKeys);
    }
    keys.iter()
        .map(|key| {
            let public_key = key.public_key().map_err(SigningError::Failed)?;
            let sign_data = key.sign(blob.as_bytes()).map_err(SigningError::Failed)?;
            Ok(Signature {
                sign_data,
                public_key,
            })
        })
        .collect()
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;
    use crate::operation::{Operation, TransferParams};
    use crate::transaction::TransactionRequest;

    fn blob(source: &Keypair) -> TransactionBlob {
        TransactionRequest {
            source_address: source.address().to_string(),
            gas_price: "1000".into(),
            fee_limit: "1000000".into(),
            nonce: "1".into(),
            operations: vec![Operation::transfer(TransferParams {
                dest_address: Keypair::generate().address().to_string(),
                amount: "1".into(),
                ..Default::default()
            })
            .unwrap()],
            metadata: None,
        }
        .build_blob()
        .unwrap()
    }

    #[test]
    fn test_signatures_follow_key_order() {
        let a = Keypair::generate();
        let b = Keypair::generate();
        let blob = blob(&a);

        let sigs = sign(&blob, &[a.private_key().encode(), b.private_key().encode()]).unwrap();
        assert_eq!(sigs.len(), 2);
        assert_eq!(sigs[0].public_key, a.public_key);
        assert_eq!(sigs[1].public_key, b.public_key);
        for sig in &sigs {
            assert!(sig.verify(blob.as_bytes()).is_ok());
        }
    }

    #[test]
    fn test_signing_is_deterministic() {
        let a = Keypair::generate();
        let blob = blob(&a);
        let first = sign(&blob, &[a.private_key().encode()]).unwrap();
        let second = sign(&blob, &[a.private_key().encode()]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_one_bad_key_fails_everything() {
        let a = Keypair::generate();
        let blob = blob(&a);
        let keys = [a.private_key().encode(), "privbroken".to_string()];
        let err = sign(&blob, &keys).unwrap_err();
        assert!(matches!(err, SigningError::InvalidKey { index: 1, .. }));
        assert_eq!(err.code(), 11058);
    }

    #[test]
    fn test_no_keys() {
        let a = Keypair::generate();
        let keys: [&str; 0] = [];
        assert_eq!(sign(&blob(&a), &keys), Err(SigningError::NoKeys));
    }

    #[test]
    fn test_signature_json_shape() {
        let a = Keypair::generate();
        let sig = sign(&blob(&a), &[a.private_key().encode()]).unwrap().remove(0);
        let json = serde_json::to_value(&sig).unwrap();
        assert_eq!(json["sign_data"].as_str().unwrap().len(), 128);
        assert_eq!(json["public_key"], a.public_key.encode());

        let back: Signature = serde_json::from_value(json).unwrap();
        assert_eq!(back, sig);
    }
}
