//! SHA-256 hashing utilities.
//!
//! Transaction hashes, address payloads and encoding checksums are all
//! derived from SHA-256, so this is the only digest used by the crate.

use sha2::{Digest, Sha256};
use std::fmt;

/// A named alias for a 32-byte(u8) array, used to represent a 256-bit hash.
pub type H256 = [u8; 32];

/// Number of checksum bytes appended to every encoded key and address.
pub const CHECKSUM_LEN: usize = 4;

/// A wrapper type for H256 with Display and Debug formatting.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hash(pub H256);

impl Hash {
    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &H256 {
        &self.0
    }

    /// Convert to a lowercase hex string, the form the node reports hashes in.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let arr: H256 = bytes
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({}..)", &self.to_hex()[..8])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Hash arbitrary data using SHA-256.
pub fn sha256(data: &[u8]) -> Hash {
    Hash(Sha256::digest(data).into())
}

/// SHA-256 applied twice.
pub fn double_sha256(data: &[u8]) -> Hash {
    sha256(sha256(data).as_bytes())
}

/// The four-byte checksum appended to encoded keys and addresses.
pub fn checksum(payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = double_sha256(payload);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest.0[..CHECKSUM_LEN]);
    out
}

/// Split `data` into payload and trailing checksum, returning the payload
/// only if the checksum matches.
pub fn verify_checksum(data: &[u8]) -> Option<&[u8]> {
    if data.len() <= CHECKSUM_LEN {
        return None;
    }
    let (payload, sum) = data.split_at(data.len() - CHECKSUM_LEN);
    (checksum(payload) == sum).then_some(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_answer() {
        assert_eq!(
            sha256(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash_hex_roundtrip() {
        let h = sha256(b"test data");
        let parsed = Hash::from_hex(&h.to_hex()).unwrap();
        assert_eq!(h, parsed);
    }

    #[test]
    fn test_from_hex_wrong_length() {
        assert!(Hash::from_hex("abcd").is_err());
    }

    #[test]
    fn test_checksum_detects_corruption() {
        let mut data = b"payload".to_vec();
        data.extend_from_slice(&checksum(b"payload"));
        assert_eq!(verify_checksum(&data), Some(&b"payload"[..]));

        data[0] ^= 0x01;
        assert_eq!(verify_checksum(&data), None);
    }

    #[test]
    fn test_verify_checksum_too_short() {
        assert_eq!(verify_checksum(&[1, 2, 3, 4]), None);
    }
}
