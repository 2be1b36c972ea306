//! Key pairs, encoded key formats and checksummed addresses.
//!
//! Every encoded artifact embeds a key-type byte that selects the
//! [`SignatureScheme`] used to interpret it. Ed25519 is the only scheme the
//! network currently defines.
//!
//! Text formats:
//! - private key: base58 of `DA 37 9F | type | secret | 00 | checksum`
//! - public key: hex of `B0 | type | key | checksum`
//! - address: base58 of `01 56 | type | sha256(key)[12..] | checksum`
//!
//! `checksum` is the first four bytes of a double SHA-256 over everything
//! before it.

use crate::hash::{checksum, sha256, verify_checksum};
use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Base58 alphabet used by the network (bitcoin's, with `b`/`B` and `u`/`U`
/// swapped so that addresses read `buQ...`).
static ALPHABET: bs58::Alphabet =
    bs58::Alphabet::new_unwrap(b"123456789AbCDEFGHJKLMNPQRSTuVWXYZaBcdefghijkmnopqrstUvwxyz");

const PRIVATE_KEY_PREFIX: [u8; 3] = [0xDA, 0x37, 0x9F];
const PRIVATE_KEY_FILL: u8 = 0x00;
const PUBLIC_KEY_PREFIX: u8 = 0xB0;
const ADDRESS_PREFIX: [u8; 2] = [0x01, 0x56];
const ADDRESS_HASH_LEN: usize = 20;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("invalid private key: {0}")]
    InvalidKeyFormat(&'static str),
    #[error("invalid public key: {0}")]
    InvalidPublicKey(&'static str),
    #[error("invalid address format")]
    InvalidAddress,
    #[error("unsupported key type {0:#04x}")]
    UnsupportedKeyType(u8),
    #[error("invalid signature encoding")]
    InvalidSignature,
    #[error("signature verification failed")]
    VerificationFailed,
}

impl CryptoError {
    /// SDK-local numeric code reported in the response envelope.
    pub fn code(&self) -> i64 {
        match self {
            CryptoError::InvalidKeyFormat(_) => 11001,
            CryptoError::InvalidPublicKey(_) => 11004,
            CryptoError::InvalidAddress => 11006,
            CryptoError::UnsupportedKeyType(_) => 11009,
            CryptoError::InvalidSignature | CryptoError::VerificationFailed => 11010,
        }
    }
}

pub type Result<T> = std::result::Result<T, CryptoError>;

/// Key type byte embedded in encoded keys and addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum KeyType {
    Ed25519 = 0x01,
}

impl KeyType {
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0x01 => Ok(KeyType::Ed25519),
            other => Err(CryptoError::UnsupportedKeyType(other)),
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// The signature scheme implementing this key type.
    pub fn scheme(self) -> &'static dyn SignatureScheme {
        match self {
            KeyType::Ed25519 => &Ed25519,
        }
    }
}

/// A signature scheme the SDK can derive keys and sign with.
///
/// Implementations operate on raw key bytes; encoding, prefixes and
/// checksums are handled by [`PrivateKey`], [`PublicKey`] and [`Address`].
pub trait SignatureScheme: Send + Sync {
    fn key_type(&self) -> KeyType;

    /// Length of a raw secret key.
    fn secret_len(&self) -> usize;

    /// Generate a fresh secret from OS randomness.
    fn generate_secret(&self) -> Vec<u8>;

    /// Derive the raw public key for `secret`.
    fn public_key(&self, secret: &[u8]) -> Result<Vec<u8>>;

    /// Check that `public` is a well-formed public key for this scheme.
    fn check_public_key(&self, public: &[u8]) -> Result<()>;

    /// Sign the exact bytes of `message`.
    fn sign(&self, secret: &[u8], message: &[u8]) -> Result<Vec<u8>>;

    fn verify(&self, public: &[u8], message: &[u8], signature: &[u8]) -> Result<()>;
}

/// Ed25519 signatures; the message is hashed internally with SHA-512 as
/// the scheme prescribes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519;

impl Ed25519 {
    fn signing_key(secret: &[u8]) -> Result<SigningKey> {
        let bytes: [u8; 32] = secret
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyFormat("ed25519 secret must be 32 bytes"))?;
        Ok(SigningKey::from_bytes(&bytes))
    }

    fn verifying_key(public: &[u8]) -> Result<VerifyingKey> {
        let bytes: [u8; 32] = public
            .try_into()
            .map_err(|_| CryptoError::InvalidPublicKey("ed25519 key must be 32 bytes"))?;
        VerifyingKey::from_bytes(&bytes)
            .map_err(|_| CryptoError::InvalidPublicKey("not a curve point"))
    }
}

impl SignatureScheme for Ed25519 {
    fn key_type(&self) -> KeyType {
        KeyType::Ed25519
    }

    fn secret_len(&self) -> usize {
        32
    }

    fn generate_secret(&self) -> Vec<u8> {
        SigningKey::generate(&mut OsRng).to_bytes().to_vec()
    }

    fn public_key(&self, secret: &[u8]) -> Result<Vec<u8>> {
        Ok(Self::signing_key(secret)?.verifying_key().to_bytes().to_vec())
    }

    fn check_public_key(&self, public: &[u8]) -> Result<()> {
        Self::verifying_key(public).map(|_| ())
    }

    fn sign(&self, secret: &[u8], message: &[u8]) -> Result<Vec<u8>> {
        let sig = Self::signing_key(secret)?.sign(message);
        Ok(sig.to_bytes().to_vec())
    }

    fn verify(&self, public: &[u8], message: &[u8], signature: &[u8]) -> Result<()> {
        let key = Self::verifying_key(public)?;
        let sig = DalekSignature::from_slice(signature).map_err(|_| CryptoError::InvalidSignature)?;
        key.verify(message, &sig)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

fn with_checksum(mut payload: Vec<u8>) -> Vec<u8> {
    let sum = checksum(&payload);
    payload.extend_from_slice(&sum);
    payload
}

fn base58_encode(data: &[u8]) -> String {
    bs58::encode(data).with_alphabet(&ALPHABET).into_string()
}

fn base58_decode(s: &str) -> Option<Vec<u8>> {
    bs58::decode(s).with_alphabet(&ALPHABET).into_vec().ok()
}

/// A secret key. Never logged: `Debug` is redacted and there is no
/// `Display` or `Serialize` impl.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey {
    key_type: KeyType,
    secret: Vec<u8>,
}

impl PrivateKey {
    /// Generate a new random key of the given type.
    pub fn generate(key_type: KeyType) -> Self {
        Self {
            key_type,
            secret: key_type.scheme().generate_secret(),
        }
    }

    /// Wrap raw secret bytes.
    pub fn from_raw(key_type: KeyType, secret: &[u8]) -> Result<Self> {
        if secret.len() != key_type.scheme().secret_len() {
            return Err(CryptoError::InvalidKeyFormat("wrong secret length"));
        }
        Ok(Self {
            key_type,
            secret: secret.to_vec(),
        })
    }

    /// Parse an encoded private key (`priv...`).
    pub fn parse(encoded: &str) -> Result<Self> {
        let raw = base58_decode(encoded).ok_or(CryptoError::InvalidKeyFormat("not base58"))?;
        let payload = verify_checksum(&raw).ok_or(CryptoError::InvalidKeyFormat("bad checksum"))?;

        // prefix(3) + type(1) + secret + fill(1)
        if payload.len() < PRIVATE_KEY_PREFIX.len() + 2 {
            return Err(CryptoError::InvalidKeyFormat("too short"));
        }
        if payload[..3] != PRIVATE_KEY_PREFIX {
            return Err(CryptoError::InvalidKeyFormat("bad prefix"));
        }
        let key_type = KeyType::from_byte(payload[3])?;
        let (secret, fill) = payload[4..].split_at(payload.len() - 5);
        if fill != [PRIVATE_KEY_FILL] {
            return Err(CryptoError::InvalidKeyFormat("bad trailer"));
        }
        Self::from_raw(key_type, secret)
    }

    /// Encode as `priv...`.
    pub fn encode(&self) -> String {
        let mut payload = PRIVATE_KEY_PREFIX.to_vec();
        payload.push(self.key_type.as_byte());
        payload.extend_from_slice(&self.secret);
        payload.push(PRIVATE_KEY_FILL);
        base58_encode(&with_checksum(payload))
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Raw secret bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.secret
    }

    /// Derive the matching public key.
    pub fn public_key(&self) -> Result<PublicKey> {
        let bytes = self.key_type.scheme().public_key(&self.secret)?;
        Ok(PublicKey {
            key_type: self.key_type,
            bytes,
        })
    }

    /// Sign the exact bytes of `message`.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        self.key_type.scheme().sign(&self.secret, message)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey({:?}, <redacted>)", self.key_type)
    }
}

impl FromStr for PrivateKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A public key for signature verification.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PublicKey {
    key_type: KeyType,
    bytes: Vec<u8>,
}

impl PublicKey {
    /// Wrap raw public key bytes, checking they form a valid key.
    pub fn from_raw(key_type: KeyType, bytes: &[u8]) -> Result<Self> {
        key_type.scheme().check_public_key(bytes)?;
        Ok(Self {
            key_type,
            bytes: bytes.to_vec(),
        })
    }

    /// Parse an encoded public key (`b001...` hex).
    pub fn parse(encoded: &str) -> Result<Self> {
        let raw = hex::decode(encoded).map_err(|_| CryptoError::InvalidPublicKey("not hex"))?;
        let payload =
            verify_checksum(&raw).ok_or(CryptoError::InvalidPublicKey("bad checksum"))?;
        if payload.len() < 3 || payload[0] != PUBLIC_KEY_PREFIX {
            return Err(CryptoError::InvalidPublicKey("bad prefix"));
        }
        let key_type = KeyType::from_byte(payload[1])?;
        Self::from_raw(key_type, &payload[2..])
    }

    /// Encode as hex, the form carried in submitted signatures.
    pub fn encode(&self) -> String {
        let mut payload = vec![PUBLIC_KEY_PREFIX, self.key_type.as_byte()];
        payload.extend_from_slice(&self.bytes);
        hex::encode(with_checksum(payload))
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Derive the address from this public key.
    pub fn to_address(&self) -> Address {
        let digest = sha256(&self.bytes);
        let mut payload = ADDRESS_PREFIX.to_vec();
        payload.push(self.key_type.as_byte());
        payload.extend_from_slice(&digest.0[32 - ADDRESS_HASH_LEN..]);
        Address(base58_encode(&with_checksum(payload)))
    }

    /// Verify a signature over `message`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        self.key_type
            .scheme()
            .verify(&self.bytes, message, signature)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(&self.bytes[..self.bytes.len().min(8)]))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for PublicKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A checksummed account address (`buQ...`).
///
/// Only constructed from a public key or by [`Address::parse`], so every
/// value is known to be well formed.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(String);

impl Address {
    /// Parse and validate an address string.
    pub fn parse(s: &str) -> Result<Self> {
        let raw = base58_decode(s).ok_or(CryptoError::InvalidAddress)?;
        let payload = verify_checksum(&raw).ok_or(CryptoError::InvalidAddress)?;
        if payload.len() != ADDRESS_PREFIX.len() + 1 + ADDRESS_HASH_LEN
            || payload[..2] != ADDRESS_PREFIX
        {
            return Err(CryptoError::InvalidAddress);
        }
        KeyType::from_byte(payload[2]).map_err(|_| CryptoError::InvalidAddress)?;
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A keypair for signing and verification.
#[derive(Clone)]
pub struct Keypair {
    private_key: PrivateKey,
    pub public_key: PublicKey,
}

impl Keypair {
    /// Generate a new random Ed25519 keypair.
    pub fn generate() -> Self {
        let private_key = PrivateKey::generate(KeyType::Ed25519);
        Self::from_private_key(private_key)
            .unwrap_or_else(|_| unreachable!("freshly generated secrets have the scheme's length"))
    }

    /// Create a keypair from a private key.
    pub fn from_private_key(private_key: PrivateKey) -> Result<Self> {
        let public_key = private_key.public_key()?;
        Ok(Self {
            private_key,
            public_key,
        })
    }

    /// Create a keypair from an encoded private key (`priv...`).
    pub fn from_encoded(encoded: &str) -> Result<Self> {
        Self::from_private_key(PrivateKey::parse(encoded)?)
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// Get the address derived from the public key.
    pub fn address(&self) -> Address {
        self.public_key.to_address()
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        self.private_key.sign(message)
    }

    /// Verify a signature against our public key.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        self.public_key.verify(message, signature)
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address())
            .finish()
    }
}

/// Derive the public key for an encoded private key.
pub fn derive_public_key(private_key: &str) -> Result<PublicKey> {
    PrivateKey::parse(private_key)?.public_key()
}

/// Derive the address of a public key.
pub fn derive_address(public_key: &PublicKey) -> Address {
    public_key.to_address()
}

/// Check prefix, key type, length and checksum of an address without any
/// network access.
pub fn is_valid_address(address: &str) -> bool {
    Address::parse(address).is_ok()
}
