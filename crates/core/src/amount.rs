//! Non-negative integer amounts of arbitrary size.
//!
//! On-chain quantities (balances, asset supplies, fees, gas prices) are
//! exchanged as decimal strings because they can exceed the native integer
//! range of some callers. `Amount` keeps the canonical decimal form: ASCII
//! digits only, no sign, no leading zeros (`"0"` for zero).

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Upper bound on the number of digits accepted when parsing.
pub const MAX_DIGITS: usize = 78;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("amount {0:?} is not a non-negative integer")]
    NotAnInteger(String),
    #[error("amount has more than {max} digits", max = MAX_DIGITS)]
    TooLong,
}

/// A canonical non-negative integer.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Amount(String);

impl Amount {
    pub fn zero() -> Self {
        Self("0".to_string())
    }

    /// Parse a non-negative decimal integer string.
    pub fn parse(s: &str) -> Result<Self, AmountError> {
        if s.is_empty() {
            return Err(AmountError::Empty);
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountError::NotAnInteger(s.to_string()));
        }
        let trimmed = s.trim_start_matches('0');
        if trimmed.len() > MAX_DIGITS {
            return Err(AmountError::TooLong);
        }
        if trimmed.is_empty() {
            Ok(Self::zero())
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    pub fn is_zero(&self) -> bool {
        self.0 == "0"
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The value as `u64`, if it fits.
    pub fn to_u64(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::zero()
    }
}

impl Ord for Amount {
    fn cmp(&self, other: &Self) -> Ordering {
        // canonical form: more digits means larger
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Amount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, AmountError> {
        Self::parse(s)
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({})", self.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(de::Error::custom)
    }
}

/// Deserialize an amount that a node may report either as a JSON number or
/// as a decimal string. Use with `#[serde(deserialize_with = ...)]` on
/// self-describing formats only.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Amount, D::Error>
where
    D: Deserializer<'de>,
{
    struct LenientVisitor;

    impl<'de> Visitor<'de> for LenientVisitor {
        type Value = Amount;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a non-negative integer or integer string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
            Ok(Amount::from(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
            u64::try_from(v)
                .map(Amount::from)
                .map_err(|_| E::custom(format!("negative amount {}", v)))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
            Amount::parse(v).map_err(E::custom)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Amount, E> {
            Ok(Amount::zero())
        }
    }

    deserializer.deserialize_any(LenientVisitor)
}
