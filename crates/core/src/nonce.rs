//! Per-account nonce allocation.
//!
//! The network accepts a transaction only if its nonce is exactly the source
//! account's current nonce plus one. A [`NonceSequencer`] hands out
//! consecutive nonces to concurrent submitters for one account, starting from
//! the last value observed on chain.

use crate::crypto::Address;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug)]
pub struct NonceSequencer {
    address: Address,
    next: AtomicU64,
}

impl NonceSequencer {
    /// Start allocating at `last_observed + 1`.
    pub fn new(address: Address, last_observed: u64) -> Self {
        Self {
            address,
            next: AtomicU64::new(last_observed.saturating_add(1)),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Take the next nonce. Every call returns a distinct value.
    pub fn allocate(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    /// The nonce the next [`allocate`](Self::allocate) call would return.
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }

    /// Restart from a freshly observed on-chain nonce, e.g. after the
    /// network rejected a transaction as out of sequence.
    pub fn resync(&self, last_observed: u64) {
        self.next
            .store(last_observed.saturating_add(1), Ordering::SeqCst);
    }
}
