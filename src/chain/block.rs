//! Blocks: an indexed header binding a Merkle root over its transactions,
//! chained by previous-hash, sealed by proof-of-work.

use serde::{Deserialize, Serialize};

use crate::chain::merkle::merkle_root;
use crate::chain::transaction::Transaction;
use crate::crypto;
use crate::error::{ChainError, TransactionError};

/// Sentinel `prevHash` carried only by the genesis block.
pub const NONE_PREV_HASH: &str = "none";

/// An indexed, content-chained block of transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: f64,
    pub prev_hash: String,
    pub transactions: Vec<Transaction>,
    pub merkle_root: String,
    pub nonce: u64,
    pub curr_hash: String,
}

impl Block {
    /// Builds an unsealed block: stamps time, computes the Merkle root,
    /// copies `prevHash` from `tail` (the null sentinel for genesis), and
    /// sets `index = tail.index + 1` (1 if `tail` is `None`). `nonce` is 0
    /// and `curr_hash` is empty until [`Block::mine`] seals it.
    ///
    /// # Panics
    /// Panics if `transactions` is empty.
    pub fn new(transactions: Vec<Transaction>, tail: Option<&Block>) -> Self {
        assert!(!transactions.is_empty(), "a block must carry at least one transaction");
        let merkle_root = merkle_root(&transactions);
        let (index, prev_hash) = match tail {
            Some(block) => (block.index + 1, block.curr_hash.clone()),
            None => (1, NONE_PREV_HASH.to_string()),
        };
        Block {
            index,
            timestamp: now_fractional_secs(),
            prev_hash,
            transactions,
            merkle_root,
            nonce: 0,
            curr_hash: String::new(),
        }
    }

    fn digest_at(&self, nonce: u64) -> String {
        crypto::sha256_hex(&[
            self.index.to_string().as_bytes(),
            self.timestamp.to_string().as_bytes(),
            self.prev_hash.as_bytes(),
            self.merkle_root.as_bytes(),
            nonce.to_string().as_bytes(),
        ])
    }

    /// Recomputes `curr_hash` from the block's current fields and nonce.
    pub fn digest(&self) -> String {
        self.digest_at(self.nonce)
    }

    /// Increments `nonce` from its current value until `digest()` carries
    /// `difficulty` leading hex zeros, then seals `curr_hash`. Polls
    /// `cancelled` between attempts so callers can abort an unbounded
    /// search.
    ///
    /// Returns `false` (leaving the block unsealed) if cancelled before a
    /// satisfying nonce was found.
    pub fn mine(&mut self, difficulty: usize, cancelled: &std::sync::atomic::AtomicBool) -> bool {
        use std::sync::atomic::Ordering;
        let target = "0".repeat(difficulty);
        loop {
            if cancelled.load(Ordering::Relaxed) {
                return false;
            }
            let candidate = self.digest_at(self.nonce);
            if candidate.starts_with(&target) {
                self.curr_hash = candidate;
                return true;
            }
            self.nonce += 1;
        }
    }

    /// Self-verifies: recomputes `curr_hash` and the Merkle root, and
    /// verifies every transaction's signature against its own
    /// self-described signer key ([`Transaction::signer_key`]).
    pub fn verify(&self, difficulty: usize) -> Result<(), ChainError> {
        if self.transactions.is_empty() {
            return Err(ChainError::EmptyBlock { index: self.index });
        }
        let target = "0".repeat(difficulty);
        if self.curr_hash != self.digest() || !self.curr_hash.starts_with(&target) {
            return Err(ChainError::BlockHashMismatch { index: self.index });
        }
        if self.merkle_root != merkle_root(&self.transactions) {
            return Err(ChainError::MerkleMismatch { index: self.index });
        }
        for (ordinal, tx) in self.transactions.iter().enumerate() {
            tx.verify_self_described().map_err(|source| ChainError::InvalidTransaction {
                index: self.index,
                tx_ordinal: ordinal,
                source: TransactionError::Crypto(source),
            })?;
        }
        Ok(())
    }
}

fn now_fractional_secs() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Wallet;
    use std::sync::atomic::AtomicBool;

    fn wallet_with_keys(name: &str) -> Wallet {
        let (public, private) = crate::keys::generate_keypair(2048);
        Wallet { name: name.to_string(), public, private: Some(private) }
    }

    #[test]
    fn genesis_block_carries_the_null_sentinel() {
        let creator = wallet_with_keys("creator");
        let tx = Transaction::new_system(&creator, 100).unwrap();
        let block = Block::new(vec![tx], None);
        assert_eq!(block.index, 1);
        assert_eq!(block.prev_hash, NONE_PREV_HASH);
    }

    #[test]
    fn mining_satisfies_the_difficulty_target() {
        let creator = wallet_with_keys("creator");
        let tx = Transaction::new_system(&creator, 100).unwrap();
        let mut block = Block::new(vec![tx], None);
        let cancelled = AtomicBool::new(false);
        assert!(block.mine(2, &cancelled));
        assert!(block.curr_hash.starts_with("00"));
    }

    #[test]
    fn mined_block_self_verifies() {
        let creator = wallet_with_keys("creator");
        let tx = Transaction::new_system(&creator, 100).unwrap();
        let mut block = Block::new(vec![tx], None);
        let cancelled = AtomicBool::new(false);
        block.mine(1, &cancelled);
        let result = block.verify(1);
        assert!(result.is_ok());
    }

    #[test]
    fn tampered_hash_fails_verification() {
        let creator = wallet_with_keys("creator");
        let tx = Transaction::new_system(&creator, 100).unwrap();
        let mut block = Block::new(vec![tx], None);
        let cancelled = AtomicBool::new(false);
        block.mine(1, &cancelled);
        block.nonce += 1;
        let result = block.verify(1);
        assert!(matches!(result, Err(ChainError::BlockHashMismatch { .. })));
    }

    #[test]
    fn cancelling_mid_mine_leaves_block_unsealed() {
        let creator = wallet_with_keys("creator");
        let tx = Transaction::new_system(&creator, 100).unwrap();
        let mut block = Block::new(vec![tx], None);
        let cancelled = AtomicBool::new(true);
        assert!(!block.mine(64, &cancelled));
        assert!(block.curr_hash.is_empty());
    }
}
