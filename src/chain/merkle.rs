//! Merkle summarization over a block's transactions.
//!
//! The reduction is queue-based, not the common "duplicate the odd leaf"
//! scheme: hashes produced by combining a pair are pushed onto the *back*
//! of the same queue they were dequeued from, so an odd-sized level pairs
//! its orphan with the first hash produced at the next level rather than
//! with a duplicate of itself. This must be preserved bit-for-bit for
//! compatibility with existing chains; it is not the scheme you'd design
//! from scratch.

use std::collections::VecDeque;

use crate::chain::transaction::Transaction;
use crate::crypto;

/// Computes the Merkle root of a non-empty transaction list.
///
/// Each transaction contributes a leaf `SHA256(unsigned_digest(tx) ‖ tx.hash)`.
/// Leaves are reduced two-at-a-time, FIFO, until one hash remains.
///
/// # Panics
/// Panics if `transactions` is empty; blocks are never constructed without
/// at least one transaction (the miner reward or a caller-supplied tx).
pub fn merkle_root(transactions: &[Transaction]) -> String {
    assert!(!transactions.is_empty(), "merkle root requires at least one transaction");

    let mut queue: VecDeque<String> = transactions
        .iter()
        .map(|tx| crypto::sha256_hex(&[tx.unsigned_digest().as_bytes(), tx.hash.as_bytes()]))
        .collect();

    while queue.len() > 1 {
        let left = queue.pop_front().unwrap();
        let right = queue.pop_front().unwrap();
        let combined = crypto::sha256_hex(&[left.as_bytes(), right.as_bytes()]);
        queue.push_back(combined);
    }

    queue.pop_front().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Wallet;

    fn wallet_with_keys(name: &str) -> Wallet {
        let (public, private) = crate::keys::generate_keypair(2048);
        Wallet { name: name.to_string(), public, private: Some(private) }
    }

    #[test]
    fn single_transaction_root_is_its_own_leaf_hash() {
        let sender = wallet_with_keys("alice");
        let receiver = wallet_with_keys("bob");
        let tx = Transaction::new(&receiver, 10, &sender).unwrap();
        let expected = crypto::sha256_hex(&[tx.unsigned_digest().as_bytes(), tx.hash.as_bytes()]);
        assert_eq!(merkle_root(&[tx]), expected);
    }

    #[test]
    fn permuting_two_transactions_changes_the_root() {
        let sender = wallet_with_keys("alice");
        let receiver = wallet_with_keys("bob");
        let tx_a = Transaction::new(&receiver, 10, &sender).unwrap();
        let tx_b = Transaction::new(&receiver, 20, &sender).unwrap();
        let tx_c = Transaction::new(&receiver, 30, &sender).unwrap();

        let root_1 = merkle_root(&[tx_a.clone(), tx_b.clone(), tx_c.clone()]);
        let root_2 = merkle_root(&[tx_b, tx_a, tx_c]);
        assert_ne!(root_1, root_2);
    }

    #[test]
    fn odd_count_pairs_orphan_with_next_level_via_queue() {
        let sender = wallet_with_keys("alice");
        let receiver = wallet_with_keys("bob");
        let tx_a = Transaction::new(&receiver, 10, &sender).unwrap();
        let tx_b = Transaction::new(&receiver, 20, &sender).unwrap();
        let tx_c = Transaction::new(&receiver, 30, &sender).unwrap();

        let leaf_a = crypto::sha256_hex(&[tx_a.unsigned_digest().as_bytes(), tx_a.hash.as_bytes()]);
        let leaf_b = crypto::sha256_hex(&[tx_b.unsigned_digest().as_bytes(), tx_b.hash.as_bytes()]);
        let leaf_c = crypto::sha256_hex(&[tx_c.unsigned_digest().as_bytes(), tx_c.hash.as_bytes()]);

        // level 1: [a, b, c] -> combine(a,b) -> [c, combine(a,b)]
        let combined_ab = crypto::sha256_hex(&[leaf_a.as_bytes(), leaf_b.as_bytes()]);
        // level 2: [c, combine(a,b)] -> combine(c, combine(a,b))
        let expected = crypto::sha256_hex(&[leaf_c.as_bytes(), combined_ab.as_bytes()]);

        assert_eq!(merkle_root(&[tx_a, tx_b, tx_c]), expected);
    }
}
