//! The in-memory ordered sequence of blocks, with verification, mining,
//! and balance-query operations.

use std::sync::atomic::AtomicBool;

use crate::chain::block::Block;
use crate::chain::transaction::{Transaction, SYSTEM};
use crate::error::{ChainError, TransactionError};
use crate::keys::Wallet;

/// An append-only, in-memory ledger. No persistent storage binding is
/// provided here; that is a collaborator concern.
#[derive(Debug, Clone)]
pub struct BlockChain {
    blocks: Vec<Block>,
    difficulty: usize,
    reward: u64,
}

impl BlockChain {
    /// Builds a genesis block carrying a single `System -> creator, seed`
    /// transaction and mines it with `prevHash = none`. No miner reward
    /// is configured; use [`BlockChain::with_reward`] to set one.
    pub fn new(creator: &Wallet, seed: u64, difficulty: usize) -> Result<Self, TransactionError> {
        let genesis_tx = Transaction::new_system(creator, seed)?;
        let mut genesis = Block::new(vec![genesis_tx], None);
        let cancelled = AtomicBool::new(false);
        genesis.mine(difficulty, &cancelled);
        Ok(BlockChain { blocks: vec![genesis], difficulty, reward: 0 })
    }

    /// Same as [`BlockChain::new`] but also records the miner reward to
    /// use for future [`BlockChain::mine_block`] calls supplied a miner.
    pub fn with_reward(creator: &Wallet, seed: u64, difficulty: usize, reward: u64) -> Result<Self, TransactionError> {
        let mut chain = Self::new(creator, seed, difficulty)?;
        chain.reward = reward;
        Ok(chain)
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn reward(&self) -> u64 {
        self.reward
    }

    pub fn first_block(&self) -> &Block {
        self.blocks.first().expect("a chain always has a genesis block")
    }

    pub fn last_block(&self) -> &Block {
        self.blocks.last().expect("a chain always has a genesis block")
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Enumerates blocks in order, optionally starting `offset` blocks
    /// into the chain (0-based). `offset` beyond the chain length yields
    /// an empty iterator.
    pub fn iterator(&self, offset: usize) -> impl Iterator<Item = &Block> {
        self.blocks.iter().skip(offset)
    }

    /// 1-indexed block lookup.
    pub fn block_at(&self, index: u64) -> Option<&Block> {
        if index == 0 {
            return None;
        }
        self.blocks.get((index - 1) as usize)
    }

    fn append_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Balance of `account_key` over blocks `[1, up_to_block_index]`
    /// (default: the whole chain). Unknown accounts and the System
    /// sentinel return 0.
    pub fn get_balance(&self, account_key: &str, up_to_block_index: Option<u64>) -> i128 {
        if account_key == SYSTEM {
            return 0;
        }
        let limit = up_to_block_index.unwrap_or(self.last_block().index);
        let mut balance: i128 = 0;
        for block in self.blocks.iter().take_while(|b| b.index <= limit) {
            for tx in &block.transactions {
                if tx.recv == account_key {
                    balance += tx.amount as i128;
                }
                if tx.sender.as_deref() == Some(account_key) {
                    balance -= tx.amount as i128;
                }
            }
        }
        balance
    }

    /// System transactions always succeed. Ordinary transactions must
    /// `tx.verify_self_described()` and the sender's balance (as of
    /// `up_to_block_index`, default whole chain) must cover `tx.amount`.
    pub fn verify_transaction(&self, tx: &Transaction, up_to_block_index: Option<u64>) -> Result<(), TransactionError> {
        tx.verify_self_described()?;
        if tx.is_system() {
            return Ok(());
        }
        let sender = tx.sender.as_deref().expect("non-system transaction carries a sender");
        let balance = self.get_balance(sender, up_to_block_index);
        if balance < tx.amount as i128 {
            return Err(TransactionError::InsufficientBalance { balance, amount: tx.amount });
        }
        Ok(())
    }

    /// Mines a new block from `candidates`.
    ///
    /// 1. Transactions failing [`BlockChain::verify_transaction`] against
    ///    the *current* chain are split off into the rejected list.
    ///    Candidates are evaluated independently of each other within the
    ///    same batch (a double-spend guard: a batch only valid as a
    ///    sequence must be submitted sequentially).
    /// 2. If the surviving set is non-empty, `miner` is supplied, and a
    ///    reward is configured, a reward transaction `System -> miner,
    ///    reward` is prepended.
    /// 3. The block is sealed by proof-of-work at the chain's difficulty.
    /// 4. The block is appended.
    ///
    /// Returns `(sealed_block, rejected)`; `sealed_block` is `None` if
    /// nothing was mineable.
    pub fn mine_block(
        &mut self,
        candidates: Vec<Transaction>,
        miner: Option<&Wallet>,
    ) -> Result<(Option<Block>, Vec<Transaction>), TransactionError> {
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        for tx in candidates {
            match self.verify_transaction(&tx, None) {
                Ok(()) => accepted.push(tx),
                Err(_) => rejected.push(tx),
            }
        }

        if accepted.is_empty() {
            return Ok((None, rejected));
        }

        if let Some(miner) = miner {
            if self.reward > 0 {
                let reward_tx = Transaction::new_system(miner, self.reward)?;
                accepted.insert(0, reward_tx);
            }
        }

        let mut block = Block::new(accepted, Some(self.last_block()));
        let cancelled = AtomicBool::new(false);
        block.mine(self.difficulty, &cancelled);
        self.append_block(block.clone());
        Ok((Some(block), rejected))
    }

    /// All-or-nothing chain verification: every block self-verifies,
    /// every transaction is re-validated against cumulative balance
    /// computed over `[1, block.index - 1]`, and every `prevHash` equals
    /// the prior block's `currHash`. Reports the first defect found.
    pub fn verify(&self) -> Result<(), ChainError> {
        if self.blocks.is_empty() {
            return Err(ChainError::EmptyChain);
        }
        let mut prev: Option<&Block> = None;
        for block in &self.blocks {
            match prev {
                None => {
                    if block.prev_hash != crate::chain::block::NONE_PREV_HASH {
                        return Err(ChainError::MissingPrevHash { index: block.index });
                    }
                }
                Some(prior) => {
                    if block.prev_hash != prior.curr_hash {
                        return Err(ChainError::PrevHashMismatch { index: block.index, prev_index: prior.index });
                    }
                }
            }
            block.verify(self.difficulty)?;
            for (ordinal, tx) in block.transactions.iter().enumerate() {
                if tx.is_system() {
                    continue;
                }
                self.verify_transaction(tx, Some(block.index - 1))
                    .map_err(|source| ChainError::InvalidTransaction { index: block.index, tx_ordinal: ordinal, source })?;
            }
            prev = Some(block);
        }
        Ok(())
    }
}
