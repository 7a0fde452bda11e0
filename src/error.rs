//! Domain error types.
//!
//! Grouped the way spec groups them: crypto primitives, chain/block
//! validation, and peer handshake failures. HTTP handlers flatten these
//! into the `{status: "error"}` / 404 bodies described by the external
//! interface; nothing here should ever become a panic outside tests.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("no modular inverse exists for the given exponent and modulus")]
    NoModularInverse,
    #[error("signed hash does not match the recomputed digest")]
    HashMismatch,
    #[error("transaction amount must be positive")]
    NonPositiveAmount,
    #[error("message integer is not smaller than the modulus")]
    MessageTooLarge,
    #[error("wire value is not valid utf-8 after decryption")]
    InvalidUtf8,
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("block {index}: hash does not match recomputed digest")]
    BlockHashMismatch { index: u64 },
    #[error("block {index}: merkle root does not match transactions")]
    MerkleMismatch { index: u64 },
    #[error("block {index}: previous hash does not match block {prev_index}'s hash")]
    PrevHashMismatch { index: u64, prev_index: u64 },
    #[error("block {index}: missing previous hash but is not genesis")]
    MissingPrevHash { index: u64 },
    #[error("block {index}, transaction {tx_ordinal}: {source}")]
    InvalidTransaction {
        index: u64,
        tx_ordinal: usize,
        #[source]
        source: TransactionError,
    },
    #[error("block {index} carries no transactions")]
    EmptyBlock { index: u64 },
    #[error("chain is empty")]
    EmptyChain,
}

#[derive(Debug, Error)]
pub enum TransactionError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error("sender has insufficient balance: has {balance}, needs {amount}")]
    InsufficientBalance { balance: i128, amount: u64 },
}

#[derive(Debug, Error)]
pub enum PeerError {
    #[error("malformed handshake payload")]
    MalformedPayload,
    #[error("decryption of handshake payload failed")]
    DecryptionFailed,
    #[error("nonce echoed back by peer did not match the one we sent")]
    NonceMismatch,
    #[error("socket receive timed out")]
    Timeout,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
