//! Signed value-transfer transactions.

use serde::{Deserialize, Serialize};

use crate::crypto;
use crate::error::CryptoError;
use crate::keys::{CompositeKey, CompositeKeyParseError, Wallet};

/// Sentinel sender identifying a System-originated transaction (genesis
/// seed, miner reward). Never carries a balance of its own.
pub const SYSTEM: &str = "System";

/// An immutable, signed value-transfer record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub timestamp: f64,
    pub recv: String,
    pub sender: Option<String>,
    pub amount: u64,
    pub hash: String,
}

impl Transaction {
    /// Builds an ordinary transaction from `sender` to `receiver.public`,
    /// signed under `sender.private`.
    pub fn new(receiver: &Wallet, amount: u64, sender: &Wallet) -> Result<Self, CryptoError> {
        let sender_private = sender
            .private
            .as_ref()
            .expect("sender wallet must hold a private key to originate a transaction");
        Self::build(
            receiver.account_id(),
            Some(sender.account_id()),
            amount,
            sender_private,
        )
    }

    /// Builds a System-originated transaction (genesis seed or miner
    /// reward), signed under the *receiver's* private key.
    pub fn new_system(receiver: &Wallet, amount: u64) -> Result<Self, CryptoError> {
        let receiver_private = receiver
            .private
            .as_ref()
            .expect("receiver wallet must hold a private key to accept a System transaction");
        Self::build(receiver.account_id(), None, amount, receiver_private)
    }

    fn build(
        recv: String,
        sender: Option<String>,
        amount: u64,
        signer_private: &CompositeKey,
    ) -> Result<Self, CryptoError> {
        if amount == 0 {
            return Err(CryptoError::NonPositiveAmount);
        }
        let timestamp = now_fractional_secs();
        let digest = unsigned_digest(&recv, sender.as_deref(), amount, timestamp);
        let hash = crypto::sign(signer_private, &digest)?;

        let tx = Transaction {
            timestamp,
            recv,
            sender,
            amount,
            hash,
        };
        // Spec requires construction to self-verify before returning; an
        // undersized or mismatched key must abort here, not surface as a
        // validation failure somewhere downstream.
        tx.verify_self_described()?;
        Ok(tx)
    }

    /// Recomputes the unsigned digest over the transaction's current
    /// field values.
    pub fn unsigned_digest(&self) -> String {
        unsigned_digest(&self.recv, self.sender.as_deref(), self.amount, self.timestamp)
    }

    /// `true` for transactions minted by the System sentinel (genesis
    /// seed, miner reward).
    pub fn is_system(&self) -> bool {
        self.sender.is_none()
    }

    /// The public key that must have signed this transaction: the
    /// sender's, for ordinary transactions, or the receiver's, for
    /// System-originated ones. `sender` and `recv` are themselves wire
    /// forms of composite keys, so no external lookup is needed.
    pub fn signer_key(&self) -> Result<CompositeKey, CompositeKeyParseError> {
        let wire = self.sender.as_deref().unwrap_or(&self.recv);
        CompositeKey::from_wire(wire)
    }

    /// Recomputes the digest and verifies the signature using
    /// [`Transaction::signer_key`], without requiring the caller to
    /// already hold the signer's key.
    pub fn verify_self_described(&self) -> Result<(), CryptoError> {
        let key = self.signer_key().map_err(|_| CryptoError::HashMismatch)?;
        self.verify(&key)
    }

    /// Recomputes the unsigned digest and checks the signature against the
    /// signer's public key (sender's, or receiver's for System
    /// transactions); also checks `amount > 0`.
    pub fn verify(&self, signer_public: &CompositeKey) -> Result<(), CryptoError> {
        if self.amount == 0 {
            return Err(CryptoError::NonPositiveAmount);
        }
        let digest = self.unsigned_digest();
        if crypto::verify(signer_public, &self.hash, &digest) {
            Ok(())
        } else {
            Err(CryptoError::HashMismatch)
        }
    }
}

fn unsigned_digest(recv: &str, sender: Option<&str>, amount: u64, timestamp: f64) -> String {
    let sender_field = sender.unwrap_or(SYSTEM);
    crypto::sha256_hex(&[
        recv.as_bytes(),
        sender_field.as_bytes(),
        amount.to_string().as_bytes(),
        timestamp.to_string().as_bytes(),
    ])
}

fn now_fractional_secs() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet_with_keys(name: &str) -> Wallet {
        let (public, private) = crate::keys::generate_keypair(2048);
        Wallet {
            name: name.to_string(),
            public,
            private: Some(private),
        }
    }

    fn wallet_public_only(wallet: &Wallet) -> Wallet {
        Wallet {
            name: wallet.name.clone(),
            public: wallet.public.clone(),
            private: None,
        }
    }

    #[test]
    fn ordinary_transaction_self_verifies() {
        let sender = wallet_with_keys("alice");
        let receiver = wallet_with_keys("bob");
        let tx = Transaction::new(&receiver, 10, &sender).unwrap();
        assert!(tx.verify(&sender.public).is_ok());
        assert_eq!(tx.sender.as_deref(), Some(sender.account_id().as_str()));
    }

    #[test]
    fn system_transaction_is_signed_by_receiver() {
        let receiver = wallet_with_keys("miner");
        let tx = Transaction::new_system(&receiver, 10).unwrap();
        assert!(tx.is_system());
        assert!(tx.verify(&receiver.public).is_ok());
    }

    #[test]
    fn verify_fails_under_wrong_key() {
        let sender = wallet_with_keys("alice");
        let other = wallet_with_keys("mallory");
        let receiver = wallet_with_keys("bob");
        let tx = Transaction::new(&receiver, 10, &sender).unwrap();
        assert!(tx.verify(&other.public).is_err());
    }

    #[test]
    fn tampering_with_amount_breaks_verification() {
        let sender = wallet_with_keys("alice");
        let receiver = wallet_with_keys("bob");
        let mut tx = Transaction::new(&receiver, 10, &sender).unwrap();
        tx.amount = 999;
        assert!(tx.verify(&sender.public).is_err());
    }

    #[test]
    fn zero_amount_is_rejected() {
        let sender = wallet_with_keys("alice");
        let receiver = wallet_with_keys("bob");
        let err = Transaction::build(
            receiver.account_id(),
            Some(sender.account_id()),
            0,
            sender.private.as_ref().unwrap(),
        );
        assert!(matches!(err, Err(CryptoError::NonPositiveAmount)));
    }

    #[test]
    fn public_only_wallet_can_still_verify() {
        let sender = wallet_with_keys("alice");
        let receiver = wallet_with_keys("bob");
        let tx = Transaction::new(&receiver, 10, &sender).unwrap();
        let sender_pub = wallet_public_only(&sender);
        assert!(tx.verify(&sender_pub.public).is_ok());
    }

    #[test]
    fn self_described_verification_needs_no_external_key_lookup() {
        let sender = wallet_with_keys("alice");
        let receiver = wallet_with_keys("bob");
        let ordinary = Transaction::new(&receiver, 10, &sender).unwrap();
        assert!(ordinary.verify_self_described().is_ok());

        let system = Transaction::new_system(&receiver, 10).unwrap();
        assert!(system.verify_self_described().is_ok());
    }
}
