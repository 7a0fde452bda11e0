//! The shared peer directory: a `"ip:port" -> Peer` map guarded by a
//! single mutex, live for the process lifetime.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::keys::CompositeKey;

/// A discovered peer: its public key, address, and the last handshake
/// nonce exchanged with it (an encrypted-bytes blob, opaque to us once
/// stored).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Peer {
    pub public_key: CompositeKey,
    pub ip: String,
    pub port: u16,
    pub nonce: String,
}

impl Peer {
    pub fn key(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

/// Directory of known peers keyed by `"ip:port"`. All reads and writes,
/// including the snapshot built for an HTTP response, happen under the
/// single internal mutex; it is never held across network I/O.
#[derive(Debug, Default)]
pub struct PeerDirectory {
    peers: Mutex<HashMap<String, Peer>>,
}

impl PeerDirectory {
    pub fn new() -> Self {
        PeerDirectory { peers: Mutex::new(HashMap::new()) }
    }

    /// A snapshot of every peer known *before* this call. Used by the
    /// `/peer` handler: it must describe the directory as it stood prior
    /// to inserting the caller.
    pub fn snapshot(&self) -> Vec<Peer> {
        self.peers.lock().expect("peer directory mutex poisoned").values().cloned().collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.peers.lock().expect("peer directory mutex poisoned").contains_key(key)
    }

    /// Inserts `peer` under its `ip:port` key if not already present.
    /// Returns `true` if it was newly inserted.
    pub fn insert_if_absent(&self, peer: Peer) -> bool {
        let key = peer.key();
        let mut guard = self.peers.lock().expect("peer directory mutex poisoned");
        if guard.contains_key(&key) {
            false
        } else {
            guard.insert(key, peer);
            true
        }
    }

    /// Merges each entry of `incoming` whose key is not already present.
    pub fn merge_new(&self, incoming: Vec<Peer>) {
        let mut guard = self.peers.lock().expect("peer directory mutex poisoned");
        for peer in incoming {
            guard.entry(peer.key()).or_insert(peer);
        }
    }

    pub fn len(&self) -> usize {
        self.peers.lock().expect("peer directory mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;

    fn dummy_key() -> CompositeKey {
        CompositeKey::new(BigUint::from(17u32), BigUint::from(3233u32))
    }

    fn dummy_peer(ip: &str, port: u16) -> Peer {
        Peer { public_key: dummy_key(), ip: ip.to_string(), port, nonce: "n".to_string() }
    }

    #[test]
    fn insert_then_contains() {
        let dir = PeerDirectory::new();
        assert!(dir.insert_if_absent(dummy_peer("10.0.0.1", 5001)));
        assert!(dir.contains("10.0.0.1:5001"));
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let dir = PeerDirectory::new();
        dir.insert_if_absent(dummy_peer("10.0.0.1", 5001));
        assert!(!dir.insert_if_absent(dummy_peer("10.0.0.1", 5001)));
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn snapshot_excludes_nothing_inserted_after() {
        let dir = PeerDirectory::new();
        dir.insert_if_absent(dummy_peer("10.0.0.1", 5001));
        let snap = dir.snapshot();
        dir.insert_if_absent(dummy_peer("10.0.0.2", 5001));
        assert_eq!(snap.len(), 1);
        assert_eq!(dir.len(), 2);
    }

    #[test]
    fn merge_new_skips_already_known_keys() {
        let dir = PeerDirectory::new();
        dir.insert_if_absent(dummy_peer("10.0.0.1", 5001));
        dir.merge_new(vec![dummy_peer("10.0.0.1", 5001), dummy_peer("10.0.0.2", 5001)]);
        assert_eq!(dir.len(), 2);
    }
}
