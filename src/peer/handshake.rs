//! The authenticated `/peer` handshake: a nonce-based challenge-response
//! that lets a node prove custody of the private key matching the public
//! key its beacon advertises.

use serde::{Deserialize, Serialize};

use crate::crypto;
use crate::error::PeerError;
use crate::keys::CompositeKey;
use crate::peer::directory::{Peer, PeerDirectory};

/// UDP broadcast payload: advertises our public key under a fixed coin
/// name so unrelated broadcast traffic on the LAN is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Beacon {
    pub coin: String,
    pub id: String,
}

pub const COIN_NAME: &str = "simplecoin";

impl Beacon {
    pub fn new(public: &CompositeKey) -> Self {
        Beacon { coin: COIN_NAME.to_string(), id: public.to_wire() }
    }
}

/// The plaintext enclosed (encrypted under the peer's public key) in a
/// handshake request's `data` field.
#[derive(Debug, Serialize, Deserialize)]
struct IpNonce {
    address: String,
    nonce: u64,
}

/// `POST /peer` request body.
#[derive(Debug, Serialize, Deserialize)]
pub struct HandshakeRequest {
    pub data: String,
    pub id: String,
}

/// `POST /peer` response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct HandshakeResponse {
    pub peers: Vec<Peer>,
    pub id: Peer,
    pub nonce: String,
}

/// Result of a successfully authenticated handshake, as seen by the
/// initiator (the receiver thread that sent the request).
pub struct HandshakeOutcome {
    pub new_peers: Vec<Peer>,
    pub responder: Peer,
}

/// Initiates a handshake with `peer_ip:ledger_port`, whose public key
/// (wire form) was just seen in a beacon datagram. Encrypts a
/// freshly generated nonce under the peer's public key, POSTs it, and
/// authenticates the response by decrypting its `nonce` field under the
/// peer's public key and checking it echoes what we sent.
pub fn initiate_handshake(
    client: &reqwest::blocking::Client,
    peer_ip: &str,
    ledger_port: u16,
    peer_public_wire: &str,
    my_public: &CompositeKey,
) -> Result<HandshakeOutcome, PeerError> {
    let peer_public = CompositeKey::from_wire(peer_public_wire).map_err(|_| PeerError::MalformedPayload)?;

    let send_nonce: u64 = rand::random();
    let ip_nonce = IpNonce { address: format!("{peer_ip}:{ledger_port}"), nonce: send_nonce };
    let plaintext = serde_json::to_string(&ip_nonce)?;
    let encrypted = crypto::encrypt_with_key(&peer_public, &plaintext).map_err(|_| PeerError::MalformedPayload)?;

    let request = HandshakeRequest { data: encrypted, id: my_public.to_wire() };
    let url = format!("http://{peer_ip}:{ledger_port}/peer");
    let response: HandshakeResponse = client.post(url).json(&request).send()?.json()?;

    let recovered =
        crypto::decrypt_with_key(&response.id.public_key, &response.nonce).map_err(|_| PeerError::DecryptionFailed)?;
    if recovered != send_nonce.to_string() {
        return Err(PeerError::NonceMismatch);
    }

    Ok(HandshakeOutcome { new_peers: response.peers, responder: response.id })
}

/// Server-side `/peer` handler body, callable both from the axum route
/// and directly from tests. Decrypts `request.data` with our private key
/// (proving we hold it), registers the caller, and replies with a
/// snapshot of previously known peers plus an authenticated echo of the
/// caller's nonce.
///
/// Never leaves the directory mutex held across this call's network-free
/// body for longer than the snapshot/insert; there is no I/O here for the
/// caller to block on.
pub fn handle_peer_request(
    request: &HandshakeRequest,
    caller_ip: &str,
    caller_port: u16,
    my_private: &CompositeKey,
    my_public: &CompositeKey,
    advertise_ip: &str,
    advertise_port: u16,
    directory: &PeerDirectory,
) -> Result<HandshakeResponse, PeerError> {
    let plaintext = crypto::decrypt_with_key(my_private, &request.data).map_err(|_| PeerError::DecryptionFailed)?;
    let ip_nonce: IpNonce = serde_json::from_str(&plaintext).map_err(|_| PeerError::MalformedPayload)?;
    let caller_public = CompositeKey::from_wire(&request.id).map_err(|_| PeerError::MalformedPayload)?;

    let snapshot = directory.snapshot();
    let caller_peer =
        Peer { public_key: caller_public, ip: caller_ip.to_string(), port: caller_port, nonce: request.data.clone() };
    directory.insert_if_absent(caller_peer);

    let echoed_nonce = crypto::sign(my_private, &ip_nonce.nonce.to_string()).map_err(|_| PeerError::DecryptionFailed)?;
    let me = Peer {
        public_key: my_public.clone(),
        ip: advertise_ip.to_string(),
        port: advertise_port,
        nonce: echoed_nonce.clone(),
    };

    Ok(HandshakeResponse { peers: snapshot, id: me, nonce: echoed_nonce })
}
