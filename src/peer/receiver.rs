//! The inbound UDP receiver: blocks in `recv_from` with a short timeout
//! so cancellation is checked regularly, and reacts to each beacon by
//! initiating the `/peer` handshake.

use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::keys::CompositeKey;
use crate::peer::directory::PeerDirectory;
use crate::peer::handshake::{self, Beacon};

/// Spawns the receiver thread. Binds `receive_port`, and for every
/// distinct beacon seen (not our own), initiates a handshake against the
/// sender's address on `ledger_port` and merges the outcome into
/// `directory`. Exits once `running` is cleared; cancellation latency is
/// bounded by `receive_timeout`.
#[allow(clippy::too_many_arguments)]
pub fn spawn(
    my_public: CompositeKey,
    receive_port: u16,
    ledger_port: u16,
    receive_timeout: Duration,
    http_timeout: Duration,
    directory: Arc<PeerDirectory>,
    running: Arc<AtomicBool>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let socket = match UdpSocket::bind(("0.0.0.0", receive_port)) {
            Ok(s) => s,
            Err(e) => {
                warn!("peer receiver: failed to bind port {receive_port}: {e}");
                return;
            }
        };
        if let Err(e) = socket.set_read_timeout(Some(receive_timeout)) {
            warn!("peer receiver: failed to set read timeout: {e}");
            return;
        }

        let client = match reqwest::blocking::Client::builder().timeout(http_timeout).build() {
            Ok(c) => c,
            Err(e) => {
                warn!("peer receiver: failed to build http client: {e}");
                return;
            }
        };

        let my_id = my_public.to_wire();
        let mut buf = [0u8; 4096];

        while running.load(Ordering::Relaxed) {
            let (len, src) = match socket.recv_from(&mut buf) {
                Ok(pair) => pair,
                Err(ref e) if matches!(e.kind(), std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut) => {
                    continue;
                }
                Err(e) => {
                    warn!("peer receiver: recv failed: {e}");
                    continue;
                }
            };

            let beacon: Beacon = match serde_json::from_slice(&buf[..len]) {
                Ok(b) => b,
                Err(_) => continue,
            };
            if beacon.coin != handshake::COIN_NAME || beacon.id == my_id {
                continue;
            }

            let peer_ip = src.ip().to_string();
            match handshake::initiate_handshake(&client, &peer_ip, ledger_port, &beacon.id, &my_public) {
                Ok(outcome) => {
                    let responder_key = outcome.responder.key();
                    directory.merge_new(outcome.new_peers);
                    directory.insert_if_absent(outcome.responder);
                    info!("peer receiver: handshake with {responder_key} succeeded");
                }
                Err(e) => debug!("peer receiver: handshake with {peer_ip} failed: {e}"),
            }
        }
    })
}

/// Best-effort discovery of the address this process would use to reach
/// the LAN, via the connect-without-sending trick: connecting a UDP
/// socket never sends a packet, it only asks the kernel to pick a route.
pub fn local_ip() -> std::io::Result<String> {
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.connect("8.8.8.8:80")?;
    Ok(socket.local_addr()?.ip().to_string())
}
