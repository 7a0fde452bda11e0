//! The outbound UDP beacon: a paced `sleep -> send` loop run on its own
//! OS thread, independent of the async HTTP surface.

use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use crate::keys::CompositeKey;
use crate::peer::handshake::Beacon;

/// Spawns the beacon thread. Broadcasts `{coin, id}` to the LAN broadcast
/// address on `receive_port` every `delay`, until `running` is cleared.
/// The sleep between sends is the thread's only suspension point, so
/// cancellation latency is bounded by one `delay` interval.
pub fn spawn(public: CompositeKey, receive_port: u16, delay: Duration, running: Arc<AtomicBool>) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let socket = match UdpSocket::bind(("0.0.0.0", 0)) {
            Ok(s) => s,
            Err(e) => {
                warn!("beacon: failed to bind broadcast socket: {e}");
                return;
            }
        };
        if let Err(e) = socket.set_broadcast(true) {
            warn!("beacon: failed to enable broadcast: {e}");
            return;
        }

        let beacon = Beacon::new(&public);
        let payload = match serde_json::to_vec(&beacon) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("beacon: failed to serialize beacon payload: {e}");
                return;
            }
        };

        while running.load(Ordering::Relaxed) {
            match socket.send_to(&payload, ("255.255.255.255", receive_port)) {
                Ok(_) => debug!("beacon: broadcast sent"),
                Err(e) => warn!("beacon: send failed: {e}"),
            }
            std::thread::sleep(delay);
        }
    })
}
