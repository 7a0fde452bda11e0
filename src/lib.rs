//! A small-scale proof-of-work ledger: signed transactions, content-
//! chained blocks mined under a difficulty target, and a UDP-beacon plus
//! HTTP `/peer` handshake that lets independent nodes find each other on
//! a LAN.

pub mod bigint;
pub mod chain;
pub mod config;
pub mod crypto;
pub mod error;
pub mod http;
pub mod keys;
pub mod peer;

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, Naming, WriteMode};

use chain::BlockChain;
use config::Config;
use keys::Wallet;
use peer::PeerDirectory;

/// Initializes file-backed, size-rotated logging. Call once from each
/// binary entry point before doing anything else.
pub fn init_logging() -> Result<flexi_logger::LoggerHandle, flexi_logger::FlexiLoggerError> {
    Logger::try_with_str("info, simplecoin=debug")?
        .log_to_file(FileSpec::default().directory("logs").basename("simplecoin"))
        .write_mode(WriteMode::Async)
        .rotate(Criterion::Size(10 * 1024 * 1024), Naming::Timestamps, Cleanup::KeepLogFiles(7))
        .start()
}

/// Everything a running node shares across its HTTP handlers and its two
/// background peer-discovery threads.
pub struct Node {
    pub chain: Arc<Mutex<BlockChain>>,
    pub directory: Arc<PeerDirectory>,
    pub identity: Arc<Wallet>,
    pub config: Arc<Config>,
    pub running: Arc<AtomicBool>,
}

impl Node {
    /// Builds a node around a freshly seeded chain: genesis is `System ->
    /// identity, config.seed`, mined at `config.difficulty`.
    pub fn bootstrap(identity: Wallet, config: Config) -> Result<Self, error::TransactionError> {
        let chain = BlockChain::with_reward(&identity, config.seed, config.difficulty, config.reward)?;
        Ok(Node {
            chain: Arc::new(Mutex::new(chain)),
            directory: Arc::new(PeerDirectory::new()),
            identity: Arc::new(identity),
            config: Arc::new(config),
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Spawns the UDP beacon and receiver threads sharing this node's
    /// identity, directory, and configuration.
    pub fn spawn_discovery_threads(&self) -> (std::thread::JoinHandle<()>, std::thread::JoinHandle<()>) {
        let beacon = peer::beacon::spawn(
            self.identity.public.clone(),
            self.config.receive_port,
            self.config.broadcast_delay,
            Arc::clone(&self.running),
        );
        let receiver = peer::receiver::spawn(
            self.identity.public.clone(),
            self.config.receive_port,
            self.config.ledger_port,
            self.config.receive_timeout,
            config::HANDSHAKE_HTTP_TIMEOUT,
            Arc::clone(&self.directory),
            Arc::clone(&self.running),
        );
        (beacon, receiver)
    }

    pub fn http_state(&self, advertise_ip: String) -> http::AppState {
        http::AppState {
            chain: Arc::clone(&self.chain),
            directory: Arc::clone(&self.directory),
            identity: Arc::clone(&self.identity),
            config: Arc::clone(&self.config),
            advertise_ip: Arc::from(advertise_ip.as_str()),
        }
    }
}
