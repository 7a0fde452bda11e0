//! Node configuration.
//!
//! Generalizes the teacher crate's `utils::constants` (a module of bare
//! `const`s) into an overridable struct: a pedagogical node meant to run
//! several instances side-by-side on one LAN needs distinct ports per
//! instance, so these can't stay compile-time constants. `Default` still
//! matches spec's documented end-to-end scenario values (`D=2`, `R=10`,
//! `S=100`).

use std::time::Duration;

/// Mining difficulty: minimum count of leading hex `'0'` characters
/// required on a block's `curr_hash`.
pub const DEFAULT_DIFFICULTY: usize = 2;
/// Miner reward, in coins, prepended to a mined block when a miner wallet
/// is supplied.
pub const DEFAULT_REWARD: u64 = 10;
/// Genesis seed amount credited to the chain's creator.
pub const DEFAULT_SEED: u64 = 100;
/// UDP port the beacon broadcasts to and the receiver binds.
pub const RECEIVE_PORT: u16 = 5001;
/// Default HTTP port for the `/peer` handshake and transaction/query API.
pub const DEFAULT_LEDGER_PORT: u16 = 8000;
/// Delay between successive beacon broadcasts.
pub const BROADCAST_DELAY: Duration = Duration::from_secs(3);
/// UDP receive timeout; also the cadence at which the receiver loop checks
/// for shutdown.
pub const RECEIVE_TIMEOUT: Duration = Duration::from_secs(3);
/// Timeout for the outbound `/peer` handshake POST.
pub const HANDSHAKE_HTTP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct Config {
    pub difficulty: usize,
    pub reward: u64,
    pub seed: u64,
    pub receive_port: u16,
    pub ledger_port: u16,
    pub broadcast_delay: Duration,
    pub receive_timeout: Duration,
    /// Resolves the open question in spec §9: whether `POST /transactions`
    /// should mine with a miner reward. Defaults to `false`, matching the
    /// literal behavior spec flags as likely unintentional.
    pub reward_on_api_submit: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            difficulty: DEFAULT_DIFFICULTY,
            reward: DEFAULT_REWARD,
            seed: DEFAULT_SEED,
            receive_port: RECEIVE_PORT,
            ledger_port: DEFAULT_LEDGER_PORT,
            broadcast_delay: BROADCAST_DELAY,
            receive_timeout: RECEIVE_TIMEOUT,
            reward_on_api_submit: false,
        }
    }
}
