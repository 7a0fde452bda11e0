//! The node binary: loads a key pair, bootstraps a chain, starts the
//! UDP beacon/receiver threads, and serves the HTTP API.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use clap::Parser;
use simplecoin::{
    config::Config,
    error::TransactionError,
    keys::{CompositeKey, Wallet},
    peer, Node,
};

/// simplecoin node: a proof-of-work ledger with UDP/HTTP peer discovery.
#[derive(Parser, Debug)]
#[command(name = "simplecoin-node", version, about)]
struct Cli {
    /// Path to this node's public composite-key file.
    #[arg(long)]
    public_key: PathBuf,

    /// Path to this node's private composite-key file. Required: this
    /// node's identity signs the genesis transaction and every peer
    /// handshake it answers.
    #[arg(long)]
    private_key: PathBuf,

    /// Mining difficulty: leading hex zeros required on a block hash.
    #[arg(long, default_value_t = simplecoin::config::DEFAULT_DIFFICULTY)]
    difficulty: usize,

    /// Miner reward credited to a supplied miner wallet.
    #[arg(long, default_value_t = simplecoin::config::DEFAULT_REWARD)]
    reward: u64,

    /// Genesis seed credited to this node's identity.
    #[arg(long, default_value_t = simplecoin::config::DEFAULT_SEED)]
    seed: u64,

    /// UDP port the beacon broadcasts to and the receiver binds.
    #[arg(long, default_value_t = simplecoin::config::RECEIVE_PORT)]
    receive_port: u16,

    /// HTTP port for the `/peer` handshake and the transaction/query API.
    #[arg(long, default_value_t = simplecoin::config::DEFAULT_LEDGER_PORT)]
    ledger_port: u16,

    /// Whether POST /transactions should attach a miner reward to the
    /// node's own identity. Spec leaves this open; default is no reward.
    #[arg(long, default_value_t = false)]
    reward_on_api_submit: bool,
}

fn load_key(path: &PathBuf) -> anyhow::Result<CompositeKey> {
    let text = std::fs::read_to_string(path)?;
    CompositeKey::from_wire(text.trim()).map_err(anyhow::Error::from)
}

fn bootstrap(cli: &Cli) -> anyhow::Result<Node> {
    let public = load_key(&cli.public_key)?;
    let private = load_key(&cli.private_key)?;
    let identity = Wallet { name: "node".to_string(), public, private: Some(private) };

    let config = Config {
        difficulty: cli.difficulty,
        reward: cli.reward,
        seed: cli.seed,
        receive_port: cli.receive_port,
        ledger_port: cli.ledger_port,
        broadcast_delay: simplecoin::config::BROADCAST_DELAY,
        receive_timeout: simplecoin::config::RECEIVE_TIMEOUT,
        reward_on_api_submit: cli.reward_on_api_submit,
    };

    Node::bootstrap(identity, config).map_err(|e: TransactionError| anyhow::anyhow!(e))
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let _logger = match simplecoin::init_logging() {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("failed to initialize logging: {e}");
            return std::process::ExitCode::FAILURE;
        }
    };

    let node = match bootstrap(&cli) {
        Ok(node) => node,
        Err(e) => {
            log::error!("failed to bootstrap node: {e}");
            return std::process::ExitCode::FAILURE;
        }
    };

    log::info!(
        "bootstrapped chain: difficulty={} reward={} seed={} height={}",
        cli.difficulty,
        cli.reward,
        cli.seed,
        node.chain.lock().expect("chain mutex poisoned").len()
    );

    let (beacon_handle, receiver_handle) = node.spawn_discovery_threads();

    let advertise_ip = peer::local_ip().unwrap_or_else(|e| {
        log::warn!("could not determine LAN address, advertising 127.0.0.1: {e}");
        "127.0.0.1".to_string()
    });
    let state = node.http_state(advertise_ip);
    let app = simplecoin::http::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], cli.ledger_port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            log::error!("failed to bind {addr}: {e}");
            node.running.store(false, Ordering::Relaxed);
            return std::process::ExitCode::FAILURE;
        }
    };
    log::info!("listening on {addr}");

    let serve_result = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await;

    node.running.store(false, Ordering::Relaxed);
    let _ = beacon_handle.join();
    let _ = receiver_handle.join();

    match serve_result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            log::error!("http server error: {e}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    log::info!("shutdown signal received");
}
