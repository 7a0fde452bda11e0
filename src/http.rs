//! The HTTP surface: a thin façade over the chain and the peer
//! directory, specified only by its request/response contracts.
//! Rendering blocks or peers for human consumption is a collaborator
//! concern; every route here returns JSON.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::chain::{Block, BlockChain, Transaction};
use crate::config::Config;
use crate::keys::Wallet;
use crate::peer::handshake::{self, HandshakeRequest};
use crate::peer::PeerDirectory;

#[derive(Clone)]
pub struct AppState {
    pub chain: Arc<Mutex<BlockChain>>,
    pub directory: Arc<PeerDirectory>,
    pub identity: Arc<Wallet>,
    pub config: Arc<Config>,
    pub advertise_ip: Arc<str>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/transactions", post(submit_transactions).get(list_blocks))
        .route("/transactions/:block_id", get(get_block))
        .route("/peers", get(list_peers))
        .route("/peer", post(handle_peer))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    height: u64,
    peer_count: usize,
}

/// Not part of spec's external interface -- an additive readiness probe
/// in the style of a typical node's status route.
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let chain = state.chain.lock().expect("chain mutex poisoned");
    Json(HealthResponse { height: chain.last_block().index, peer_count: state.directory.len() })
}

#[derive(Deserialize)]
struct SubmitTransactionsRequest {
    transactions: Vec<Transaction>,
}

#[derive(Serialize)]
struct SubmitTransactionsResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_accepted: Option<usize>,
}

/// `POST /transactions`: mines every parseable transaction in the body.
/// Whether a miner reward is attached is governed by
/// [`Config::reward_on_api_submit`] (spec leaves this an open question;
/// we resolve it behind this flag, defaulting to no reward).
async fn submit_transactions(State(state): State<AppState>, body: Json<SubmitTransactionsRequest>) -> impl IntoResponse {
    let miner = if state.config.reward_on_api_submit { Some(state.identity.as_ref()) } else { None };

    let mut chain = state.chain.lock().expect("chain mutex poisoned");
    match chain.mine_block(body.transactions.clone(), miner) {
        Ok((_block, rejected)) => {
            let num_accepted = body.transactions.len() - rejected.len();
            Json(SubmitTransactionsResponse { status: "ok", num_accepted: Some(num_accepted) })
        }
        Err(_) => Json(SubmitTransactionsResponse { status: "error", num_accepted: None }),
    }
}

#[derive(Deserialize)]
struct ListBlocksQuery {
    start: Option<u64>,
}

/// `GET /transactions[?start=K]`: blocks from the K-th (1-indexed)
/// block onward.
async fn list_blocks(State(state): State<AppState>, Query(query): Query<ListBlocksQuery>) -> impl IntoResponse {
    let chain = state.chain.lock().expect("chain mutex poisoned");
    let start = query.start.unwrap_or(1);
    let offset = start.saturating_sub(1) as usize;
    let blocks: Vec<Block> = chain.iterator(offset).cloned().collect();
    Json(blocks)
}

/// `GET /transactions/<blockID>`: a single 1-indexed block, or a
/// 404-equivalent text body.
async fn get_block(State(state): State<AppState>, Path(block_id): Path<u64>) -> impl IntoResponse {
    let chain = state.chain.lock().expect("chain mutex poisoned");
    match chain.block_at(block_id) {
        Some(block) => Json(block.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "block not found").into_response(),
    }
}

#[derive(Deserialize)]
struct ListPeersQuery {
    #[allow(dead_code)]
    mode: Option<String>,
}

/// `GET /peers[?mode=json|html]`: the current directory snapshot.
/// `mode=html` is accepted but not implemented -- template rendering is
/// a collaborator concern; every mode returns JSON.
async fn list_peers(State(state): State<AppState>, Query(_query): Query<ListPeersQuery>) -> impl IntoResponse {
    Json(state.directory.snapshot())
}

/// `POST /peer`: the authenticated handshake responder. The caller's
/// reachable port is assumed to be this node's own configured ledger
/// port -- every node in this network advertises the same well-known
/// port, only the address varies.
async fn handle_peer(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(request): Json<HandshakeRequest>,
) -> impl IntoResponse {
    let my_private = state.identity.private.as_ref().expect("node identity must hold a private key");
    let result = handshake::handle_peer_request(
        &request,
        &addr.ip().to_string(),
        state.config.ledger_port,
        my_private,
        &state.identity.public,
        &state.advertise_ip,
        state.config.ledger_port,
        &state.directory,
    );
    match result {
        Ok(response) => Json(response).into_response(),
        Err(_) => StatusCode::BAD_REQUEST.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> AppState {
        let (public, private) = crate::keys::generate_keypair(2048);
        let creator = Wallet { name: "node".to_string(), public, private: Some(private) };
        let chain = BlockChain::new(&creator, 100, 1).unwrap();
        AppState {
            chain: Arc::new(Mutex::new(chain)),
            directory: Arc::new(PeerDirectory::new()),
            identity: Arc::new(creator),
            config: Arc::new(Config::default()),
            advertise_ip: Arc::from("127.0.0.1"),
        }
    }

    #[test]
    fn app_state_chain_reflects_genesis() {
        let state = test_state();
        let chain = state.chain.lock().unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.get_balance(&state.identity.account_id(), None), 100);
    }

    #[test]
    fn peer_directory_starts_empty() {
        let state = test_state();
        assert!(state.directory.snapshot().is_empty());
    }
}
