//! End-to-end chain scenario exercised through the public API only,
//! mirroring the documented walk of balances across six blocks.

use simplecoin::chain::BlockChain;
use simplecoin::chain::Transaction;
use simplecoin::keys::{generate_keypair, Wallet};

fn wallet(name: &str) -> Wallet {
    let (public, private) = generate_keypair(2048);
    Wallet { name: name.to_string(), public, private: Some(private) }
}

#[test]
fn documented_balance_walk_across_six_blocks() {
    let creator = wallet("A");
    let receiver = wallet("B");
    let miner = wallet("M");

    let mut chain = BlockChain::with_reward(&creator, 100, 2, 10).unwrap();
    assert_eq!(chain.len(), 1);
    assert_eq!(chain.get_balance(&creator.account_id(), None), 100);

    let tx = Transaction::new(&receiver, 40, &creator).unwrap();
    let (block, rejected) = chain.mine_block(vec![tx], Some(&miner)).unwrap();
    assert!(block.is_some());
    assert!(rejected.is_empty());
    assert_eq!(chain.len(), 2);
    assert_eq!(chain.get_balance(&creator.account_id(), None), 60);
    assert_eq!(chain.get_balance(&receiver.account_id(), None), 40);
    assert_eq!(chain.get_balance(&miner.account_id(), None), 10);

    let tx = Transaction::new(&creator, 15, &receiver).unwrap();
    chain.mine_block(vec![tx], Some(&miner)).unwrap();
    assert_eq!(chain.get_balance(&creator.account_id(), None), 75);
    assert_eq!(chain.get_balance(&receiver.account_id(), None), 25);
    assert_eq!(chain.get_balance(&miner.account_id(), None), 20);

    let tx = Transaction::new(&receiver, 60, &creator).unwrap();
    chain.mine_block(vec![tx], Some(&miner)).unwrap();
    assert_eq!(chain.get_balance(&creator.account_id(), None), 15);
    assert_eq!(chain.get_balance(&receiver.account_id(), None), 85);
    assert_eq!(chain.get_balance(&miner.account_id(), None), 30);
    assert_eq!(chain.len(), 4);

    // Overspend: creator only has 15 left, tries to send 20. Rejected,
    // chain height unchanged.
    let tx = Transaction::new(&receiver, 20, &creator).unwrap();
    let (block, rejected) = chain.mine_block(vec![tx], Some(&miner)).unwrap();
    assert!(block.is_none());
    assert_eq!(rejected.len(), 1);
    assert_eq!(chain.len(), 4);

    let tx = Transaction::new(&creator, 50, &receiver).unwrap();
    chain.mine_block(vec![tx], Some(&miner)).unwrap();
    assert_eq!(chain.get_balance(&creator.account_id(), None), 65);
    assert_eq!(chain.get_balance(&receiver.account_id(), None), 35);
    assert_eq!(chain.get_balance(&miner.account_id(), None), 40);
    assert_eq!(chain.len(), 5);

    chain.verify().expect("a chain built entirely through mine_block must self-verify");
}

#[test]
fn chain_with_no_reward_configured_never_mints_one() {
    let creator = wallet("A");
    let receiver = wallet("B");
    let miner = wallet("M");
    let mut chain = BlockChain::new(&creator, 50, 1).unwrap();

    let tx = Transaction::new(&receiver, 10, &creator).unwrap();
    chain.mine_block(vec![tx], Some(&miner)).unwrap();
    assert_eq!(chain.get_balance(&miner.account_id(), None), 0);
}

#[test]
fn balances_at_an_earlier_index_ignore_later_blocks() {
    let creator = wallet("A");
    let receiver = wallet("B");
    let mut chain = BlockChain::new(&creator, 100, 1).unwrap();

    let tx = Transaction::new(&receiver, 30, &creator).unwrap();
    chain.mine_block(vec![tx], None).unwrap();
    let tx = Transaction::new(&receiver, 20, &creator).unwrap();
    chain.mine_block(vec![tx], None).unwrap();

    assert_eq!(chain.get_balance(&receiver.account_id(), Some(1)), 0);
    assert_eq!(chain.get_balance(&receiver.account_id(), Some(2)), 30);
    assert_eq!(chain.get_balance(&receiver.account_id(), Some(3)), 50);
}
