mod common;

use bumo_client::{BlockRef, ClientError};
use bumo_core::Amount;
use common::{client_for, spawn, MockNode, BASE_RESERVE, GAS_PRICE, GENESIS_CLOSE_TIME};

#[tokio::test]
async fn test_block_number_and_info() {
    let mut node = MockNode::new();
    node.ledgers.push(("aa".repeat(32), Vec::new()));
    let (host, _node) = spawn(node).await;
    let client = client_for(&host, 5);

    assert_eq!(client.get_block_number().await.unwrap(), 2);

    let latest = client.get_block_info(BlockRef::Latest).await.unwrap();
    assert_eq!(latest.number, 2);
    assert_eq!(latest.hash, "aa".repeat(32));

    let first = client.get_block_info(BlockRef::Number(1)).await.unwrap();
    assert_eq!(first.number, 1);
    assert_eq!(latest.previous_hash, first.hash);
    assert_eq!(
        first.closed_at().unwrap().timestamp_micros(),
        GENESIS_CLOSE_TIME + 10_000_000
    );
}

#[tokio::test]
async fn test_missing_block() {
    let (host, _node) = spawn(MockNode::new()).await;
    let client = client_for(&host, 5);

    let err = client.get_block_info(BlockRef::Number(999)).await.unwrap_err();
    assert!(matches!(err, ClientError::BlockNotFound(ref n) if n == "999"));
    assert_eq!(err.code(), 4);
}

#[tokio::test]
async fn test_validators_reward_and_fees() {
    let (host, node) = spawn(MockNode::new()).await;
    let client = client_for(&host, 5);
    let validator = node.lock().unwrap().validators[0].clone();

    let validators = client.get_validators(BlockRef::Latest).await.unwrap();
    assert_eq!(validators.len(), 1);
    assert_eq!(validators[0].address, validator);

    let reward = client.get_reward(BlockRef::Number(1)).await.unwrap();
    assert_eq!(reward.block_reward, Amount::from(800_000_000));
    assert_eq!(reward.validators_reward[&validator], Amount::from(800_000_000));

    let fees = client.get_fees(BlockRef::Latest).await.unwrap();
    assert_eq!(fees.base_reserve, Amount::from(BASE_RESERVE));
    assert_eq!(fees.gas_price, Amount::from(GAS_PRICE));
}

#[tokio::test]
async fn test_block_status() {
    let (host, node) = spawn(MockNode::new()).await;
    let client = client_for(&host, 5);
    assert!(client.check_block_status().await.unwrap());

    node.lock().unwrap().chain_max_ledger_seq = Some(50);
    assert!(!client.check_block_status().await.unwrap());
}

#[tokio::test]
async fn test_empty_block_has_no_transactions() {
    let (host, _node) = spawn(MockNode::new()).await;
    let client = client_for(&host, 5);
    assert!(client.get_block_transactions(1).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_transactions_of_missing_block() {
    let (host, _node) = spawn(MockNode::new()).await;
    let client = client_for(&host, 5);

    let err = client.get_block_transactions(999).await.unwrap_err();
    assert!(matches!(err, ClientError::BlockNotFound(ref n) if n == "999"));
    assert_eq!(err.code(), 4);
}

#[tokio::test]
async fn test_transaction_lookup_validates_hash() {
    let (host, _node) = spawn(MockNode::new()).await;
    let client = client_for(&host, 5);

    assert!(matches!(
        client.get_transaction_info("xyz").await,
        Err(ClientError::InvalidHash(_))
    ));
    let unknown = "ab".repeat(32);
    assert!(matches!(
        client.get_transaction_info(&unknown).await,
        Err(ClientError::TransactionNotFound(_))
    ));
}
