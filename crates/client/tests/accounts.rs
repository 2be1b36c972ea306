mod common;

use bumo_client::{ClientError, Envelope, NonceInfo, SdkError};
use bumo_core::{Amount, Keypair};
use common::{client_for, spawn, MockNode};
use serde_json::json;

#[tokio::test]
async fn test_account_info_and_nonce() {
    let alice = Keypair::generate().address().to_string();
    let mut node = MockNode::new();
    node.fund(&alice, 7_000_000, 10);
    let (host, _node) = spawn(node).await;
    let client = client_for(&host, 5);

    let info = client.get_account_info(&alice).await.unwrap();
    assert_eq!(info.address.as_str(), alice);
    assert_eq!(info.balance, Amount::from(7_000_000));
    assert_eq!(info.nonce, 10);
    assert!(info.is_activated);
    assert!(info.assets.is_empty());

    assert_eq!(client.get_nonce(&alice).await.unwrap().nonce, 10);
    assert_eq!(client.get_balance(&alice).await.unwrap(), Amount::from(7_000_000));
    assert!(client.is_activated(&alice).await.unwrap());
}

#[tokio::test]
async fn test_fresh_account_reports_zero_nonce() {
    let alice = Keypair::generate().address().to_string();
    let mut node = MockNode::new();
    node.fund(&alice, 1, 0);
    let (host, _node) = spawn(node).await;
    let client = client_for(&host, 5);

    assert_eq!(client.get_nonce(&alice).await.unwrap().nonce, 0);
    let seq = client.nonce_sequencer(&alice).await.unwrap();
    assert_eq!(seq.peek(), 1);
}

#[tokio::test]
async fn test_unknown_account() {
    let (host, _node) = spawn(MockNode::new()).await;
    let client = client_for(&host, 5);
    let nobody = client.create_account().address;

    let err = client.get_account_info(&nobody).await.unwrap_err();
    assert!(matches!(err, ClientError::AccountNotFound(ref a) if *a == nobody));
    assert!(matches!(
        client.get_nonce(&nobody).await,
        Err(ClientError::AccountNotFound(_))
    ));
    assert!(!client.is_activated(&nobody).await.unwrap());
}

#[tokio::test]
async fn test_invalid_address_rejected_locally() {
    // Nothing listens here; a local rejection must not need the network.
    let client = client_for("127.0.0.1:9", 1);

    let err = client.get_balance("buQnotanaddress").await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidAddress(_)));
    assert!(!client.check_address("buQnotanaddress"));
}

#[tokio::test]
async fn test_envelope_for_queries() {
    let alice = Keypair::generate().address().to_string();
    let mut node = MockNode::new();
    node.fund(&alice, 500, 3);
    let (host, _node) = spawn(node).await;
    let client = client_for(&host, 5);

    let ok: Envelope<NonceInfo> = client.get_nonce(&alice).await.map_err(SdkError::from).into();
    assert_eq!(
        serde_json::to_value(&ok).unwrap(),
        json!({"errorCode": 0, "result": {"nonce": "3"}})
    );

    let nobody = client.create_account().address;
    let missing: Envelope<NonceInfo> = client.get_nonce(&nobody).await.map_err(SdkError::from).into();
    assert_eq!(missing.error_code, 4);
    assert!(missing.result.is_none());
    assert!(missing.error_desc.unwrap().contains(&nobody));
}

#[tokio::test]
async fn test_unreachable_node_is_a_network_error() {
    // Bind and drop to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let host = listener.local_addr().unwrap().to_string();
    drop(listener);

    let client = client_for(&host, 2);
    let alice = Keypair::generate().address().to_string();
    let err = client.get_nonce(&alice).await.unwrap_err();
    assert!(matches!(err, ClientError::Http(_) | ClientError::Timeout(_)));
    assert_ne!(err.code(), 0);
}
