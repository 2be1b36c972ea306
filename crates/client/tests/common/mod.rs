//! In-process mock BUMO node for integration tests.
//!
//! Serves the subset of the node HTTP API the client uses. Submissions are
//! decoded, their signatures checked and their nonce enforced; accepted
//! transactions close a new ledger immediately.

#![allow(dead_code)]

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use bumo_client::{ChainClient, ClientConfig};
use bumo_core::{Keypair, Operation, Signature, TransactionBlob, TransactionRequest};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

pub const GENESIS_CLOSE_TIME: i64 = 1_524_031_260_000_000;
pub const BASE_RESERVE: u64 = 10_000_000;
pub const GAS_PRICE: u64 = 1000;

#[derive(Debug, Clone, Default)]
pub struct MockAccount {
    pub balance: u64,
    pub nonce: u64,
    /// `(code, issuer) -> amount`
    pub assets: BTreeMap<(String, String), u64>,
}

#[derive(Debug, Clone)]
pub struct RecordedTx {
    pub hash: String,
    pub ledger_seq: u64,
    pub error_code: i64,
    pub error_desc: String,
    pub request: TransactionRequest,
}

#[derive(Debug)]
pub struct MockNode {
    pub accounts: HashMap<String, MockAccount>,
    /// Closed ledgers as `(hash, tx hashes)`; index is `seq - 1`.
    pub ledgers: Vec<(String, Vec<String>)>,
    pub history: Vec<RecordedTx>,
    pub validators: Vec<String>,
    pub chain_max_ledger_seq: Option<u64>,
    pub submit_delay: Option<Duration>,
    pub submissions: usize,
}

impl Default for MockNode {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNode {
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
            ledgers: vec![(hex_of_seq(1), Vec::new())],
            history: Vec::new(),
            validators: vec![Keypair::generate().address().to_string()],
            chain_max_ledger_seq: None,
            submit_delay: None,
            submissions: 0,
        }
    }

    pub fn fund(&mut self, address: &str, balance: u64, nonce: u64) {
        self.accounts.insert(
            address.to_string(),
            MockAccount {
                balance,
                nonce,
                assets: BTreeMap::new(),
            },
        );
    }

    pub fn height(&self) -> u64 {
        self.ledgers.len() as u64
    }

    fn close_time(seq: u64) -> i64 {
        GENESIS_CLOSE_TIME + seq as i64 * 10_000_000
    }
}

pub type Shared = Arc<Mutex<MockNode>>;

/// Start the mock node on an ephemeral port. Returns its `host:port`.
pub async fn spawn(node: MockNode) -> (String, Shared) {
    let shared = Arc::new(Mutex::new(node));
    let app = Router::new()
        .route("/getAccountBase", get(account_base))
        .route("/getAccount", get(account))
        .route("/getLedger", get(ledger))
        .route("/getTransactionHistory", get(transaction_history))
        .route("/getModulesStatus", get(modules_status))
        .route("/submitTransaction", post(submit_transaction))
        .with_state(shared.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr.to_string(), shared)
}

/// A client for `host` that polls quickly.
pub fn client_for(host: &str, timeout_secs: u64) -> ChainClient {
    let config = ClientConfig {
        host: host.to_string(),
        secure: false,
        timeout_secs,
    };
    ChainClient::new(&config)
        .unwrap()
        .with_poll_interval(Duration::from_millis(20))
}

fn hex_of_seq(seq: u64) -> String {
    bumo_core::sha256(&seq.to_be_bytes()).to_hex()
}

fn envelope(result: Value) -> Json<Value> {
    Json(json!({"error_code": 0, "result": result}))
}

fn failure(code: i64, desc: &str) -> Json<Value> {
    Json(json!({"error_code": code, "error_desc": desc}))
}

type Params = Query<HashMap<String, String>>;

async fn account_base(State(node): State<Shared>, Query(q): Params) -> Json<Value> {
    let node = node.lock().unwrap();
    let address = q.get("address").cloned().unwrap_or_default();
    match node.accounts.get(&address) {
        Some(acc) if acc.nonce == 0 => {
            envelope(json!({"address": address, "balance": acc.balance}))
        }
        Some(acc) => {
            envelope(json!({"address": address, "balance": acc.balance, "nonce": acc.nonce}))
        }
        None => failure(4, "Account not exist"),
    }
}

async fn account(State(node): State<Shared>, Query(q): Params) -> Json<Value> {
    let node = node.lock().unwrap();
    let address = q.get("address").cloned().unwrap_or_default();
    let Some(acc) = node.accounts.get(&address) else {
        return failure(4, "Account not exist");
    };
    let assets: Vec<Value> = acc
        .assets
        .iter()
        .map(|((code, issuer), amount)| {
            json!({"key": {"code": code, "issuer": issuer}, "amount": amount})
        })
        .collect();
    let assets = if assets.is_empty() {
        Value::Null
    } else {
        Value::Array(assets)
    };
    envelope(json!({
        "address": address,
        "balance": acc.balance,
        "nonce": acc.nonce,
        "assets": assets,
    }))
}

async fn ledger(State(node): State<Shared>, Query(q): Params) -> Json<Value> {
    let node = node.lock().unwrap();
    let seq = match q.get("seq") {
        Some(s) => match s.parse::<u64>() {
            Ok(n) => n,
            Err(_) => return failure(2, "invalid seq"),
        },
        None => node.height(),
    };
    if seq == 0 || seq > node.height() {
        return failure(4, "Ledger not exist");
    }
    let (hash, txs) = &node.ledgers[(seq - 1) as usize];
    let previous_hash = if seq == 1 {
        String::new()
    } else {
        node.ledgers[(seq - 2) as usize].0.clone()
    };

    let mut result = json!({
        "header": {
            "seq": seq,
            "hash": hash,
            "previous_hash": previous_hash,
            "close_time": MockNode::close_time(seq),
            "tx_count": txs.len(),
            "version": 1000,
        }
    });
    let flag = |name: &str| q.get(name).map(String::as_str) == Some("true");
    if flag("with_validator") {
        result["validators"] = node
            .validators
            .iter()
            .map(|v| json!({"address": v, "pledge_coin_amount": 0}))
            .collect();
    }
    if flag("with_fee") {
        result["fees"] = json!({"base_reserve": BASE_RESERVE, "gas_price": GAS_PRICE});
    }
    if flag("with_block_reward") {
        let share = 800_000_000u64 / node.validators.len().max(1) as u64;
        let rewards: serde_json::Map<String, Value> = node
            .validators
            .iter()
            .map(|v| (v.clone(), json!(share)))
            .collect();
        result["block_reward"] = json!(800_000_000u64);
        result["validators_reward"] = Value::Object(rewards);
    }
    envelope(result)
}

fn tx_json(tx: &RecordedTx) -> Value {
    let req = &tx.request;
    let operations: Vec<Value> = req
        .operations
        .iter()
        .map(|op| json!({"type": op.kind()}))
        .collect();
    json!({
        "hash": tx.hash,
        "ledger_seq": tx.ledger_seq,
        "close_time": MockNode::close_time(tx.ledger_seq),
        "error_code": tx.error_code,
        "error_desc": tx.error_desc,
        "actual_fee": 0,
        "transaction": {
            "source_address": req.source_address,
            "nonce": req.nonce.parse::<u64>().unwrap_or_default(),
            "fee_limit": req.fee_limit.parse::<u64>().unwrap_or_default(),
            "gas_price": req.gas_price.parse::<u64>().unwrap_or_default(),
            "metadata": req.metadata,
            "operations": operations,
        }
    })
}

async fn transaction_history(State(node): State<Shared>, Query(q): Params) -> Json<Value> {
    let node = node.lock().unwrap();
    let txs: Vec<Value> = if let Some(hash) = q.get("hash") {
        node.history
            .iter()
            .filter(|tx| &tx.hash == hash)
            .map(tx_json)
            .collect()
    } else if let Some(seq) = q.get("ledger_seq").and_then(|s| s.parse::<u64>().ok()) {
        node.history
            .iter()
            .filter(|tx| tx.ledger_seq == seq)
            .map(tx_json)
            .collect()
    } else {
        return failure(2, "hash or ledger_seq required");
    };
    if txs.is_empty() {
        return failure(4, "Transaction not exist");
    }
    envelope(json!({"total_count": txs.len(), "transactions": txs}))
}

async fn modules_status(State(node): State<Shared>) -> Json<Value> {
    let node = node.lock().unwrap();
    let height = node.height();
    Json(json!({
        "ledger_manager": {
            "chain_max_ledger_seq": node.chain_max_ledger_seq.unwrap_or(height),
            "ledger_sequence": height,
        }
    }))
}

fn submit_result(code: i64, desc: &str, hash: &str) -> Json<Value> {
    let success_count = u64::from(code == 0);
    Json(json!({
        "results": [{"error_code": code, "error_desc": desc, "hash": hash}],
        "success_count": success_count,
    }))
}

async fn submit_transaction(State(node): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let delay = node.lock().unwrap().submit_delay;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let item = &body["items"][0];
    let Some(blob) = item["transaction_blob"]
        .as_str()
        .and_then(|s| TransactionBlob::from_hex(s).ok())
    else {
        return submit_result(2, "invalid transaction blob", "");
    };
    let hash = blob.hash().to_hex();
    let Ok(request) = blob.decode() else {
        return submit_result(2, "malformed transaction", &hash);
    };
    let Ok(signatures) = serde_json::from_value::<Vec<Signature>>(item["signatures"].clone())
    else {
        return submit_result(93, "malformed signatures", &hash);
    };
    let signed_by_source = signatures
        .iter()
        .any(|sig| sig.public_key.to_address().as_str() == request.source_address);
    if !signed_by_source || signatures.iter().any(|sig| sig.verify(blob.as_bytes()).is_err()) {
        return submit_result(93, "signature invalid", &hash);
    }

    let mut node = node.lock().unwrap();
    node.submissions += 1;
    let Some(source) = node.accounts.get(&request.source_address) else {
        return submit_result(4, "source account not exist", &hash);
    };
    let nonce: u64 = request.nonce.parse().unwrap_or_default();
    if nonce != source.nonce + 1 {
        return submit_result(99, "bad sequence", &hash);
    }

    let seq = node.height() + 1;
    let (error_code, error_desc) = match apply(&node.accounts, &request) {
        Ok(accounts) => {
            node.accounts = accounts;
            (0, String::new())
        }
        Err((code, desc)) => (code, desc),
    };
    if let Some(source) = node.accounts.get_mut(&request.source_address) {
        source.nonce = nonce;
    }
    node.ledgers.push((hex_of_seq(seq), vec![hash.clone()]));
    node.history.push(RecordedTx {
        hash: hash.clone(),
        ledger_seq: seq,
        error_code,
        error_desc,
        request,
    });
    submit_result(0, "", &hash)
}

type Accounts = HashMap<String, MockAccount>;

fn amount(a: &bumo_core::Amount) -> Result<u64, (i64, String)> {
    a.to_u64().ok_or((2, "amount out of range".to_string()))
}

fn debit(accounts: &mut Accounts, address: &str, value: u64) -> Result<(), (i64, String)> {
    let acc = accounts
        .get_mut(address)
        .ok_or((4, format!("account {} not exist", address)))?;
    if acc.balance < value {
        return Err((100, "balance not enough".into()));
    }
    acc.balance -= value;
    Ok(())
}

fn apply(accounts: &Accounts, request: &TransactionRequest) -> Result<Accounts, (i64, String)> {
    let mut next = accounts.clone();
    for op in &request.operations {
        match op {
            Operation::Transfer(t) => {
                let source = t
                    .source_address
                    .as_ref()
                    .map_or(request.source_address.clone(), |a| a.to_string());
                let value = amount(&t.amount)?;
                debit(&mut next, &source, value)?;
                let dest = next
                    .get_mut(t.dest_address.as_str())
                    .ok_or((4, "destination not exist".to_string()))?;
                dest.balance += value;
            }
            Operation::AccountActivate(a) => {
                let source = a
                    .source_address
                    .as_ref()
                    .map_or(request.source_address.clone(), |a| a.to_string());
                if next.contains_key(a.dest_address.as_str()) {
                    return Err((102, "account already exists".into()));
                }
                let value = amount(&a.init_balance)?;
                debit(&mut next, &source, value)?;
                next.insert(
                    a.dest_address.to_string(),
                    MockAccount {
                        balance: value,
                        ..Default::default()
                    },
                );
            }
            Operation::AssetIssue(issue) => {
                let source = issue
                    .source_address
                    .as_ref()
                    .map_or(request.source_address.clone(), |a| a.to_string());
                let value = amount(&issue.amount)?;
                let acc = next
                    .get_mut(&source)
                    .ok_or((4, "issuer not exist".to_string()))?;
                *acc.assets
                    .entry((issue.code.clone(), source.clone()))
                    .or_default() += value;
            }
            Operation::AssetTransfer(t) => {
                let source = t
                    .source_address
                    .as_ref()
                    .map_or(request.source_address.clone(), |a| a.to_string());
                let value = amount(&t.amount)?;
                let key = (t.code.clone(), t.issuer.to_string());
                let held = next
                    .get_mut(&source)
                    .and_then(|acc| acc.assets.get_mut(&key))
                    .ok_or((104, "asset not held".to_string()))?;
                if *held < value {
                    return Err((104, "asset amount not enough".into()));
                }
                *held -= value;
                let dest = next
                    .get_mut(t.dest_address.as_str())
                    .ok_or((4, "destination not exist".to_string()))?;
                *dest.assets.entry(key).or_default() += value;
            }
        }
    }
    Ok(next)
}
