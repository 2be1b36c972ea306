//! Async client for a BUMO node's HTTP API.
//!
//! # Responsibilities
//! - Query account, ledger and transaction state
//! - Broadcast signed blobs and report what the node said
//! - Poll for confirmation
//! - Bound every request by the configured timeout

use crate::config::ClientConfig;
use crate::envelope::NodeResponse;
use crate::error::{codes, ClientError, Result};
use crate::types::{
    AccountInfo, AccountKeys, AssetBalance, BlockInfo, BlockRef, FeeInfo, NonceInfo, RewardInfo,
    SubmissionStatus, SubmittedTransaction, TransactionInfo, TransactionOutcome, ValidatorInfo,
};
use bumo_core::amount::deserialize_lenient;
use bumo_core::{
    is_valid_address, Address, Amount, Hash, Keypair, NonceSequencer, Signature,
    SignedTransaction, TransactionBlob,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

/// How often [`ChainClient::wait_for_confirmation`] polls by default.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Handle to one BUMO node. Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ChainClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    poll_interval: Duration,
}

impl ChainClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: config.base_url(),
            timeout: config.timeout(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ---- accounts ----

    /// Generate a new account locally. Nothing is sent to the node; the
    /// account exists on chain only once activated.
    pub fn create_account(&self) -> AccountKeys {
        AccountKeys::from_keypair(&Keypair::generate())
    }

    /// Check an address locally.
    pub fn check_address(&self, address: &str) -> bool {
        is_valid_address(address)
    }

    pub async fn get_account_info(&self, address: &str) -> Result<AccountInfo> {
        let address = parse_address(address)?;
        let resp: NodeResponse<RawAccount> = self
            .get("getAccount", &[("address", address.to_string())])
            .await?;
        if resp.error_code == codes::NOT_EXIST {
            return Err(ClientError::AccountNotFound(address.to_string()));
        }
        let raw = into_result(resp, "getAccount")?;

        let assets = raw
            .assets
            .unwrap_or_default()
            .into_iter()
            .map(|asset| {
                let issuer = Address::parse(&asset.key.issuer).map_err(|_| {
                    ClientError::Decode(format!("bad asset issuer {:?}", asset.key.issuer))
                })?;
                Ok(AssetBalance {
                    code: asset.key.code,
                    issuer,
                    amount: asset.amount.0,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(AccountInfo {
            address,
            balance: lenient_or_zero(raw.balance),
            nonce: raw.nonce,
            assets,
            is_activated: true,
        })
    }

    /// Nonce of the last transaction the account sent. The next transaction
    /// must use this value plus one.
    pub async fn get_nonce(&self, address: &str) -> Result<NonceInfo> {
        let address = parse_address(address)?;
        self.account_base(&address)
            .await?
            .map(|raw| NonceInfo { nonce: raw.nonce })
            .ok_or_else(|| ClientError::AccountNotFound(address.to_string()))
    }

    pub async fn get_balance(&self, address: &str) -> Result<Amount> {
        let address = parse_address(address)?;
        self.account_base(&address)
            .await?
            .map(|raw| lenient_or_zero(raw.balance))
            .ok_or_else(|| ClientError::AccountNotFound(address.to_string()))
    }

    pub async fn is_activated(&self, address: &str) -> Result<bool> {
        let address = parse_address(address)?;
        Ok(self.account_base(&address).await?.is_some())
    }

    /// A sequencer for `address` seeded from its on-chain nonce.
    pub async fn nonce_sequencer(&self, address: &str) -> Result<NonceSequencer> {
        let address = parse_address(address)?;
        let nonce = self.get_nonce(address.as_str()).await?;
        Ok(NonceSequencer::new(address, nonce.nonce))
    }

    async fn account_base(&self, address: &Address) -> Result<Option<RawAccount>> {
        let resp: NodeResponse<RawAccount> = self
            .get("getAccountBase", &[("address", address.to_string())])
            .await?;
        if resp.error_code == codes::NOT_EXIST {
            return Ok(None);
        }
        into_result(resp, "getAccountBase").map(Some)
    }

    // ---- ledgers ----

    pub async fn get_block_number(&self) -> Result<u64> {
        Ok(self.ledger(BlockRef::Latest, None).await?.header.seq)
    }

    /// Whether the node has caught up with the rest of the network.
    pub async fn check_block_status(&self) -> Result<bool> {
        let status: RawModulesStatus = self.get("getModulesStatus", &[]).await?;
        let lm = status.ledger_manager;
        Ok(lm.ledger_sequence >= lm.chain_max_ledger_seq)
    }

    pub async fn get_block_info(&self, block: BlockRef) -> Result<BlockInfo> {
        let header = self.ledger(block, None).await?.header;
        Ok(BlockInfo {
            number: header.seq,
            hash: header.hash,
            previous_hash: header.previous_hash,
            close_time: header.close_time,
            tx_count: header.tx_count,
            version: header.version,
        })
    }

    pub async fn get_validators(&self, block: BlockRef) -> Result<Vec<ValidatorInfo>> {
        let ledger = self.ledger(block, Some("with_validator")).await?;
        Ok(ledger
            .validators
            .unwrap_or_default()
            .into_iter()
            .map(|v| ValidatorInfo {
                address: v.address,
                pledge_coin_amount: lenient_or_zero(v.pledge_coin_amount),
            })
            .collect())
    }

    pub async fn get_reward(&self, block: BlockRef) -> Result<RewardInfo> {
        let ledger = self.ledger(block, Some("with_block_reward")).await?;
        Ok(RewardInfo {
            block_reward: lenient_or_zero(ledger.block_reward),
            validators_reward: ledger
                .validators_reward
                .unwrap_or_default()
                .into_iter()
                .map(|(address, amount)| (address, amount.0))
                .collect(),
        })
    }

    pub async fn get_fees(&self, block: BlockRef) -> Result<FeeInfo> {
        let ledger = self.ledger(block, Some("with_fee")).await?;
        let fees = ledger
            .fees
            .ok_or_else(|| ClientError::Decode("getLedger returned no fees".into()))?;
        Ok(FeeInfo {
            base_reserve: lenient_or_zero(fees.base_reserve),
            gas_price: lenient_or_zero(fees.gas_price),
        })
    }

    async fn ledger(&self, block: BlockRef, flag: Option<&'static str>) -> Result<RawLedger> {
        let mut query = Vec::new();
        if let BlockRef::Number(n) = block {
            query.push(("seq", n.to_string()));
        }
        if let Some(flag) = flag {
            query.push((flag, "true".to_string()));
        }
        let resp: NodeResponse<RawLedger> = self.get("getLedger", &query).await?;
        if resp.error_code == codes::NOT_EXIST {
            return Err(ClientError::BlockNotFound(block.to_string()));
        }
        into_result(resp, "getLedger")
    }

    // ---- transactions ----

    /// Transactions included in ledger `number`, in ledger order.
    ///
    /// The node answers "not exist" both for an empty ledger and for one that
    /// has not closed yet; the ledger header tells them apart.
    pub async fn get_block_transactions(&self, number: u64) -> Result<Vec<TransactionInfo>> {
        let resp: NodeResponse<RawHistory> = self
            .get("getTransactionHistory", &[("ledger_seq", number.to_string())])
            .await?;
        if resp.error_code == codes::NOT_EXIST {
            self.ledger(BlockRef::Number(number), None).await?;
            return Ok(Vec::new());
        }
        let history = into_result(resp, "getTransactionHistory")?;
        Ok(history.transactions.into_iter().map(RawTx::into_info).collect())
    }

    pub async fn get_transaction_info(&self, hash: &str) -> Result<TransactionInfo> {
        let hash = Hash::from_hex(hash)
            .map_err(|_| ClientError::InvalidHash(hash.to_string()))?
            .to_hex();
        let resp: NodeResponse<RawHistory> = self
            .get("getTransactionHistory", &[("hash", hash.clone())])
            .await?;
        if resp.error_code == codes::NOT_EXIST {
            return Err(ClientError::TransactionNotFound(hash));
        }
        into_result(resp, "getTransactionHistory")?
            .transactions
            .into_iter()
            .next()
            .map(RawTx::into_info)
            .ok_or(ClientError::TransactionNotFound(hash))
    }

    /// Broadcast a blob with its signatures.
    ///
    /// A node-level refusal is returned as [`SubmissionStatus::Rejected`], not
    /// as an error. A timeout is [`SubmissionStatus::Unknown`].
    pub async fn submit_transaction(
        &self,
        blob: &TransactionBlob,
        signatures: &[Signature],
    ) -> Result<SubmissionStatus> {
        let hash = blob.hash().to_hex();
        let body = SubmitRequest {
            items: vec![SubmitItem {
                transaction_blob: blob.to_hex(),
                signatures,
            }],
        };
        debug!(
            %hash,
            bytes = blob.len(),
            signatures = signatures.len(),
            "submitting transaction"
        );

        let request = self
            .http
            .post(format!("{}/submitTransaction", self.base_url))
            .json(&body);
        let resp: SubmitResponse = match self.send(request, "submitTransaction").await {
            Ok(resp) => resp,
            Err(ClientError::Timeout(_)) => {
                warn!(%hash, "no answer to submission, outcome unknown");
                return Ok(SubmissionStatus::Unknown { hash });
            }
            Err(e) => return Err(e),
        };

        let result = resp
            .results
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::Decode("submitTransaction returned no results".into()))?;

        if result.error_code == codes::SUCCESS {
            info!(%hash, "transaction accepted");
            Ok(SubmissionStatus::Accepted { hash })
        } else {
            warn!(
                %hash,
                code = result.error_code,
                desc = %result.error_desc,
                "transaction rejected"
            );
            Ok(SubmissionStatus::Rejected {
                hash,
                code: result.error_code,
                desc: result.error_desc,
            })
        }
    }

    /// Submit a signed transaction, consuming it.
    pub async fn submit(&self, signed: SignedTransaction) -> Result<SubmittedTransaction> {
        let (blob, signatures) = signed.into_parts();
        let status = self.submit_transaction(&blob, &signatures).await?;
        Ok(SubmittedTransaction {
            hash: blob.hash(),
            status,
        })
    }

    /// Resolve a submitted transaction to its final outcome.
    pub async fn wait(
        &self,
        submitted: SubmittedTransaction,
        within: Duration,
    ) -> Result<TransactionOutcome> {
        match submitted.status {
            SubmissionStatus::Rejected { hash, code, desc } => {
                Ok(TransactionOutcome::Rejected { hash, code, desc })
            }
            _ => {
                self.wait_for_confirmation(&submitted.hash.to_hex(), within)
                    .await
            }
        }
    }

    /// Poll until the transaction appears in a closed ledger or `within`
    /// elapses.
    pub async fn wait_for_confirmation(
        &self,
        hash: &str,
        within: Duration,
    ) -> Result<TransactionOutcome> {
        let deadline = Instant::now() + within;
        loop {
            match self.get_transaction_info(hash).await {
                Ok(info) if info.error_code == codes::SUCCESS => {
                    info!(hash = %info.hash, ledger = info.ledger_seq, "transaction confirmed");
                    return Ok(TransactionOutcome::Confirmed(info));
                }
                Ok(info) => {
                    return Ok(TransactionOutcome::Rejected {
                        hash: info.hash,
                        code: info.error_code,
                        desc: info.error_desc,
                    })
                }
                Err(ClientError::TransactionNotFound(_)) => {}
                Err(e @ ClientError::InvalidHash(_)) => return Err(e),
                Err(e) => warn!(hash, error = %e, "polling transaction failed"),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(ClientError::Timeout(within));
            }
            sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    // ---- transport ----

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        debug!(path, ?query, "node request");
        let request = self
            .http
            .get(format!("{}/{}", self.base_url, path))
            .query(query);
        self.send(request, path).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        path: &str,
    ) -> Result<T> {
        let exchange = async {
            let resp = request.send().await?;
            let status = resp.status();
            if !status.is_success() {
                return Err(ClientError::HttpStatus(status.as_u16()));
            }
            let body = resp.bytes().await?;
            serde_json::from_slice::<T>(&body).map_err(|e| ClientError::Decode(e.to_string()))
        };
        match timeout(self.timeout, exchange).await {
            Ok(res) => res,
            Err(_) => {
                warn!(path, timeout_ms = self.timeout.as_millis() as u64, "node request timed out");
                Err(ClientError::Timeout(self.timeout))
            }
        }
    }
}

fn parse_address(address: &str) -> Result<Address> {
    Address::parse(address).map_err(|_| ClientError::InvalidAddress(address.to_string()))
}

fn into_result<T>(resp: NodeResponse<T>, path: &str) -> Result<T> {
    if resp.error_code != codes::SUCCESS {
        let desc = resp.error_desc.unwrap_or_default();
        warn!(path, code = resp.error_code, %desc, "node returned error");
        return Err(ClientError::Node {
            code: resp.error_code,
            desc,
        });
    }
    resp.result
        .ok_or_else(|| ClientError::Decode(format!("{} returned no result", path)))
}

fn lenient_or_zero(amount: Option<Lenient>) -> Amount {
    amount.map(|a| a.0).unwrap_or_default()
}

/// An amount the node may report as a JSON number or a string.
struct Lenient(Amount);

impl<'de> Deserialize<'de> for Lenient {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserialize_lenient(deserializer).map(Lenient)
    }
}

// Node wire shapes. Unknown fields are ignored.

#[derive(Deserialize)]
struct RawAccount {
    balance: Option<Lenient>,
    #[serde(default)]
    nonce: u64,
    assets: Option<Vec<RawAsset>>,
}

#[derive(Deserialize)]
struct RawAsset {
    key: RawAssetKey,
    amount: Lenient,
}

#[derive(Deserialize)]
struct RawAssetKey {
    code: String,
    issuer: String,
}

#[derive(Deserialize)]
struct RawLedger {
    header: RawHeader,
    validators: Option<Vec<RawValidator>>,
    fees: Option<RawFees>,
    block_reward: Option<Lenient>,
    validators_reward: Option<BTreeMap<String, Lenient>>,
}

#[derive(Deserialize)]
struct RawHeader {
    seq: u64,
    #[serde(default)]
    hash: String,
    #[serde(default)]
    previous_hash: String,
    #[serde(default)]
    close_time: i64,
    #[serde(default)]
    tx_count: u64,
    #[serde(default)]
    version: u64,
}

#[derive(Deserialize)]
struct RawValidator {
    address: String,
    pledge_coin_amount: Option<Lenient>,
}

#[derive(Deserialize)]
struct RawFees {
    base_reserve: Option<Lenient>,
    gas_price: Option<Lenient>,
}

#[derive(Deserialize)]
struct RawModulesStatus {
    ledger_manager: RawLedgerManager,
}

#[derive(Deserialize)]
struct RawLedgerManager {
    chain_max_ledger_seq: u64,
    ledger_sequence: u64,
}

#[derive(Deserialize)]
struct RawHistory {
    #[serde(default)]
    transactions: Vec<RawTx>,
}

#[derive(Deserialize)]
struct RawTx {
    hash: String,
    #[serde(default)]
    ledger_seq: u64,
    #[serde(default)]
    close_time: i64,
    #[serde(default)]
    error_code: i64,
    #[serde(default)]
    error_desc: String,
    actual_fee: Option<Lenient>,
    transaction: RawTxBody,
}

#[derive(Deserialize)]
struct RawTxBody {
    #[serde(default)]
    source_address: String,
    #[serde(default)]
    nonce: u64,
    fee_limit: Option<Lenient>,
    gas_price: Option<Lenient>,
    metadata: Option<String>,
    #[serde(default)]
    operations: Vec<serde_json::Value>,
}

impl RawTx {
    fn into_info(self) -> TransactionInfo {
        TransactionInfo {
            hash: self.hash,
            ledger_seq: self.ledger_seq,
            close_time: self.close_time,
            error_code: self.error_code,
            error_desc: self.error_desc,
            actual_fee: lenient_or_zero(self.actual_fee),
            source_address: self.transaction.source_address,
            nonce: self.transaction.nonce,
            fee_limit: lenient_or_zero(self.transaction.fee_limit),
            gas_price: lenient_or_zero(self.transaction.gas_price),
            metadata: self.transaction.metadata,
            operation_count: self.transaction.operations.len(),
        }
    }
}

#[derive(Serialize)]
struct SubmitRequest<'a> {
    items: Vec<SubmitItem<'a>>,
}

#[derive(Serialize)]
struct SubmitItem<'a> {
    transaction_blob: String,
    signatures: &'a [Signature],
}

#[derive(Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    results: Vec<SubmitResult>,
}

#[derive(Deserialize)]
struct SubmitResult {
    error_code: i64,
    #[serde(default)]
    error_desc: String,
}
