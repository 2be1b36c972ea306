//! Transaction command.
//!
//! Every subcommand follows the same path: look up the source nonce, build
//! the operation, encode, sign, submit and optionally wait for the ledger.

use super::output::print_json;
use super::GlobalArgs;
use anyhow::{Context, Result};
use bumo_client::{
    BlockRef, ChainClient, ClientError, SdkError, SubmissionStatus, TransactionOutcome,
};
use bumo_core::{
    AccountActivateParams, AssetIssueParams, AssetTransferParams, Keypair, Operation,
    TransactionRequest, TransferParams,
};
use clap::{Args, Subcommand};
use colored::Colorize;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

#[derive(Args)]
pub struct TxArgs {
    #[command(subcommand)]
    command: TxCommand,
}

/// Source account and fee options.
#[derive(Args)]
struct SignerArgs {
    /// Encoded private key of the source account (priv...)
    #[arg(long, env = "BUMO_PRIVATE_KEY", hide_env_values = true)]
    private_key: String,

    /// Maximum fee the source account will pay
    #[arg(long)]
    fee_limit: String,

    /// Gas price; defaults to the network's current price
    #[arg(long)]
    gas_price: Option<String>,

    /// Transaction-level metadata
    #[arg(long)]
    metadata: Option<String>,

    /// Wait until the transaction closes in a ledger
    #[arg(long)]
    wait: bool,

    /// How long to wait with --wait, in seconds
    #[arg(long, default_value = "30")]
    wait_secs: u64,
}

#[derive(Subcommand)]
enum TxCommand {
    /// Send native coin
    Send {
        #[command(flatten)]
        signer: SignerArgs,

        /// Recipient address
        dest: String,

        /// Amount in the smallest unit
        amount: String,
    },
    /// Issue a custom asset from the source account
    Issue {
        #[command(flatten)]
        signer: SignerArgs,

        /// Asset code
        code: String,

        /// Amount to issue
        amount: String,

        /// Supply cap; 0 means unlimited
        #[arg(long, default_value = "0")]
        total_supply: String,

        /// Decimal places (0-8)
        #[arg(long, default_value = "0")]
        decimals: u8,

        /// Asset description
        #[arg(long, default_value = "")]
        description: String,

        /// Attach the ATP 1.0 token descriptor as transaction metadata
        #[arg(long, conflicts_with = "metadata")]
        atp10: bool,
    },
    /// Send an issued asset
    SendAsset {
        #[command(flatten)]
        signer: SignerArgs,

        /// Recipient address
        dest: String,

        /// Asset code
        code: String,

        /// Issuer address of the asset
        issuer: String,

        /// Amount to send
        amount: String,
    },
    /// Create a new account with an initial balance
    Activate {
        #[command(flatten)]
        signer: SignerArgs,

        /// Address of the account to create
        dest: String,

        /// Initial balance
        init_balance: String,
    },
}

pub async fn run(args: TxArgs, global: &GlobalArgs) -> Result<()> {
    let (signer, operation, atp10) = match args.command {
        TxCommand::Send {
            signer,
            dest,
            amount,
        } => {
            let op = Operation::transfer(TransferParams {
                dest_address: dest,
                amount,
                ..Default::default()
            })
            .map_err(SdkError::from)?;
            (signer, op, false)
        }
        TxCommand::Issue {
            signer,
            code,
            amount,
            total_supply,
            decimals,
            description,
            atp10,
        } => {
            let op = Operation::asset_issue(AssetIssueParams {
                code,
                total_supply,
                amount,
                decimals,
                description,
                ..Default::default()
            })
            .map_err(SdkError::from)?;
            (signer, op, atp10)
        }
        TxCommand::SendAsset {
            signer,
            dest,
            code,
            issuer,
            amount,
        } => {
            let op = Operation::asset_transfer(AssetTransferParams {
                dest_address: dest,
                code,
                issuer,
                amount,
                ..Default::default()
            })
            .map_err(SdkError::from)?;
            (signer, op, false)
        }
        TxCommand::Activate {
            signer,
            dest,
            init_balance,
        } => {
            let op = Operation::account_activate(AccountActivateParams {
                dest_address: dest,
                init_balance,
                ..Default::default()
            })
            .map_err(SdkError::from)?;
            (signer, op, false)
        }
    };

    let metadata = match &operation {
        Operation::AssetIssue(issue) if atp10 => Some(issue.atp10_metadata()),
        _ => signer.metadata.clone(),
    };
    let client = global.client()?;
    let report = submit(&client, &signer, vec![operation], metadata).await?;

    if global.json {
        return print_json(&report);
    }
    print_report(&report);
    Ok(())
}

#[derive(Serialize)]
struct TxReport {
    hash: String,
    nonce: u64,
    submission: SubmissionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<TransactionOutcome>,
}

async fn submit(
    client: &ChainClient,
    signer: &SignerArgs,
    operations: Vec<Operation>,
    metadata: Option<String>,
) -> Result<TxReport> {
    let keypair = Keypair::from_encoded(&signer.private_key)
        .map_err(SdkError::from)
        .context("Invalid private key")?;
    let source = keypair.address();

    let sequencer = client
        .nonce_sequencer(source.as_str())
        .await
        .with_context(|| format!("Failed to read nonce of {}", source))?;
    let nonce = sequencer.allocate();

    let gas_price = match &signer.gas_price {
        Some(price) => price.clone(),
        None => client.get_fees(BlockRef::Latest).await?.gas_price.to_string(),
    };

    let request = TransactionRequest {
        source_address: source.to_string(),
        gas_price,
        fee_limit: signer.fee_limit.clone(),
        nonce: nonce.to_string(),
        operations,
        metadata,
    };
    let signed = request
        .encode()
        .map_err(SdkError::from)?
        .sign_with_keys(&[keypair.private_key().clone()])
        .map_err(SdkError::from)?;
    info!(hash = %signed.hash(), nonce, "transaction signed");

    let submitted = client.submit(signed).await.map_err(SdkError::from)?;
    let hash = submitted.hash().to_hex();
    let submission = submitted.status().clone();

    if let SubmissionStatus::Rejected { code, desc, .. } = &submission {
        return Err(SdkError::from(ClientError::Node {
            code: *code,
            desc: format!("{} (transaction {})", desc, hash),
        })
        .into());
    }

    let outcome = if signer.wait {
        let within = Duration::from_secs(signer.wait_secs);
        Some(client.wait(submitted, within).await.map_err(SdkError::from)?)
    } else {
        None
    };

    Ok(TxReport {
        hash,
        nonce,
        submission,
        outcome,
    })
}

fn print_report(report: &TxReport) {
    println!();
    match &report.submission {
        SubmissionStatus::Accepted { .. } => {
            println!("{}  Transaction submitted", "✓".green().bold());
        }
        SubmissionStatus::Unknown { .. } => {
            println!(
                "{}  No answer from the node; check the hash before resending",
                "?".yellow().bold()
            );
        }
        SubmissionStatus::Rejected { code, desc, .. } => {
            println!("{}  Rejected ({}): {}", "✗".red().bold(), code, desc);
        }
    }
    println!("    Hash:  {}", report.hash.bright_yellow());
    println!("    Nonce: {}", report.nonce.to_string().bright_cyan());

    match &report.outcome {
        Some(TransactionOutcome::Confirmed(info)) => {
            println!(
                "{}  Confirmed in ledger {}",
                "✓".green().bold(),
                info.ledger_seq.to_string().bright_cyan()
            );
            println!("    Fee:   {}", info.actual_fee);
        }
        Some(TransactionOutcome::Rejected { code, desc, .. }) => {
            println!("{}  Failed on chain ({}): {}", "✗".red().bold(), code, desc);
        }
        None => {}
    }
    println!();
}
