//! Block command.

use super::output::print_json;
use super::GlobalArgs;
use anyhow::Result;
use bumo_client::{BlockRef, TransactionInfo};
use clap::{Args, Subcommand};
use colored::Colorize;
use serde_json::json;

#[derive(Args)]
pub struct BlockArgs {
    #[command(subcommand)]
    command: BlockCommand,
}

#[derive(Subcommand)]
enum BlockCommand {
    /// Show the latest closed ledger number
    Number,
    /// Check whether the node is synchronised
    Status,
    /// Show a ledger header
    Info {
        /// Ledger number (latest if omitted)
        number: Option<u64>,
    },
    /// List the transactions in a ledger
    Txs {
        /// Ledger number
        number: u64,
    },
    /// List the validators at a ledger
    Validators {
        /// Ledger number (latest if omitted)
        number: Option<u64>,
    },
    /// Show the block reward and its split
    Reward {
        /// Ledger number (latest if omitted)
        number: Option<u64>,
    },
    /// Show the fee parameters in effect
    Fees {
        /// Ledger number (latest if omitted)
        number: Option<u64>,
    },
}

pub async fn run(args: BlockArgs, global: &GlobalArgs) -> Result<()> {
    let client = global.client()?;
    match args.command {
        BlockCommand::Number => {
            let number = client.get_block_number().await?;
            if global.json {
                return print_json(json!({ "block_number": number }));
            }
            println!("  Latest ledger: {}", number.to_string().bright_cyan());
        }
        BlockCommand::Status => {
            let synced = client.check_block_status().await?;
            if global.json {
                return print_json(json!({ "is_synchronous": synced }));
            }
            if synced {
                println!("{}  Node is synchronised", "✓".green().bold());
            } else {
                println!("{}  Node is still catching up", "…".yellow().bold());
            }
        }
        BlockCommand::Info { number } => {
            let block = client.get_block_info(BlockRef::from(number)).await?;
            if global.json {
                return print_json(&block);
            }
            let closed = block
                .closed_at()
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| block.close_time.to_string());
            println!();
            println!("{}", format!("Ledger #{}", block.number).bold().cyan());
            println!();
            println!("  Hash:          {}", block.hash.bright_yellow());
            println!("  Previous Hash: {}", block.previous_hash.bright_black());
            println!("  Closed At:     {}", closed);
            println!("  Transactions:  {}", block.tx_count.to_string().bright_cyan());
            println!("  Version:       {}", block.version);
            println!();
        }
        BlockCommand::Txs { number } => {
            let txs = client.get_block_transactions(number).await?;
            if global.json {
                return print_json(&txs);
            }
            print_transactions(number, &txs);
        }
        BlockCommand::Validators { number } => {
            let validators = client.get_validators(BlockRef::from(number)).await?;
            if global.json {
                return print_json(&validators);
            }
            println!();
            println!("{}", "Validators:".bold().cyan());
            for v in &validators {
                println!(
                    "  {} {}",
                    v.address.bright_yellow(),
                    format!("(pledged {})", v.pledge_coin_amount).bright_black()
                );
            }
            println!();
        }
        BlockCommand::Reward { number } => {
            let reward = client.get_reward(BlockRef::from(number)).await?;
            if global.json {
                return print_json(&reward);
            }
            println!();
            println!("  Block Reward: {}", reward.block_reward.to_string().bright_cyan());
            for (address, amount) in &reward.validators_reward {
                println!("    {} {}", address.bright_yellow(), amount);
            }
            println!();
        }
        BlockCommand::Fees { number } => {
            let fees = client.get_fees(BlockRef::from(number)).await?;
            if global.json {
                return print_json(&fees);
            }
            println!();
            println!("  Base Reserve: {}", fees.base_reserve.to_string().bright_cyan());
            println!("  Gas Price:    {}", fees.gas_price.to_string().bright_cyan());
            println!();
        }
    }
    Ok(())
}

fn print_transactions(number: u64, txs: &[TransactionInfo]) {
    println!();
    println!("{}", format!("Transactions in ledger #{}:", number).bold().cyan());
    println!();
    if txs.is_empty() {
        println!("  {}", "none".bright_black());
    }
    for tx in txs {
        let result = if tx.error_code == 0 {
            "ok".green()
        } else {
            format!("failed ({})", tx.error_code).red()
        };
        println!(
            "  {} {} {} {}",
            tx.hash[..16.min(tx.hash.len())].bright_yellow(),
            tx.source_address.bright_black(),
            format!("nonce {}", tx.nonce).bright_black(),
            result
        );
    }
    println!();
}
