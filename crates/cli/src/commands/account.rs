//! Account command.

use super::output::print_json;
use super::GlobalArgs;
use anyhow::{Context, Result};
use bumo_client::AccountKeys;
use bumo_core::Keypair;
use clap::{Args, Subcommand};
use colored::Colorize;
use serde_json::json;

#[derive(Args)]
pub struct AccountArgs {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand)]
enum AccountCommand {
    /// Generate a new keypair locally
    New,
    /// Show balance, nonce and assets
    Info {
        /// Account address (buQ...)
        address: String,
    },
    /// Show native balance
    Balance {
        /// Account address (buQ...)
        address: String,
    },
    /// Show the nonce of the last transaction sent
    Nonce {
        /// Account address (buQ...)
        address: String,
    },
    /// Check an address offline
    Check {
        /// Address to check
        address: String,
    },
    /// Check whether an account exists on chain
    Activated {
        /// Account address (buQ...)
        address: String,
    },
}

pub async fn run(args: AccountArgs, global: &GlobalArgs) -> Result<()> {
    match args.command {
        AccountCommand::New => new_account(global),
        AccountCommand::Check { address } => check_address(global, &address),
        AccountCommand::Info { address } => show_info(global, &address).await,
        AccountCommand::Balance { address } => show_balance(global, &address).await,
        AccountCommand::Nonce { address } => show_nonce(global, &address).await,
        AccountCommand::Activated { address } => show_activated(global, &address).await,
    }
}

fn new_account(global: &GlobalArgs) -> Result<()> {
    let keys = AccountKeys::from_keypair(&Keypair::generate());
    if global.json {
        return print_json(&keys);
    }

    println!("{}", "Generated new account:".bold().cyan());
    println!();
    println!("  Address:     {}", keys.address.bright_yellow());
    println!("  Public Key:  {}", keys.public_key.bright_black());
    println!("  Private Key: {}", keys.private_key.bright_black());
    println!();
    println!(
        "{}",
        "Keep your private key safe! The account exists on chain only after activation."
            .yellow()
            .bold()
    );
    Ok(())
}

fn check_address(global: &GlobalArgs, address: &str) -> Result<()> {
    let valid = bumo_core::is_valid_address(address);
    if global.json {
        return print_json(json!({ "is_valid": valid }));
    }
    if valid {
        println!("{}  {} is a valid address", "✓".green().bold(), address.bright_yellow());
    } else {
        println!("{}  {} is not a valid address", "✗".red().bold(), address);
    }
    Ok(())
}

async fn show_info(global: &GlobalArgs, address: &str) -> Result<()> {
    let client = global.client()?;
    let info = client
        .get_account_info(address)
        .await
        .with_context(|| format!("Failed to fetch account {}", address))?;
    if global.json {
        return print_json(&info);
    }

    println!();
    println!("{}", "Account Information:".bold().cyan());
    println!();
    println!("  Address:  {}", info.address.to_string().bright_yellow());
    println!("  Balance:  {}", info.balance.to_string().bright_cyan());
    println!("  Nonce:    {}", info.nonce.to_string().bright_cyan());
    if info.assets.is_empty() {
        println!("  Assets:   {}", "none".bright_black());
    } else {
        println!("  Assets:");
        for asset in &info.assets {
            println!(
                "    {} {} {}",
                asset.amount.to_string().bright_cyan(),
                asset.code.bold(),
                format!("(issuer {})", asset.issuer).bright_black()
            );
        }
    }
    println!();
    Ok(())
}

async fn show_balance(global: &GlobalArgs, address: &str) -> Result<()> {
    let balance = global.client()?.get_balance(address).await?;
    if global.json {
        return print_json(json!({ "balance": balance }));
    }
    println!();
    println!("  Address: {}", address.bright_yellow());
    println!("  Balance: {}", balance.to_string().bright_cyan());
    println!();
    Ok(())
}

async fn show_nonce(global: &GlobalArgs, address: &str) -> Result<()> {
    let nonce = global.client()?.get_nonce(address).await?;
    if global.json {
        return print_json(nonce);
    }
    println!();
    println!("  Address:    {}", address.bright_yellow());
    println!("  Nonce:      {}", nonce.nonce.to_string().bright_cyan());
    println!("  Next nonce: {}", nonce.next().to_string().bright_cyan());
    println!();
    Ok(())
}

async fn show_activated(global: &GlobalArgs, address: &str) -> Result<()> {
    let activated = global.client()?.is_activated(address).await?;
    if global.json {
        return print_json(json!({ "is_activated": activated }));
    }
    let state = if activated {
        "activated".green()
    } else {
        "not activated".bright_black()
    };
    println!("  {} is {}", address.bright_yellow(), state);
    Ok(())
}
