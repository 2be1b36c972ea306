//! CLI commands module.

use anyhow::{Context, Result};
use bumo_client::{ChainClient, ClientConfig};
use clap::{ArgAction, Args, Subcommand};
use std::path::PathBuf;

mod account;
mod block;
pub mod output;
mod tx;

/// Options shared by every command.
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Node address as host:port
    #[arg(long, global = true, env = "BUMO_HOST")]
    pub host: Option<String>,

    /// JSON config file with host, secure and timeout_secs
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print the response envelope as JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

impl GlobalArgs {
    /// Resolve the client configuration: `--host`/`BUMO_HOST` over the
    /// config file over built-in defaults.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ClientConfig::default(),
        };
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        config.validate()?;
        Ok(config)
    }

    pub fn client(&self) -> Result<ChainClient> {
        let config = self.client_config()?;
        tracing::debug!(url = %config.base_url(), "using node");
        Ok(ChainClient::new(&config)?)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate keys and query accounts
    Account(account::AccountArgs),
    /// Query ledgers
    Block(block::BlockArgs),
    /// Build, sign and submit transactions
    Tx(tx::TxArgs),
}

pub async fn run(cmd: Commands, global: &GlobalArgs) -> Result<()> {
    match cmd {
        Commands::Account(args) => account::run(args, global).await,
        Commands::Block(args) => block::run(args, global).await,
        Commands::Tx(args) => tx::run(args, global).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumo_client::config::DEFAULT_HOST;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = GlobalArgs::default().client_config().unwrap();
        assert_eq!(config.host, DEFAULT_HOST);
    }

    #[test]
    fn test_host_overrides_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"host": "10.0.0.1:26002", "timeout_secs": 3}}"#).unwrap();

        let from_file = GlobalArgs {
            config: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let config = from_file.client_config().unwrap();
        assert_eq!(config.host, "10.0.0.1:26002");
        assert_eq!(config.timeout_secs, 3);

        let overridden = GlobalArgs {
            host: Some("127.0.0.1:36002".into()),
            config: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let config = overridden.client_config().unwrap();
        assert_eq!(config.host, "127.0.0.1:36002");
        assert_eq!(config.timeout_secs, 3);
    }

    #[test]
    fn test_missing_config_file() {
        let args = GlobalArgs {
            config: Some("/nonexistent/bumo.json".into()),
            ..Default::default()
        };
        assert!(args.client_config().is_err());
    }
}
