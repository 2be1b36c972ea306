//! bumo CLI entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "bumo")]
#[command(about = "Command-line client for BUMO nodes", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: commands::GlobalArgs,

    #[command(subcommand)]
    command: Option<commands::Commands>,
}

/// Logs go to stderr so `--json` output stays machine readable.
/// `RUST_LOG` takes precedence over `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    match cli.command {
        Some(cmd) => {
            if let Err(e) = commands::run(cmd, &cli.global).await {
                commands::output::report_error(cli.global.json, &e);
                std::process::exit(1);
            }
        }
        None => {
            println!("bumo - command-line client for BUMO nodes");
            println!("Run 'bumo --help' for usage information.");
        }
    }
}
