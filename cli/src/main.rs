mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{batch, classify};

/// Install the log subscriber: `-v` selects info, `-vv` debug; `RUST_LOG` wins when set.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match &cli.command {
        Commands::Run(args) => batch::run(&cli, args),
        Commands::ClassifyGroups(args) => classify::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
