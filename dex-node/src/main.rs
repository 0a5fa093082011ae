//! Market state machine node
//!
//! Replays a genesis document and a file of ordered blocks through the market
//! module and prints the per-block results with the final application hash.

mod replay;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::replay::{ReplayOptions, Replayer};

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute every block of a block file on top of a genesis document
    Replay {
        /// Genesis document (JSON)
        #[clap(long)]
        genesis: PathBuf,
        /// Ordered blocks (JSON array)
        #[clap(long)]
        blocks: PathBuf,
        /// Stop at the first block that ends with a broken invariant
        #[clap(long)]
        halt_on_broken_invariant: bool,
        /// Migrate a genesis document exported by an older release before loading it
        #[clap(long)]
        upgrade_genesis: bool,
        /// Write the final market state to this file
        #[clap(long)]
        export: Option<PathBuf>,
        /// Default log level when RUST_LOG is unset
        #[clap(long, default_value = "info")]
        log_level: Level,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv().ok();

    let args = Args::parse();
    match args.command {
        Command::Replay {
            genesis,
            blocks,
            halt_on_broken_invariant,
            upgrade_genesis,
            export,
            log_level,
        } => {
            init_tracing(log_level);
            info!("Replaying {} on top of {}", blocks.display(), genesis.display());

            let options = ReplayOptions {
                halt_on_broken_invariant,
                upgrade_genesis,
            };
            let mut replayer = Replayer::from_files(&genesis, options)?;
            let report = replayer.run_file(&blocks)?;

            if let Some(path) = export {
                std::fs::write(&path, serde_json::to_vec_pretty(&replayer.export_genesis()?)?)?;
                info!("Exported market state to {}", path.display());
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

fn init_tracing(level: Level) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    // Only set the global subscriber if it hasn't been set already
    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        info!("Tracing initialized at {}", level);
    }
}
