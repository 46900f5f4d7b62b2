//! Trellis CLI - build panel display documents from tabular data.

mod cli;
mod commands;

use std::env;
use std::sync::OnceLock;

use clap::Parser;
use cli::{Cli, Commands};
use log::LevelFilter;

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging(verbose: bool) {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            let level = if verbose {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            };
            builder.filter_module("trellis", level);
            builder.filter_module("trellis_cli", level);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Infer { file, factor, json } => {
            commands::infer::run(file, factor, json, cli.config)
        }
        Commands::Build(args) => commands::build::run(args, cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
