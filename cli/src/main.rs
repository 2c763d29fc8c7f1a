use std::process::ExitCode;

use bns_guide_lib::commands::{ask, build_index, health, Cli, Command};
use bns_guide_lib::config::AppConfig;
use bns_guide_lib::logging;
use clap::Parser;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();

    let config = AppConfig::load(cli.config.as_deref())?;
    logging::init_logging(&config.logging);

    match cli.command {
        Command::Ask(args) => ask::run(&config, args),
        Command::BuildIndex(args) => build_index::run(&config, args),
        Command::Health => health::run(&config),
    }
}
