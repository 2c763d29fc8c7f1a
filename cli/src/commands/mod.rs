use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod ask;
pub mod build_index;
pub mod health;

#[derive(Parser, Debug)]
#[command(name = "bns-guide")]
#[command(version, about = "Legal guidance grounded in the Bharatiya Nyaya Sanhita", long_about = None)]
pub struct Cli {
    /// Extra configuration file, layered after config/default and config/local
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Describe a situation and get the relevant BNS sections and punishments
    Ask(ask::AskArgs),
    /// Build or refresh the semantic index from the corpus
    BuildIndex(build_index::BuildIndexArgs),
    /// Check the Ollama backend, corpus and index
    Health,
}
