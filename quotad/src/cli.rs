use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quotad", version, about = "Storage quota plugin daemon")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the quota plugin with a config file
    Start {
        #[arg(short, long)]
        config: PathBuf,
    },
}
