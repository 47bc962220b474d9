mod commands;
mod format;
mod input;
mod writer;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{cat::CatArgs, schema::SchemaArgs};

#[derive(Parser)]
#[command(name = "ipccat", about = "Inspect Arrow IPC streams")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print record batches as a table, JSONL or CSV
    Cat(CatArgs),
    /// Print the stream schema
    Schema(SchemaArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Cat(args) => args.run(),
        Commands::Schema(args) => args.run(),
    }
}
