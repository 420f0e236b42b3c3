mod compare;
mod generate;
mod ic;
mod record;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Log level (error|warn|info|debug|trace); falls back to RUST_LOG, then info
    #[arg(long, global = true)]
    log_level: Option<LevelFilter>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write (u^t, u^{t+tau}) training pairs using the reference margin
    Generate(generate::GenerateArgs),
    /// Jump the same field with the run and reference margins and report both
    Compare(compare::CompareArgs),
}

fn init_logging(level: Option<LevelFilter>) {
    let level = level
        .or_else(|| std::env::var("RUST_LOG").ok().and_then(|v| v.parse().ok()))
        .unwrap_or(LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp_millis()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    match cli.command {
        Command::Generate(args) => generate::run(&args),
        Command::Compare(args) => compare::run(&args),
    }
}
