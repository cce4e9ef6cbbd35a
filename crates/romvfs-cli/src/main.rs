use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "romvfs")]
#[command(about = "Detect container formats and browse them as file trees")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a file for known container signatures
    Scan {
        file: PathBuf,

        /// JSON signature set to scan with instead of the builtins
        #[arg(short, long)]
        signatures: Option<PathBuf>,
    },

    /// Mount a directory with the host-filesystem device and print its tree
    Mount { path: PathBuf },

    /// List the builtin signatures
    Signatures,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("romvfs=info".parse()?))
        .init();

    let args = Args::parse();

    match args.command {
        Command::Scan { file, signatures } => commands::scan::run(&file, signatures.as_deref()),
        Command::Mount { path } => commands::mount::run(&path),
        Command::Signatures => commands::signatures::run(),
    }
}
