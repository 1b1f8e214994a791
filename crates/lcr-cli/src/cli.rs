use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "lcr",
    about = "Ledger chain replay: publish, inspect, verify and replay checkpoint archives",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Close synthetic ledgers from genesis and publish them as an archive
    Generate(GenerateArgs),
    /// List the ledgers and transaction sets of one checkpoint
    Inspect(InspectArgs),
    /// Verify the archived header chain over a range of ledgers
    Verify(VerifyArgs),
    /// Replay a range of ledgers into a fresh ledger from genesis
    Replay(ReplayArgs),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Generate(_) => "generate",
            Self::Inspect(_) => "inspect",
            Self::Verify(_) => "verify",
            Self::Replay(_) => "replay",
        }
    }
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Archive root to write
    #[arg(long)]
    pub dir: PathBuf,
    /// Sequence of the last ledger to close
    #[arg(long, default_value = "200")]
    pub ledgers: u32,
    #[arg(long, default_value = "64")]
    pub frequency: u32,
    /// Most transactions per ledger; zero-transaction ledgers leave gaps
    #[arg(long, default_value = "4")]
    pub max_txs: u32,
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args)]
pub struct InspectArgs {
    #[arg(long)]
    pub dir: PathBuf,
    /// Checkpoint to list (the last ledger of its span)
    #[arg(long)]
    pub checkpoint: u32,
    #[arg(long, default_value = "64")]
    pub frequency: u32,
}

#[derive(Args)]
pub struct VerifyArgs {
    #[arg(long)]
    pub dir: PathBuf,
    #[arg(long, default_value = "1")]
    pub first: u32,
    #[arg(long)]
    pub last: u32,
    #[arg(long, default_value = "64")]
    pub frequency: u32,
}

#[derive(Args)]
pub struct ReplayArgs {
    /// Archive root; overrides `download_dir` from the config file
    #[arg(long)]
    pub dir: Option<PathBuf>,
    #[arg(long, default_value = "2")]
    pub first: u32,
    #[arg(long)]
    pub last: u32,
    /// Overrides `checkpoint_frequency` from the config file
    #[arg(long)]
    pub frequency: Option<u32>,
    /// TOML replay configuration
    #[arg(long)]
    pub config: Option<PathBuf>,
}
