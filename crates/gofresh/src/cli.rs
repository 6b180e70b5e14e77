//! CLI argument parsing with clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use gofresh_core::layout::DEFAULT_INSTALL_ROOT;
use gofresh_core::DEFAULT_DOWNLOAD_BASE;

/// gofresh - install or update the Go toolchain
#[derive(Parser, Debug)]
#[command(name = "gofresh")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress log output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install or update the toolchain (requires root)
    Update(UpdateArgs),

    /// Show version information
    Version(VersionArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Reinstall even if the installed toolchain is already current
    #[arg(short, long)]
    pub force: bool,

    /// Installation directory
    #[arg(long, default_value = DEFAULT_INSTALL_ROOT)]
    pub install_root: PathBuf,

    /// Release manifest (TOML) to use instead of the embedded one
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Download origin the artifact filename is appended to
    #[arg(long, default_value = DEFAULT_DOWNLOAD_BASE)]
    pub download_base: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
