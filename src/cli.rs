use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about = "Download and install the platform-specific service")]
pub struct Args {
    /// Path to the service config (JSON or TOML)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub sub: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Install the service unless an installed server is already present
    Install {
        /// Platform id to install for (defaults to the detected platform)
        #[arg(long)]
        platform: Option<String>,

        /// Directory for the temporary download file
        #[arg(long)]
        temp_dir: Option<PathBuf>,

        /// Download and extract even when a server is already installed
        #[arg(long)]
        force: bool,
    },
    /// Print the file name, URL and install directory without touching anything
    Resolve {
        #[arg(long)]
        platform: Option<String>,
    },
    /// Print the detected platform
    Platform,
}
