use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "site-mirror")]
#[command(about = "Mirrors websites of newly listed token profiles")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Poll the token-profile feed and mirror new websites
    Watch {
        /// Path to a JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seconds between feed polls
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Mirror a single website once
    Mirror {
        /// URL to start mirroring from
        url: String,

        /// Directory to write the mirror into
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// URL for the WebDriver instance
        #[arg(long)]
        webdriver_url: Option<String>,

        /// Maximum static-resource references per page before aborting
        #[arg(long, default_value_t = 100)]
        resource_limit: usize,
    },

    /// Delete incomplete or aborted mirrors under a directory
    Cleanup {
        /// Base directory holding one mirror per host
        dir: PathBuf,
    },
}
