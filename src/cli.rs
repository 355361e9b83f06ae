use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "clipforge")]
#[command(author, version, about = "Cut time ranges out of a media source and splice them together")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding outputs/ and tmp/ (overrides the config file)
    #[arg(long, global = true, env = "DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API
    Start {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,
    },

    /// Run a single clip job and print the output location
    Cut {
        /// Source media: an http(s) URL or a local file path
        #[arg(short, long)]
        source: String,

        /// Comma-separated mm:ss-mm:ss ranges, e.g. "0:10-0:25,1:02-1:30"
        #[arg(short, long)]
        ranges: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Force a retention pass over outputs and scratch workspaces
    Cleanup,

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses --config if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
