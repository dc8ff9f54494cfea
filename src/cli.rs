use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bucket-scout")]
#[command(about = "A TUI for browsing object-storage buckets with instant client-side search, sort and keyboard navigation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the interactive TUI (default)
    Run {
        /// Open this bucket immediately instead of the bucket list
        #[arg(short, long)]
        bucket: Option<String>,
        /// Start at this prefix inside the bucket
        #[arg(short, long, default_value = "")]
        prefix: String,
    },
    /// Fetch a complete listing and print it as JSON without running the TUI
    Dump {
        /// Bucket to list
        #[arg(short, long)]
        bucket: String,
        /// Prefix to list under
        #[arg(short, long, default_value = "")]
        prefix: String,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
}
