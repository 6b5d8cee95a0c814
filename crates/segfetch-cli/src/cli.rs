use std::path::PathBuf;

use clap::{ArgAction, Parser};

#[derive(Clone, Debug, Parser)]
#[command(
    name = "segfetch",
    version = env!("CARGO_PKG_VERSION"),
    about = "Download one file over HTTP with concurrent range requests",
    long_about = None
)]
pub struct App {
    /// The download url
    #[arg(long, short = 'i')]
    pub url: String,

    /// The output file name
    #[arg(long, short = 'o')]
    pub file: PathBuf,

    /// Number of concurrent segments
    #[arg(long, short = 't')]
    pub task_count: Option<u32>,

    /// Retries per segment after consecutive connection failures
    #[arg(long)]
    pub retries: Option<u32>,

    /// Base backoff between retries, in milliseconds
    #[arg(long)]
    pub backoff_ms: Option<u64>,

    /// Abort the whole download after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Give up connecting after this many seconds
    #[arg(long)]
    pub connect_timeout_secs: Option<u64>,

    /// Treat a connection that stays silent this long as failed and retry it
    #[arg(long)]
    pub read_timeout_secs: Option<u64>,

    /// Proxy url, picked for https or http targets by its scheme (repeatable)
    #[arg(long = "proxy", value_name = "URL")]
    pub proxies: Vec<String>,

    /// Extra request header, `Name: value` (repeatable)
    #[arg(long = "header", short = 'H', value_name = "HEADER")]
    pub headers: Vec<String>,

    /// Do not send the browser-like default headers
    #[arg(long)]
    pub no_default_headers: bool,

    /// TOML file with default settings
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(long, short = 'v', action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors and hide progress bars
    #[arg(long, short = 'q')]
    pub quiet: bool,
}
