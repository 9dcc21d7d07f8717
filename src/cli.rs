use crate::logging::LogFormat;
use clap::Parser;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Dump the newest posts or comments of a subreddit to a JSON-lines file.
///
/// Credentials are read from REDDIT_CLIENT_ID, REDDIT_CLIENT_SECRET,
/// REDDIT_USER_AGENT, REDDIT_USERNAME and REDDIT_PASSWORD.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    #[arg(long, default_value = "stocks")]
    pub subreddit: String,

    /// `submission` or `comment`.
    #[arg(long, default_value = "comment")]
    pub mode: String,

    #[arg(long, short, default_value = "test_output.json")]
    pub output: PathBuf,

    /// Maximum number of records written.
    #[arg(long, default_value_t = crate::config::DEFAULT_LIMIT)]
    pub limit: NonZeroUsize,

    /// Reserved: lower time bound in epoch seconds. Not applied.
    #[arg(long)]
    pub start: Option<i64>,

    /// Reserved: upper time bound in epoch seconds. Not applied.
    #[arg(long)]
    pub end: Option<i64>,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Disable progress bars.
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}
