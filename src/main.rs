use anyhow::Context;
use clap::Parser;
use subreddit_extract::cli::Args;
use subreddit_extract::events::SilentSink;
use subreddit_extract::logging::{self, LogConfig};
use subreddit_extract::reddit::RedditApi;
use subreddit_extract::{Credentials, ExtractRequest, pipeline};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_logging(&LogConfig {
        format: args.log_format,
        ..LogConfig::default()
    })?;

    let request = ExtractRequest::new(&args.subreddit, &args.mode, &args.output, args.limit)?
        .with_bounds(args.start, args.end);
    let credentials = Credentials::from_env();
    let api = RedditApi::new();

    let summary = if args.no_progress {
        pipeline::run_with_sink(&api, &credentials, &request, &SilentSink)
    } else {
        pipeline::run(&api, &credentials, &request)
    }
    .with_context(|| format!("extraction to {} failed", request.output.display()))?;

    if let Some(cause) = &summary.fetch_error {
        tracing::warn!(%cause, written = summary.written, "feed ended early; output is partial");
    }
    Ok(())
}
