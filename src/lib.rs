//! Pull the newest posts or comments of a subreddit into a JSON-lines file.
//!
//! [`fetch::fetch_objects`] authenticates and reads a community feed into
//! flat [`record::Record`]s; [`pipeline::run_with_sink`] writes a bounded
//! prefix of them to disk.

pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod fetch;
pub mod logging;
pub mod pipeline;
pub mod record;
pub mod reddit;
pub mod writer;

#[cfg(test)]
mod test_helpers;

pub use config::{Credentials, ExtractRequest};
pub use error::{ExtractError, FetchError};
pub use fetch::{FetchOutcome, fetch_objects, fetch_records};
pub use pipeline::{ExtractSummary, run, run_with_sink};
pub use record::{CommentRecord, Mode, Record, SubmissionRecord};
