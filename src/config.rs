use crate::error::ExtractError;
use crate::record::Mode;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Default number of records written per run.
pub const DEFAULT_LIMIT: NonZeroUsize = match NonZeroUsize::new(100) {
    Some(n) => n,
    None => unreachable!(),
};

/// Script-app credentials for the Reddit API.
///
/// Read once at startup and passed explicitly into the fetcher. Nothing is
/// validated locally; a bad value surfaces as an authentication failure.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Read `REDDIT_*` variables from the process environment. Unset variables
    /// become empty strings.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).unwrap_or_default();
        Self {
            client_id: get("REDDIT_CLIENT_ID"),
            client_secret: get("REDDIT_CLIENT_SECRET"),
            user_agent: get("REDDIT_USER_AGENT"),
            username: get("REDDIT_USERNAME"),
            password: get("REDDIT_PASSWORD"),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Parameters of a single extraction run.
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    /// Community (subreddit) name, without the `r/` prefix.
    pub community: String,
    pub mode: Mode,
    /// Output file. Created or truncated on every run.
    pub output: PathBuf,
    /// Maximum number of records written.
    pub limit: NonZeroUsize,
    /// Reserved lower time bound (epoch seconds). Not applied.
    pub start: Option<i64>,
    /// Reserved upper time bound (epoch seconds). Not applied.
    pub end: Option<i64>,
}

impl ExtractRequest {
    /// Build a request, validating `mode` before anything else happens.
    pub fn new(
        community: impl Into<String>,
        mode: &str,
        output: impl Into<PathBuf>,
        limit: NonZeroUsize,
    ) -> Result<Self, ExtractError> {
        let mode = mode.parse::<Mode>()?;
        let community = community.into();
        let community = community
            .trim_start_matches('/')
            .trim_start_matches("r/")
            .to_string();
        Ok(Self {
            community,
            mode,
            output: output.into(),
            limit,
            start: None,
            end: None,
        })
    }

    pub fn with_bounds(mut self, start: Option<i64>, end: Option<i64>) -> Self {
        self.start = start;
        self.end = end;
        self
    }
}
