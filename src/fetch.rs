use crate::config::Credentials;
use crate::error::{ExtractError, FetchError};
use crate::events::{EventSink, ExtractEvent};
use crate::reddit::{ContentApi, Session};
use crate::record::{Mode, Record};
use tracing::{debug, error, info};

/// Records collected by one fetch, plus the error that cut it short, if any.
#[derive(Debug)]
pub struct FetchOutcome {
    pub records: Vec<Record>,
    pub error: Option<FetchError>,
}

impl FetchOutcome {
    /// True when the feed was read to exhaustion.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Fetch with a mode given by name. Unknown modes fail before any network call.
pub fn fetch_objects<A: ContentApi>(
    api: &A,
    credentials: &Credentials,
    mode: &str,
    community: &str,
    sink: &dyn EventSink,
) -> Result<FetchOutcome, ExtractError> {
    let mode = mode.parse::<Mode>().inspect_err(|e| error!("{}", e))?;
    fetch_records(api, credentials, mode, community, sink)
}

/// Authenticate, then read the community's newest submissions or comments
/// until the feed ends or fails.
///
/// Authentication errors are returned. Errors while paging are not: the loop
/// stops and the outcome carries everything read before the failure.
pub fn fetch_records<A: ContentApi>(
    api: &A,
    credentials: &Credentials,
    mode: Mode,
    community: &str,
    sink: &dyn EventSink,
) -> Result<FetchOutcome, ExtractError> {
    info!(%mode, community, "fetching objects");

    let session = api.authenticate(credentials).map_err(ExtractError::Auth)?;
    let username = session.username().map_err(ExtractError::Auth)?;
    info!(%username, "authenticated");
    sink.send(ExtractEvent::Authenticated { username });

    sink.send(ExtractEvent::FetchStarted {
        community: community.to_string(),
        mode,
    });

    let items = match mode {
        Mode::Submission => session.newest(community),
        Mode::Comment => session.comments(community),
    };

    let mut records = Vec::new();
    let mut failure = None;
    for item in items {
        match item.and_then(|item| Record::from_item(mode, &item)) {
            Ok(record) => {
                debug!(id = record.id(), created_utc = record.created_utc(), "{}", mode);
                records.push(record);
                sink.send(ExtractEvent::FetchProgress { fetched: records.len() });
            }
            Err(e) => {
                error!(error = %e, collected = records.len(), "error during data fetch");
                failure = Some(e);
                break;
            }
        }
    }

    info!(count = records.len(), "fetch finished");
    sink.send(ExtractEvent::FetchComplete {
        fetched: records.len(),
        partial: failure.is_some(),
    });

    Ok(FetchOutcome {
        records,
        error: failure,
    })
}
