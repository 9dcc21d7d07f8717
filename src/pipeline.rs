use crate::config::{Credentials, ExtractRequest};
use crate::error::{ExtractError, FetchError};
use crate::events::{ConsoleSink, EventSink, ExtractEvent};
use crate::fetch::fetch_records;
use crate::reddit::ContentApi;
use crate::writer::JsonlWriter;
use tracing::{debug, info};

/// What a run produced.
#[derive(Debug)]
pub struct ExtractSummary {
    pub fetched: usize,
    pub written: usize,
    pub limit_reached: bool,
    /// Set when the feed failed part way and only a prefix was written.
    pub fetch_error: Option<FetchError>,
}

/// Run an extraction with console progress bars.
pub fn run<A: ContentApi>(
    api: &A,
    credentials: &Credentials,
    request: &ExtractRequest,
) -> Result<ExtractSummary, ExtractError> {
    let sink = ConsoleSink::new();
    run_with_sink(api, credentials, request, &sink)
}

/// Fetch the community feed, then write up to `request.limit` records to
/// `request.output`, one JSON object per line, in feed order.
///
/// The output file is truncated before fetching starts. A feed failure is
/// not an error here: whatever was fetched is written and the cause is
/// returned in the summary.
pub fn run_with_sink<A: ContentApi>(
    api: &A,
    credentials: &Credentials,
    request: &ExtractRequest,
    sink: &dyn EventSink,
) -> Result<ExtractSummary, ExtractError> {
    info!(
        community = %request.community,
        mode = %request.mode,
        path = %request.output.display(),
        limit = request.limit.get(),
        "extracting"
    );
    if request.start.is_some() || request.end.is_some() {
        debug!(start = ?request.start, end = ?request.end, "time bounds are not applied");
    }

    let mut writer = JsonlWriter::create(&request.output, request.limit)?;

    let outcome = fetch_records(api, credentials, request.mode, &request.community, sink)?;
    let fetched = outcome.records.len();
    info!(fetched, "fetched objects");

    sink.send(ExtractEvent::WriteStarted {
        total: fetched.min(request.limit.get()),
    });
    for record in &outcome.records {
        writer.write_record(record)?;
        info!(id = record.id(), total_written = writer.written(), "wrote object");
        sink.send(ExtractEvent::RecordWritten {
            written: writer.written(),
        });
        if writer.is_full() {
            info!("reached record limit");
            break;
        }
    }

    let limit_reached = writer.is_full();
    let written = writer.finish()?;
    info!(written, path = %request.output.display(), "finished writing");
    sink.send(ExtractEvent::Finished {
        written,
        path: request.output.clone(),
    });

    Ok(ExtractSummary {
        fetched,
        written,
        limit_reached,
        fetch_error: outcome.error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_LIMIT;
    use crate::events::SilentSink;
    use crate::record::Mode;
    use crate::test_helpers::{FakeApi, comment_feed};
    use serde_json::{Map, Value, json};
    use std::num::NonZeroUsize;
    use std::path::Path;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<ExtractEvent>>,
    }

    impl EventSink for RecordingSink {
        fn send(&self, event: ExtractEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn request(dir: &Path, mode: &str, limit: usize) -> ExtractRequest {
        ExtractRequest::new(
            "stocks",
            mode,
            dir.join("out.json"),
            NonZeroUsize::new(limit).unwrap(),
        )
        .unwrap()
    }

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn parse(line: &str) -> Map<String, Value> {
        match serde_json::from_str::<Value>(line).unwrap() {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    /// Keys in the order they appear in the raw line.
    fn raw_keys(line: &str, expected: &[&str]) -> Vec<usize> {
        expected
            .iter()
            .map(|k| line.find(&format!("\"{}\":", k)).unwrap())
            .collect()
    }

    #[test]
    fn test_comment_scenario_limit_three() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path(), "comment", 3);
        let api = FakeApi::with_comments(comment_feed(5));

        let summary = run_with_sink(&api, &Credentials::default(), &req, &SilentSink).unwrap();
        assert_eq!(summary.fetched, 5);
        assert_eq!(summary.written, 3);
        assert!(summary.limit_reached);
        assert!(summary.fetch_error.is_none());

        let lines = read_lines(&req.output);
        assert_eq!(lines.len(), 3);
        let keys = ["author", "body", "created_utc", "id", "total_awards_received"];
        for (line, id) in lines.iter().zip(["c1", "c2", "c3"]) {
            let obj = parse(line);
            assert_eq!(obj.keys().map(String::as_str).collect::<Vec<_>>(), keys);
            assert_eq!(obj["id"], id);

            let positions = raw_keys(line, &keys);
            assert!(positions.windows(2).all(|w| w[0] < w[1]), "unsorted keys: {line}");
        }
    }

    #[test]
    fn test_writes_min_of_limit_and_fetched() {
        for (limit, feed) in [(1, 4), (4, 4), (10, 4), (100, 0), (2, 7)] {
            let dir = tempfile::tempdir().unwrap();
            let req = request(dir.path(), "comment", limit);
            let api = FakeApi::with_comments(comment_feed(feed));

            let summary = run_with_sink(&api, &Credentials::default(), &req, &SilentSink).unwrap();
            let lines = read_lines(&req.output);
            assert_eq!(lines.len(), limit.min(feed), "limit={limit} feed={feed}");
            assert_eq!(summary.written, lines.len());

            let ids: Vec<String> = lines.iter().map(|l| parse(l)["id"].as_str().unwrap().to_string()).collect();
            let expected: Vec<String> = (1..=lines.len()).map(|i| format!("c{}", i)).collect();
            assert_eq!(ids, expected);
        }
    }

    #[test]
    fn test_empty_feed_writes_empty_file() {
        for mode in ["submission", "comment"] {
            let dir = tempfile::tempdir().unwrap();
            let req = request(dir.path(), mode, 100);
            let summary = run_with_sink(&FakeApi::default(), &Credentials::default(), &req, &SilentSink).unwrap();
            assert_eq!(summary.written, 0);
            assert!(!summary.limit_reached);
            assert_eq!(std::fs::read_to_string(&req.output).unwrap(), "");
        }
    }

    #[test]
    fn test_submission_defaults_in_output() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path(), "submission", 100);
        let api = FakeApi::with_submissions(vec![json!({
            "id": "s1",
            "title": "Prix du pétrole",
            "author": null,
            "created_utc": 1700000000.0,
            "num_comments": 12
        })]);

        run_with_sink(&api, &Credentials::default(), &req, &SilentSink).unwrap();
        let lines = read_lines(&req.output);
        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0],
            "{\"author\": \"\", \"created_utc\": 1700000000, \"id\": \"s1\", \"num_comments\": 12, \
             \"title\": \"Prix du p\\u00e9trole\", \"total_awards_received\": 0}"
        );
    }

    #[test]
    fn test_partial_fetch_still_writes() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path(), "comment", 100);
        let api = FakeApi::with_comments(comment_feed(5)).failing_after(3);

        let summary = run_with_sink(&api, &Credentials::default(), &req, &SilentSink).unwrap();
        assert_eq!(summary.written, 3);
        assert!(summary.fetch_error.is_some());
        assert_eq!(read_lines(&req.output).len(), 3);
    }

    #[test]
    fn test_auth_failure_leaves_truncated_file() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path(), "comment", 100);
        std::fs::write(&req.output, "old\n").unwrap();
        let api = FakeApi {
            reject_auth: true,
            ..Default::default()
        };

        let err = run_with_sink(&api, &Credentials::default(), &req, &SilentSink).unwrap_err();
        assert!(matches!(err, ExtractError::Auth(_)));
        assert_eq!(std::fs::read_to_string(&req.output).unwrap(), "");
    }

    #[test]
    fn test_unwritable_path_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let req = ExtractRequest::new("stocks", "comment", dir.path().join("missing/out.json"), DEFAULT_LIMIT).unwrap();
        let api = FakeApi::with_comments(comment_feed(1));

        let err = run_with_sink(&api, &Credentials::default(), &req, &SilentSink).unwrap_err();
        assert!(matches!(err, ExtractError::Io(_)));
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_reserved_bounds_do_not_filter() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path(), "comment", 100).with_bounds(Some(0), Some(1));
        let api = FakeApi::with_comments(comment_feed(4));

        let summary = run_with_sink(&api, &Credentials::default(), &req, &SilentSink).unwrap();
        assert_eq!(summary.written, 4);
    }

    #[test]
    fn test_event_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path(), "comment", 2);
        let api = FakeApi::with_comments(comment_feed(3));
        let sink = RecordingSink::default();

        run_with_sink(&api, &Credentials::default(), &req, &sink).unwrap();
        let events = sink.events.into_inner().unwrap();
        assert_eq!(
            events,
            vec![
                ExtractEvent::Authenticated { username: "test_bot".into() },
                ExtractEvent::FetchStarted { community: "stocks".into(), mode: Mode::Comment },
                ExtractEvent::FetchProgress { fetched: 1 },
                ExtractEvent::FetchProgress { fetched: 2 },
                ExtractEvent::FetchProgress { fetched: 3 },
                ExtractEvent::FetchComplete { fetched: 3, partial: false },
                ExtractEvent::WriteStarted { total: 2 },
                ExtractEvent::RecordWritten { written: 1 },
                ExtractEvent::RecordWritten { written: 2 },
                ExtractEvent::Finished { written: 2, path: req.output.clone() },
            ]
        );
    }
}
