//! In-memory content API for fetcher and pipeline tests.

use crate::config::Credentials;
use crate::error::FetchError;
use crate::reddit::{ContentApi, ItemStream, Session};
use crate::record::Item;
use serde_json::{Value, json};
use std::cell::RefCell;
use std::rc::Rc;

/// Serves fixed feeds and records every call made against it.
#[derive(Default)]
pub struct FakeApi {
    pub submissions: Vec<Value>,
    pub comments: Vec<Value>,
    /// Yield an error after this many items.
    pub fail_after: Option<usize>,
    pub reject_auth: bool,
    pub calls: Rc<RefCell<Vec<String>>>,
}

impl FakeApi {
    pub fn with_comments(comments: Vec<Value>) -> Self {
        Self { comments, ..Default::default() }
    }

    pub fn with_submissions(submissions: Vec<Value>) -> Self {
        Self { submissions, ..Default::default() }
    }

    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl ContentApi for FakeApi {
    type Session = FakeSession;

    fn authenticate(&self, _credentials: &Credentials) -> Result<FakeSession, FetchError> {
        self.calls.borrow_mut().push("authenticate".into());
        if self.reject_auth {
            return Err(FetchError::Rejected("invalid_grant".into()));
        }
        Ok(FakeSession {
            submissions: self.submissions.clone(),
            comments: self.comments.clone(),
            fail_after: self.fail_after,
            calls: Rc::clone(&self.calls),
        })
    }
}

pub struct FakeSession {
    submissions: Vec<Value>,
    comments: Vec<Value>,
    fail_after: Option<usize>,
    calls: Rc<RefCell<Vec<String>>>,
}

impl FakeSession {
    fn stream(&self, feed: &[Value]) -> ItemStream<'_> {
        let items: Vec<Result<Item, FetchError>> = feed.iter().cloned().map(Item::from).map(Ok).collect();
        match self.fail_after {
            Some(n) => Box::new(
                items
                    .into_iter()
                    .take(n)
                    .chain(std::iter::once(Err(FetchError::Rejected("upstream failure".into())))),
            ),
            None => Box::new(items.into_iter()),
        }
    }
}

impl Session for FakeSession {
    fn username(&self) -> Result<String, FetchError> {
        Ok("test_bot".into())
    }

    fn newest(&self, community: &str) -> ItemStream<'_> {
        self.calls.borrow_mut().push(format!("newest:{}", community));
        self.stream(&self.submissions)
    }

    fn comments(&self, community: &str) -> ItemStream<'_> {
        self.calls.borrow_mut().push(format!("comments:{}", community));
        self.stream(&self.comments)
    }
}

/// `count` comments with ids `c1..=count`, newest first.
pub fn comment_feed(count: usize) -> Vec<Value> {
    (1..=count)
        .map(|i| {
            json!({
                "id": format!("c{}", i),
                "author": format!("user{}", i),
                "body": format!("comment number {}", i),
                "created_utc": 1_700_000_000.0 - i as f64,
                "total_awards_received": 0
            })
        })
        .collect()
}
