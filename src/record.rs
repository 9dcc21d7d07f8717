use crate::error::{ExtractError, FetchError};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

// ── Mode ────────────────────────────────────────────────────────────────────

/// Which listing of a community is retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Submission,
    Comment,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Submission => "submission",
            Mode::Comment => "comment",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submission" => Ok(Mode::Submission),
            "comment" => Ok(Mode::Comment),
            other => Err(ExtractError::InvalidMode(other.to_string())),
        }
    }
}

// ── Field access ────────────────────────────────────────────────────────────

/// Read-only view of a source item's fields.
///
/// Every accessor returns `None` when the field is absent or has the wrong
/// shape; record constructors decide the fallback.
pub trait FieldSource {
    fn text(&self, field: &str) -> Option<String>;
    fn integer(&self, field: &str) -> Option<i64>;
    /// Display name of the author, `None` for deleted or anonymous items.
    fn author(&self) -> Option<String>;
}

/// A raw listing child as returned by the API (`children[].data`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Item {
    fields: Map<String, Value>,
}

impl Item {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

impl From<Value> for Item {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            _ => Self::default(),
        }
    }
}

/// Reddit's placeholder for removed accounts.
const DELETED_AUTHOR: &str = "[deleted]";

impl FieldSource for Item {
    fn text(&self, field: &str) -> Option<String> {
        self.fields.get(field)?.as_str().map(str::to_string)
    }

    fn integer(&self, field: &str) -> Option<i64> {
        let value = self.fields.get(field)?;
        value
            .as_i64()
            .or_else(|| value.as_f64().map(|f| f.trunc() as i64))
    }

    fn author(&self) -> Option<String> {
        self.text("author")
            .filter(|name| !name.is_empty() && name != DELETED_AUTHOR)
    }
}

fn count(item: &dyn FieldSource, field: &str) -> u64 {
    item.integer(field)
        .and_then(|n| u64::try_from(n).ok())
        .unwrap_or(0)
}

fn required_id(item: &dyn FieldSource, kind: &'static str) -> Result<String, FetchError> {
    item.text("id")
        .filter(|id| !id.is_empty())
        .ok_or_else(|| FetchError::MalformedItem {
            kind,
            reason: "missing id".into(),
        })
}

// ── Records ─────────────────────────────────────────────────────────────────

/// Flat projection of a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionRecord {
    pub author: String,
    pub created_utc: i64,
    pub id: String,
    pub num_comments: u64,
    pub title: String,
    pub total_awards_received: u64,
}

impl SubmissionRecord {
    /// Fallbacks: `title`/`author` → `""`, `created_utc`/`num_comments`/
    /// `total_awards_received` → `0`. A missing `id` is a malformed item.
    pub fn from_item(item: &dyn FieldSource) -> Result<Self, FetchError> {
        Ok(Self {
            id: required_id(item, "submission")?,
            title: item.text("title").unwrap_or_default(),
            author: item.author().unwrap_or_default(),
            created_utc: item.integer("created_utc").unwrap_or(0),
            num_comments: count(item, "num_comments"),
            total_awards_received: count(item, "total_awards_received"),
        })
    }
}

/// Flat projection of a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentRecord {
    pub author: String,
    pub body: String,
    pub created_utc: i64,
    pub id: String,
    pub total_awards_received: u64,
}

impl CommentRecord {
    /// Fallbacks: `author`/`body` → `""`, `created_utc`/`total_awards_received`
    /// → `0`. A missing `id` is a malformed item.
    pub fn from_item(item: &dyn FieldSource) -> Result<Self, FetchError> {
        Ok(Self {
            id: required_id(item, "comment")?,
            author: item.author().unwrap_or_default(),
            created_utc: item.integer("created_utc").unwrap_or(0),
            body: item.text("body").unwrap_or_default(),
            total_awards_received: count(item, "total_awards_received"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Submission(SubmissionRecord),
    Comment(CommentRecord),
}

impl Record {
    pub fn from_item(mode: Mode, item: &dyn FieldSource) -> Result<Self, FetchError> {
        match mode {
            Mode::Submission => SubmissionRecord::from_item(item).map(Record::Submission),
            Mode::Comment => CommentRecord::from_item(item).map(Record::Comment),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Record::Submission(s) => &s.id,
            Record::Comment(c) => &c.id,
        }
    }

    pub fn created_utc(&self) -> i64 {
        match self {
            Record::Submission(s) => s.created_utc,
            Record::Comment(c) => c.created_utc,
        }
    }
}
