use crate::config::Credentials;
use crate::error::FetchError;
use crate::record::Item;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use serde::Deserialize;
use serde_json::Value;
use std::collections::VecDeque;

/// Lazy, fallible sequence of listing items, newest first.
pub type ItemStream<'a> = Box<dyn Iterator<Item = Result<Item, FetchError>> + 'a>;

// ── Collaborator traits ─────────────────────────────────────────────────────

/// A content API that can open an authenticated session.
pub trait ContentApi {
    type Session: Session;

    fn authenticate(&self, credentials: &Credentials) -> Result<Self::Session, FetchError>;
}

/// An authenticated session.
pub trait Session {
    /// Name of the account the session is logged in as.
    fn username(&self) -> Result<String, FetchError>;
    /// Newest submissions of `community`, paging until the feed is exhausted.
    fn newest(&self, community: &str) -> ItemStream<'_>;
    /// Newest comments of `community`, paging until the feed is exhausted.
    fn comments(&self, community: &str) -> ItemStream<'_>;
}

// ── Reddit client ───────────────────────────────────────────────────────────

const PAGE_SIZE: &str = "100";

/// Base URLs used by [`RedditApi`].
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub token_url: String,
    pub api_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            token_url: "https://www.reddit.com/api/v1/access_token".into(),
            api_url: "https://oauth.reddit.com".into(),
        }
    }
}

/// Blocking Reddit client using the script-app password grant.
pub struct RedditApi {
    agent: ureq::Agent,
    endpoints: Endpoints,
}

impl RedditApi {
    pub fn new() -> Self {
        Self::with_endpoints(Endpoints::default())
    }

    pub fn with_endpoints(endpoints: Endpoints) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            endpoints,
        }
    }
}

impl Default for RedditApi {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentApi for RedditApi {
    type Session = RedditSession;

    fn authenticate(&self, credentials: &Credentials) -> Result<RedditSession, FetchError> {
        let basic = B64.encode(format!(
            "{}:{}",
            credentials.client_id, credentials.client_secret
        ));
        let mut resp = self
            .agent
            .post(&self.endpoints.token_url)
            .header("Authorization", format!("Basic {}", basic))
            .header("User-Agent", credentials.user_agent.as_str())
            .send_form([
                ("grant_type", "password"),
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ])?;
        let body = resp.body_mut().read_to_string()?;
        let token = parse_token(&body)?;

        Ok(RedditSession {
            agent: self.agent.clone(),
            api_url: self.endpoints.api_url.trim_end_matches('/').to_string(),
            user_agent: credentials.user_agent.clone(),
            token,
        })
    }
}

pub struct RedditSession {
    agent: ureq::Agent,
    api_url: String,
    user_agent: String,
    token: String,
}

impl RedditSession {
    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<String, FetchError> {
        let url = format!("{}/{}", self.api_url, path);
        let mut req = self
            .agent
            .get(&url)
            .header("Authorization", format!("bearer {}", self.token))
            .header("User-Agent", self.user_agent.as_str());
        for (k, v) in query {
            req = req.query(*k, *v);
        }
        let mut resp = req.call()?;
        Ok(resp.body_mut().read_to_string()?)
    }

    fn fetch_page(&self, path: &str, after: Option<&str>) -> Result<Page, FetchError> {
        let mut query = vec![("limit", PAGE_SIZE), ("raw_json", "1")];
        if let Some(after) = after {
            query.push(("after", after));
        }
        let body = self.get(path, &query)?;
        parse_listing(&body)
    }

    fn listing(&self, community: &str, sort: &str) -> ItemStream<'_> {
        let path = format!("r/{}/{}", community, sort);
        Box::new(Listing::new(move |after: Option<&str>| {
            self.fetch_page(&path, after)
        }))
    }
}

impl Session for RedditSession {
    fn username(&self) -> Result<String, FetchError> {
        let body = self.get("api/v1/me", &[("raw_json", "1")])?;
        let me: Identity = serde_json::from_str(&body)?;
        Ok(me.name)
    }

    fn newest(&self, community: &str) -> ItemStream<'_> {
        self.listing(community, "new")
    }

    fn comments(&self, community: &str) -> ItemStream<'_> {
        self.listing(community, "comments")
    }
}

// ── Wire formats ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Deserialize)]
struct Identity {
    name: String,
}

#[derive(Deserialize)]
struct ListingResponse {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    #[serde(default)]
    after: Option<String>,
    #[serde(default)]
    children: Vec<ListingChild>,
}

#[derive(Deserialize)]
struct ListingChild {
    #[serde(default)]
    data: Value,
}

/// One decoded page of a listing.
#[derive(Debug, Default)]
struct Page {
    items: Vec<Item>,
    /// Cursor of the next page, `None` on the last page.
    after: Option<String>,
}

/// Reddit answers a bad password grant with 200 and an `error` member.
fn parse_token(body: &str) -> Result<String, FetchError> {
    let resp: TokenResponse = serde_json::from_str(body)?;
    match (resp.access_token, resp.error) {
        (_, Some(err)) => Err(FetchError::Rejected(match err {
            Value::String(s) => s,
            other => other.to_string(),
        })),
        (Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(FetchError::Rejected("no access token in response".into())),
    }
}

fn parse_listing(body: &str) -> Result<Page, FetchError> {
    let resp: ListingResponse = serde_json::from_str(body)?;
    Ok(Page {
        items: resp
            .data
            .children
            .into_iter()
            .map(|c| Item::from(c.data))
            .collect(),
        after: resp.data.after.filter(|a| !a.is_empty()),
    })
}

// ── Pagination ──────────────────────────────────────────────────────────────

/// Walks a cursor-paginated listing one page at a time.
///
/// Stops after the page without an `after` cursor, after an empty page, or
/// after yielding the first error.
struct Listing<F> {
    fetch: F,
    after: Option<String>,
    buffer: VecDeque<Item>,
    done: bool,
}

impl<F> Listing<F>
where
    F: FnMut(Option<&str>) -> Result<Page, FetchError>,
{
    fn new(fetch: F) -> Self {
        Self {
            fetch,
            after: None,
            buffer: VecDeque::new(),
            done: false,
        }
    }
}

impl<F> Iterator for Listing<F>
where
    F: FnMut(Option<&str>) -> Result<Page, FetchError>,
{
    type Item = Result<Item, FetchError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some(Ok(item));
            }
            if self.done {
                return None;
            }
            match (self.fetch)(self.after.as_deref()) {
                Ok(page) => {
                    self.done = page.after.is_none() || page.items.is_empty();
                    self.after = page.after;
                    self.buffer.extend(page.items);
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
