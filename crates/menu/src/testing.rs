//! In-memory stand-ins for the browser session used by the menu tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use {
    async_trait::async_trait,
    dinehall_browser::{
        BrowserError, BrowsingContext, FetchedResponse, Launcher, RequestFilter, Session,
        SessionManager,
    },
    url::Url,
};

use crate::upstream::Upstream;

/// What the fake upstream answers for one request.
#[derive(Debug, Clone)]
pub enum Reply {
    Body(u16, String),
    Status(u16),
    Fail(String),
    Hang,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::Body(200, body.into())
    }
}

#[derive(Default)]
struct State {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: Mutex<Vec<String>>,
    blocked: Mutex<Vec<String>>,
    unfiltered: AtomicUsize,
    launches: AtomicUsize,
    launch_failures: AtomicUsize,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

/// A scripted browser: URL-keyed replies, and counters for everything the
/// code under test does with it.
#[derive(Clone, Default)]
pub struct FakeBrowser {
    state: Arc<State>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, url: Url, reply: Reply) {
        self.reply_sequence(url, vec![reply]);
    }

    /// Replies handed out in order; the last one repeats.
    pub fn reply_sequence(&self, url: Url, replies: Vec<Reply>) {
        self.state
            .replies
            .lock()
            .unwrap()
            .insert(url.to_string(), replies.into());
    }

    pub fn fail_launches(&self, count: usize) {
        self.state.launch_failures.store(count, Ordering::SeqCst);
    }

    pub fn launcher(&self) -> FakeLauncher {
        FakeLauncher {
            state: Arc::clone(&self.state),
        }
    }

    pub fn session_manager(&self) -> Arc<SessionManager> {
        Arc::new(SessionManager::new(self.launcher()))
    }

    pub async fn filtered_context(&self, upstream: &Upstream) -> Box<dyn BrowsingContext> {
        let mut ctx = self.new_context();
        ctx.install_filter(RequestFilter::new(upstream.host()))
            .await
            .unwrap();
        ctx
    }

    /// URLs that passed the filter and reached the fake network.
    pub fn requests(&self) -> Vec<String> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn blocked(&self) -> Vec<String> {
        self.state.blocked.lock().unwrap().clone()
    }

    pub fn unfiltered_fetches(&self) -> usize {
        self.state.unfiltered.load(Ordering::SeqCst)
    }

    pub fn launches(&self) -> usize {
        self.state.launches.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    fn new_context(&self) -> Box<dyn BrowsingContext> {
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        Box::new(FakeContext {
            state: Arc::clone(&self.state),
            filter: None,
        })
    }
}

pub struct FakeLauncher {
    state: Arc<State>,
}

#[async_trait]
impl Launcher for FakeLauncher {
    async fn launch(&self) -> Result<Arc<dyn Session>, BrowserError> {
        if self
            .state
            .launch_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(BrowserError::BrowserNotAvailable("no chromium on this host".into()));
        }
        self.state.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakeSession {
            browser: FakeBrowser {
                state: Arc::clone(&self.state),
            },
        }))
    }
}

struct FakeSession {
    browser: FakeBrowser,
}

#[async_trait]
impl Session for FakeSession {
    fn is_alive(&self) -> bool {
        true
    }

    async fn new_context(&self) -> Result<Box<dyn BrowsingContext>, BrowserError> {
        Ok(self.browser.new_context())
    }

    async fn close(&self) {}
}

struct FakeContext {
    state: Arc<State>,
    filter: Option<RequestFilter>,
}

#[async_trait]
impl BrowsingContext for FakeContext {
    async fn install_filter(&mut self, filter: RequestFilter) -> Result<(), BrowserError> {
        self.filter = Some(filter);
        Ok(())
    }

    async fn fetch(&self, url: &str) -> Result<FetchedResponse, BrowserError> {
        match &self.filter {
            None => {
                self.state.unfiltered.fetch_add(1, Ordering::SeqCst);
            },
            Some(filter) if !filter.allows(url) => {
                self.state.blocked.lock().unwrap().push(url.to_string());
                return Err(BrowserError::Evaluation(
                    "TypeError: Failed to fetch (net::ERR_BLOCKED_BY_CLIENT)".into(),
                ));
            },
            Some(_) => {},
        }
        self.state.requests.lock().unwrap().push(url.to_string());

        let reply = {
            let mut replies = self.state.replies.lock().unwrap();
            match replies.get_mut(url) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match reply.unwrap_or(Reply::Status(404)) {
            Reply::Body(status, body) => Ok(FetchedResponse { status, body }),
            Reply::Status(status) => Ok(FetchedResponse {
                status,
                body: String::new(),
            }),
            Reply::Fail(msg) => Err(BrowserError::Evaluation(msg)),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(BrowserError::Timeout("fake hang".into()))
            },
        }
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        self.state.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Upstream pinned to location `5f4d` with a short per-call timeout.
pub fn test_upstream() -> Upstream {
    Upstream::from_config(&dinehall_config::UpstreamConfig {
        location_id: "5f4d".into(),
        ..Default::default()
    })
    .unwrap()
    .with_request_timeout(Duration::from_millis(200))
}

pub fn periods_body(periods: &[(&str, &str)]) -> String {
    let periods: Vec<_> = periods
        .iter()
        .map(|(id, name)| serde_json::json!({ "id": id, "name": name, "slug": null }))
        .collect();
    serde_json::json!({ "periods": periods }).to_string()
}

pub fn menu_body(period_id: &str, period_name: &str) -> String {
    serde_json::json!({
        "id": "menu-1",
        "locationId": "5f4d",
        "date": "2024-03-01",
        "period": {
            "id": period_id,
            "name": period_name,
            "slug": null,
            "categories": [{
                "id": "c1",
                "name": "Grill",
                "sortOrder": 1,
                "items": [{
                    "id": "i1",
                    "name": "Veggie Burger",
                    "desc": "Black bean patty",
                    "calories": 310,
                    "ingredients": "beans, oats",
                    "sortOrder": 0,
                    "nutrients": [
                        { "name": "Sugar (g)", "value": "less than 1", "uom": "g" }
                    ],
                    "filters": [
                        { "name": "Vegan", "icon": true, "remoteFileName": "vegan.png" }
                    ]
                }]
            }]
        }
    })
    .to_string()
}
