//! Shared browser session lifecycle and per-request browsing contexts.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use {
    async_trait::async_trait,
    serde::Deserialize,
    tokio::sync::RwLock,
    tracing::{debug, info, warn},
};

use crate::{error::BrowserError, filter::RequestFilter};

/// Status and raw body of a `fetch()` issued from inside a browsing context.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FetchedResponse {
    pub status: u16,
    pub body: String,
}

impl FetchedResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// An isolated page owned by exactly one request.
#[async_trait]
pub trait BrowsingContext: Send + Sync {
    /// Route every request the page makes through `filter`. Must be called
    /// before the first `fetch`.
    async fn install_filter(&mut self, filter: RequestFilter) -> Result<(), BrowserError>;
    /// Issue a GET from inside the page and return the status and body.
    async fn fetch(&self, url: &str) -> Result<FetchedResponse, BrowserError>;
    /// Release the page.
    async fn close(self: Box<Self>) -> Result<(), BrowserError>;
}

/// A running browser process that hands out browsing contexts.
#[async_trait]
pub trait Session: Send + Sync {
    /// False once the underlying process or its connection is gone.
    fn is_alive(&self) -> bool;
    /// Open a fresh, isolated browsing context.
    async fn new_context(&self) -> Result<Box<dyn BrowsingContext>, BrowserError>;
    /// Shut the browser down. Safe to call on a dead session.
    async fn close(&self);
}

/// Starts browser sessions.
#[async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(&self) -> Result<Arc<dyn Session>, BrowserError>;
}

/// Owns the single browser session shared by every request in the process.
///
/// The session is launched on first use and reused while it stays alive.
/// Launching happens under the write lock, so concurrent callers that find no
/// usable session wait for the one launch in flight instead of starting their
/// own.
pub struct SessionManager {
    launcher: Box<dyn Launcher>,
    current: RwLock<Option<Arc<dyn Session>>>,
    launches: AtomicUsize,
}

impl SessionManager {
    pub fn new(launcher: impl Launcher + 'static) -> Self {
        Self {
            launcher: Box::new(launcher),
            current: RwLock::new(None),
            launches: AtomicUsize::new(0),
        }
    }

    /// Return the live session, launching (or relaunching) it if needed.
    pub async fn acquire(&self) -> Result<Arc<dyn Session>, BrowserError> {
        {
            let current = self.current.read().await;
            if let Some(session) = current.as_ref().filter(|s| s.is_alive()) {
                return Ok(Arc::clone(session));
            }
        }

        let mut current = self.current.write().await;

        // Another caller may have launched while we waited for the lock.
        if let Some(session) = current.as_ref() {
            if session.is_alive() {
                return Ok(Arc::clone(session));
            }
            warn!("shared browser session is no longer alive, relaunching");
            session.close().await;
            *current = None;
        }

        let session = self.launcher.launch().await?;
        let launches = self.launches.fetch_add(1, Ordering::Relaxed) + 1;
        info!(launches, "launched shared browser session");
        *current = Some(Arc::clone(&session));
        Ok(session)
    }

    /// Replace `stale` with a freshly launched session.
    ///
    /// If another caller already replaced it, the current session is returned
    /// and nothing is launched.
    pub async fn relaunch(&self, stale: &Arc<dyn Session>) -> Result<Arc<dyn Session>, BrowserError> {
        {
            let mut current = self.current.write().await;
            if current.as_ref().is_some_and(|s| same_session(s, stale)) {
                if let Some(session) = current.take() {
                    session.close().await;
                }
                debug!("discarded stale browser session");
            }
        }
        self.acquire().await
    }

    /// Open a browsing context on the shared session.
    ///
    /// A context that cannot be opened because the browser connection is gone
    /// triggers one relaunch and a second attempt.
    pub async fn open_context(&self) -> Result<Box<dyn BrowsingContext>, BrowserError> {
        let session = self.acquire().await?;
        match session.new_context().await {
            Ok(ctx) => Ok(ctx),
            Err(e) if e.is_connection_lost() => {
                warn!(error = %e, "browser connection lost while opening context, relaunching");
                let session = self.relaunch(&session).await?;
                session.new_context().await
            },
            Err(e) => Err(e),
        }
    }

    /// Number of sessions launched so far.
    pub fn launch_count(&self) -> usize {
        self.launches.load(Ordering::Relaxed)
    }

    /// Whether a live session is currently held.
    pub async fn is_running(&self) -> bool {
        self.current
            .read()
            .await
            .as_ref()
            .is_some_and(|s| s.is_alive())
    }

    /// Close the shared session, if any.
    pub async fn shutdown(&self) {
        let session = self.current.write().await.take();
        if let Some(session) = session {
            session.close().await;
            info!("shared browser session shut down");
        }
    }
}

fn same_session(a: &Arc<dyn Session>, b: &Arc<dyn Session>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
