//! Shared headless Chrome/Chromium session with per-request, network-filtered
//! browsing contexts.
//!
//! # Features
//!
//! - **session**: one lazily launched browser per process, relaunched when it dies
//! - **context**: an isolated page per request, released on every exit path
//! - **filter**: every request a page makes is checked against a single pinned host
//! - **fetch**: `fetch()` issued from inside the page, returning status and body
//!
//! # Example
//!
//! ```ignore
//! use dinehall_browser::{ChromiumLauncher, LaunchOptions, RequestFilter, SessionManager};
//!
//! let sessions = SessionManager::new(ChromiumLauncher::new(LaunchOptions::default()));
//! let mut ctx = sessions.open_context().await?;
//! ctx.install_filter(RequestFilter::new("apiv4.dineoncampus.com")).await?;
//! let response = ctx.fetch("https://apiv4.dineoncampus.com/...").await;
//! ctx.close().await?;
//! ```

pub mod chromium;
pub mod detect;
pub mod error;
pub mod filter;
pub mod session;

pub use {
    chromium::{ChromiumLauncher, LaunchOptions},
    error::BrowserError,
    filter::{FilterDecision, RequestFilter},
    session::{BrowsingContext, FetchedResponse, Launcher, Session, SessionManager},
};
