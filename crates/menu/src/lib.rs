//! Dining hall menus fetched through a filtered headless-browser context.
//!
//! A request for `(date, meal)` opens one browsing context on the shared
//! browser session, pins its network access to the upstream API host,
//! resolves the meal name to the upstream period id, fetches that period's
//! menu and releases the context on every exit path.

pub mod error;
pub mod fetcher;
pub mod resolver;
pub mod service;
pub mod types;
pub mod upstream;

#[cfg(test)]
mod testing;

pub use {
    error::MenuError,
    service::MenuService,
    types::{Category, Filter, MenuItem, MenuResponse, Nutrient, Period, PeriodSummary},
    upstream::{RetryPolicy, Upstream},
};
