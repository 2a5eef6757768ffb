//! End-to-end menu retrieval over the shared browser session.

use std::{sync::Arc, time::Instant};

use {
    dinehall_browser::{
        BrowsingContext, ChromiumLauncher, LaunchOptions, RequestFilter, SessionManager,
    },
    tracing::{info, warn},
};

use crate::{
    error::MenuError,
    fetcher::fetch_menu,
    resolver::{list_periods, resolve_period},
    types::{MenuResponse, PeriodSummary},
    upstream::{Upstream, millis},
};

/// Menu lookups for one dining location.
///
/// Every call opens its own browsing context on the shared session, pins it to
/// the upstream host and closes it again whether the call succeeds or not.
pub struct MenuService {
    sessions: Arc<SessionManager>,
    upstream: Upstream,
}

impl MenuService {
    pub fn new(sessions: Arc<SessionManager>, upstream: Upstream) -> Self {
        Self { sessions, upstream }
    }

    /// Build a service backed by a local Chromium. The browser is not
    /// launched until the first request.
    pub fn from_config(config: &dinehall_config::DinehallConfig) -> anyhow::Result<Self> {
        let upstream = Upstream::from_config(&config.upstream)?;
        let launcher = ChromiumLauncher::new(LaunchOptions::from(&config.browser));
        Ok(Self::new(Arc::new(SessionManager::new(launcher)), upstream))
    }

    pub fn upstream(&self) -> &Upstream {
        &self.upstream
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Menu served as `meal` ("breakfast", "Lunch", ...) on `date`.
    pub async fn get_menu(&self, date: &str, meal: &str) -> Result<MenuResponse, MenuError> {
        let date = require("date", date)?;
        let meal = require("meal", meal)?;
        let start = Instant::now();

        let ctx = self.open_filtered_context().await?;
        let result = async {
            let period = resolve_period(ctx.as_ref(), &self.upstream, date, meal).await?;
            fetch_menu(ctx.as_ref(), &self.upstream, date, &period.id).await
        }
        .await;
        release(ctx).await;

        let duration_ms = millis(start.elapsed());
        match &result {
            Ok(menu) => info!(
                date,
                meal,
                period_id = %menu.period.id,
                categories = menu.period.categories.len(),
                duration_ms,
                "menu fetched"
            ),
            Err(e) => warn!(date, meal, kind = e.kind(), error = %e, duration_ms, "menu fetch failed"),
        }
        result
    }

    /// Periods served on `date`.
    pub async fn list_periods(&self, date: &str) -> Result<Vec<PeriodSummary>, MenuError> {
        let date = require("date", date)?;

        let ctx = self.open_filtered_context().await?;
        let result = list_periods(ctx.as_ref(), &self.upstream, date).await;
        release(ctx).await;

        if let Err(ref e) = result {
            warn!(date, kind = e.kind(), error = %e, "period listing failed");
        }
        result
    }

    /// Close the shared browser.
    pub async fn shutdown(&self) {
        self.sessions.shutdown().await;
    }

    async fn open_filtered_context(&self) -> Result<Box<dyn BrowsingContext>, MenuError> {
        let mut ctx = self
            .sessions
            .open_context()
            .await
            .map_err(|e| MenuError::SessionLaunch(e.to_string()))?;

        let installed = ctx
            .install_filter(RequestFilter::new(self.upstream.host()))
            .await;
        if let Err(e) = installed {
            release(ctx).await;
            return Err(MenuError::SessionLaunch(format!(
                "failed to install request filter: {e}"
            )));
        }
        Ok(ctx)
    }
}

async fn release(ctx: Box<dyn BrowsingContext>) {
    if let Err(e) = ctx.close().await {
        warn!(error = %e, "failed to close browsing context");
    }
}

fn require<'a>(field: &str, value: &'a str) -> Result<&'a str, MenuError> {
    if value.trim().is_empty() {
        return Err(MenuError::InvalidRequest(format!("{field} is required")));
    }
    Ok(value)
}
