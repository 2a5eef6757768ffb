//! Upstream API endpoints and the timeout/retry policy for calling them.

use std::time::Duration;

use {
    dinehall_browser::{BrowsingContext, FetchedResponse},
    serde::de::DeserializeOwned,
    tracing::{debug, warn},
    url::Url,
};

use crate::error::MenuError;

/// Longest delay between two attempts, whatever the backoff says.
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Whole milliseconds in `d` for log fields, saturating at `u64::MAX`.
pub(crate) fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Bounded exponential backoff for transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub retries: u32,
    /// Delay before the first retry; doubled for each further one.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub const NONE: Self = Self {
        retries: 0,
        backoff: Duration::ZERO,
    };

    /// Delay before retry number `retry` (1-based).
    pub fn delay(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.backoff.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

/// The dining-service API: where it lives and how to call it.
#[derive(Debug, Clone)]
pub struct Upstream {
    base: Url,
    location_id: String,
    request_timeout: Duration,
    retry: RetryPolicy,
}

impl Upstream {
    /// Build from config. The location id has no default and must be set.
    pub fn from_config(cfg: &dinehall_config::UpstreamConfig) -> anyhow::Result<Self> {
        let location_id = cfg.location_id.trim();
        if location_id.is_empty() {
            anyhow::bail!(
                "upstream.location_id is not configured (set it in dinehall.toml or DINEHALL_LOCATION_ID)"
            );
        }
        let base = Url::parse(&format!("{}://{}/", cfg.scheme, cfg.host.trim()))
            .map_err(|e| anyhow::anyhow!("invalid upstream {}://{}: {e}", cfg.scheme, cfg.host))?;
        if base.host_str().is_none() {
            anyhow::bail!("upstream URL has no host: {base}");
        }

        Ok(Self {
            base,
            location_id: location_id.to_string(),
            request_timeout: Duration::from_millis(cfg.request_timeout_ms),
            retry: RetryPolicy {
                retries: cfg.retries,
                backoff: Duration::from_millis(cfg.retry_backoff_ms),
            },
        })
    }

    /// Override the per-call timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Override the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The single host the browsing context may talk to.
    pub fn host(&self) -> &str {
        self.base.host_str().unwrap_or_default()
    }

    pub fn location_id(&self) -> &str {
        &self.location_id
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// `/locations/{location}/periods/?date={date}`
    pub fn periods_url(&self, date: &str) -> Result<Url, MenuError> {
        let mut url = self.endpoint(&["periods", ""])?;
        url.query_pairs_mut().append_pair("date", date);
        Ok(url)
    }

    /// `/locations/{location}/menu?date={date}&period={period}`
    pub fn menu_url(&self, date: &str, period_id: &str) -> Result<Url, MenuError> {
        let mut url = self.endpoint(&["menu"])?;
        url.query_pairs_mut()
            .append_pair("date", date)
            .append_pair("period", period_id);
        Ok(url)
    }

    fn endpoint(&self, tail: &[&str]) -> Result<Url, MenuError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| MenuError::InvalidRequest(format!("{} cannot carry a path", self.base)))?
            .clear()
            .push("locations")
            .push(&self.location_id)
            .extend(tail);
        Ok(url)
    }

    /// GET `url` through `ctx` and decode the JSON body.
    ///
    /// Each attempt is bounded by the request timeout. Transport failures are
    /// retried per the retry policy; a body that fails to decode is not.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        ctx: &dyn BrowsingContext,
        url: &Url,
    ) -> Result<T, MenuError> {
        let mut retry = 0;
        let response = loop {
            match self.fetch_once(ctx, url).await {
                Ok(response) => break response,
                Err(e) if e.is_retryable() && retry < self.retry.retries => {
                    retry += 1;
                    let delay = self.retry.delay(retry);
                    warn!(
                        url = %url,
                        retry,
                        delay_ms = millis(delay),
                        error = %e,
                        "upstream request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                },
                Err(e) => return Err(e),
            }
        };

        serde_json::from_str(&response.body).map_err(|e| {
            MenuError::MalformedResponse(format!("{}: {e}", url.path()))
        })
    }

    async fn fetch_once(
        &self,
        ctx: &dyn BrowsingContext,
        url: &Url,
    ) -> Result<FetchedResponse, MenuError> {
        debug!(url = %url, "upstream request");
        let response = tokio::time::timeout(self.request_timeout, ctx.fetch(url.as_str()))
            .await
            .map_err(|_| {
                MenuError::UpstreamTransport(format!(
                    "{} timed out after {}ms",
                    url.path(),
                    self.request_timeout.as_millis()
                ))
            })?
            .map_err(|e| MenuError::UpstreamTransport(format!("{}: {e}", url.path())))?;

        if !response.is_success() {
            return Err(MenuError::UpstreamTransport(format!(
                "{} returned HTTP {}",
                url.path(),
                response.status
            )));
        }
        Ok(response)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn upstream() -> Upstream {
        Upstream::from_config(&dinehall_config::UpstreamConfig {
            location_id: "5f4d".into(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn builds_periods_url() {
        assert_eq!(
            upstream().periods_url("2024-03-01").unwrap().as_str(),
            "https://apiv4.dineoncampus.com/locations/5f4d/periods/?date=2024-03-01"
        );
    }

    #[test]
    fn builds_menu_url() {
        assert_eq!(
            upstream().menu_url("2024-03-01", "77").unwrap().as_str(),
            "https://apiv4.dineoncampus.com/locations/5f4d/menu?date=2024-03-01&period=77"
        );
    }

    #[test]
    fn escapes_user_supplied_parts() {
        let url = upstream().menu_url("2024-03-01&x=1", "7 7").unwrap();
        assert_eq!(url.query(), Some("date=2024-03-01%26x%3D1&period=7+7"));
    }

    #[test]
    fn location_id_is_required() {
        let err = Upstream::from_config(&dinehall_config::UpstreamConfig::default()).unwrap_err();
        assert!(err.to_string().contains("location_id"));
    }

    #[test]
    fn host_comes_from_config() {
        let upstream = Upstream::from_config(&dinehall_config::UpstreamConfig {
            host: "API.Example.edu".into(),
            location_id: "1".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(upstream.host(), "api.example.edu");
    }

    #[test]
    fn millis_saturates() {
        assert_eq!(millis(Duration::from_millis(1500)), 1500);
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            retries: 10,
            backoff: Duration::from_millis(500),
        };
        assert_eq!(policy.delay(1), Duration::from_millis(500));
        assert_eq!(policy.delay(2), Duration::from_millis(1000));
        assert_eq!(policy.delay(3), Duration::from_millis(2000));
        assert_eq!(policy.delay(9), MAX_BACKOFF);
        assert_eq!(RetryPolicy::NONE.delay(1), Duration::ZERO);
    }
}
