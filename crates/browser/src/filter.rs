//! Allow-list filter for requests issued from inside a browsing context.

use std::fmt;

/// What to do with an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    /// Let the request reach the network unmodified.
    Continue,
    /// Fail the request before it leaves the browser.
    Abort,
}

impl fmt::Display for FilterDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continue => write!(f, "continue"),
            Self::Abort => write!(f, "abort"),
        }
    }
}

/// Permits requests to exactly one host and aborts everything else.
///
/// Sub-domains, look-alike hosts, non-HTTP schemes (`data:`, `blob:`,
/// `about:`) and unparseable URLs are all aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFilter {
    host: String,
}

impl RequestFilter {
    /// Create a filter pinned to `host`. Comparison is ASCII case-insensitive.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into().trim().to_ascii_lowercase(),
        }
    }

    /// The pinned host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns true if a request to `url` may proceed.
    pub fn allows(&self, url: &str) -> bool {
        let Ok(parsed) = url::Url::parse(url) else {
            return false;
        };
        if !matches!(parsed.scheme(), "https" | "http") {
            return false;
        }
        parsed
            .host_str()
            .is_some_and(|host| !self.host.is_empty() && host.eq_ignore_ascii_case(&self.host))
    }

    /// Decide the fate of a request to `url`.
    pub fn decide(&self, url: &str) -> FilterDecision {
        if self.allows(url) {
            FilterDecision::Continue
        } else {
            FilterDecision::Abort
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: &str = "apiv4.dineoncampus.com";

    #[test]
    fn allows_only_the_pinned_host() {
        let filter = RequestFilter::new(HOST);
        let batch = [
            ("https://apiv4.dineoncampus.com/locations/1/periods/?date=2024-03-01", true),
            ("https://apiv4.dineoncampus.com/locations/1/menu?date=2024-03-01&period=77", true),
            ("https://APIV4.DineOnCampus.com/x", true),
            ("https://apiv4.dineoncampus.com:8443/x", true),
            ("https://dineoncampus.com/", false),
            ("https://www.dineoncampus.com/app.js", false),
            ("https://cdn.apiv4.dineoncampus.com/x", false),
            ("https://apiv4.dineoncampus.com.evil.net/x", false),
            ("https://www.google-analytics.com/collect", false),
            ("https://evil.net/?next=https://apiv4.dineoncampus.com", false),
        ];

        let allowed: Vec<&str> = batch
            .iter()
            .filter(|(url, _)| filter.allows(url))
            .map(|(url, _)| *url)
            .collect();
        let expected: Vec<&str> = batch
            .iter()
            .filter(|(_, ok)| *ok)
            .map(|(url, _)| *url)
            .collect();
        assert_eq!(allowed, expected);
    }

    #[test]
    fn aborts_non_http_and_garbage() {
        let filter = RequestFilter::new(HOST);
        assert_eq!(filter.decide("about:blank"), FilterDecision::Abort);
        assert_eq!(filter.decide("data:text/html,<h1>x</h1>"), FilterDecision::Abort);
        assert_eq!(filter.decide("ws://apiv4.dineoncampus.com/socket"), FilterDecision::Abort);
        assert_eq!(filter.decide("not a url"), FilterDecision::Abort);
        assert_eq!(filter.decide(""), FilterDecision::Abort);
    }

    #[test]
    fn continue_for_upstream() {
        let filter = RequestFilter::new(" ApiV4.DineOnCampus.com ");
        assert_eq!(filter.host(), HOST);
        assert_eq!(
            filter.decide("https://apiv4.dineoncampus.com/locations/1/menu"),
            FilterDecision::Continue
        );
    }

    #[test]
    fn empty_host_allows_nothing() {
        let filter = RequestFilter::new("");
        assert!(!filter.allows("https://apiv4.dineoncampus.com/"));
    }
}
