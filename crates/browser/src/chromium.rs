//! Chromium backend for the session traits, driven over CDP by chromiumoxide.

use std::{sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    chromiumoxide::{
        Browser, BrowserConfig as CdpBrowserConfig, Page,
        cdp::{
            browser_protocol::{
                browser::{BrowserContextId, CloseParams},
                fetch::{
                    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams,
                    RequestPattern, RequestStage,
                },
                network::ErrorReason,
                target::{
                    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
                },
            },
            js_protocol::runtime::EvaluateParams,
        },
    },
    futures::StreamExt,
    tokio::task::JoinHandle,
    tracing::{debug, info, warn},
};

use crate::{
    detect,
    error::BrowserError,
    filter::{FilterDecision, RequestFilter},
    session::{BrowsingContext, FetchedResponse, Launcher, Session},
};

/// Flags that keep page scripts from spotting the automation and keep
/// cross-origin frames in-process.
const STEALTH_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-features=IsolateOrigins,site-per-process",
];

/// Flags needed to run inside containers and CI hosts.
const BASE_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-gpu",
    "--disable-dev-shm-usage",
    "--disable-extensions",
    "--disable-background-networking",
];

/// How to launch the browser.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub chrome_path: Option<String>,
    pub headless: bool,
    pub launch_timeout: Duration,
    pub user_agent: Option<String>,
    pub chrome_args: Vec<String>,
    pub stealth: bool,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self::from(&dinehall_config::BrowserConfig::default())
    }
}

impl From<&dinehall_config::BrowserConfig> for LaunchOptions {
    fn from(cfg: &dinehall_config::BrowserConfig) -> Self {
        Self {
            chrome_path: cfg.chrome_path.clone(),
            headless: cfg.headless,
            launch_timeout: Duration::from_millis(cfg.launch_timeout_ms),
            user_agent: cfg.user_agent.clone(),
            chrome_args: cfg.chrome_args.clone(),
            stealth: cfg.stealth,
        }
    }
}

impl LaunchOptions {
    /// Full list of extra command-line arguments passed to the browser.
    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = BASE_ARGS.iter().map(|a| (*a).to_string()).collect();
        if self.stealth {
            args.extend(STEALTH_ARGS.iter().map(|a| (*a).to_string()));
        }
        if let Some(ref ua) = self.user_agent {
            args.push(format!("--user-agent={ua}"));
        }
        for arg in &self.chrome_args {
            if !args.contains(arg) {
                args.push(arg.clone());
            }
        }
        args
    }
}

/// Launches a local Chrome/Chromium process.
pub struct ChromiumLauncher {
    options: LaunchOptions,
}

impl ChromiumLauncher {
    pub fn new(options: LaunchOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl Launcher for ChromiumLauncher {
    async fn launch(&self) -> Result<Arc<dyn Session>, BrowserError> {
        let detection = detect::detect_browser(self.options.chrome_path.as_deref());
        let Some(executable) = detection.path else {
            return Err(BrowserError::BrowserNotAvailable(detection.install_hint));
        };

        let mut builder = CdpBrowserConfig::builder().chrome_executable(&executable);

        // chromiumoxide runs headless unless asked otherwise
        if !self.options.headless {
            builder = builder.with_head();
        }
        for arg in self.options.args() {
            builder = builder.arg(arg);
        }

        let config = builder.build().map_err(|e| {
            BrowserError::LaunchFailed(format!("failed to build browser config: {e}"))
        })?;

        info!(
            executable = %executable.display(),
            headless = self.options.headless,
            stealth = self.options.stealth,
            "launching browser"
        );

        let (browser, mut handler) =
            tokio::time::timeout(self.options.launch_timeout, Browser::launch(config))
                .await
                .map_err(|_| {
                    BrowserError::LaunchFailed(format!(
                        "browser did not start within {}ms",
                        self.options.launch_timeout.as_millis()
                    ))
                })?
                .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        // The handler drives the CDP connection; when it ends the session is dead.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "browser handler error");
                }
            }
            debug!("browser event handler exited (connection closed)");
        });

        Ok(Arc::new(ChromiumSession {
            browser: Arc::new(browser),
            handler_task,
        }))
    }
}

/// A running Chromium process.
pub struct ChromiumSession {
    browser: Arc<Browser>,
    handler_task: JoinHandle<()>,
}

#[async_trait]
impl Session for ChromiumSession {
    fn is_alive(&self) -> bool {
        !self.handler_task.is_finished()
    }

    async fn new_context(&self) -> Result<Box<dyn BrowsingContext>, BrowserError> {
        if !self.is_alive() {
            return Err(BrowserError::BrowserClosed);
        }

        // Each request gets its own incognito-style browser context so cookies,
        // cache and storage never leak between requests.
        let context_id = self
            .browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(|e| self.context_error(e))?
            .result
            .browser_context_id;

        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id.clone())
            .build()
            .map_err(BrowserError::ContextFailed)?;

        let page = match self.browser.new_page(target).await {
            Ok(page) => page,
            Err(e) => {
                let err = self.context_error(e);
                dispose_browser_context(&self.browser, context_id).await;
                return Err(err);
            },
        };

        debug!("opened browsing context");
        Ok(Box::new(ChromiumContext {
            browser: Arc::clone(&self.browser),
            page: Some(page),
            context_id: Some(context_id),
            interceptor: None,
        }))
    }

    async fn close(&self) {
        if self.is_alive()
            && let Err(e) = self.browser.execute(CloseParams::default()).await
        {
            warn!(error = %e, "failed to close browser cleanly");
        }
        self.handler_task.abort();
    }
}

impl ChromiumSession {
    fn context_error(&self, err: chromiumoxide::error::CdpError) -> BrowserError {
        if self.is_alive() {
            BrowserError::ContextFailed(err.to_string())
        } else {
            BrowserError::BrowserClosed
        }
    }
}

/// One page inside its own browser context.
pub struct ChromiumContext {
    browser: Arc<Browser>,
    page: Option<Page>,
    context_id: Option<BrowserContextId>,
    interceptor: Option<JoinHandle<()>>,
}

impl ChromiumContext {
    fn page(&self) -> Result<&Page, BrowserError> {
        self.page
            .as_ref()
            .ok_or_else(|| BrowserError::ContextFailed("context already closed".into()))
    }
}

#[async_trait]
impl BrowsingContext for ChromiumContext {
    async fn install_filter(&mut self, filter: RequestFilter) -> Result<(), BrowserError> {
        let page = self.page()?;

        // Subscribe before enabling interception so no paused request is missed.
        let mut paused = page.event_listener::<EventRequestPaused>().await?;
        let enable = EnableParams::builder()
            .pattern(
                RequestPattern::builder()
                    .url_pattern("*")
                    .request_stage(RequestStage::Request)
                    .build(),
            )
            .build();
        page.execute(enable).await?;

        let page = page.clone();
        let host = filter.host().to_string();
        self.interceptor = Some(tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                let url = event.request.url.as_str();
                let decision = filter.decide(url);
                debug!(url, %decision, "intercepted request");
                let outcome = match decision {
                    FilterDecision::Continue => page
                        .execute(ContinueRequestParams::new(event.request_id.clone()))
                        .await
                        .map(|_| ()),
                    FilterDecision::Abort => page
                        .execute(FailRequestParams::new(
                            event.request_id.clone(),
                            ErrorReason::BlockedByClient,
                        ))
                        .await
                        .map(|_| ()),
                };
                if let Err(e) = outcome {
                    debug!(url, error = %e, "failed to resolve intercepted request");
                }
            }
        }));

        debug!(host, "request filter installed");
        Ok(())
    }

    async fn fetch(&self, url: &str) -> Result<FetchedResponse, BrowserError> {
        let page = self.page()?;
        let target = serde_json::to_string(url)
            .map_err(|e| BrowserError::Evaluation(format!("invalid url: {e}")))?;
        let script = format!(
            "(async () => {{ \
               const r = await fetch({target}, {{ credentials: 'omit', headers: {{ accept: 'application/json' }} }}); \
               return {{ status: r.status, body: await r.text() }}; \
             }})()"
        );

        let params = EvaluateParams::builder()
            .expression(script)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(BrowserError::Evaluation)?;

        let result = page.evaluate_expression(params).await?;
        result
            .into_value::<FetchedResponse>()
            .map_err(|e| BrowserError::Evaluation(format!("unexpected fetch result: {e}")))
    }

    async fn close(mut self: Box<Self>) -> Result<(), BrowserError> {
        if let Some(task) = self.interceptor.take() {
            task.abort();
        }
        let page_result = match self.page.take() {
            Some(page) => page.close().await.map_err(BrowserError::from),
            None => Ok(()),
        };
        if let Some(id) = self.context_id.take() {
            dispose_browser_context(&self.browser, id).await;
        }
        debug!("closed browsing context");
        page_result
    }
}

impl Drop for ChromiumContext {
    fn drop(&mut self) {
        if let Some(task) = self.interceptor.take() {
            task.abort();
        }
        let page = self.page.take();
        let context_id = self.context_id.take();
        if page.is_none() && context_id.is_none() {
            return;
        }

        // Dropped without `close()` (e.g. the owning request was cancelled).
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("browsing context dropped outside a runtime; page leaked until browser exit");
            return;
        };
        let browser = Arc::clone(&self.browser);
        runtime.spawn(async move {
            if let Some(page) = page {
                let _ = page.close().await;
            }
            if let Some(id) = context_id {
                dispose_browser_context(&browser, id).await;
            }
        });
    }
}

async fn dispose_browser_context(browser: &Browser, id: BrowserContextId) {
    if let Err(e) = browser.execute(DisposeBrowserContextParams::new(id)).await {
        debug!(error = %e, "failed to dispose browser context");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn stealth_args_follow_the_flag() {
        let mut options = LaunchOptions::default();
        assert!(options.stealth);
        assert!(
            options
                .args()
                .iter()
                .any(|a| a == "--disable-blink-features=AutomationControlled")
        );

        options.stealth = false;
        assert!(
            !options
                .args()
                .iter()
                .any(|a| a.starts_with("--disable-blink-features"))
        );
    }

    #[test]
    fn dispose_params_carry_the_context_id() {
        let id = BrowserContextId::new("ctx-1");
        let params = DisposeBrowserContextParams::new(id.clone());
        assert_eq!(params.browser_context_id, id);
        assert_eq!(id.inner(), "ctx-1");
    }

    #[test]
    fn user_agent_and_extra_args_are_appended_once() {
        let options = LaunchOptions {
            user_agent: Some("Mozilla/5.0 test".into()),
            chrome_args: vec!["--lang=en-US".into(), "--no-sandbox".into()],
            ..Default::default()
        };
        let args = options.args();
        assert!(args.contains(&"--user-agent=Mozilla/5.0 test".to_string()));
        assert!(args.contains(&"--lang=en-US".to_string()));
        assert_eq!(args.iter().filter(|a| *a == "--no-sandbox").count(), 1);
    }

    #[test]
    fn options_follow_config() {
        let cfg = dinehall_config::BrowserConfig {
            headless: false,
            launch_timeout_ms: 1234,
            ..Default::default()
        };
        let options = LaunchOptions::from(&cfg);
        assert!(!options.headless);
        assert_eq!(options.launch_timeout, Duration::from_millis(1234));
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn filtered_context_blocks_foreign_hosts() {
        let session = ChromiumLauncher::new(LaunchOptions::default())
            .launch()
            .await
            .expect("failed to launch browser");
        let mut ctx = session.new_context().await.expect("failed to open context");
        ctx.install_filter(RequestFilter::new("apiv4.dineoncampus.com"))
            .await
            .expect("failed to install filter");

        let blocked = ctx.fetch("https://example.com/").await;
        assert!(blocked.is_err(), "fetch to a foreign host must be aborted");

        ctx.close().await.expect("close failed");
        session.close().await;
    }
}
