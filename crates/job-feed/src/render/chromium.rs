use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};
use url::Url;

use super::{PageRenderer, RenderError, RenderedPage, WaitCondition};
use crate::config::SourceConfig;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36";
const POLL_INTERVAL: Duration = Duration::from_millis(250);
const TAB_GRACE_POLLS: usize = 8;

const CLICK_TAB_SCRIPT: &str = r#"(() => {
  const label = __LABEL__;
  const candidates = document.querySelectorAll('a, button, [role="tab"], li, span, div');
  for (const element of candidates) {
    const ownText = Array.from(element.childNodes)
      .filter((node) => node.nodeType === Node.TEXT_NODE)
      .map((node) => node.textContent)
      .join(' ');
    if (ownText.includes(label)) {
      element.click();
      return true;
    }
  }
  return false;
})()"#;

#[derive(Debug, Clone, Default)]
pub struct BrowserOptions {
    pub executable: Option<PathBuf>,
    pub request_timeout: Option<Duration>,
}

impl BrowserOptions {
    pub fn from_source(source: &SourceConfig) -> Self {
        Self {
            executable: source.chrome_executable.clone(),
            request_timeout: Some(source.render_timeout),
        }
    }
}

/// Headless Chromium session exposed through the synchronous [`PageRenderer`]
/// contract. The session lives from [`ChromiumRenderer::launch`] until
/// [`ChromiumRenderer::shutdown`] or drop, whichever comes first.
pub struct ChromiumRenderer {
    runtime: Runtime,
    browser: Option<Browser>,
    handler: Option<JoinHandle<()>>,
}

impl ChromiumRenderer {
    pub fn launch(options: &BrowserOptions) -> Result<Self, RenderError> {
        let runtime = Runtime::new().map_err(|err| RenderError::Launch(err.to_string()))?;

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1920, 1080)
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg(format!("--user-agent={USER_AGENT}"));
        if let Some(executable) = &options.executable {
            builder = builder.chrome_executable(executable);
        }
        if let Some(request_timeout) = options.request_timeout {
            builder = builder.request_timeout(request_timeout);
        }
        let config = builder.build().map_err(RenderError::Launch)?;

        let (browser, mut events) = runtime
            .block_on(Browser::launch(config))
            .map_err(|err| RenderError::Launch(err.to_string()))?;

        let handler = runtime.spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(err) = event {
                    debug!(error = %err, "browser event stream closed");
                    break;
                }
            }
        });

        info!("headless browser session started");
        Ok(Self {
            runtime,
            browser: Some(browser),
            handler: Some(handler),
        })
    }

    /// Closes the browser process. Dropping the renderer has the same effect.
    pub fn shutdown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if let Some(mut browser) = self.browser.take() {
            self.runtime.block_on(async {
                if let Err(err) = browser.close().await {
                    warn!(error = %err, "browser did not close cleanly");
                }
                if let Err(err) = browser.wait().await {
                    debug!(error = %err, "browser process wait failed");
                }
            });
            info!("headless browser session closed");
        }

        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }
}

impl Drop for ChromiumRenderer {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for ChromiumRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChromiumRenderer")
            .field("open", &self.browser.is_some())
            .finish_non_exhaustive()
    }
}

impl PageRenderer for ChromiumRenderer {
    fn render(&self, url: &Url, wait: &WaitCondition) -> Result<RenderedPage, RenderError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| RenderError::Browser("session already closed".to_string()))?;

        self.runtime.block_on(async {
            let deadline = Instant::now() + wait.timeout;
            debug!(%url, "navigating");

            let page = timeout(wait.timeout, browser.new_page(url.as_str()))
                .await
                .map_err(|_| RenderError::NavigationTimeout {
                    url: url.clone(),
                    timeout: wait.timeout,
                })?
                .map_err(browser_error)?;

            let rendered = snapshot(&page, url, wait, deadline).await;
            if let Err(err) = page.close().await {
                debug!(error = %err, "page did not close cleanly");
            }
            rendered
        })
    }
}

async fn snapshot(
    page: &Page,
    url: &Url,
    wait: &WaitCondition,
    deadline: Instant,
) -> Result<RenderedPage, RenderError> {
    if let Some(label) = &wait.reveal_tab {
        if reveal_tab(page, label, wait.selector.as_deref(), deadline).await {
            sleep(wait.settle).await;
        }
    }

    if let Some(selector) = &wait.selector {
        if !appears_before(page, selector, deadline).await {
            return Err(RenderError::ContentTimeout {
                url: url.clone(),
                selector: selector.clone(),
                timeout: wait.timeout,
            });
        }
    }

    if wait.scroll {
        scroll_through(page).await;
    }

    if !wait.settle.is_zero() {
        sleep(wait.settle).await;
    }

    let html = page.content().await.map_err(browser_error)?;
    let final_url = page
        .url()
        .await
        .ok()
        .flatten()
        .and_then(|raw| Url::parse(&raw).ok())
        .unwrap_or_else(|| url.clone());

    Ok(RenderedPage {
        url: final_url,
        html,
    })
}

/// DOM queries the wait policy runs against a loaded page.
trait DomProbe {
    async fn click_tab(&self, label: &str) -> bool;
    async fn has_element(&self, selector: &str) -> bool;
}

impl DomProbe for Page {
    async fn click_tab(&self, label: &str) -> bool {
        let literal = match serde_json::to_string(label) {
            Ok(literal) => literal,
            Err(err) => {
                warn!(error = %err, "tab label could not be encoded");
                return false;
            }
        };

        let script = CLICK_TAB_SCRIPT.replace("__LABEL__", &literal);
        match self.evaluate(script).await {
            Ok(result) => result.into_value::<bool>().unwrap_or(false),
            Err(err) => {
                debug!(label, error = %err, "tab click script failed");
                false
            }
        }
    }

    async fn has_element(&self, selector: &str) -> bool {
        self.find_element(selector).await.is_ok()
    }
}

/// Keeps trying to click the tab while the client app builds the page. Once
/// the listings container shows up the tab gets `TAB_GRACE_POLLS` more tries,
/// after which the page is used as rendered.
async fn reveal_tab<P: DomProbe>(
    page: &P,
    label: &str,
    listings: Option<&str>,
    deadline: Instant,
) -> bool {
    let mut polls_with_listings = 0;
    loop {
        if page.click_tab(label).await {
            info!(label, "clicked listing tab");
            return true;
        }

        if let Some(selector) = listings {
            if page.has_element(selector).await {
                polls_with_listings += 1;
                if polls_with_listings > TAB_GRACE_POLLS {
                    debug!(label, "listing tab not present");
                    return false;
                }
            }
        }

        if Instant::now() >= deadline {
            warn!(label, "listing tab did not appear in time");
            return false;
        }
        sleep(POLL_INTERVAL).await;
    }
}

async fn scroll_through(page: &Page) {
    for script in [
        "window.scrollTo(0, document.body.scrollHeight)",
        "window.scrollTo(0, 0)",
    ] {
        if let Err(err) = page.evaluate(script).await {
            debug!(error = %err, "scroll failed");
            return;
        }
        sleep(POLL_INTERVAL).await;
    }
}

async fn appears_before<P: DomProbe>(page: &P, selector: &str, deadline: Instant) -> bool {
    loop {
        if page.has_element(selector).await {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(POLL_INTERVAL).await;
    }
}

fn browser_error(err: chromiumoxide::error::CdpError) -> RenderError {
    RenderError::Browser(err.to_string())
}
