//! Boundary to the browser that turns a client-rendered page into HTML.

mod chromium;

use std::fmt::Debug;
use std::time::Duration;

use url::Url;

pub use chromium::{BrowserOptions, ChromiumRenderer};

/// Fully rendered document for one navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// Address after redirects.
    pub url: Url,
    pub html: String,
}

/// What the renderer waits for before it snapshots the DOM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitCondition {
    /// Element that must exist before the page counts as rendered.
    pub selector: Option<String>,
    /// Upper bound for navigation plus waiting for `selector`.
    pub timeout: Duration,
    /// Pause after the page is ready, for late client-side updates.
    pub settle: Duration,
    /// Text of a tab to click before waiting, if the portal hides jobs behind one.
    pub reveal_tab: Option<String>,
    /// Scroll to the bottom and back to trigger lazy loading.
    pub scroll: bool,
}

impl WaitCondition {
    pub fn for_selector(selector: impl Into<String>, timeout: Duration) -> Self {
        Self {
            selector: Some(selector.into()),
            timeout,
            settle: Duration::ZERO,
            reveal_tab: None,
            scroll: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("unable to start browser: {0}")]
    Launch(String),
    #[error("navigation to {url} did not finish within {timeout:?}")]
    NavigationTimeout { url: Url, timeout: Duration },
    #[error("no element matching '{selector}' appeared on {url} within {timeout:?}")]
    ContentTimeout {
        url: Url,
        selector: String,
        timeout: Duration,
    },
    #[error("browser session failed: {0}")]
    Browser(String),
}

pub trait PageRenderer: Debug {
    fn render(&self, url: &Url, wait: &WaitCondition) -> Result<RenderedPage, RenderError>;
}
