use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use headless_chrome::{Browser, LaunchOptions, Tab};
use tracing::{debug, warn};

const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(30);
const MAIN_WAIT: Duration = Duration::from_secs(8);
const MAIN_FALLBACK_SLEEP: Duration = Duration::from_secs(2);
const COOKIE_WAIT: Duration = Duration::from_secs(1);
const COOKIE_SETTLE: Duration = Duration::from_secs(1);

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Consent-dialog accept buttons, tried in order; only the first visible
/// match is clicked.
const COOKIE_SELECTORS: &[&str] = &[r#"[data-testid*="accept"]"#, r#"[class*="accept"]"#];

/// One rendered-page fetcher, owned by exactly one worker for one batch.
/// Any navigation failure degrades to an empty string; the pipeline treats
/// "no text" as a soft failure, never as a fatal one.
pub trait Fetcher: Send {
    fn fetch(&mut self, url: &str) -> String;
}

/// Creates a fresh fetcher per worker. Creation is lazy (first URL of the
/// batch) so idle workers never pay browser startup.
pub trait FetcherFactory: Send + Sync + 'static {
    type Fetcher: Fetcher + 'static;

    fn create(&self) -> Result<Self::Fetcher>;
}

/// Headless-Chrome fetcher. One browser and one reused tab per instance;
/// dropping the fetcher tears the browser down.
pub struct ChromeFetcher {
    // Held to keep the browser process alive for the tab's lifetime.
    _browser: Browser,
    tab: Arc<Tab>,
}

impl ChromeFetcher {
    pub fn launch() -> Result<Self> {
        let args: Vec<&OsStr> = [
            "--disable-gpu",
            "--disable-dev-shm-usage",
            "--blink-settings=imagesEnabled=false",
            "--disable-blink-features=AutomationControlled",
        ]
        .iter()
        .map(OsStr::new)
        .collect();

        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .window_size(Some((1920, 1080)))
            .args(args)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build launch options: {e}"))?;

        let browser = Browser::new(options)?;
        let tab = browser.new_tab()?;
        tab.set_default_timeout(PAGE_LOAD_TIMEOUT);
        tab.set_user_agent(USER_AGENT, None, None)?;

        Ok(Self {
            _browser: browser,
            tab,
        })
    }

    fn try_fetch(&self, url: &str) -> Result<String> {
        self.tab.navigate_to(url)?;
        self.tab.wait_until_navigated()?;

        // Give the main landmark a chance to appear; a slow SPA is not a
        // failed fetch.
        if self
            .tab
            .wait_for_element_with_custom_timeout("main", MAIN_WAIT)
            .is_err()
        {
            std::thread::sleep(MAIN_FALLBACK_SLEEP);
        }

        self.dismiss_cookie_banner();

        Ok(self.tab.get_content()?)
    }

    /// Best-effort click on the first visible consent button. Absence of a
    /// banner is the normal case, so every failure here is swallowed.
    fn dismiss_cookie_banner(&self) {
        for selector in COOKIE_SELECTORS {
            let found = self
                .tab
                .wait_for_element_with_custom_timeout(selector, COOKIE_WAIT);
            if let Ok(button) = found {
                if button.click().is_ok() {
                    debug!(selector, "dismissed cookie banner");
                    std::thread::sleep(COOKIE_SETTLE);
                }
                return;
            }
        }
    }
}

impl Fetcher for ChromeFetcher {
    fn fetch(&mut self, url: &str) -> String {
        match self.try_fetch(url) {
            Ok(html) => html,
            Err(e) => {
                warn!(url, "fetch degraded to empty: {e}");
                String::new()
            }
        }
    }
}

pub struct ChromeFetcherFactory;

impl FetcherFactory for ChromeFetcherFactory {
    type Fetcher = ChromeFetcher;

    fn create(&self) -> Result<ChromeFetcher> {
        ChromeFetcher::launch()
    }
}
