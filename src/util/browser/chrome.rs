use std::{
    ffi::OsStr,
    path::PathBuf,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use tokio::task;

use crate::{
    config,
    declare::ExtractionError,
    util::{
        browser::{RenderingSession, SessionFactory},
        http::user_agent,
    },
};

/// How often the bounded region wait re-queries the page.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Upper bound on a browser sitting without CDP traffic before the crate
/// reaps it. Generous so slow page loads never race the reaper.
const IDLE_BROWSER_TIMEOUT: Duration = Duration::from_secs(120);

/// Launches one throwaway Chrome per session. Every launch argument comes
/// from here, nothing is inherited from ambient driver state.
pub struct ChromeSessionFactory {
    browser_path: Option<PathBuf>,
    page_load_timeout: Duration,
}

impl ChromeSessionFactory {
    pub fn new(settings: &config::Dfm) -> Self {
        let browser_path = if settings.browser_path.is_empty() {
            None
        } else {
            Some(PathBuf::from(&settings.browser_path))
        };

        ChromeSessionFactory {
            browser_path,
            page_load_timeout: Duration::from_secs(settings.page_load_timeout_secs),
        }
    }

    fn launch(
        browser_path: Option<PathBuf>,
        page_load_timeout: Duration,
    ) -> Result<ChromeSession, ExtractionError> {
        let user_agent_arg = format!("--user-agent={}", user_agent::gen_random_ua());
        let extra_args: Vec<&OsStr> = vec![
            OsStr::new("--disable-gpu"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--disable-blink-features=AutomationControlled"),
            OsStr::new(user_agent_arg.as_str()),
        ];

        let options = LaunchOptions::default_builder()
            .headless(true)
            // chrome refuses to sandbox when running as root in a container
            .sandbox(false)
            .window_size(Some((1920, 1080)))
            .path(browser_path)
            .args(extra_args)
            .idle_browser_timeout(IDLE_BROWSER_TIMEOUT)
            .build()
            .map_err(|why| ExtractionError::SessionInit(format!("{why}")))?;

        let browser = Browser::new(options)
            .map_err(|why| ExtractionError::SessionInit(format!("{why:?}")))?;
        let tab = browser
            .new_tab()
            .map_err(|why| ExtractionError::SessionInit(format!("{why:?}")))?;
        tab.set_default_timeout(page_load_timeout);

        Ok(ChromeSession {
            browser: Some(browser),
            tab: Some(tab),
        })
    }
}

#[async_trait]
impl SessionFactory for ChromeSessionFactory {
    async fn open(&self) -> Result<Box<dyn RenderingSession>, ExtractionError> {
        let browser_path = self.browser_path.clone();
        let page_load_timeout = self.page_load_timeout;

        let session = task::spawn_blocking(move || Self::launch(browser_path, page_load_timeout))
            .await
            .map_err(|why| ExtractionError::SessionInit(format!("launch task failed: {why}")))??;

        Ok(Box::new(session))
    }
}

/// One tab in one dedicated chrome process. The blocking CDP calls run on the
/// blocking thread pool; dropping the browser kills the process, which backs
/// up the explicit shutdown on abandoned sessions.
pub struct ChromeSession {
    browser: Option<Browser>,
    tab: Option<Arc<Tab>>,
}

impl ChromeSession {
    fn tab(&self) -> Result<Arc<Tab>, ExtractionError> {
        self.tab
            .clone()
            .ok_or_else(|| ExtractionError::SessionInit("session already shut down".to_string()))
    }
}

#[async_trait]
impl RenderingSession for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), ExtractionError> {
        let tab = self.tab()?;
        let target = url.to_string();

        task::spawn_blocking(move || {
            tab.navigate_to(&target)
                .map_err(|why| ExtractionError::NavigationTimeout {
                    url: target.clone(),
                    detail: format!("{why:?}"),
                })?;
            tab.wait_until_navigated()
                .map_err(|why| ExtractionError::NavigationTimeout {
                    url: target.clone(),
                    detail: format!("{why:?}"),
                })?;

            Ok(())
        })
        .await
        .map_err(|why| ExtractionError::NavigationTimeout {
            url: url.to_string(),
            detail: format!("navigation task failed: {why}"),
        })?
    }

    async fn wait_for_text(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<String, ExtractionError> {
        let tab = self.tab()?;
        let xpath = selector.to_string();

        task::spawn_blocking(move || wait_for_text_blocking(&tab, &xpath, timeout))
            .await
            .map_err(|why| ExtractionError::ElementNotFound {
                selector: selector.to_string(),
                detail: format!("wait task failed: {why}"),
            })?
    }

    async fn shutdown(&mut self) {
        let tab = self.tab.take();
        let browser = self.browser.take();

        // killing the chrome process can block, keep it off the async runtime
        let _ = task::spawn_blocking(move || {
            drop(tab);
            drop(browser);
        })
        .await;
    }
}

/// Re-queries the page on a fixed interval until the element shows up, then
/// reads its rendered text. Deterministic `ElementNotFound` at the deadline.
fn wait_for_text_blocking(
    tab: &Tab,
    xpath: &str,
    timeout: Duration,
) -> Result<String, ExtractionError> {
    let deadline = Instant::now() + timeout;
    let mut last_failure = String::new();

    loop {
        match tab.find_element_by_xpath(xpath) {
            Ok(element) => {
                return element
                    .get_inner_text()
                    .map_err(|why| ExtractionError::ElementNotFound {
                        selector: xpath.to_string(),
                        detail: format!("text read failed: {why:?}"),
                    });
            }
            Err(why) => {
                last_failure = format!("{why:?}");
            }
        }

        if Instant::now() >= deadline {
            return Err(ExtractionError::ElementNotFound {
                selector: xpath.to_string(),
                detail: last_failure,
            });
        }

        thread::sleep(POLL_INTERVAL);
    }
}
