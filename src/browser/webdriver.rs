use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thirtyfour::prelude::*;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, error};

use super::{script, Browser, BrowserError, PageContext, WaitUntil};
use crate::config::BrowserSettings;

const READY_POLL: Duration = Duration::from_millis(250);
const SELECTOR_POLL: Duration = Duration::from_millis(250);
// Extra quiet period after `readyState` turns complete, so late XHR-driven
// content has a chance to land before we start reading the DOM
const NETWORK_GRACE: Duration = Duration::from_millis(750);

/// WebDriver-backed browser; every opened page context is its own Chrome session
pub struct WebDriverBrowser {
    settings: BrowserSettings,
}

impl WebDriverBrowser {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn open(&self) -> Result<Box<dyn PageContext>, BrowserError> {
        let mut caps = DesiredCapabilities::chrome();

        // Set user agent
        caps.add_chrome_arg(&format!("--user-agent={}", self.settings.user_agent))?;

        // Set language
        let lang = self
            .settings
            .accept_language
            .split(',')
            .next()
            .unwrap_or("en-US");
        caps.add_chrome_arg(&format!("--lang={}", lang))?;

        // Set window size
        caps.add_chrome_arg(&format!(
            "--window-size={},{}",
            self.settings.window_size.0, self.settings.window_size.1
        ))?;

        // Set headless mode if configured
        if self.settings.headless {
            caps.set_headless()?;
        }

        // Keep the session from advertising itself as automated
        caps.add_chrome_arg("--disable-blink-features=AutomationControlled")?;
        caps.add_chrome_arg("--disable-dev-shm-usage")?;

        let driver = WebDriver::new(&self.settings.webdriver_url, caps).await?;
        driver
            .set_page_load_timeout(Duration::from_millis(self.settings.page_load_timeout))
            .await?;

        debug!(
            "browser session opened against {}",
            self.settings.webdriver_url
        );

        Ok(Box::new(WebDriverPage {
            driver: Mutex::new(Some(driver)),
        }))
    }
}

/// One driven browser tab
pub struct WebDriverPage {
    driver: Mutex<Option<WebDriver>>,
}

impl WebDriverPage {
    async fn ready_state(driver: &WebDriver) -> Result<String, BrowserError> {
        let ret = driver
            .execute("return document.readyState;", Vec::new())
            .await?;
        Ok(ret.json().as_str().unwrap_or_default().to_string())
    }

    async fn await_readiness(driver: &WebDriver, wait: WaitUntil) -> Result<(), BrowserError> {
        loop {
            let state = Self::ready_state(driver).await?;
            let ready = match wait {
                WaitUntil::DomContentLoaded => state == "interactive" || state == "complete",
                WaitUntil::NetworkSettled => state == "complete",
            };
            if ready {
                break;
            }
            sleep(READY_POLL).await;
        }
        if wait == WaitUntil::NetworkSettled {
            sleep(NETWORK_GRACE).await;
        }
        Ok(())
    }
}

#[async_trait]
impl PageContext for WebDriverPage {
    async fn navigate(
        &self,
        url: &str,
        wait: WaitUntil,
        limit: Duration,
    ) -> Result<(), BrowserError> {
        let guard = self.driver.lock().await;
        let driver = guard.as_ref().ok_or(BrowserError::SessionClosed)?;

        debug!("navigating to {} (wait {:?}, limit {:?})", url, wait, limit);
        let attempt = async {
            driver.goto(url).await?;
            Self::await_readiness(driver, wait).await
        };
        match timeout(limit, attempt).await {
            Ok(result) => result,
            Err(_) => Err(BrowserError::NavigationTimeout {
                url: url.to_string(),
                condition: wait,
                timeout: limit,
            }),
        }
    }

    async fn evaluate(&self, script: &str) -> Result<Value, BrowserError> {
        let guard = self.driver.lock().await;
        let driver = guard.as_ref().ok_or(BrowserError::SessionClosed)?;

        let ret = driver.execute(script, Vec::new()).await?;
        Ok(ret.json().clone())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        limit: Duration,
    ) -> Result<bool, BrowserError> {
        let probe = format!(
            "return document.querySelectorAll({}).length;",
            script::js_str(selector)
        );
        let deadline = Instant::now() + limit;
        loop {
            let found = {
                let guard = self.driver.lock().await;
                let driver = guard.as_ref().ok_or(BrowserError::SessionClosed)?;
                let ret = driver.execute(&probe, Vec::new()).await?;
                ret.json().as_u64().unwrap_or(0) > 0
            };
            if found {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            sleep(SELECTOR_POLL).await;
        }
    }

    async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        let guard = self.driver.lock().await;
        let driver = guard.as_ref().ok_or(BrowserError::SessionClosed)?;

        let element = driver.find(By::Css(selector)).await?;
        element.scroll_into_view().await?;
        element.click().await?;

        debug!("clicked {}", selector);
        Ok(())
    }

    async fn close(&self) -> Result<(), BrowserError> {
        if let Some(driver) = self.driver.lock().await.take() {
            driver.quit().await?;
            debug!("browser session closed");
        }
        Ok(())
    }
}

impl Drop for WebDriverPage {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.get_mut().take() {
            // Session was not closed explicitly; quit it out of band
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    if let Err(e) = driver.quit().await {
                        error!("error closing browser session during drop: {}", e);
                    }
                });
            }
        }
    }
}
