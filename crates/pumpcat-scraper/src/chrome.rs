//! Chromium-backed implementation of the browser capability, via chromiumoxide.

use std::path::Path;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::element::Element;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;

use crate::dom::{BrowserError, ElementHandle, PageDriver, Query, QueryScope};

const IS_VISIBLE_FN: &str = "function() { \
    const r = this.getBoundingClientRect(); \
    const s = window.getComputedStyle(this); \
    return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none'; \
}";

const IS_ENABLED_FN: &str = "function() { return !this.disabled; }";

const SCRIPT_CLICK_FN: &str = "function() { this.click(); }";

fn driver_err(e: impl std::fmt::Display) -> BrowserError {
    BrowserError::Driver(e.to_string())
}

/// A headless (or headed) Chromium session owning one page.
pub struct ChromeDriver {
    browser: Browser,
    page: Page,
}

impl ChromeDriver {
    /// Launches Chromium and opens a blank page.
    ///
    /// The CDP event handler is spawned onto the runtime and runs until the
    /// browser process exits.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::Driver`] if Chromium cannot be found, launched,
    /// or the initial page cannot be created.
    pub async fn launch(headless: bool) -> Result<Self, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage");

        if !headless {
            builder = builder.with_head();
        }

        let config = builder.build().map_err(driver_err)?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(driver_err)?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(driver_err)?;

        Ok(Self { browser, page })
    }

    /// Closes the page and shuts the browser process down.
    pub async fn close(mut self) -> Result<(), BrowserError> {
        let _ = self.page.close().await;
        self.browser.close().await.map_err(driver_err)?;
        Ok(())
    }
}

#[async_trait]
impl QueryScope for ChromeDriver {
    async fn query(&self, probe: &Query) -> Result<Vec<Box<dyn ElementHandle>>, BrowserError> {
        let elements = match probe {
            Query::Css(selector) => self.page.find_elements(selector.as_str()).await,
            Query::XPath(expression) => self.page.find_xpaths(expression.as_str()).await,
        }
        .map_err(|e| map_find_error(probe, &e))?;

        Ok(elements.into_iter().map(boxed_element).collect())
    }
}

#[async_trait]
impl PageDriver for ChromeDriver {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::Navigation {
                url: url.to_owned(),
                reason: e.to_string(),
            })?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| BrowserError::Navigation {
                url: url.to_owned(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn execute_script(&self, js: &str) -> Result<serde_json::Value, BrowserError> {
        let result = self
            .page
            .evaluate(js)
            .await
            .map_err(|e| BrowserError::Script {
                reason: e.to_string(),
            })?;
        // Scripts evaluating to `undefined` carry no convertible value.
        Ok(result.into_value().unwrap_or(serde_json::Value::Null))
    }

    async fn screenshot(&self, path: &Path) -> Result<(), BrowserError> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        self.page
            .save_screenshot(params, path)
            .await
            .map_err(driver_err)?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        let url = self.page.url().await.map_err(driver_err)?;
        Ok(url.unwrap_or_default())
    }

    async fn page_source(&self) -> Result<String, BrowserError> {
        self.page.content().await.map_err(driver_err)
    }

    async fn back(&self) -> Result<(), BrowserError> {
        // chromiumoxide exposes no history command on Page; session history
        // navigation goes through script evaluation instead.
        let _ = self
            .page
            .evaluate("history.back()")
            .await
            .map_err(|e| BrowserError::Script {
                reason: e.to_string(),
            })?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(driver_err)?;
        Ok(())
    }
}

/// One matched element on a [`ChromeDriver`] page.
pub struct ChromeElement {
    element: Element,
}

fn boxed_element(element: Element) -> Box<dyn ElementHandle> {
    Box::new(ChromeElement { element })
}

impl ChromeElement {
    /// Calls a JS function with `this` bound to the element and extracts a
    /// boolean result, defaulting to `false` for non-boolean returns.
    async fn call_bool_fn(&self, declaration: &str) -> Result<bool, BrowserError> {
        let returns = self
            .element
            .call_js_fn(declaration, false)
            .await
            .map_err(|e| BrowserError::Script {
                reason: e.to_string(),
            })?;
        Ok(returns
            .result
            .value
            .as_ref()
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false))
    }
}

#[async_trait]
impl QueryScope for ChromeElement {
    async fn query(&self, probe: &Query) -> Result<Vec<Box<dyn ElementHandle>>, BrowserError> {
        let Query::Css(selector) = probe else {
            // Element-scoped lookups go through DOM.querySelectorAll, which
            // has no XPath form in the protocol. Strategy tables keep all
            // element-scoped probes in CSS.
            return Err(BrowserError::Driver(format!(
                "element-scoped XPath probes are unsupported: {probe}"
            )));
        };
        let elements = self
            .element
            .find_elements(selector.as_str())
            .await
            .map_err(|e| map_find_error(probe, &e))?;
        Ok(elements.into_iter().map(boxed_element).collect())
    }
}

#[async_trait]
impl ElementHandle for ChromeElement {
    async fn text(&self) -> Result<String, BrowserError> {
        let text = self
            .element
            .inner_text()
            .await
            .map_err(|e| map_stale_error("inner_text", &e))?;
        Ok(text.unwrap_or_default().trim().to_owned())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, BrowserError> {
        self.element
            .attribute(name)
            .await
            .map_err(|e| map_stale_error("attribute", &e))
    }

    async fn is_visible(&self) -> Result<bool, BrowserError> {
        self.call_bool_fn(IS_VISIBLE_FN).await
    }

    async fn is_enabled(&self) -> Result<bool, BrowserError> {
        self.call_bool_fn(IS_ENABLED_FN).await
    }

    async fn scroll_into_view(&self) -> Result<(), BrowserError> {
        self.element
            .scroll_into_view()
            .await
            .map(|_| ())
            .map_err(|e| map_stale_error("scroll_into_view", &e))
    }

    async fn click(&self) -> Result<(), BrowserError> {
        self.element
            .click()
            .await
            .map(|_| ())
            .map_err(|e| BrowserError::Click {
                reason: e.to_string(),
            })
    }

    async fn click_via_script(&self) -> Result<(), BrowserError> {
        self.element
            .call_js_fn(SCRIPT_CLICK_FN, false)
            .await
            .map(|_| ())
            .map_err(|e| BrowserError::Click {
                reason: e.to_string(),
            })
    }
}

fn map_find_error(probe: &Query, e: &impl std::fmt::Display) -> BrowserError {
    let message = e.to_string();
    if message.contains("not find node") || message.contains("No node") {
        BrowserError::NotFound {
            query: probe.to_string(),
        }
    } else {
        BrowserError::Driver(message)
    }
}

fn map_stale_error(context: &str, e: &impl std::fmt::Display) -> BrowserError {
    let message = e.to_string();
    if message.contains("detached") || message.contains("No node") {
        BrowserError::Stale {
            context: context.to_owned(),
        }
    } else {
        BrowserError::Driver(message)
    }
}
