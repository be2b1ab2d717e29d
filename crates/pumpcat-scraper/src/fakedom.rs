//! In-memory fake of the browser capability for tests.
//!
//! Elements and pages are mounted with explicit [`Query`] → children tables,
//! so resolver and traversal tests run against exactly the DOM shape they
//! declare, with no browser involved.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::dom::{BrowserError, ElementHandle, PageDriver, Query, QueryScope};

#[derive(Default)]
struct FakeElementInner {
    text: String,
    attributes: HashMap<String, String>,
    hidden: bool,
    disabled: bool,
    fail_native_click: bool,
    fail_script_click: bool,
    native_clicks: AtomicUsize,
    script_clicks: AtomicUsize,
    children: Mutex<HashMap<Query, Vec<FakeElement>>>,
}

/// A shared-handle fake element; clones observe the same click counters.
#[derive(Clone, Default)]
pub struct FakeElement(Arc<FakeElementInner>);

impl FakeElement {
    pub fn new(text: &str) -> Self {
        Self(Arc::new(FakeElementInner {
            text: text.to_owned(),
            ..FakeElementInner::default()
        }))
    }

    pub fn with_attr(self, name: &str, value: &str) -> Self {
        // Builder methods run before the element is shared.
        let mut inner = Arc::try_unwrap(self.0).unwrap_or_else(|_| panic!("element already shared"));
        inner.attributes.insert(name.to_owned(), value.to_owned());
        Self(Arc::new(inner))
    }

    pub fn hidden(self) -> Self {
        let mut inner = Arc::try_unwrap(self.0).unwrap_or_else(|_| panic!("element already shared"));
        inner.hidden = true;
        Self(Arc::new(inner))
    }

    pub fn disabled(self) -> Self {
        let mut inner = Arc::try_unwrap(self.0).unwrap_or_else(|_| panic!("element already shared"));
        inner.disabled = true;
        Self(Arc::new(inner))
    }

    pub fn failing_native_click(self) -> Self {
        let mut inner = Arc::try_unwrap(self.0).unwrap_or_else(|_| panic!("element already shared"));
        inner.fail_native_click = true;
        Self(Arc::new(inner))
    }

    pub fn failing_script_click(self) -> Self {
        let mut inner = Arc::try_unwrap(self.0).unwrap_or_else(|_| panic!("element already shared"));
        inner.fail_script_click = true;
        Self(Arc::new(inner))
    }

    pub fn with_children(self, probe: Query, children: Vec<FakeElement>) -> Self {
        self.0
            .children
            .lock()
            .expect("children lock")
            .insert(probe, children);
        self
    }

    pub fn native_clicks(&self) -> usize {
        self.0.native_clicks.load(Ordering::SeqCst)
    }

    pub fn script_clicks(&self) -> usize {
        self.0.script_clicks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryScope for FakeElement {
    async fn query(&self, probe: &Query) -> Result<Vec<Box<dyn ElementHandle>>, BrowserError> {
        let children = self.0.children.lock().expect("children lock");
        Ok(children
            .get(probe)
            .map(|matched| {
                matched
                    .iter()
                    .map(|e| Box::new(e.clone()) as Box<dyn ElementHandle>)
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl ElementHandle for FakeElement {
    async fn text(&self) -> Result<String, BrowserError> {
        Ok(self.0.text.trim().to_owned())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, BrowserError> {
        Ok(self.0.attributes.get(name).cloned())
    }

    async fn is_visible(&self) -> Result<bool, BrowserError> {
        Ok(!self.0.hidden)
    }

    async fn is_enabled(&self) -> Result<bool, BrowserError> {
        Ok(!self.0.disabled)
    }

    async fn scroll_into_view(&self) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn click(&self) -> Result<(), BrowserError> {
        if self.0.fail_native_click {
            return Err(BrowserError::Click {
                reason: "native click intercepted".to_owned(),
            });
        }
        self.0.native_clicks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn click_via_script(&self) -> Result<(), BrowserError> {
        if self.0.fail_script_click {
            return Err(BrowserError::Click {
                reason: "script click failed".to_owned(),
            });
        }
        self.0.script_clicks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A fake page: a mountable element table plus navigation bookkeeping.
#[derive(Default)]
pub struct FakePage {
    elements: Mutex<HashMap<Query, Vec<FakeElement>>>,
    navigations: Mutex<Vec<String>>,
    current_url: Mutex<String>,
    fail_navigations_remaining: AtomicUsize,
    back_count: AtomicUsize,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mounts elements under a probe. Later mounts replace earlier ones.
    pub fn mount(&self, probe: Query, elements: Vec<FakeElement>) {
        self.elements
            .lock()
            .expect("elements lock")
            .insert(probe, elements);
    }

    /// Makes the next `n` navigations fail.
    pub fn fail_next_navigations(&self, n: usize) {
        self.fail_navigations_remaining.store(n, Ordering::SeqCst);
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().expect("navigations lock").clone()
    }

    pub fn back_count(&self) -> usize {
        self.back_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryScope for FakePage {
    async fn query(&self, probe: &Query) -> Result<Vec<Box<dyn ElementHandle>>, BrowserError> {
        let elements = self.elements.lock().expect("elements lock");
        Ok(elements
            .get(probe)
            .map(|matched| {
                matched
                    .iter()
                    .map(|e| Box::new(e.clone()) as Box<dyn ElementHandle>)
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        let remaining = self.fail_navigations_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_navigations_remaining
                .store(remaining - 1, Ordering::SeqCst);
            return Err(BrowserError::Navigation {
                url: url.to_owned(),
                reason: "connection reset".to_owned(),
            });
        }
        self.navigations
            .lock()
            .expect("navigations lock")
            .push(url.to_owned());
        *self.current_url.lock().expect("url lock") = url.to_owned();
        Ok(())
    }

    async fn execute_script(&self, _js: &str) -> Result<serde_json::Value, BrowserError> {
        Ok(serde_json::Value::Null)
    }

    async fn screenshot(&self, _path: &Path) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        Ok(self.current_url.lock().expect("url lock").clone())
    }

    async fn page_source(&self) -> Result<String, BrowserError> {
        Ok(String::new())
    }

    async fn back(&self) -> Result<(), BrowserError> {
        self.back_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
