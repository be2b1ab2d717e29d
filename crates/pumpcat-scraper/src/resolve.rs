//! Selector cascade resolution.
//!
//! `resolve` tries an ordered list of [`LocatorStrategy`] entries against a
//! query scope and returns the first visible match that satisfies the
//! strategy's content predicate. A miss is `None`, not an error — callers own
//! the decision to retry, fall back, or continue. Per-strategy browser
//! failures (stale handles, protocol errors) count as misses.

use std::time::Duration;

use crate::dom::{ElementHandle, QueryScope};

/// A declarative matching rule: what we are looking for (`intent`), where to
/// look (`probe`), and what the match's text must satisfy (`predicate`).
#[derive(Debug, Clone)]
pub struct LocatorStrategy {
    /// Semantic tag, used for logging only.
    pub intent: &'static str,
    pub probe: crate::dom::Query,
    pub predicate: ContentPredicate,
}

/// Predicate on an element's rendered text, used to reject decorative matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPredicate {
    /// Accept any element.
    Any,
    /// Accept elements with non-empty trimmed text.
    NonEmptyText,
    /// Accept elements whose trimmed text has at least `n` characters.
    MinTextLen(usize),
    /// Accept elements whose text contains the given substring.
    Contains(String),
    /// Both of the above.
    MinTextLenContains(usize, String),
}

impl ContentPredicate {
    /// Returns `true` when no text needs to be read to evaluate the predicate.
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        matches!(self, ContentPredicate::Any)
    }

    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        let trimmed = text.trim();
        match self {
            ContentPredicate::Any => true,
            ContentPredicate::NonEmptyText => !trimmed.is_empty(),
            ContentPredicate::MinTextLen(n) => trimmed.chars().count() >= *n,
            ContentPredicate::Contains(s) => trimmed.contains(s.as_str()),
            ContentPredicate::MinTextLenContains(n, s) => {
                trimmed.chars().count() >= *n && trimmed.contains(s.as_str())
            }
        }
    }
}

/// Runs one strategy's probe and filters the matches to usable elements:
/// visible, enabled where required, and predicate-satisfying. A query failure
/// counts as zero matches (stale handles and protocol hiccups are misses,
/// not errors).
async fn usable_matches<S: QueryScope + ?Sized>(
    scope: &S,
    strategy: &LocatorStrategy,
    require_enabled: bool,
) -> Vec<Box<dyn ElementHandle>> {
    let matches = match scope.query(&strategy.probe).await {
        Ok(matches) => matches,
        Err(e) => {
            tracing::debug!(intent = strategy.intent, probe = %strategy.probe, error = %e, "strategy query failed");
            return Vec::new();
        }
    };

    let mut usable = Vec::new();
    for element in matches {
        if !element.is_visible().await.unwrap_or(false) {
            continue;
        }
        if require_enabled && !element.is_enabled().await.unwrap_or(false) {
            continue;
        }
        if !strategy.predicate.is_trivial() {
            let text = element.text().await.unwrap_or_default();
            if !strategy.predicate.matches(&text) {
                continue;
            }
        }
        usable.push(element);
    }
    usable
}

/// Resolves a cascade to the first visible element satisfying its strategy's
/// predicate. With `require_enabled`, disabled elements are skipped as well
/// (used for clickable intents).
///
/// Returns `None` when no strategy yields a usable match; this is a valid
/// outcome the caller must branch on. No retries happen here.
pub async fn resolve<S: QueryScope + ?Sized>(
    scope: &S,
    strategies: &[LocatorStrategy],
    require_enabled: bool,
) -> Option<Box<dyn ElementHandle>> {
    for strategy in strategies {
        if let Some(element) = usable_matches(scope, strategy, require_enabled)
            .await
            .into_iter()
            .next()
        {
            tracing::debug!(intent = strategy.intent, probe = %strategy.probe, "strategy matched");
            return Some(element);
        }
    }
    None
}

/// Resolves a cascade to every visible, predicate-satisfying match of the
/// first strategy that yields any, in document order.
pub async fn resolve_all<S: QueryScope + ?Sized>(
    scope: &S,
    strategies: &[LocatorStrategy],
) -> Vec<Box<dyn ElementHandle>> {
    for strategy in strategies {
        let usable = usable_matches(scope, strategy, false).await;
        if !usable.is_empty() {
            tracing::debug!(
                intent = strategy.intent,
                probe = %strategy.probe,
                count = usable.len(),
                "strategy matched"
            );
            return usable;
        }
    }
    Vec::new()
}

/// Like [`resolve_all`], but concatenates usable matches from *every*
/// strategy in the cascade instead of stopping at the first productive one.
/// Used for media extraction, where each probe covers a different gallery
/// widget and the caller de-duplicates by URL.
pub async fn resolve_each<S: QueryScope + ?Sized>(
    scope: &S,
    strategies: &[LocatorStrategy],
) -> Vec<Box<dyn ElementHandle>> {
    let mut all = Vec::new();
    for strategy in strategies {
        all.extend(usable_matches(scope, strategy, false).await);
    }
    all
}

/// Re-runs [`resolve`] up to `attempts` times with a fixed delay between
/// attempts, logging each miss. Handles are never reused across attempts —
/// every retry resolves from scratch.
pub async fn resolve_with_retry<S: QueryScope + ?Sized>(
    scope: &S,
    strategies: &[LocatorStrategy],
    require_enabled: bool,
    attempts: u32,
    delay: Duration,
) -> Option<Box<dyn ElementHandle>> {
    let intent = strategies.first().map_or("(empty)", |s| s.intent);
    for attempt in 1..=attempts.max(1) {
        if let Some(element) = resolve(scope, strategies, require_enabled).await {
            return Some(element);
        }
        tracing::debug!(intent, attempt, attempts, "resolve miss");
        if attempt < attempts {
            tokio::time::sleep(delay).await;
        }
    }
    None
}

/// Polls [`resolve`] until it matches or `timeout` elapses, checking every
/// `poll_interval`. The poll-with-timeout replacement for fixed sleeps.
pub async fn wait_for<S: QueryScope + ?Sized>(
    scope: &S,
    strategies: &[LocatorStrategy],
    timeout: Duration,
    poll_interval: Duration,
) -> Option<Box<dyn ElementHandle>> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Some(element) = resolve(scope, strategies, false).await {
            return Some(element);
        }
        if tokio::time::Instant::now() >= deadline {
            let intent = strategies.first().map_or("(empty)", |s| s.intent);
            tracing::debug!(intent, timeout_ms = timeout.as_millis() as u64, "wait_for timed out");
            return None;
        }
        tokio::time::sleep(poll_interval).await;
    }
}

/// Clicks a resolved element: scroll into view, native click, then script
/// click. Both mechanisms failing is a soft failure — logged, `false`
/// returned, caller continues.
pub async fn click_element(element: &dyn ElementHandle, intent: &str) -> bool {
    if let Err(e) = element.scroll_into_view().await {
        tracing::debug!(intent, error = %e, "scroll_into_view failed");
    }

    match element.click().await {
        Ok(()) => return true,
        Err(e) => {
            tracing::debug!(intent, error = %e, "native click failed, trying script click");
        }
    }

    match element.click_via_script().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(intent, error = %e, "both click mechanisms failed");
            false
        }
    }
}
