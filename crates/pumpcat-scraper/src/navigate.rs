//! Selection-tool navigation: country selection and the pump-selection tile.

use std::time::Duration;

use pumpcat_core::Country;

use crate::dom::PageDriver;
use crate::resolve::{click_element, wait_for};
use crate::strategies;

/// How often element waits re-poll the resolver.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Drives the selection tool's entry flow over a [`PageDriver`].
pub struct SelectionNavigator<'a> {
    driver: &'a dyn PageDriver,
    /// Pause after a successful click, giving the site time to re-render.
    action_delay: Duration,
    /// Deadline for each element wait.
    wait_timeout: Duration,
}

impl<'a> SelectionNavigator<'a> {
    #[must_use]
    pub fn new(driver: &'a dyn PageDriver, action_delay: Duration, wait_timeout: Duration) -> Self {
        Self {
            driver,
            action_delay,
            wait_timeout,
        }
    }

    /// Selects a country on the entry page. Returns `false` when neither
    /// locator strategy produced a clickable button — the caller decides
    /// whether to skip the country or end the run.
    pub async fn select_country(&self, country: &Country) -> bool {
        tracing::info!(country = country.key, "selecting country");
        let cascade = strategies::country_button(country);
        let Some(button) = wait_for(
            self.driver,
            &cascade,
            self.wait_timeout,
            POLL_INTERVAL,
        )
        .await
        else {
            tracing::warn!(country = country.key, "country button not found");
            return false;
        };

        if !click_element(button.as_ref(), "country-button").await {
            return false;
        }
        tokio::time::sleep(self.action_delay).await;
        true
    }

    /// Opens the localized "hydraulic pump selection" tile.
    pub async fn open_pump_selection(&self, country: &Country) -> bool {
        tracing::info!(
            country = country.key,
            label = country.pump_tile_label,
            "opening pump selection"
        );
        let cascade = strategies::pump_selection_tile(country);
        let Some(tile) = wait_for(
            self.driver,
            &cascade,
            self.wait_timeout,
            POLL_INTERVAL,
        )
        .await
        else {
            tracing::warn!(country = country.key, "pump selection tile not found");
            return false;
        };

        if !click_element(tile.as_ref(), "pump-selection-tile").await {
            return false;
        }
        tokio::time::sleep(self.action_delay).await;
        true
    }

    /// Lists the application categories currently offered (dropdown first,
    /// tree fallback), as trimmed labels in page order.
    pub async fn list_categories(&self) -> Vec<String> {
        let cascade = strategies::categories();
        let elements = crate::resolve::resolve_all(self.driver, &cascade).await;
        let mut labels = Vec::with_capacity(elements.len());
        for element in &elements {
            if let Ok(text) = element.text().await {
                if !text.is_empty() {
                    labels.push(text);
                }
            }
        }
        tracing::info!(count = labels.len(), "categories found");
        labels
    }
}
