//! Locator strategy tables.
//!
//! Each extraction target gets an ordered cascade of [`LocatorStrategy`]
//! entries; the resolver tries them top to bottom and returns the first
//! usable match. Keeping the cascades as data (probe + content predicate)
//! instead of nested fallback code makes them testable against a fake DOM.
//!
//! Element-scoped cascades (run against a card or row handle) use CSS probes
//! only; page-scoped cascades may use XPath.

use pumpcat_core::Country;

use crate::dom::Query;
use crate::resolve::{ContentPredicate, LocatorStrategy};

fn strategy(intent: &'static str, probe: Query, predicate: ContentPredicate) -> LocatorStrategy {
    LocatorStrategy {
        intent,
        probe,
        predicate,
    }
}

/// Product overview cards on the catalog page.
#[must_use]
pub fn product_cards() -> Vec<LocatorStrategy> {
    vec![
        strategy(
            "product-card",
            Query::xpath("//div[contains(@class, 'card cl-overview h-100 rebrush')]"),
            ContentPredicate::Any,
        ),
        strategy(
            "product-card",
            Query::css("div.card.cl-overview"),
            ContentPredicate::Any,
        ),
    ]
}

/// Product name inside a card (card-scoped).
#[must_use]
pub fn card_name() -> Vec<LocatorStrategy> {
    vec![
        strategy(
            "card-name",
            Query::css(".card-footer h3"),
            ContentPredicate::NonEmptyText,
        ),
        strategy(
            "card-name",
            Query::css("h3"),
            ContentPredicate::NonEmptyText,
        ),
    ]
}

/// Card thumbnail image (card-scoped).
#[must_use]
pub fn card_image() -> Vec<LocatorStrategy> {
    vec![strategy("card-image", Query::css("img"), ContentPredicate::Any)]
}

/// Detail-page link inside a card (card-scoped).
#[must_use]
pub fn card_link() -> Vec<LocatorStrategy> {
    vec![
        strategy(
            "card-link",
            Query::css("a.stretched-link"),
            ContentPredicate::Any,
        ),
        strategy("card-link", Query::css("a"), ContentPredicate::Any),
    ]
}

/// Carousel/gallery images on a product detail page.
#[must_use]
pub fn product_images() -> Vec<LocatorStrategy> {
    vec![
        strategy(
            "product-image",
            Query::xpath("//div[contains(@class, 'carousel')]//img"),
            ContentPredicate::Any,
        ),
        strategy(
            "product-image",
            Query::xpath("//div[contains(@class, 'gallery')]//img"),
            ContentPredicate::Any,
        ),
        strategy(
            "product-image",
            Query::xpath("//div[contains(@class, 'cl-gutters')]//img"),
            ContentPredicate::Any,
        ),
        strategy(
            "product-image",
            Query::xpath("//img[contains(@src, 'wilo')]"),
            ContentPredicate::Any,
        ),
    ]
}

/// Short description paragraphs on a product detail page.
#[must_use]
pub fn short_description() -> Vec<LocatorStrategy> {
    vec![
        strategy(
            "short-description",
            Query::xpath("//div[contains(@class, 'product-info')]//p"),
            ContentPredicate::MinTextLen(20),
        ),
        strategy(
            "short-description",
            Query::xpath("//div[contains(@class, 'description')]//p"),
            ContentPredicate::MinTextLen(20),
        ),
        strategy(
            "short-description",
            Query::xpath("//div[@class='pl-md-8']//p"),
            ContentPredicate::MinTextLen(20),
        ),
    ]
}

/// "Your advantages" bullet items on a product detail page.
#[must_use]
pub fn advantages() -> Vec<LocatorStrategy> {
    vec![
        strategy(
            "advantages",
            Query::xpath("//div[contains(@class, 'cl-your-advantages')]//ul//li"),
            ContentPredicate::NonEmptyText,
        ),
        strategy(
            "advantages",
            Query::xpath("//h3[contains(text(), 'Vorteile')]/following-sibling::div//ul//li"),
            ContentPredicate::NonEmptyText,
        ),
        strategy(
            "advantages",
            Query::xpath("//h3[contains(text(), 'advantages')]/following-sibling::div//ul//li"),
            ContentPredicate::NonEmptyText,
        ),
    ]
}

/// Longer free-text content sections on a product detail page.
#[must_use]
pub fn long_description() -> Vec<LocatorStrategy> {
    vec![
        strategy(
            "long-description",
            Query::xpath("//div[contains(@class, 'two-cols-section')]//div[contains(@class, 'text-module')]"),
            ContentPredicate::MinTextLen(50),
        ),
        strategy(
            "long-description",
            Query::xpath("//div[contains(@class, 'product-details')]"),
            ContentPredicate::MinTextLen(50),
        ),
        strategy(
            "long-description",
            Query::xpath("//div[contains(@class, 'description')]"),
            ContentPredicate::MinTextLen(50),
        ),
    ]
}

/// Result rows of the selection tool's product grid.
#[must_use]
pub fn grid_rows() -> Vec<LocatorStrategy> {
    vec![
        strategy(
            "grid-row",
            Query::xpath("//tr[contains(@class, 'jqgrow')]"),
            ContentPredicate::Any,
        ),
        strategy(
            "grid-row",
            Query::xpath("//tr[contains(@class, 'ui-widget-content')]"),
            ContentPredicate::Any,
        ),
        strategy(
            "grid-row",
            Query::xpath("//tbody//tr[@role='row']"),
            ContentPredicate::Any,
        ),
    ]
}

/// Product name inside a grid row (row-scoped).
#[must_use]
pub fn grid_row_name() -> Vec<LocatorStrategy> {
    vec![strategy(
        "grid-row-name",
        Query::css("span.common_lbl_bold"),
        ContentPredicate::MinTextLen(3),
    )]
}

/// Sprite tile inside a grid row (row-scoped): the div whose inline style
/// carries the `background-image` sprite declaration.
#[must_use]
pub fn sprite_tile() -> Vec<LocatorStrategy> {
    vec![strategy(
        "sprite-tile",
        Query::css("div[style*='background-image']"),
        ContentPredicate::Any,
    )]
}

/// Country buttons on the selection tool's entry page.
#[must_use]
pub fn country_button(country: &Country) -> Vec<LocatorStrategy> {
    vec![
        strategy(
            "country-button",
            Query::xpath(format!("//button[@value='{}']", country.display_name)),
            ContentPredicate::Any,
        ),
        strategy(
            "country-button",
            Query::xpath(format!(
                "//button[contains(.//span, '{}')]",
                country.display_name
            )),
            ContentPredicate::Any,
        ),
    ]
}

/// The localized "hydraulic pump selection" tile. The content predicate
/// rejects decorative matches that merely mention the label in passing.
#[must_use]
pub fn pump_selection_tile(country: &Country) -> Vec<LocatorStrategy> {
    vec![strategy(
        "pump-selection-tile",
        Query::xpath(format!(
            "//span[contains(text(), '{}')]/ancestor::div[contains(@class, 'tileButton')]",
            country.pump_tile_label
        )),
        ContentPredicate::MinTextLenContains(10, country.pump_tile_label.to_owned()),
    )]
}

/// Application categories in the selection tool (dropdown first, tree second).
#[must_use]
pub fn categories() -> Vec<LocatorStrategy> {
    vec![
        strategy(
            "category",
            Query::xpath("//ul[@class='rcbList']//li"),
            ContentPredicate::NonEmptyText,
        ),
        strategy(
            "category",
            Query::xpath("//ul[@class='jstree-children']//a"),
            ContentPredicate::NonEmptyText,
        ),
    ]
}
