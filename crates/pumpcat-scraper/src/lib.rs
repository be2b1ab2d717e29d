pub mod assets;
pub mod builder;
pub mod catalog;
pub mod chrome;
pub mod dom;
pub mod export;
pub mod grid;
pub mod navigate;
pub mod resolve;
pub mod sprite;
pub mod strategies;

pub use assets::{FetchError, SpriteSheetFetcher};
pub use builder::{build, ProductFragments};
pub use catalog::{CatalogConfig, CatalogScraper};
pub use chrome::ChromeDriver;
pub use dom::{BrowserError, ElementHandle, PageDriver, Query, QueryScope};
pub use grid::{extract_grid_products, GridContext};
pub use navigate::SelectionNavigator;
pub use resolve::{ContentPredicate, LocatorStrategy};
pub use sprite::{decode, SpriteDescriptor};

#[cfg(test)]
pub(crate) mod fakedom;
