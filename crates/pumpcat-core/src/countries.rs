//! Country table for the Wilo selection tool.
//!
//! The selection site localizes the "hydraulic pump selection" tile label per
//! country, so navigation needs the label alongside the country/language
//! codes used in URL parameters.

/// A supported country on the Wilo selection site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Country {
    /// Stable lookup key used in configuration, e.g. `"germany"`.
    pub key: &'static str,
    /// Display name as the site renders it, e.g. `"Deutschland"`.
    pub display_name: &'static str,
    /// ISO 3166-1 alpha-2 code.
    pub code: &'static str,
    /// Localized label of the hydraulic pump selection tile.
    pub pump_tile_label: &'static str,
    /// `(country, lang)` URL parameter pair.
    pub url_params: (&'static str, &'static str),
}

pub const COUNTRIES: &[Country] = &[
    Country {
        key: "germany",
        display_name: "Deutschland",
        code: "DE",
        pump_tile_label: "Hydraulische Pumpenauswahl",
        url_params: ("de", "de"),
    },
    Country {
        key: "austria",
        display_name: "Österreich",
        code: "AT",
        pump_tile_label: "Hydraulische Pumpenauswahl",
        url_params: ("at", "de"),
    },
    Country {
        key: "france",
        display_name: "France",
        code: "FR",
        pump_tile_label: "Sélection de pompes hydrauliques",
        url_params: ("fr", "fr"),
    },
    Country {
        key: "italy",
        display_name: "Italia",
        code: "IT",
        pump_tile_label: "Selezione pompe idrauliche",
        url_params: ("it", "it"),
    },
    Country {
        key: "spain",
        display_name: "España",
        code: "ES",
        pump_tile_label: "Selección de bombas hidráulicas",
        url_params: ("es", "es"),
    },
    Country {
        key: "netherlands",
        display_name: "Nederland",
        code: "NL",
        pump_tile_label: "Hydraulische pompselectie",
        url_params: ("nl", "nl"),
    },
    Country {
        key: "united_kingdom",
        display_name: "United Kingdom",
        code: "GB",
        pump_tile_label: "Hydraulic pump selection",
        url_params: ("gb", "en"),
    },
];

/// Looks up a country by its configuration key (case-insensitive).
#[must_use]
pub fn country_by_key(key: &str) -> Option<&'static Country> {
    COUNTRIES
        .iter()
        .find(|c| c.key.eq_ignore_ascii_case(key.trim()))
}
