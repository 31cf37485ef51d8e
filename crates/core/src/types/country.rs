//! Billing countries accepted at checkout.

use serde::Serialize;

/// A selectable billing country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Country {
    /// ISO 3166-1 alpha-2 code.
    pub code: &'static str,
    /// Display name.
    pub name: &'static str,
}

const fn country(code: &'static str, name: &'static str) -> Country {
    Country { code, name }
}

/// Countries offered in the checkout form, in display order.
pub const COUNTRIES: &[Country] = &[
    country("US", "United States"),
    country("CA", "Canada"),
    country("GB", "United Kingdom"),
    country("AU", "Australia"),
    country("FR", "France"),
    country("DE", "Germany"),
    country("ES", "Spain"),
    country("IT", "Italy"),
    country("NL", "Netherlands"),
    country("SE", "Sweden"),
    country("NO", "Norway"),
    country("DK", "Denmark"),
    country("FI", "Finland"),
    country("BE", "Belgium"),
    country("CH", "Switzerland"),
    country("AT", "Austria"),
    country("IE", "Ireland"),
    country("PT", "Portugal"),
    country("NZ", "New Zealand"),
    country("JP", "Japan"),
    country("KR", "South Korea"),
    country("SG", "Singapore"),
    country("BR", "Brazil"),
    country("MX", "Mexico"),
    country("AR", "Argentina"),
    country("CL", "Chile"),
    country("IN", "India"),
    country("AE", "United Arab Emirates"),
    country("SA", "Saudi Arabia"),
    country("ZA", "South Africa"),
    country("IL", "Israel"),
    country("TR", "Turkey"),
    country("RU", "Russia"),
    country("PL", "Poland"),
    country("CZ", "Czech Republic"),
    country("HU", "Hungary"),
    country("GR", "Greece"),
    country("RO", "Romania"),
    country("BG", "Bulgaria"),
    country("HR", "Croatia"),
    country("SK", "Slovakia"),
    country("SI", "Slovenia"),
    country("LT", "Lithuania"),
    country("LV", "Latvia"),
    country("EE", "Estonia"),
    country("MT", "Malta"),
    country("CY", "Cyprus"),
    country("LU", "Luxembourg"),
    country("IS", "Iceland"),
];

/// Default selection for a fresh checkout form.
pub const DEFAULT_COUNTRY: &str = "US";

/// Look up an allowed country by its exact code.
#[must_use]
pub fn find(code: &str) -> Option<&'static Country> {
    COUNTRIES.iter().find(|c| c.code == code)
}
