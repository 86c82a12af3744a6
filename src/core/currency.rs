//! Currency conversion.
//!
//! A static USD-based rate table. Provider totals are always stored in raw
//! USD; the active rate is applied exactly once, at aggregation time.
//! Live exchange-rate fetching is out of scope.

/// Supported display currencies and their USD conversion rates.
pub const RATES: &[(&str, f64)] = &[
    ("USD", 1.0),
    ("EUR", 0.92),
    ("GBP", 0.79),
    ("INR", 83.3),
    ("JPY", 149.5),
    ("CAD", 1.36),
    ("AUD", 1.52),
];

/// Fallback currency code.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Conversion rate from USD into `code`. Unknown codes fall back to 1.0.
#[must_use]
pub fn rate_for(code: &str) -> f64 {
    let upper = code.to_uppercase();
    RATES
        .iter()
        .find(|(c, _)| *c == upper)
        .map_or(1.0, |(_, r)| *r)
}

/// Whether `code` is a supported display currency.
#[must_use]
pub fn is_supported(code: &str) -> bool {
    let upper = code.to_uppercase();
    RATES.iter().any(|(c, _)| *c == upper)
}

/// Display symbol for a currency code.
#[must_use]
pub fn symbol_for(code: &str) -> &'static str {
    match code.to_uppercase().as_str() {
        "EUR" => "€",
        "GBP" => "£",
        "INR" => "₹",
        "JPY" => "¥",
        "CAD" => "C$",
        "AUD" => "A$",
        _ => "$",
    }
}
