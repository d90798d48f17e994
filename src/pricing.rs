//! Application level price filtering.
//!
//! Prices are stored both as numbers and as locale formatted strings, so they
//! cannot be pushed into the catalog predicate. Structural filters run in the
//! catalog; price bounds run here, over the returned candidates. Once the
//! catalog stores a uniform numeric price this stage can move into the
//! predicate without changing results.

use crate::data_models::{Price, PropertyRecord};

/// Numeric value of a stored price. Text keeps only its digits and decimal
/// points; anything unparseable normalizes to `0.0`.
pub fn normalize_price(price: &Price) -> f64 {
    match price {
        Price::Amount(value) if value.is_finite() => *value,
        Price::Amount(_) => 0.0,
        Price::Text(text) => {
            let digits: String = text
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            // "Rs. 45,00,000" leaves a stray leading point behind.
            digits.trim_matches('.').parse().unwrap_or(0.0)
        }
    }
}

/// Keeps candidates inside the requested bounds. With any bound set, a
/// normalized price of zero counts as missing data and is dropped.
pub fn filter_by_price(
    candidates: Vec<PropertyRecord>,
    min_price: Option<f64>,
    max_price: Option<f64>,
) -> Vec<PropertyRecord> {
    if min_price.is_none() && max_price.is_none() {
        return candidates;
    }

    candidates
        .into_iter()
        .filter(|property| {
            let price = normalize_price(&property.price);
            if price == 0.0 {
                return false;
            }
            min_price.is_none_or(|min| price >= min) && max_price.is_none_or(|max| price <= max)
        })
        .collect()
}
