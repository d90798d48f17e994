use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::parser::ParsedQuery;

pub const FALLBACK_MESSAGE: &str = "We couldn't quite understand that search. Try adding details such as the property type, a location or a budget, e.g. \"3 bhk villa in Assagao under 3 crore\".";

const GENERIC_SUMMARY: &str = "All properties";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub pages: usize,
}

impl Pagination {
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        Self {
            page,
            limit,
            total,
            pages: total.div_ceil(limit),
        }
    }
}

/// Slices one page out of the fully filtered list. `total` counts the whole
/// list; a page past the end is empty.
pub fn paginate<T>(items: Vec<T>, page: usize, limit: usize) -> (Vec<T>, Pagination) {
    let pagination = Pagination::new(page, limit, items.len());
    let offset = (pagination.page - 1).saturating_mul(pagination.limit);
    let slice = items
        .into_iter()
        .skip(offset)
        .take(pagination.limit)
        .collect();
    (slice, pagination)
}

/// Rupee amount in lakh/crore notation, e.g. `₹2.0 Cr`, `₹50.0 L`.
pub fn format_inr(amount: f64) -> String {
    if amount >= 1e7 {
        format!("₹{:.1} Cr", amount / 1e7)
    } else if amount >= 1e5 {
        format!("₹{:.1} L", amount / 1e5)
    } else {
        format!("₹{}", amount.round() as u64)
    }
}

fn price_phrase(query: &ParsedQuery) -> Option<String> {
    match (query.min_price, query.max_price) {
        (Some(min), Some(max)) => Some(format!("{} - {}", format_inr(min), format_inr(max))),
        (None, Some(max)) => Some(format!("under {}", format_inr(max))),
        (Some(min), None) => Some(format!("above {}", format_inr(min))),
        (None, None) => None,
    }
}

/// Human readable description of the recognized facets, in the order
/// bedrooms, type, location, price: `"2 bedroom villa in Assagao, under ₹2.0 Cr"`.
pub fn summarize(query: &ParsedQuery) -> String {
    let price = price_phrase(query);
    if query.bedrooms.is_none()
        && query.property_type.is_none()
        && query.location.is_none()
        && price.is_none()
    {
        return GENERIC_SUMMARY.to_string();
    }

    let mut summary = String::new();
    if let Some(bedrooms) = query.bedrooms {
        summary.push_str(&format!("{bedrooms} bedroom "));
    }
    match query.property_type {
        Some(ty) => summary.push_str(ty.label()),
        None if summary.is_empty() => summary.push_str("Properties"),
        None => summary.push_str("properties"),
    }
    if let Some(location) = &query.location {
        summary.push_str(" in ");
        summary.push_str(location);
    }
    if let Some(price) = price {
        summary.push_str(", ");
        summary.push_str(&price);
    }
    summary
}

fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 && amount.abs() < 1e15 {
        format!("{}", amount as i64)
    } else {
        amount.to_string()
    }
}

/// The parsed facets as flat structured search parameters, for deep links
/// and analytics.
pub fn search_params(query: &ParsedQuery) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    if let Some(bedrooms) = query.bedrooms {
        params.insert("bedrooms".to_string(), bedrooms.to_string());
    }
    if let Some(ty) = query.property_type {
        params.insert("type".to_string(), ty.as_str().to_string());
    }
    if let Some(location) = &query.location {
        params.insert("location".to_string(), location.clone());
    }
    if let Some(min) = query.min_price {
        params.insert("minPrice".to_string(), format_amount(min));
    }
    if let Some(max) = query.max_price {
        params.insert("maxPrice".to_string(), format_amount(max));
    }
    if !query.amenities.is_empty() {
        params.insert("amenities".to_string(), query.amenities.join(","));
    }
    if !query.keywords.is_empty() {
        params.insert("keywords".to_string(), query.keywords.join(" "));
    }
    params
}
