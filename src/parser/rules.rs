use std::ops::{Range, RangeInclusive};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::lexicon;
use super::{ParsedQuery, QueryText, ordered_bounds};
use crate::analyzer::is_stop_word;

pub const BEDROOM_RANGE: RangeInclusive<u32> = 1..=10;

/// One facet rule of the parser. A rule looks at the not yet consumed part of
/// the query, records what it recognized in `parsed` and consumes the span so
/// later rules and keyword extraction never see it again.
pub trait FacetExtractor: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, text: &mut QueryText, parsed: &mut ParsedQuery);
}

// =============================================================================
// Bedrooms
// =============================================================================

/// Tried in order; the first pattern with an in-range count wins.
static BEDROOM_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\b(\d{1,2})\s*-?\s*bhk\b",
        r"\b(\d{1,2})\s*-?\s*bedrooms?\b",
        r"\b(\d{1,2})\s*-?\s*beds?\b",
        r"\b(\d{1,2})\s*-?\s*br\b",
        r"\b(one|two|three|four|five|six)\s*-?\s*(?:bhk|bedrooms?|beds?|br)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid bedroom pattern"))
    .collect()
});

pub struct BedroomExtractor;

impl BedroomExtractor {
    fn count(raw: &str) -> Option<u32> {
        raw.parse::<u32>()
            .ok()
            .or_else(|| lexicon::spelled_number(raw))
    }
}

impl FacetExtractor for BedroomExtractor {
    fn name(&self) -> &'static str {
        "bedrooms"
    }

    fn extract(&self, text: &mut QueryText, parsed: &mut ParsedQuery) {
        for pattern in BEDROOM_PATTERNS.iter() {
            let hit = pattern.captures_iter(text.as_str()).find_map(|caps| {
                let whole = caps.get(0)?;
                let count = Self::count(caps.get(1)?.as_str())?;
                BEDROOM_RANGE
                    .contains(&count)
                    .then(|| (whole.range(), count))
            });
            if let Some((range, count)) = hit {
                text.consume(range);
                parsed.bedrooms = Some(count);
                return;
            }
        }
    }
}

// =============================================================================
// Property type
// =============================================================================

pub struct PropertyTypeExtractor;

impl FacetExtractor for PropertyTypeExtractor {
    fn name(&self) -> &'static str {
        "property_type"
    }

    fn extract(&self, text: &mut QueryText, parsed: &mut ParsedQuery) {
        for entry in lexicon::property_types().iter() {
            let found = entry.pattern.find(text.as_str()).map(|m| m.range());
            if let Some(range) = found {
                text.consume(range);
                parsed.property_type = Some(entry.value);
                return;
            }
        }
    }
}

// =============================================================================
// Price
// =============================================================================

const NUMBER: &str = r"(?:(?:rs\.?|inr|₹)\s*)?\b(\d+(?:,\d+)*(?:\.\d+)?)";
const UNIT: &str = r"(lakhs?|lacs?|l|crores?|crs?|thousand|k|million|mn)\b";

static BETWEEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:between|from)\s*{NUMBER}(?:\s*{UNIT})?\s*(?:and|to|-)\s*{NUMBER}(?:\s*{UNIT})?"
    ))
    .expect("valid between pattern")
});

static UPPER_BOUND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:under|below|less\s+than|max(?:imum)?|up\s*to|within|budget(?:\s+of)?)\s*{NUMBER}(?:\s*{UNIT})?"
    ))
    .expect("valid upper bound pattern")
});

static LOWER_BOUND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:above|over|more\s+than|min(?:imum)?|from|starting(?:\s+(?:at|from))?|at\s*least)\s*{NUMBER}(?:\s*{UNIT})?"
    ))
    .expect("valid lower bound pattern")
});

static BARE_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"{NUMBER}\s*{UNIT}")).expect("valid amount pattern"));

/// Numbers without a unit are only taken as rupees when they are at least this
/// large, so `"under 3"` is not read as three rupees.
const MIN_UNITLESS_AMOUNT: f64 = 1_000.0;

/// Converts a matched number and optional unit into whole rupees.
pub fn amount(number: &str, unit: Option<&str>) -> Option<f64> {
    let value: f64 = number.replace(',', "").parse().ok()?;
    let rupees = match unit {
        Some(unit) => value * lexicon::unit_multiplier(unit)?,
        None if value >= MIN_UNITLESS_AMOUNT => value,
        None => return None,
    };
    (rupees.is_finite() && rupees > 0.0).then(|| rupees.round())
}

fn single_bound(pattern: &Regex, text: &str) -> Option<(Range<usize>, f64)> {
    pattern.captures_iter(text).find_map(|caps| {
        let value = amount(caps.get(1)?.as_str(), caps.get(2).map(|m| m.as_str()))?;
        Some((caps.get(0)?.range(), value))
    })
}

fn between_bounds(caps: &Captures<'_>) -> Option<(f64, f64)> {
    let first_unit = caps.get(2).map(|m| m.as_str());
    let second_unit = caps.get(4).map(|m| m.as_str());
    // "between 50 and 80 lakh": a missing unit is shared from the other side.
    let low = amount(caps.get(1)?.as_str(), first_unit.or(second_unit))?;
    let high = amount(caps.get(3)?.as_str(), second_unit.or(first_unit))?;
    Some((low, high))
}

pub struct PriceExtractor;

impl FacetExtractor for PriceExtractor {
    fn name(&self) -> &'static str {
        "price"
    }

    fn extract(&self, text: &mut QueryText, parsed: &mut ParsedQuery) {
        let mut min_price = None;
        let mut max_price = None;

        let between = BETWEEN.captures_iter(text.as_str()).find_map(|caps| {
            let (low, high) = between_bounds(&caps)?;
            Some((caps.get(0)?.range(), low, high))
        });
        if let Some((range, low, high)) = between {
            text.consume(range);
            min_price = Some(low);
            max_price = Some(high);
        }

        if max_price.is_none() {
            if let Some((range, value)) = single_bound(&UPPER_BOUND, text.as_str()) {
                text.consume(range);
                max_price = Some(value);
            }
        }

        if min_price.is_none() {
            if let Some((range, value)) = single_bound(&LOWER_BOUND, text.as_str()) {
                text.consume(range);
                min_price = Some(value);
            }
        }

        // Last resort: "villa 2 cr" reads as a budget.
        if min_price.is_none() && max_price.is_none() {
            if let Some((range, value)) = single_bound(&BARE_AMOUNT, text.as_str()) {
                text.consume(range);
                max_price = Some(value);
            }
        }

        let (min_price, max_price) = ordered_bounds(min_price, max_price);
        parsed.min_price = min_price;
        parsed.max_price = max_price;
    }
}

// =============================================================================
// Amenities
// =============================================================================

pub struct AmenityExtractor;

impl FacetExtractor for AmenityExtractor {
    fn name(&self) -> &'static str {
        "amenities"
    }

    fn extract(&self, text: &mut QueryText, parsed: &mut ParsedQuery) {
        for entry in lexicon::amenities().iter() {
            while let Some(range) = entry.pattern.find(text.as_str()).map(|m| m.range()) {
                text.consume(range);
                if !parsed.amenities.iter().any(|a| a == entry.value) {
                    parsed.amenities.push(entry.value.to_string());
                }
            }
        }
    }
}

// =============================================================================
// Location
// =============================================================================

static PREPOSITION_PLACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:in|at|near|around|close\s+to)\s+([a-z][a-z0-9'\s-]*?)\s*(?:[|,.;!?]|$|\b(?:under|below|above|over|between|from|with|within|for|having|and|or|priced|budget|upto|up|less|more|max|min|starting)\b)",
    )
    .expect("valid preposition pattern")
});

const MIN_PLACE_CHARS: usize = 3;

/// Gazetteer lookup first, then `in|at|near|around <place>`.
pub struct LocationExtractor;

impl LocationExtractor {
    fn from_gazetteer(text: &mut QueryText) -> Option<String> {
        for entry in lexicon::places().iter() {
            if let Some(range) = entry.pattern.find(text.as_str()).map(|m| m.range()) {
                text.consume(range);
                return Some(entry.value.to_string());
            }
        }
        None
    }

    fn from_preposition(text: &mut QueryText) -> Option<String> {
        let hit = PREPOSITION_PLACE
            .captures_iter(text.as_str())
            .find_map(|caps| {
                let place = caps.get(1)?;
                let cleaned = Self::clean_place(place.as_str())?;
                Some((caps.get(0)?.start()..place.end(), cleaned))
            });
        let (range, place) = hit?;
        text.consume(range);
        Some(place)
    }

    fn clean_place(raw: &str) -> Option<String> {
        let words: Vec<&str> = raw
            .split_whitespace()
            .skip_while(|w| lexicon::PLACE_ARTICLES.contains(w))
            .collect();
        // "in good condition": a place never opens with any other stop word.
        if words.first().is_none_or(|w| is_stop_word(w)) {
            return None;
        }
        let place = words.join(" ");

        if place.chars().count() < MIN_PLACE_CHARS
            || lexicon::GENERIC_PLACE_WORDS.contains(&place.as_str())
            || words.iter().any(|w| lexicon::QUALITY_NOUNS.contains(w))
        {
            return None;
        }
        Some(title_case(&place))
    }
}

impl FacetExtractor for LocationExtractor {
    fn name(&self) -> &'static str {
        "location"
    }

    fn extract(&self, text: &mut QueryText, parsed: &mut ParsedQuery) {
        parsed.location = Self::from_gazetteer(text).or_else(|| Self::from_preposition(text));
    }
}

pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
