//! Free text to structured facets.
//!
//! The parser is a fixed, ordered list of [`FacetExtractor`] rules:
//!
//! 1. bedrooms
//! 2. property type
//! 3. price range
//! 4. amenities
//! 5. location (gazetteer, then prepositions)
//!
//! Each rule consumes the span it recognized. Whatever is left is run through
//! the keyword [`TextAnalyzer`]. Parsing is pure and total: every input yields a
//! [`ParsedQuery`], possibly with no facet at all and a confidence of zero.

pub mod lexicon;
pub mod rules;

use std::ops::Range;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::analyzer::TextAnalyzer;
use crate::data_models::PropertyType;

pub use rules::{
    AmenityExtractor, BedroomExtractor, FacetExtractor, LocationExtractor, PriceExtractor,
    PropertyTypeExtractor,
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ParsedQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type: Option<PropertyType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    pub amenities: Vec<String>,
    pub keywords: Vec<String>,
    pub confidence: u8,
}

impl ParsedQuery {
    pub fn has_price_bound(&self) -> bool {
        self.min_price.is_some() || self.max_price.is_some()
    }

    /// True when anything beyond free keywords was recognized.
    pub fn has_structured_facet(&self) -> bool {
        self.bedrooms.is_some()
            || self.property_type.is_some()
            || self.location.is_some()
            || self.has_price_bound()
            || !self.amenities.is_empty()
    }
}

/// Additive confidence weights. Type and location are the strongest
/// disambiguators and also earn a bonus when they appear together.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfidenceWeights {
    pub bedrooms: u8,
    pub property_type: u8,
    pub location: u8,
    pub price: u8,
    pub amenities: u8,
    pub keywords: u8,
    pub type_and_location: u8,
}

pub const MAX_CONFIDENCE: u8 = 100;

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            bedrooms: 20,
            property_type: 25,
            location: 20,
            price: 15,
            amenities: 10,
            keywords: 10,
            type_and_location: 20,
        }
    }
}

impl ConfidenceWeights {
    pub fn score(&self, query: &ParsedQuery) -> u8 {
        let mut score = 0u32;
        if query.bedrooms.is_some() {
            score += u32::from(self.bedrooms);
        }
        if query.property_type.is_some() {
            score += u32::from(self.property_type);
        }
        if query.location.is_some() {
            score += u32::from(self.location);
        }
        if query.has_price_bound() {
            score += u32::from(self.price);
        }
        if !query.amenities.is_empty() {
            score += u32::from(self.amenities);
        }
        if query.property_type.is_some() && query.location.is_some() {
            score += u32::from(self.type_and_location);
        }
        // Unrecognized words alone are no evidence that the query was understood.
        if !query.keywords.is_empty() && query.has_structured_facet() {
            score += u32::from(self.keywords);
        }
        score.min(u32::from(MAX_CONFIDENCE)) as u8
    }
}

/// Swaps a lower bound that exceeds the upper bound.
pub fn ordered_bounds(min: Option<f64>, max: Option<f64>) -> (Option<f64>, Option<f64>) {
    match (min, max) {
        (Some(low), Some(high)) if low > high => (Some(high), Some(low)),
        bounds => bounds,
    }
}

const CONSUMED: &str = " | ";

/// The lower-cased query with recognized spans masked out.
#[derive(Debug, Clone)]
pub struct QueryText {
    working: String,
}

impl QueryText {
    pub fn new(raw: &str) -> Self {
        Self {
            working: raw.trim().to_lowercase(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.working
    }

    /// Masks a byte range of the current text. The mask is a word break, so
    /// neighbouring words never merge.
    pub fn consume(&mut self, range: Range<usize>) {
        self.working.replace_range(range, CONSUMED);
    }

    pub fn into_remaining(self) -> String {
        self.working
    }
}

pub struct QueryParser {
    extractors: Vec<Box<dyn FacetExtractor>>,
    keyword_analyzer: TextAnalyzer,
    weights: ConfidenceWeights,
}

impl QueryParser {
    pub fn new(weights: ConfidenceWeights) -> Self {
        Self {
            extractors: vec![
                Box::new(BedroomExtractor),
                Box::new(PropertyTypeExtractor),
                Box::new(PriceExtractor),
                Box::new(AmenityExtractor),
                Box::new(LocationExtractor),
            ],
            keyword_analyzer: TextAnalyzer::keywords(),
            weights,
        }
    }

    pub fn weights(&self) -> &ConfidenceWeights {
        &self.weights
    }

    pub fn parse(&self, text: &str) -> ParsedQuery {
        let mut query = QueryText::new(text);
        let mut parsed = ParsedQuery::default();

        for extractor in self.extractors.iter() {
            extractor.extract(&mut query, &mut parsed);
            tracing::trace!(rule = extractor.name(), remaining = query.as_str(), "facet rule applied");
        }

        parsed.keywords = self
            .keyword_analyzer
            .analyze(query.into_remaining())
            .into_iter()
            .map(|t| t.term)
            .collect();
        parsed.confidence = self.weights.score(&parsed);
        parsed
    }
}

impl Default for QueryParser {
    fn default() -> Self {
        Self::new(ConfidenceWeights::default())
    }
}

static DEFAULT_PARSER: Lazy<QueryParser> = Lazy::new(QueryParser::default);

/// Parses with the default weights.
pub fn parse(text: &str) -> ParsedQuery {
    DEFAULT_PARSER.parse(text)
}
