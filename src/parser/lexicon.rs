//! Static vocabularies of the query parser. Every table is an ordered list of
//! `(phrase, value)` pairs; [`PhraseTable`] compiles them into word-bounded
//! patterns sorted longest phrase first, so `"residential plot"` is always
//! tried before `"plot"` and matching never depends on map iteration order.

use std::cmp::Reverse;
use std::sync::OnceLock;

use regex::Regex;

use crate::data_models::PropertyType;

pub const PROPERTY_TYPE_SYNONYMS: &[(&str, PropertyType)] = &[
    ("villa", PropertyType::Villa),
    ("holiday home", PropertyType::Villa),
    ("vacation home", PropertyType::Villa),
    ("bungalow", PropertyType::Villa),
    ("independent house", PropertyType::Villa),
    ("house", PropertyType::Villa),
    ("cottage", PropertyType::Villa),
    ("farmhouse", PropertyType::Farmland),
    ("farm house", PropertyType::Farmland),
    ("farmland", PropertyType::Farmland),
    ("farm land", PropertyType::Farmland),
    ("agricultural land", PropertyType::Farmland),
    ("orchard", PropertyType::Farmland),
    ("plot", PropertyType::Plot),
    ("land", PropertyType::Plot),
    ("residential plot", PropertyType::ResidentialPlot),
    ("residential land", PropertyType::ResidentialPlot),
    ("housing plot", PropertyType::ResidentialPlot),
    ("apartment", PropertyType::Apartment),
    ("flat", PropertyType::Apartment),
    ("condo", PropertyType::Apartment),
    ("penthouse", PropertyType::Apartment),
    ("studio", PropertyType::Apartment),
];

/// Amenity phrase and the canonical amenity it stands for.
pub const AMENITY_PHRASES: &[(&str, &str)] = &[
    ("pool", "pool"),
    ("swimming pool", "pool"),
    ("private pool", "pool"),
    ("gym", "gym"),
    ("gymnasium", "gym"),
    ("parking", "parking"),
    ("garage", "parking"),
    ("garden", "garden"),
    ("lawn", "garden"),
    ("security", "security"),
    ("gated", "security"),
    ("furnished", "furnished"),
    ("clubhouse", "clubhouse"),
    ("lift", "lift"),
    ("elevator", "lift"),
    ("balcony", "balcony"),
    ("terrace", "terrace"),
    ("power backup", "power backup"),
    ("sea view", "sea view"),
    ("jacuzzi", "jacuzzi"),
    ("wifi", "wifi"),
];

/// Curated destinations the parser recognizes anywhere in the text, with the
/// display name it reports.
pub const GAZETTEER: &[(&str, &str)] = &[
    ("goa", "Goa"),
    ("north goa", "North Goa"),
    ("south goa", "South Goa"),
    ("assagao", "Assagao"),
    ("anjuna", "Anjuna"),
    ("vagator", "Vagator"),
    ("calangute", "Calangute"),
    ("candolim", "Candolim"),
    ("siolim", "Siolim"),
    ("morjim", "Morjim"),
    ("ashwem", "Ashwem"),
    ("mandrem", "Mandrem"),
    ("arambol", "Arambol"),
    ("arpora", "Arpora"),
    ("baga", "Baga"),
    ("parra", "Parra"),
    ("saligao", "Saligao"),
    ("sangolda", "Sangolda"),
    ("nerul", "Nerul"),
    ("aldona", "Aldona"),
    ("moira", "Moira"),
    ("porvorim", "Porvorim"),
    ("mapusa", "Mapusa"),
    ("panjim", "Panjim"),
    ("panaji", "Panaji"),
    ("dona paula", "Dona Paula"),
    ("margao", "Margao"),
    ("colva", "Colva"),
    ("benaulim", "Benaulim"),
    ("varca", "Varca"),
    ("cavelossim", "Cavelossim"),
    ("palolem", "Palolem"),
    ("mumbai", "Mumbai"),
    ("pune", "Pune"),
    ("bangalore", "Bangalore"),
    ("bengaluru", "Bengaluru"),
    ("delhi", "Delhi"),
    ("hyderabad", "Hyderabad"),
    ("chennai", "Chennai"),
];

/// Multipliers of the price units, in rupees.
pub const PRICE_UNITS: &[(&str, f64)] = &[
    ("lakh", 1e5),
    ("lakhs", 1e5),
    ("lac", 1e5),
    ("lacs", 1e5),
    ("l", 1e5),
    ("crore", 1e7),
    ("crores", 1e7),
    ("cr", 1e7),
    ("crs", 1e7),
    ("thousand", 1e3),
    ("k", 1e3),
    ("million", 1e6),
    ("mn", 1e6),
];

pub const SPELLED_NUMBERS: &[(&str, u32)] = &[
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
];

/// Nouns a preposition capture must not be mistaken for a place name.
pub const GENERIC_PLACE_WORDS: &[&str] = &[
    "property",
    "properties",
    "area",
    "areas",
    "city",
    "town",
    "locality",
    "location",
    "region",
    "budget",
    "price",
    "range",
    "market",
    "village",
    "beach",
];

/// Nouns describing a listing rather than a place. A capture containing one
/// is never a place ("in portuguese style").
pub const QUALITY_NOUNS: &[&str] = &[
    "condition",
    "shape",
    "style",
    "quality",
    "order",
    "state",
    "view",
    "views",
    "demand",
    "stock",
    "progress",
    "future",
];

/// Articles that may open a place name ("in the Fontainhas quarter").
pub const PLACE_ARTICLES: &[&str] = &["the", "a", "an"];

pub fn unit_multiplier(unit: &str) -> Option<f64> {
    PRICE_UNITS
        .iter()
        .find(|(name, _)| *name == unit)
        .map(|(_, multiplier)| *multiplier)
}

pub fn spelled_number(word: &str) -> Option<u32> {
    SPELLED_NUMBERS
        .iter()
        .find(|(name, _)| *name == word)
        .map(|(_, value)| *value)
}

pub struct PhraseEntry<T> {
    pub phrase: &'static str,
    pub pattern: Regex,
    pub value: T,
}

pub struct PhraseTable<T> {
    entries: Vec<PhraseEntry<T>>,
}

impl<T: Copy> PhraseTable<T> {
    pub fn build(pairs: &[(&'static str, T)], allow_plural: bool) -> Self {
        let mut entries: Vec<PhraseEntry<T>> = pairs
            .iter()
            .map(|(phrase, value)| PhraseEntry {
                phrase: *phrase,
                pattern: phrase_pattern(phrase, allow_plural),
                value: *value,
            })
            .collect();
        // Stable, so equally long phrases keep their table order.
        entries.sort_by_key(|entry| Reverse(entry.phrase.len()));
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PhraseEntry<T>> {
        self.entries.iter()
    }
}

/// Compiles a lower-case phrase into a word-bounded pattern tolerant of
/// repeated whitespace between its words.
pub fn phrase_pattern(phrase: &str, allow_plural: bool) -> Regex {
    let body = phrase
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    let plural = if allow_plural { "s?" } else { "" };
    Regex::new(&format!(r"\b{body}{plural}\b")).expect("lexicon phrases are valid patterns")
}

static PROPERTY_TYPES: OnceLock<PhraseTable<PropertyType>> = OnceLock::new();
static AMENITIES: OnceLock<PhraseTable<&'static str>> = OnceLock::new();
static PLACES: OnceLock<PhraseTable<&'static str>> = OnceLock::new();

pub fn property_types() -> &'static PhraseTable<PropertyType> {
    PROPERTY_TYPES.get_or_init(|| PhraseTable::build(PROPERTY_TYPE_SYNONYMS, true))
}

pub fn amenities() -> &'static PhraseTable<&'static str> {
    AMENITIES.get_or_init(|| PhraseTable::build(AMENITY_PHRASES, true))
}

pub fn places() -> &'static PhraseTable<&'static str> {
    PLACES.get_or_init(|| PhraseTable::build(GAZETTEER, false))
}
