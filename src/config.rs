use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::parser::ConfidenceWeights;

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv().ok(); // Load .env file if present
    Config::from_lookup(|key| env::var(key).ok())
});

pub struct Config {
    pub mongo_uri: String,
    pub mongo_db_name: String,
    pub bind_addr: String,
    pub log_level: tracing::Level,
    pub search: SearchSettings,
}

/// Tunables of the search pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    /// Queries scoring below this confidence never reach the catalog.
    pub fallback_threshold: u8,
    pub default_limit: usize,
    pub max_limit: usize,
    pub catalog_timeout: Duration,
    pub weights: ConfidenceWeights,
}

pub const DEFAULT_FALLBACK_THRESHOLD: u8 = 30;
pub const DEFAULT_PAGE_LIMIT: usize = 20;
pub const DEFAULT_MAX_PAGE_LIMIT: usize = 100;
pub const DEFAULT_CATALOG_TIMEOUT_MS: u64 = 5_000;

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            fallback_threshold: DEFAULT_FALLBACK_THRESHOLD,
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: DEFAULT_MAX_PAGE_LIMIT,
            catalog_timeout: Duration::from_millis(DEFAULT_CATALOG_TIMEOUT_MS),
            weights: ConfidenceWeights::default(),
        }
    }
}

impl Config {
    /// Builds the configuration from an arbitrary key lookup. `CONFIG` uses the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ConfidenceWeights::default();
        let weights = ConfidenceWeights {
            bedrooms: parse_or(&lookup, "SEARCH_WEIGHT_BEDROOMS", defaults.bedrooms),
            property_type: parse_or(&lookup, "SEARCH_WEIGHT_PROPERTY_TYPE", defaults.property_type),
            location: parse_or(&lookup, "SEARCH_WEIGHT_LOCATION", defaults.location),
            price: parse_or(&lookup, "SEARCH_WEIGHT_PRICE", defaults.price),
            amenities: parse_or(&lookup, "SEARCH_WEIGHT_AMENITIES", defaults.amenities),
            keywords: parse_or(&lookup, "SEARCH_WEIGHT_KEYWORDS", defaults.keywords),
            type_and_location: parse_or(
                &lookup,
                "SEARCH_WEIGHT_TYPE_AND_LOCATION",
                defaults.type_and_location,
            ),
        };

        let search = SearchSettings {
            fallback_threshold: parse_or(
                &lookup,
                "SEARCH_FALLBACK_THRESHOLD",
                DEFAULT_FALLBACK_THRESHOLD,
            ),
            default_limit: parse_or(&lookup, "SEARCH_DEFAULT_LIMIT", DEFAULT_PAGE_LIMIT).max(1),
            max_limit: parse_or(&lookup, "SEARCH_MAX_LIMIT", DEFAULT_MAX_PAGE_LIMIT).max(1),
            catalog_timeout: Duration::from_millis(parse_or(
                &lookup,
                "SEARCH_CATALOG_TIMEOUT_MS",
                DEFAULT_CATALOG_TIMEOUT_MS,
            )),
            weights,
        };

        Config {
            mongo_uri: get_or_default(&lookup, "MONGO_URI", "mongodb://localhost:27017"),
            mongo_db_name: get_or_default(&lookup, "MONGO_DB_NAME", "estate"),
            bind_addr: get_or_default(&lookup, "BIND_ADDR", "0.0.0.0:3000"),
            log_level: parse_or(&lookup, "LOG_LEVEL", tracing::Level::INFO),
            search,
        }
    }
}

fn get_or_default<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).unwrap_or_else(|| default.to_string())
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("ignoring invalid value {raw:?} for {key}, using default");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.mongo_db_name, "estate");
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.log_level, tracing::Level::INFO);
        assert_eq!(config.search, SearchSettings::default());
        assert_eq!(config.search.fallback_threshold, 30);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("MONGO_DB_NAME", "listings"),
            ("SEARCH_FALLBACK_THRESHOLD", "45"),
            ("SEARCH_WEIGHT_PRICE", "5"),
            ("SEARCH_CATALOG_TIMEOUT_MS", "250"),
            ("LOG_LEVEL", "debug"),
        ]);
        assert_eq!(config.mongo_db_name, "listings");
        assert_eq!(config.search.fallback_threshold, 45);
        assert_eq!(config.search.weights.price, 5);
        assert_eq!(config.search.weights.bedrooms, 20);
        assert_eq!(config.search.catalog_timeout, Duration::from_millis(250));
        assert_eq!(config.log_level, tracing::Level::DEBUG);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("SEARCH_FALLBACK_THRESHOLD", "lots"),
            ("SEARCH_DEFAULT_LIMIT", "0"),
        ]);
        assert_eq!(config.search.fallback_threshold, 30);
        assert_eq!(config.search.default_limit, 1);
    }
}
