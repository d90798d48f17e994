use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::data_models::{LocationRecord, PropertyRecord};
use crate::filter::{PropertyFilter, baseline_order};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog did not answer within {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// The property store the search engine reads from. It owns storage and
/// indexing; the engine owns the predicate.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Properties matching `filter`, in baseline order (featured, views,
    /// newest).
    async fn find_properties(
        &self,
        filter: &PropertyFilter,
    ) -> Result<Vec<PropertyRecord>, CatalogError>;

    /// Active locations whose name or slug contains `needle`, ignoring case.
    async fn find_locations(&self, needle: &str) -> Result<Vec<LocationRecord>, CatalogError>;
}

/// A catalog held in memory, evaluating the same predicate as the MongoDB
/// store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    properties: Vec<PropertyRecord>,
    locations: Vec<LocationRecord>,
}

impl InMemoryCatalog {
    pub fn new(properties: Vec<PropertyRecord>, locations: Vec<LocationRecord>) -> Self {
        Self {
            properties,
            locations,
        }
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn find_properties(
        &self,
        filter: &PropertyFilter,
    ) -> Result<Vec<PropertyRecord>, CatalogError> {
        let mut found: Vec<PropertyRecord> = self
            .properties
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        found.sort_by(baseline_order);
        Ok(found)
    }

    async fn find_locations(&self, needle: &str) -> Result<Vec<LocationRecord>, CatalogError> {
        let needle = needle.to_lowercase();
        Ok(self
            .locations
            .iter()
            .filter(|l| {
                l.active
                    && (l.name.to_lowercase().contains(&needle)
                        || l.slug.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect())
    }
}
