use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;

use crate::analytics::{SearchEvent, SearchEventSink, TracingSink};
use crate::catalog::{CatalogError, CatalogStore};
use crate::composer::{self, FALLBACK_MESSAGE, Pagination};
use crate::config::SearchSettings;
use crate::data_models::{Coordinates, PropertyRecord, PropertyType, RankedCandidate};
use crate::filter::PropertyFilter;
use crate::geo;
use crate::parser::{ParsedQuery, QueryParser, ordered_bounds, rules::BEDROOM_RANGE};
use crate::pricing;

pub const MAX_QUERY_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{0}")]
    Validation(String),

    #[error("catalog unavailable: {0}")]
    Catalog(#[from] CatalogError),
}

/// Structured filters supplied next to the free text. Each one overrides the
/// parsed facet of the same name.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FilterOverrides {
    pub bedrooms: Option<u32>,
    pub property_type: Option<PropertyType>,
    pub location: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub amenities: Option<Vec<String>>,
}

impl FilterOverrides {
    pub fn is_empty(&self) -> bool {
        *self == FilterOverrides::default()
    }

    fn validate(&self) -> Result<(), SearchError> {
        if let Some(bedrooms) = self.bedrooms {
            if !BEDROOM_RANGE.contains(&bedrooms) {
                return Err(SearchError::Validation(format!(
                    "bedrooms must be between {} and {}",
                    BEDROOM_RANGE.start(),
                    BEDROOM_RANGE.end()
                )));
            }
        }
        for (name, value) in [("minPrice", self.min_price), ("maxPrice", self.max_price)] {
            if value.is_some_and(|v| !v.is_finite() || v < 0.0) {
                return Err(SearchError::Validation(format!(
                    "{name} must be a non-negative number"
                )));
            }
        }
        Ok(())
    }

    /// The parsed query with these filters laid over it. Confidence is
    /// rescored.
    pub fn apply(&self, parsed: &ParsedQuery, parser: &QueryParser) -> ParsedQuery {
        let mut effective = parsed.clone();
        if let Some(bedrooms) = self.bedrooms {
            effective.bedrooms = Some(bedrooms);
        }
        if let Some(property_type) = self.property_type {
            effective.property_type = Some(property_type);
        }
        if let Some(location) = self.location.as_ref().filter(|l| !l.trim().is_empty()) {
            effective.location = Some(location.trim().to_string());
        }
        if self.min_price.is_some() {
            effective.min_price = self.min_price;
        }
        if self.max_price.is_some() {
            effective.max_price = self.max_price;
        }
        if let Some(amenities) = &self.amenities {
            effective.amenities = amenities.clone();
        }
        let (min_price, max_price) = ordered_bounds(effective.min_price, effective.max_price);
        effective.min_price = min_price;
        effective.max_price = max_price;
        effective.confidence = parser.weights().score(&effective);
        effective
    }
}

/// A validated search request.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    query: String,
    page: usize,
    limit: usize,
    filters: FilterOverrides,
}

impl SearchRequest {
    /// Validates the raw request. `page` and `limit` below one are clamped to
    /// one and `limit` to the configured maximum.
    pub fn new(
        query: Option<&str>,
        page: Option<i64>,
        limit: Option<i64>,
        filters: Option<FilterOverrides>,
        settings: &SearchSettings,
    ) -> Result<Self, SearchError> {
        let query = query.map(str::trim).unwrap_or_default();
        if query.is_empty() {
            return Err(SearchError::Validation(
                "query parameter 'q' is required".to_string(),
            ));
        }
        if query.chars().count() > MAX_QUERY_CHARS {
            return Err(SearchError::Validation(format!(
                "query must be at most {MAX_QUERY_CHARS} characters"
            )));
        }

        let filters = filters.unwrap_or_default();
        filters.validate()?;

        let page = page.unwrap_or(1).max(1) as usize;
        let limit = limit
            .map(|l| l.max(1) as usize)
            .unwrap_or(settings.default_limit)
            .min(settings.max_limit);

        Ok(Self {
            query: query.to_string(),
            page,
            limit,
            filters,
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Facets recognized in the text alone.
    pub parsed: ParsedQuery,
    /// Facets that drove execution: `parsed` with any supplied filters.
    pub effective: ParsedQuery,
    pub properties: Vec<RankedCandidate>,
    pub summary: String,
    pub search_params: BTreeMap<String, String>,
    pub confidence: u8,
    pub original_query: String,
    pub pagination: Pagination,
    pub fallback: bool,
    pub message: Option<String>,
}

/// Candidates after the structural predicate, plus the centroid to rank
/// around.
struct CatalogHits {
    candidates: Vec<PropertyRecord>,
    centroid: Option<Coordinates>,
}

pub struct SearchEngine {
    catalog: Arc<dyn CatalogStore>,
    parser: QueryParser,
    settings: SearchSettings,
    events: Arc<dyn SearchEventSink>,
}

impl SearchEngine {
    pub fn new(catalog: Arc<dyn CatalogStore>, settings: SearchSettings) -> Self {
        Self {
            catalog,
            parser: QueryParser::new(settings.weights),
            settings,
            events: Arc::new(TracingSink),
        }
    }

    pub fn with_event_sink(mut self, events: Arc<dyn SearchEventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<SearchOutcome, SearchError> {
        let start = Instant::now();
        let parsed = self.parser.parse(&request.query);
        let effective = if request.filters.is_empty() {
            parsed.clone()
        } else {
            request.filters.apply(&parsed, &self.parser)
        };

        if effective.confidence < self.settings.fallback_threshold {
            tracing::info!(
                query = %request.query,
                confidence = effective.confidence,
                threshold = self.settings.fallback_threshold,
                "low confidence, skipping catalog"
            );
            let outcome = self.fallback(request, parsed, effective);
            self.emit(&outcome);
            return Ok(outcome);
        }

        let hits = match tokio::time::timeout(
            self.settings.catalog_timeout,
            self.query_catalog(&effective),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(CatalogError::Timeout(self.settings.catalog_timeout)),
        }
        .inspect_err(|e| {
            tracing::error!(
                query = %request.query,
                parsed = ?effective,
                "catalog query failed: {:#}",
                e
            );
        })?;

        let candidate_count = hits.candidates.len();
        let priced =
            pricing::filter_by_price(hits.candidates, effective.min_price, effective.max_price);
        let ranked = geo::rank_by_distance(priced, hits.centroid);
        let (properties, pagination) = composer::paginate(ranked, request.page, request.limit);

        tracing::info!(
            query = %request.query,
            confidence = effective.confidence,
            candidates = candidate_count,
            total = pagination.total,
            returned = properties.len(),
            ranked_by_distance = hits.centroid.is_some(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "search completed"
        );

        let outcome = SearchOutcome {
            summary: composer::summarize(&effective),
            search_params: composer::search_params(&effective),
            confidence: effective.confidence,
            original_query: request.query.clone(),
            parsed,
            effective,
            properties,
            pagination,
            fallback: false,
            message: None,
        };
        self.emit(&outcome);
        Ok(outcome)
    }

    /// Location resolution and the structural predicate. Runs under the
    /// catalog timeout as one unit.
    async fn query_catalog(&self, query: &ParsedQuery) -> Result<CatalogHits, CatalogError> {
        let matched_locations = match &query.location {
            Some(location) => self.catalog.find_locations(location).await?,
            None => Vec::new(),
        };
        // First match wins; several matches only widen the location filter.
        let centroid = matched_locations.first().and_then(|l| l.coordinates);

        let filter = PropertyFilter::compile(query, &matched_locations);
        tracing::debug!(filter = ?filter, "compiled catalog filter");
        let candidates = self.catalog.find_properties(&filter).await?;

        Ok(CatalogHits {
            candidates,
            centroid,
        })
    }

    fn fallback(
        &self,
        request: &SearchRequest,
        parsed: ParsedQuery,
        effective: ParsedQuery,
    ) -> SearchOutcome {
        SearchOutcome {
            summary: composer::summarize(&effective),
            search_params: composer::search_params(&effective),
            confidence: effective.confidence,
            original_query: request.query.clone(),
            parsed,
            effective,
            properties: Vec::new(),
            pagination: Pagination::new(request.page, request.limit, 0),
            fallback: true,
            message: Some(FALLBACK_MESSAGE.to_string()),
        }
    }

    fn emit(&self, outcome: &SearchOutcome) {
        self.events.record(SearchEvent {
            original_query: outcome.original_query.clone(),
            parsed: outcome.parsed.clone(),
            confidence: outcome.confidence,
            fallback: outcome.fallback,
            total: outcome.pagination.total,
            searched_at: Utc::now(),
        });
    }
}
