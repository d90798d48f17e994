use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use estate_search::analytics::{SearchEvent, SearchEventSink};
use estate_search::catalog::{CatalogError, CatalogStore, InMemoryCatalog};
use estate_search::config::SearchSettings;
use estate_search::data_models::{
    Coordinates, LocationRecord, Price, PropertyRecord, PropertyStatus, PropertyType,
};
use estate_search::filter::PropertyFilter;
use estate_search::query_engine::{
    FilterOverrides, SearchEngine, SearchError, SearchOutcome, SearchRequest,
};

mod test_helpers {
    use super::*;

    pub fn listing(
        title: &str,
        property_type: PropertyType,
        price: impl Into<Price>,
        location: &LocationRecord,
    ) -> PropertyRecord {
        let mut record = PropertyRecord::new(title.to_string(), property_type, price.into());
        record.location_id = Some(location.id);
        record
    }

    pub fn engine(catalog: impl CatalogStore + 'static) -> SearchEngine {
        SearchEngine::new(Arc::new(catalog), SearchSettings::default())
    }

    pub fn request(q: &str) -> SearchRequest {
        SearchRequest::new(Some(q), None, None, None, &SearchSettings::default()).unwrap()
    }

    pub fn paged(q: &str, page: i64, limit: i64) -> SearchRequest {
        SearchRequest::new(
            Some(q),
            Some(page),
            Some(limit),
            None,
            &SearchSettings::default(),
        )
        .unwrap()
    }

    pub fn titles(outcome: &SearchOutcome) -> Vec<&str> {
        outcome
            .properties
            .iter()
            .map(|c| c.property.title.as_str())
            .collect()
    }

    /// Counts catalog round trips.
    #[derive(Default)]
    pub struct CountingCatalog {
        pub inner: InMemoryCatalog,
        pub calls: AtomicUsize,
    }

    #[async_trait]
    impl CatalogStore for CountingCatalog {
        async fn find_properties(
            &self,
            filter: &PropertyFilter,
        ) -> Result<Vec<PropertyRecord>, CatalogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.find_properties(filter).await
        }

        async fn find_locations(
            &self,
            needle: &str,
        ) -> Result<Vec<LocationRecord>, CatalogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.find_locations(needle).await
        }
    }

    pub struct SlowCatalog(pub Duration);

    #[async_trait]
    impl CatalogStore for SlowCatalog {
        async fn find_properties(
            &self,
            _filter: &PropertyFilter,
        ) -> Result<Vec<PropertyRecord>, CatalogError> {
            tokio::time::sleep(self.0).await;
            Ok(vec![])
        }

        async fn find_locations(
            &self,
            _needle: &str,
        ) -> Result<Vec<LocationRecord>, CatalogError> {
            tokio::time::sleep(self.0).await;
            Ok(vec![])
        }
    }

    pub struct FailingCatalog;

    #[async_trait]
    impl CatalogStore for FailingCatalog {
        async fn find_properties(
            &self,
            _filter: &PropertyFilter,
        ) -> Result<Vec<PropertyRecord>, CatalogError> {
            Err(anyhow::anyhow!("connection refused").into())
        }

        async fn find_locations(
            &self,
            _needle: &str,
        ) -> Result<Vec<LocationRecord>, CatalogError> {
            Err(anyhow::anyhow!("connection refused").into())
        }
    }

    #[derive(Default)]
    pub struct RecordingSink {
        pub events: Mutex<Vec<SearchEvent>>,
    }

    impl SearchEventSink for RecordingSink {
        fn record(&self, event: SearchEvent) {
            self.events.lock().unwrap().push(event);
        }
    }
}

use test_helpers::*;

#[cfg(test)]
mod end_to_end_tests {
    use super::*;

    #[tokio::test]
    async fn test_bedroom_villa_under_budget() {
        let assagao = LocationRecord::new("Assagao", Some(Coordinates::new(15.5926, 73.7781)));
        let panjim = LocationRecord::new("Panjim", Some(Coordinates::new(15.4909, 73.8278)));

        let mut villa = listing("Assagao villa", PropertyType::Villa, 18_000_000.0, &assagao);
        villa.bedrooms = Some(2);
        villa.coordinates = Some(Coordinates::new(15.60, 73.78));
        let mut flat = listing("Panjim flat", PropertyType::Apartment, 25_000_000.0, &panjim);
        flat.bedrooms = Some(2);

        let engine = engine(InMemoryCatalog::new(vec![villa, flat], vec![assagao, panjim]));
        let outcome = engine
            .search(&request("2bhk holiday home in Assagao under 2cr"))
            .await
            .unwrap();

        assert!(!outcome.fallback);
        assert_eq!(titles(&outcome), vec!["Assagao villa"]);
        assert_eq!(outcome.confidence, 100);
        assert!(outcome.summary.contains("2 bedroom villa in Assagao"));
        assert!(outcome.properties[0].distance_km.is_some_and(|d| d < 2.0));
        assert_eq!(outcome.search_params["type"], "VILLA");
        assert_eq!(outcome.search_params["maxPrice"], "20000000");
        assert_eq!(outcome.pagination.total, 1);
    }

    #[tokio::test]
    async fn test_unrecognized_query_falls_back() {
        let catalog = CountingCatalog::default();
        let engine = engine(catalog);
        let outcome = engine.search(&request("xyz")).await.unwrap();

        assert_eq!(outcome.confidence, 0);
        assert!(outcome.fallback);
        assert!(outcome.properties.is_empty());
        assert!(outcome.message.is_some());
        assert_eq!(outcome.pagination.total, 0);
        assert_eq!(outcome.pagination.pages, 0);
    }

    #[tokio::test]
    async fn test_price_range_in_place_outside_gazetteer() {
        let jaipur = LocationRecord::new("Jaipur", Some(Coordinates::new(26.9124, 75.7873)));
        let cheap = listing("Jaipur plot A", PropertyType::Plot, 6_000_000.0, &jaipur);
        let dear = listing("Jaipur plot B", PropertyType::Plot, 12_000_000.0, &jaipur);

        let engine = engine(InMemoryCatalog::new(vec![cheap, dear], vec![jaipur]));
        let outcome = engine
            .search(&request("plot in Jaipur between 50 lakh to 1 crore"))
            .await
            .unwrap();

        assert_eq!(titles(&outcome), vec!["Jaipur plot A"]);
        assert_eq!(outcome.effective.min_price, Some(5_000_000.0));
        assert_eq!(outcome.effective.max_price, Some(10_000_000.0));
    }
}

mod fallback_gate_tests {
    use super::*;

    #[tokio::test]
    async fn test_low_confidence_never_reaches_catalog() {
        let goa = LocationRecord::new("Goa", None);
        let catalog = Arc::new(CountingCatalog {
            inner: InMemoryCatalog::new(
                vec![listing("Goa villa", PropertyType::Villa, 1.0e7, &goa)],
                vec![goa],
            ),
            calls: AtomicUsize::new(0),
        });
        let engine = SearchEngine::new(catalog.clone(), SearchSettings::default());

        for q in ["xyz", "riverside", "3 bhk"] {
            let outcome = engine.search(&request(q)).await.unwrap();
            assert!(outcome.fallback, "query: {q}");
            assert!(outcome.properties.is_empty());
        }
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 0);

        let outcome = engine.search(&request("villa in goa")).await.unwrap();
        assert!(!outcome.fallback);
        assert!(catalog.calls.load(Ordering::SeqCst) > 0);
    }

    #[tokio::test]
    async fn test_threshold_is_configurable() {
        let settings = SearchSettings {
            fallback_threshold: 10,
            ..SearchSettings::default()
        };
        let engine = SearchEngine::new(Arc::new(InMemoryCatalog::default()), settings);
        let outcome = engine.search(&request("3 bhk")).await.unwrap();
        assert!(!outcome.fallback);
        assert!(outcome.message.is_none());
    }
}

mod pipeline_tests {
    use super::*;

    #[tokio::test]
    async fn test_unpriced_listing_excluded_when_price_bounded() {
        let goa = LocationRecord::new("Goa", None);
        let priced = listing("Priced villa", PropertyType::Villa, 15_000_000.0, &goa);
        let on_request = listing("On request villa", PropertyType::Villa, "Price on request", &goa);
        let engine = engine(InMemoryCatalog::new(vec![priced, on_request], vec![goa]));

        let bounded = engine
            .search(&request("villa in Goa under 2 crore"))
            .await
            .unwrap();
        assert_eq!(titles(&bounded), vec!["Priced villa"]);

        let unbounded = engine.search(&request("villa in Goa")).await.unwrap();
        assert_eq!(unbounded.pagination.total, 2);
    }

    #[tokio::test]
    async fn test_text_prices_are_normalized() {
        let goa = LocationRecord::new("Goa", None);
        let text = listing("Text villa", PropertyType::Villa, "₹1,80,00,000", &goa);
        let engine = engine(InMemoryCatalog::new(vec![text], vec![goa]));

        let outcome = engine
            .search(&request("villa in goa above 1 crore"))
            .await
            .unwrap();
        assert_eq!(titles(&outcome), vec!["Text villa"]);
    }

    #[tokio::test]
    async fn test_distance_ranking_with_unlocated_last() {
        let assagao = LocationRecord::new("Assagao", Some(Coordinates::new(15.5926, 73.7781)));

        let mut far = listing("far", PropertyType::Villa, 1.0e7, &assagao);
        far.coordinates = Some(Coordinates::new(15.90, 73.80));
        far.featured = true;
        let mut unlocated_popular = listing("unlocated popular", PropertyType::Villa, 1.0e7, &assagao);
        unlocated_popular.views = 50;
        let mut near = listing("near", PropertyType::Villa, 1.0e7, &assagao);
        near.coordinates = Some(Coordinates::new(15.60, 73.78));
        let mut unlocated_quiet = listing("unlocated quiet", PropertyType::Villa, 1.0e7, &assagao);
        unlocated_quiet.views = 5;
        let mut middle = listing("middle", PropertyType::Villa, 1.0e7, &assagao);
        middle.coordinates = Some(Coordinates::new(15.70, 73.78));

        let engine = engine(InMemoryCatalog::new(
            vec![unlocated_quiet, far, middle, unlocated_popular, near],
            vec![assagao],
        ));
        let outcome = engine.search(&request("villa in assagao")).await.unwrap();

        assert_eq!(titles(&outcome), vec![
            "near",
            "middle",
            "far",
            "unlocated popular",
            "unlocated quiet"
        ]);
        let distances: Vec<f64> = outcome
            .properties
            .iter()
            .filter_map(|c| c.distance_km)
            .collect();
        assert_eq!(distances.len(), 3);
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn test_unmatched_location_returns_nothing() {
        let goa = LocationRecord::new("Goa", Some(Coordinates::new(15.3, 74.0)));
        let mut plot = listing("Goa plot", PropertyType::Plot, 5.0e6, &goa);
        plot.coordinates = Some(Coordinates::new(15.3, 74.0));
        let engine = engine(InMemoryCatalog::new(vec![plot], vec![goa]));

        let outcome = engine.search(&request("plot in atlantis")).await.unwrap();
        assert_eq!(outcome.effective.location.as_deref(), Some("Atlantis"));
        assert!(!outcome.fallback);
        assert!(outcome.properties.is_empty());
        assert_eq!(outcome.pagination.total, 0);
    }

    #[tokio::test]
    async fn test_known_place_missing_from_catalog_does_not_widen() {
        let assagao = LocationRecord::new("Assagao", Some(Coordinates::new(15.5926, 73.7781)));
        let villa = listing("Assagao villa", PropertyType::Villa, 1.0e7, &assagao);
        let engine = engine(InMemoryCatalog::new(vec![villa], vec![assagao]));

        let outcome = engine
            .search(&request("villa in Mumbai under 2 crore"))
            .await
            .unwrap();
        assert_eq!(outcome.summary, "villa in Mumbai, under ₹2.0 Cr");
        assert!(titles(&outcome).is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_listings_are_hidden() {
        let goa = LocationRecord::new("Goa", None);
        let mut sold = listing("Sold villa", PropertyType::Villa, 1.0e7, &goa);
        sold.status = PropertyStatus::Sold;
        let mut inactive = listing("Inactive villa", PropertyType::Villa, 1.0e7, &goa);
        inactive.active = false;
        let open = listing("Open villa", PropertyType::Villa, 1.0e7, &goa);
        let engine = engine(InMemoryCatalog::new(vec![sold, inactive, open], vec![goa]));

        let outcome = engine.search(&request("villa in goa")).await.unwrap();
        assert_eq!(titles(&outcome), vec!["Open villa"]);
    }

    #[tokio::test]
    async fn test_pagination_total_is_independent_of_page() {
        let goa = LocationRecord::new("Goa", None);
        let villas: Vec<PropertyRecord> = (0..5)
            .map(|i| {
                let mut villa = listing(&format!("villa {i}"), PropertyType::Villa, 1.0e7, &goa);
                villa.views = 100 - i;
                villa
            })
            .collect();
        let engine = engine(InMemoryCatalog::new(villas, vec![goa]));

        let first = engine.search(&paged("villa in goa", 1, 2)).await.unwrap();
        assert_eq!(titles(&first), vec!["villa 0", "villa 1"]);
        assert_eq!(first.pagination.total, 5);
        assert_eq!(first.pagination.pages, 3);

        let last = engine.search(&paged("villa in goa", 3, 2)).await.unwrap();
        assert_eq!(titles(&last), vec!["villa 4"]);
        assert_eq!(last.pagination.total, 5);

        let beyond = engine.search(&paged("villa in goa", 4, 2)).await.unwrap();
        assert!(beyond.properties.is_empty());
        assert_eq!(beyond.pagination.total, 5);
        assert_eq!(beyond.pagination.pages, 3);
    }
}

mod override_tests {
    use super::*;

    #[tokio::test]
    async fn test_supplied_filters_override_parse() {
        let goa = LocationRecord::new("Goa", None);
        let villa = listing("Goa villa", PropertyType::Villa, 1.0e7, &goa);
        let flat = listing("Goa flat", PropertyType::Apartment, 1.0e7, &goa);
        let engine = engine(InMemoryCatalog::new(vec![villa, flat], vec![goa]));

        let filters = FilterOverrides {
            property_type: Some(PropertyType::Apartment),
            ..FilterOverrides::default()
        };
        let request = SearchRequest::new(
            Some("villa in goa"),
            None,
            None,
            Some(filters),
            engine.settings(),
        )
        .unwrap();
        let outcome = engine.search(&request).await.unwrap();

        assert_eq!(titles(&outcome), vec!["Goa flat"]);
        assert_eq!(outcome.parsed.property_type, Some(PropertyType::Villa));
        assert_eq!(outcome.effective.property_type, Some(PropertyType::Apartment));
        assert_eq!(outcome.search_params["type"], "APARTMENT");
    }

    #[tokio::test]
    async fn test_supplied_filters_lift_confidence() {
        let engine = engine(InMemoryCatalog::default());
        let filters = FilterOverrides {
            property_type: Some(PropertyType::Plot),
            location: Some("Jaipur".to_string()),
            ..FilterOverrides::default()
        };
        let request =
            SearchRequest::new(Some("xyz"), None, None, Some(filters), engine.settings()).unwrap();
        let outcome = engine.search(&request).await.unwrap();

        assert_eq!(outcome.parsed.confidence, 0);
        assert!(outcome.confidence >= 65);
        assert!(!outcome.fallback);
    }
}

mod failure_tests {
    use super::*;

    #[tokio::test]
    async fn test_catalog_failure_is_reported() {
        let engine = engine(FailingCatalog);
        let err = engine.search(&request("villa in goa")).await.unwrap_err();
        assert!(matches!(err, SearchError::Catalog(CatalogError::Backend(_))));
    }

    #[tokio::test]
    async fn test_catalog_timeout() {
        let settings = SearchSettings {
            catalog_timeout: Duration::from_millis(20),
            ..SearchSettings::default()
        };
        let engine = SearchEngine::new(Arc::new(SlowCatalog(Duration::from_secs(2))), settings);
        let err = engine.search(&request("villa in goa")).await.unwrap_err();
        assert!(matches!(err, SearchError::Catalog(CatalogError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_fallback_does_not_touch_failing_catalog() {
        let engine = engine(FailingCatalog);
        let outcome = engine.search(&request("xyz")).await.unwrap();
        assert!(outcome.fallback);
    }
}

mod analytics_tests {
    use super::*;

    #[tokio::test]
    async fn test_every_search_emits_one_event() {
        let sink = Arc::new(RecordingSink::default());
        let goa = LocationRecord::new("Goa", None);
        let engine = engine(InMemoryCatalog::new(
            vec![listing("Goa villa", PropertyType::Villa, 1.0e7, &goa)],
            vec![goa],
        ))
        .with_event_sink(sink.clone());

        engine.search(&request("villa in goa")).await.unwrap();
        engine.search(&request("xyz")).await.unwrap();

        let events = sink.events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].original_query, "villa in goa");
        assert_eq!(events[0].total, 1);
        assert!(!events[0].fallback);
        assert_eq!(events[1].confidence, 0);
        assert!(events[1].fallback);
    }

    #[tokio::test]
    async fn test_failed_search_emits_nothing() {
        let sink = Arc::new(RecordingSink::default());
        let engine = engine(FailingCatalog).with_event_sink(sink.clone());
        assert!(engine.search(&request("villa in goa")).await.is_err());
        assert!(sink.events.lock().unwrap().is_empty());
    }
}
