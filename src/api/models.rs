use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::composer::Pagination;
use crate::data_models::{Coordinates, Price, PropertyStatus, PropertyType, RankedCandidate};
use crate::parser::ParsedQuery;
use crate::pricing::normalize_price;
use crate::query_engine::{FilterOverrides, SearchError, SearchOutcome};

/// `GET /search` query string. Numbers arrive as text so that malformed
/// values are reported as validation errors rather than rejections.
#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
    pub q: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// A paging value given either as a JSON number or as a string.
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(i64),
    Text(String),
}

impl NumberOrText {
    fn as_text(&self) -> String {
        match self {
            NumberOrText::Number(n) => n.to_string(),
            NumberOrText::Text(s) => s.clone(),
        }
    }
}

/// `POST /search` body.
#[derive(Debug, Deserialize, Default)]
pub struct SearchBody {
    pub q: Option<String>,
    pub page: Option<NumberOrText>,
    pub limit: Option<NumberOrText>,
    pub filters: Option<FilterOverrides>,
}

impl SearchBody {
    pub fn paging(&self) -> (Option<String>, Option<String>) {
        (
            self.page.as_ref().map(NumberOrText::as_text),
            self.limit.as_ref().map(NumberOrText::as_text),
        )
    }
}

/// Parses an optional integer parameter, reporting the parameter by name.
pub fn parse_int_param(name: &str, value: Option<&str>) -> Result<Option<i64>, SearchError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<i64>()
            .map(Some)
            .map_err(|_| SearchError::Validation(format!("'{name}' must be an integer"))),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: Price,
    pub normalized_price: f64,
    pub property_type: PropertyType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    pub status: PropertyStatus,
    pub views: i64,
    pub featured: bool,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

impl From<RankedCandidate> for PropertyView {
    fn from(candidate: RankedCandidate) -> Self {
        let property = candidate.property;
        PropertyView {
            id: property.id.to_hex(),
            normalized_price: normalize_price(&property.price),
            title: property.title,
            description: property.description,
            price: property.price,
            property_type: property.property_type,
            bedrooms: property.bedrooms,
            location_id: property.location_id.map(|id| id.to_hex()),
            coordinates: property.coordinates,
            status: property.status,
            views: property.views,
            featured: property.featured,
            created_at: property.created_at.try_to_rfc3339_string().unwrap_or_default(),
            distance_km: candidate.distance_km,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchData {
    pub parsed: ParsedQuery,
    pub properties: Vec<PropertyView>,
    pub summary: String,
    pub search_params: BTreeMap<String, String>,
    pub confidence: u8,
    pub original_query: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub data: SearchData,
    pub pagination: Pagination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<SearchOutcome> for SearchResponse {
    fn from(outcome: SearchOutcome) -> Self {
        SearchResponse {
            success: true,
            data: SearchData {
                parsed: outcome.parsed,
                properties: outcome.properties.into_iter().map(PropertyView::from).collect(),
                summary: outcome.summary,
                search_params: outcome.search_params,
                confidence: outcome.confidence,
                original_query: outcome.original_query,
            },
            pagination: outcome.pagination,
            fallback: outcome.fallback.then_some(true),
            message: outcome.message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
