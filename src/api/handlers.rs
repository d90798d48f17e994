use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use std::sync::Arc;
use std::time::Instant;

use crate::query_engine::{FilterOverrides, SearchEngine, SearchError, SearchRequest};

use super::models::{HealthResponse, SearchBody, SearchParams, SearchResponse, parse_int_param};

pub async fn search_get(
    State(engine): State<Arc<SearchEngine>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse>, SearchError> {
    let Query(params) = params?;
    run_search(
        &engine,
        params.q.as_deref(),
        params.page.as_deref(),
        params.limit.as_deref(),
        None,
    )
    .await
}

pub async fn search_post(
    State(engine): State<Arc<SearchEngine>>,
    body: Result<Json<SearchBody>, JsonRejection>,
) -> Result<Json<SearchResponse>, SearchError> {
    let Json(body) = body?;
    let (page, limit) = body.paging();
    run_search(
        &engine,
        body.q.as_deref(),
        page.as_deref(),
        limit.as_deref(),
        body.filters,
    )
    .await
}

async fn run_search(
    engine: &SearchEngine,
    q: Option<&str>,
    page: Option<&str>,
    limit: Option<&str>,
    filters: Option<FilterOverrides>,
) -> Result<Json<SearchResponse>, SearchError> {
    let start = Instant::now();

    let page = parse_int_param("page", page)?;
    let limit = parse_int_param("limit", limit)?;
    let request = SearchRequest::new(q, page, limit, filters, engine.settings())
        .inspect_err(|e| tracing::debug!("rejected search request: {}", e))?;

    let outcome = engine.search(&request).await?;

    tracing::info!(
        query = %request.query(),
        fallback = outcome.fallback,
        processing_time_ms = start.elapsed().as_millis() as u64,
        "search request served"
    );
    Ok(Json(SearchResponse::from(outcome)))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
