use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use crate::config::CrawlSettings;
use crate::crawl;
use crate::fetch::ReviewClient;
use crate::models::StaticParams;

const ERROR_PARAMETER_LIMIT: &str = "Given parameter \"limit\" is not valid, it should be an integer";
const ERROR_MISSING_TARGET: &str = "Query parameter \"target_url\" is required";

#[derive(Clone)]
pub struct AppState {
    pub client: ReviewClient,
    pub settings: Arc<CrawlSettings>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/hitec/crawl/app-reviews/google-play/static/",
            get(static_reviews),
        )
        .route(
            "/hitec/crawl/app-reviews/google-play/:package_name/limit/:limit",
            get(feed_reviews),
        )
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn feed_reviews(
    State(state): State<AppState>,
    Path((package_name, limit)): Path<(String, String)>,
) -> Response {
    let Some(limit) = parse_limit(&limit) else {
        return detail(StatusCode::BAD_REQUEST, ERROR_PARAMETER_LIMIT);
    };

    tracing::info!(package = %package_name, limit, "crawling review feed");
    let result = crawl::crawl_feed(&state.client, &state.settings, &package_name, limit).await;
    tracing::info!(
        package = %package_name,
        reviews = result.reviews.len(),
        pages = result.pages,
        stop = ?result.stop,
        "review feed crawl finished"
    );
    (StatusCode::OK, Json(result.reviews)).into_response()
}

async fn static_reviews(
    State(state): State<AppState>,
    Query(params): Query<StaticParams>,
) -> Response {
    let Some(target_url) = params.target_url.filter(|u| !u.trim().is_empty()) else {
        return detail(StatusCode::BAD_REQUEST, ERROR_MISSING_TARGET);
    };

    tracing::info!(url = %target_url, "crawling app page");
    match crawl::crawl_static(&state.client, &state.settings, &target_url).await {
        Ok(reviews) => (StatusCode::OK, Json(reviews)).into_response(),
        Err(e) => {
            tracing::warn!(url = %target_url, error = %e, "app page crawl failed");
            detail(StatusCode::BAD_REQUEST, &e.to_string())
        }
    }
}

/// Any integer is accepted; zero or less means no limit.
fn parse_limit(raw: &str) -> Option<usize> {
    let limit = raw.trim().parse::<i64>().ok()?;
    Some(usize::try_from(limit).unwrap_or(0))
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"detail": message}))).into_response()
}
