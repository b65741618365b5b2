//! HTTP surface: one authenticated scrape endpoint

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::error;

use crate::config::Config;
use crate::error::ScrapeError;
use crate::models::ScrapingSettings;
use crate::pipeline::Scraper;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/scrape", post(scrape_handler))
        .with_state(state)
}

#[derive(Serialize)]
struct ScrapeResponse {
    status: &'static str,
    scraped_products: usize,
}

/// Runs one scraping run. The shared-secret check and settings
/// validation both happen before any collaborator is constructed, so a
/// rejected request has no side effects.
async fn scrape_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(settings): Json<ScrapingSettings>,
) -> Result<Json<ScrapeResponse>, ApiError> {
    let token = headers.get("token").and_then(|v| v.to_str().ok());
    if token != Some(state.config.static_token.as_str()) {
        return Err(ScrapeError::Auth.into());
    }
    settings.validate()?;

    let scraper = Scraper::from_config(&state.config, settings).await?;
    let count = scraper.run().await?;

    Ok(Json(ScrapeResponse {
        status: "success",
        scraped_products: count,
    }))
}

struct ApiError(ScrapeError);

impl From<ScrapeError> for ApiError {
    fn from(err: ScrapeError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self.0 {
            ScrapeError::Auth => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ScrapeError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            other => {
                error!("scrape request failed: {other}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}
