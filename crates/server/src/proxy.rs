//! Shop-facing app proxy routes consumed by the storefront widget.
//!
//! - `GET  /apps/quiz/proxy/config`    : current quiz document
//! - `POST /apps/quiz/proxy/recommend` : answers in, product summaries out
//! - `GET  /apps/quiz/proxy/*`         : static widget assets

use std::path::Path;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use quizlite_core::domain::answers::{AnswerEntry, AnswerMap};
use quizlite_core::domain::product::ProductSummary;
use quizlite_core::domain::quiz::QuizConfig;
use quizlite_core::errors::ApplicationError;
use quizlite_core::recommend::RecommendationService;
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;
use tracing::error;
use uuid::Uuid;

pub const PROXY_PREFIX: &str = "/apps/quiz/proxy";

#[derive(Clone)]
pub struct ProxyState {
    recommendations: RecommendationService,
    shop: Option<String>,
}

impl ProxyState {
    pub fn new(recommendations: RecommendationService, shop: Option<String>) -> Self {
        Self { recommendations, shop }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub answers: Option<Vec<AnswerEntry>>,
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub success: bool,
    pub config: QuizConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shop: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub success: bool,
    pub products: Vec<ProductSummary>,
}

#[derive(Debug, Serialize)]
pub struct ProxyError {
    pub success: bool,
    pub error: String,
}

type ProxyResult<T> = Result<Json<T>, (StatusCode, Json<ProxyError>)>;

pub fn router(state: ProxyState, static_dir: &Path) -> Router {
    Router::new()
        .route("/apps/quiz/proxy/config", get(quiz_config))
        .route("/apps/quiz/proxy/recommend", post(recommend))
        .with_state(state)
        .nest_service(PROXY_PREFIX, ServeDir::new(static_dir))
}

pub async fn quiz_config(State(state): State<ProxyState>) -> ProxyResult<ConfigResponse> {
    match state.recommendations.store().load_async().await {
        Ok(config) => Ok(Json(ConfigResponse { success: true, config, shop: state.shop.clone() })),
        Err(store_error) => {
            let correlation_id = Uuid::new_v4().to_string();
            let interface = ApplicationError::from(store_error).into_interface(&correlation_id);
            error!(
                event_name = "proxy.config.failed",
                correlation_id = %correlation_id,
                error = %interface.detail(),
                "quiz document could not be served"
            );
            Err(failure(StatusCode::INTERNAL_SERVER_ERROR, "Config error"))
        }
    }
}

pub async fn recommend(State(state): State<ProxyState>, body: Bytes) -> ProxyResult<RecommendResponse> {
    let correlation_id = Uuid::new_v4().to_string();
    let request = parse_request(&body).map_err(|message| {
        error!(
            event_name = "proxy.recommend.bad_request",
            correlation_id = %correlation_id,
            error = %message,
            "recommend body is not valid JSON"
        );
        failure(StatusCode::BAD_REQUEST, "Invalid request body")
    })?;

    let answers = AnswerMap::from_entries(request.answers.unwrap_or_default());
    match state.recommendations.recommend(&answers, &correlation_id).await {
        Ok(recommendation) => {
            Ok(Json(RecommendResponse { success: true, products: recommendation.products }))
        }
        Err(store_error) => {
            let interface = ApplicationError::from(store_error).into_interface(&correlation_id);
            error!(
                event_name = "proxy.recommend.failed",
                correlation_id = %correlation_id,
                error = %interface.detail(),
                "recommendation pipeline failed"
            );
            Err(failure(StatusCode::INTERNAL_SERVER_ERROR, "Recommendation failed"))
        }
    }
}

// An empty body is treated as a request without answers.
fn parse_request(body: &[u8]) -> Result<RecommendRequest, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RecommendRequest::default());
    }
    serde_json::from_slice(body)
}

fn failure(status: StatusCode, error: &str) -> (StatusCode, Json<ProxyError>) {
    (status, Json(ProxyError { success: false, error: error.to_string() }))
}
