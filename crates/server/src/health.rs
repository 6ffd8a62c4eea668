use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use quizlite_core::store::ConfigStore;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    store: ConfigStore,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub quiz_document: HealthCheck,
    pub checked_at: String,
}

pub fn router(store: ConfigStore) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { store })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let quiz_document = document_check(&state.store).await;
    let ready = quiz_document.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "quizlite-server runtime initialized".to_string(),
        },
        quiz_document,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn document_check(store: &ConfigStore) -> HealthCheck {
    match store.load_async().await {
        Ok(quiz) => HealthCheck {
            status: "ready",
            detail: format!("quiz document loaded with {} questions", quiz.question_count()),
        },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("quiz document unavailable: {error}") }
        }
    }
}
