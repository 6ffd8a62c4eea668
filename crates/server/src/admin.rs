//! Merchant-facing quiz document editing.
//!
//! Both routes require the `x-quizlite-admin-secret` header to match the
//! configured admin password. Without a configured password the routes are
//! closed entirely.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use quizlite_core::domain::quiz::{LintIssue, QuizConfig};
use quizlite_core::errors::{ApplicationError, InterfaceError};
use quizlite_core::store::{validate_document, ConfigStore, ValidationError};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

pub const ADMIN_SECRET_HEADER: &str = "x-quizlite-admin-secret";

#[derive(Clone)]
pub struct AdminState {
    store: ConfigStore,
    password: Option<SecretString>,
}

impl AdminState {
    pub fn new(store: ConfigStore, password: Option<SecretString>) -> Self {
        Self { store, password }
    }
}

#[derive(Debug, Serialize)]
pub struct AdminConfigResponse {
    pub success: bool,
    pub config: QuizConfig,
}

#[derive(Debug, Serialize)]
pub struct AdminSaveResponse {
    pub success: bool,
    pub questions: usize,
    pub rules: usize,
    pub combos: usize,
    pub warnings: Vec<LintIssue>,
}

#[derive(Debug, Serialize)]
pub struct AdminError {
    pub success: bool,
    pub error: String,
    pub correlation_id: String,
}

type AdminResult<T> = Result<Json<T>, (StatusCode, Json<AdminError>)>;

pub fn router(state: AdminState) -> Router {
    Router::new()
        .route("/apps/quiz/admin/config", get(read_config).put(write_config))
        .with_state(state)
}

pub async fn read_config(
    State(state): State<AdminState>,
    headers: HeaderMap,
) -> AdminResult<AdminConfigResponse> {
    let correlation_id = Uuid::new_v4().to_string();
    authorize(&state, &headers).map_err(|error| reject(error, &correlation_id))?;

    let config = state
        .store
        .load_async()
        .await
        .map_err(|error| reject(ApplicationError::from(error), &correlation_id))?;
    Ok(Json(AdminConfigResponse { success: true, config }))
}

pub async fn write_config(
    State(state): State<AdminState>,
    headers: HeaderMap,
    body: Bytes,
) -> AdminResult<AdminSaveResponse> {
    let correlation_id = Uuid::new_v4().to_string();
    authorize(&state, &headers).map_err(|error| reject(error, &correlation_id))?;

    let document: Value = serde_json::from_slice(&body).map_err(|error| {
        reject(ValidationError::Shape(error.to_string()).into(), &correlation_id)
    })?;
    let config = validate_document(document)
        .map_err(|error| reject(ApplicationError::from(error), &correlation_id))?;

    state
        .store
        .save_async(&config)
        .await
        .map_err(|error| reject(ApplicationError::from(error), &correlation_id))?;

    let warnings = config.lint();
    info!(
        event_name = "admin.config.saved",
        correlation_id = %correlation_id,
        questions = config.question_count(),
        warnings = warnings.len(),
        "quiz document replaced by admin"
    );

    Ok(Json(AdminSaveResponse {
        success: true,
        questions: config.question_count(),
        rules: config.rules.len(),
        combos: config.combos.len(),
        warnings,
    }))
}

fn authorize(state: &AdminState, headers: &HeaderMap) -> Result<(), ApplicationError> {
    let Some(password) = state.password.as_ref().filter(|value| !value.expose_secret().is_empty())
    else {
        return Err(ApplicationError::AdminDisabled);
    };

    let provided = headers.get(ADMIN_SECRET_HEADER).and_then(|value| value.to_str().ok());
    match provided {
        Some(value) if value == password.expose_secret() => Ok(()),
        _ => Err(ApplicationError::AdminDenied),
    }
}

fn reject(error: ApplicationError, correlation_id: &str) -> (StatusCode, Json<AdminError>) {
    let interface = error.into_interface(correlation_id);
    let status = match &interface {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        InterfaceError::Forbidden { .. } => StatusCode::FORBIDDEN,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(
        event_name = "admin.config.rejected",
        correlation_id = %correlation_id,
        status = status.as_u16(),
        error = %interface.detail(),
        "admin request rejected"
    );

    // Validation detail helps the merchant fix the document; everything else
    // gets the user-safe message.
    let message = match &interface {
        InterfaceError::BadRequest { message, .. } => message.clone(),
        other => other.user_message().to_string(),
    };
    (
        status,
        Json(AdminError {
            success: false,
            error: message,
            correlation_id: interface.correlation_id().to_string(),
        }),
    )
}
