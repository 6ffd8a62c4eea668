use std::sync::Arc;
use std::time::Duration;

use quizlite_core::catalog::ProductCatalog;
use quizlite_core::config::{AppConfig, CatalogConfig, CatalogSource, ConfigError};
use quizlite_core::materializer::ResultMaterializer;
use quizlite_core::recommend::RecommendationService;
use quizlite_core::store::ConfigStore;
use reqwest::Client;
use secrecy::SecretString;
use thiserror::Error;
use tracing::{info, warn};

use crate::storefront::{ProductJsCatalog, StorefrontCatalog};

pub struct Application {
    pub config: AppConfig,
    pub store: ConfigStore,
    pub recommendations: RecommendationService,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("http client construction failed: {0}")]
    HttpClient(#[source] reqwest::Error),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let store = ConfigStore::new(&config.quiz.document_path);
    report_document(&store);

    let lookup_timeout = Duration::from_secs(config.catalog.timeout_secs);
    let materializer = match build_catalog(&config.catalog)? {
        Some(catalog) => ResultMaterializer::new(catalog, lookup_timeout),
        None => ResultMaterializer::without_catalog(),
    };
    info!(
        event_name = "system.bootstrap.catalog",
        correlation_id = "bootstrap",
        source = ?config.catalog.effective_source(),
        enriching = materializer.is_enriching(),
        "catalog adapter selected"
    );

    let recommendations = RecommendationService::new(store.clone(), materializer);
    Ok(Application { config, store, recommendations })
}

fn build_catalog(
    config: &CatalogConfig,
) -> Result<Option<Arc<dyn ProductCatalog>>, BootstrapError> {
    let Some(source) = config.effective_source() else {
        return Ok(None);
    };
    let shop = config.shop.as_deref().unwrap_or_default();
    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(BootstrapError::HttpClient)?;

    let catalog: Arc<dyn ProductCatalog> = match source {
        CatalogSource::Storefront => {
            let token = config.storefront_token.clone().unwrap_or_else(|| SecretString::from(""));
            Arc::new(StorefrontCatalog::new(client, shop, &config.api_version, token))
        }
        CatalogSource::ProductJs => Arc::new(ProductJsCatalog::new(client, shop)),
        CatalogSource::Disabled => return Ok(None),
    };
    Ok(Some(catalog))
}

// A broken document is not fatal at startup; it is re-read per request and
// can be fixed in place.
fn report_document(store: &ConfigStore) {
    match store.load() {
        Ok(quiz) => {
            let issues = quiz.lint();
            info!(
                event_name = "system.bootstrap.quiz_document",
                correlation_id = "bootstrap",
                path = %store.path().display(),
                questions = quiz.question_count(),
                rules = quiz.rules.len(),
                combos = quiz.combos.len(),
                lint_issues = issues.len(),
                "quiz document loaded"
            );
            for issue in issues {
                warn!(
                    event_name = "system.bootstrap.quiz_lint",
                    correlation_id = "bootstrap",
                    code = issue.code,
                    "{}",
                    issue.message
                );
            }
        }
        Err(error) => warn!(
            event_name = "system.bootstrap.quiz_document_unavailable",
            correlation_id = "bootstrap",
            error = %error,
            "quiz document could not be loaded; proxy endpoints will fail until it is fixed"
        ),
    }
}
