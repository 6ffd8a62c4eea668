use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::catalog::{CatalogLookupError, ProductCatalog};
use crate::domain::product::{CatalogProduct, Handle, HandleSet, ProductSummary};

pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Turns resolved handles into display summaries through an optional catalog.
///
/// Every handle is looked up independently: a failure, a miss or a timeout
/// only degrades that handle to a `{handle}` summary.
#[derive(Clone)]
pub struct ResultMaterializer {
    catalog: Option<Arc<dyn ProductCatalog>>,
    lookup_timeout: Duration,
}

impl ResultMaterializer {
    pub fn new(catalog: Arc<dyn ProductCatalog>, lookup_timeout: Duration) -> Self {
        Self { catalog: Some(catalog), lookup_timeout }
    }

    /// Materializer for deployments without catalog credentials.
    pub fn without_catalog() -> Self {
        Self { catalog: None, lookup_timeout: DEFAULT_LOOKUP_TIMEOUT }
    }

    pub fn is_enriching(&self) -> bool {
        self.catalog.is_some()
    }

    pub async fn materialize(&self, handles: &HandleSet) -> Vec<ProductSummary> {
        let mut summaries: Vec<ProductSummary> =
            handles.iter().cloned().map(ProductSummary::degraded).collect();

        let Some(catalog) = &self.catalog else {
            return summaries;
        };
        if handles.is_empty() {
            return summaries;
        }

        let mut lookups = JoinSet::new();
        for (index, handle) in handles.iter().cloned().enumerate() {
            let catalog = Arc::clone(catalog);
            let lookup_timeout = self.lookup_timeout;
            lookups.spawn(async move {
                let outcome = lookup(catalog.as_ref(), &handle, lookup_timeout).await;
                (index, handle, outcome)
            });
        }

        while let Some(joined) = lookups.join_next().await {
            match joined {
                Ok((index, handle, Ok(Some(product)))) => {
                    summaries[index] = enriched(handle, product);
                }
                Ok((_, handle, Ok(None))) => {
                    debug!(
                        event_name = "catalog.lookup.not_found",
                        handle = %handle,
                        "catalog has no product for handle; returning handle only"
                    );
                }
                Ok((_, handle, Err(error))) => {
                    warn!(
                        event_name = "catalog.lookup.failed",
                        handle = %handle,
                        error = %error,
                        "catalog lookup failed; returning handle only"
                    );
                }
                Err(error) => {
                    let error = CatalogLookupError::Aborted(error.to_string());
                    warn!(
                        event_name = "catalog.lookup.aborted",
                        error = %error,
                        "catalog lookup task did not complete"
                    );
                }
            }
        }

        summaries
    }
}

async fn lookup(
    catalog: &dyn ProductCatalog,
    handle: &Handle,
    lookup_timeout: Duration,
) -> Result<Option<CatalogProduct>, CatalogLookupError> {
    match tokio::time::timeout(lookup_timeout, catalog.fetch_by_handle(handle)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(CatalogLookupError::Timeout {
            timeout_ms: u64::try_from(lookup_timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

// The requested handle stays authoritative even if the catalog echoes a
// different one.
fn enriched(handle: Handle, product: CatalogProduct) -> ProductSummary {
    ProductSummary { handle, ..ProductSummary::from(product) }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use crate::catalog::{CatalogLookupError, ProductCatalog};
    use crate::domain::product::{CatalogProduct, Handle, HandleSet, ProductSummary};
    use crate::materializer::ResultMaterializer;

    #[derive(Default)]
    struct ScriptedCatalog {
        products: HashMap<String, CatalogProduct>,
        calls: AtomicUsize,
    }

    impl ScriptedCatalog {
        fn with_product(mut self, handle: &str, title: &str, cents: i64) -> Self {
            self.products.insert(
                handle.to_string(),
                CatalogProduct {
                    handle: Handle::from(handle),
                    title: Some(title.to_string()),
                    image: Some(format!("https://cdn.example/{handle}.png")),
                    price_amount: Some(Decimal::new(cents, 2)),
                    currency_code: Some("USD".to_string()),
                },
            );
            self
        }
    }

    #[async_trait]
    impl ProductCatalog for ScriptedCatalog {
        async fn fetch_by_handle(
            &self,
            handle: &Handle,
        ) -> Result<Option<CatalogProduct>, CatalogLookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match handle.as_str() {
                "broken" => Err(CatalogLookupError::Transport("connection reset".to_string())),
                "slow" => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(None)
                }
                "panics" => panic!("lookup exploded"),
                other => Ok(self.products.get(other).cloned()),
            }
        }
    }

    fn handle_set(values: &[&str]) -> HandleSet {
        values.iter().map(|value| Handle::from(*value)).collect()
    }

    fn materializer(catalog: Arc<ScriptedCatalog>) -> ResultMaterializer {
        ResultMaterializer::new(catalog, Duration::from_millis(50))
    }

    #[tokio::test]
    async fn empty_handle_set_skips_the_catalog() {
        let catalog = Arc::new(ScriptedCatalog::default().with_product("shade-a", "Shade A", 2_400));

        let summaries = materializer(catalog.clone()).materialize(&HandleSet::new()).await;

        assert!(summaries.is_empty());
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_catalog_degrades_every_handle() {
        let summaries = ResultMaterializer::without_catalog()
            .materialize(&handle_set(&["shade-a", "shade-b"]))
            .await;

        assert_eq!(
            summaries,
            vec![
                ProductSummary::degraded(Handle::from("shade-a")),
                ProductSummary::degraded(Handle::from("shade-b")),
            ]
        );
    }

    #[tokio::test]
    async fn one_failure_does_not_affect_other_handles() {
        let catalog = Arc::new(
            ScriptedCatalog::default()
                .with_product("shade-a", "Shade A", 2_400)
                .with_product("shade-c", "Shade C", 1_850),
        );

        let summaries = materializer(catalog.clone())
            .materialize(&handle_set(&["shade-a", "broken", "shade-c"]))
            .await;

        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[0].title.as_deref(), Some("Shade A"));
        assert_eq!(summaries[0].price, Some(Decimal::new(2_400, 2)));
        assert_eq!(summaries[1], ProductSummary::degraded(Handle::from("broken")));
        assert_eq!(summaries[2].title.as_deref(), Some("Shade C"));
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn unknown_handles_degrade() {
        let catalog = Arc::new(ScriptedCatalog::default().with_product("shade-a", "Shade A", 2_400));

        let summaries =
            materializer(catalog).materialize(&handle_set(&["retired", "shade-a"])).await;

        assert!(summaries[0].is_degraded());
        assert_eq!(summaries[0].handle, Handle::from("retired"));
        assert!(!summaries[1].is_degraded());
    }

    #[tokio::test]
    async fn slow_lookups_time_out_into_degraded_summaries() {
        let catalog = Arc::new(ScriptedCatalog::default().with_product("shade-a", "Shade A", 2_400));

        let summaries = materializer(catalog).materialize(&handle_set(&["slow", "shade-a"])).await;

        assert_eq!(summaries[0], ProductSummary::degraded(Handle::from("slow")));
        assert_eq!(summaries[1].title.as_deref(), Some("Shade A"));
    }

    #[tokio::test]
    async fn panicking_lookup_only_degrades_its_handle() {
        let catalog = Arc::new(ScriptedCatalog::default().with_product("shade-a", "Shade A", 2_400));

        let summaries =
            materializer(catalog).materialize(&handle_set(&["shade-a", "panics"])).await;

        assert_eq!(summaries[0].title.as_deref(), Some("Shade A"));
        assert_eq!(summaries[1], ProductSummary::degraded(Handle::from("panics")));
    }
}
