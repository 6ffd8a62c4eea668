use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::product::{CatalogProduct, Handle};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogLookupError {
    #[error("catalog transport failure: {0}")]
    Transport(String),
    #[error("catalog returned status {status}")]
    Status { status: u16 },
    #[error("catalog response could not be decoded: {0}")]
    Decode(String),
    #[error("catalog lookup timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("catalog lookup task aborted: {0}")]
    Aborted(String),
}

/// External product lookup. `Ok(None)` means the handle is unknown to the
/// catalog; transport problems are errors. Implementations return prices in
/// major units.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn fetch_by_handle(
        &self,
        handle: &Handle,
    ) -> Result<Option<CatalogProduct>, CatalogLookupError>;
}

/// Converts an integer amount of minor units (cents) into a major-unit
/// decimal: `2450` becomes `24.50`.
pub fn cents_to_major(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::cents_to_major;

    #[test]
    fn cents_convert_to_two_decimal_major_units() {
        assert_eq!(cents_to_major(2_450), Decimal::new(245, 1));
        assert_eq!(cents_to_major(2_450).to_string(), "24.50");
        assert_eq!(cents_to_major(0), Decimal::ZERO);
    }
}
