use indexmap::IndexSet;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Opaque, stable product identifier used for catalog lookups.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle(pub String);

impl Handle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Handle {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deduplicated handles in first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandleSet {
    handles: IndexSet<Handle>,
}

impl HandleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the handle was already present; its position is kept.
    pub fn insert(&mut self, handle: Handle) -> bool {
        self.handles.insert(handle)
    }

    pub fn contains(&self, handle: &Handle) -> bool {
        self.handles.contains(handle)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Handle> {
        self.handles.iter()
    }

    pub fn to_vec(&self) -> Vec<Handle> {
        self.handles.iter().cloned().collect()
    }
}

impl Extend<Handle> for HandleSet {
    fn extend<T: IntoIterator<Item = Handle>>(&mut self, iter: T) {
        self.handles.extend(iter);
    }
}

impl FromIterator<Handle> for HandleSet {
    fn from_iter<T: IntoIterator<Item = Handle>>(iter: T) -> Self {
        Self { handles: iter.into_iter().collect() }
    }
}

impl IntoIterator for HandleSet {
    type Item = Handle;
    type IntoIter = indexmap::set::IntoIter<Handle>;

    fn into_iter(self) -> Self::IntoIter {
        self.handles.into_iter()
    }
}

/// Product data as returned by the catalog collaborator. Prices are in
/// major units (`12.34`), never in cents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub handle: Handle,
    pub title: Option<String>,
    pub image: Option<String>,
    pub price_amount: Option<Decimal>,
    pub currency_code: Option<String>,
}

/// Display-ready recommendation. Only `handle` is guaranteed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub handle: Handle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl ProductSummary {
    /// Handle-only summary used whenever enrichment is unavailable or fails.
    pub fn degraded(handle: Handle) -> Self {
        Self { handle, title: None, image: None, price: None, currency: None }
    }

    pub fn is_degraded(&self) -> bool {
        self.title.is_none() && self.image.is_none() && self.price.is_none()
    }
}

impl From<CatalogProduct> for ProductSummary {
    fn from(product: CatalogProduct) -> Self {
        Self {
            handle: product.handle,
            title: product.title,
            image: product.image,
            price: product.price_amount,
            currency: product.currency_code,
        }
    }
}
