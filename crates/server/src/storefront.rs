//! Catalog adapters backed by the shop's HTTP APIs.
//!
//! - `StorefrontCatalog`: Storefront GraphQL `productByHandle`, authenticated
//!   with a storefront access token. Amounts arrive in major units.
//! - `ProductJsCatalog`: the public `/products/{handle}.js` endpoint. Prices
//!   arrive in cents and are converted before leaving this module.

use async_trait::async_trait;
use quizlite_core::catalog::{cents_to_major, CatalogLookupError, ProductCatalog};
use quizlite_core::domain::product::{CatalogProduct, Handle};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};

const STOREFRONT_TOKEN_HEADER: &str = "X-Shopify-Storefront-Access-Token";

const PRODUCT_BY_HANDLE_QUERY: &str = r#"
query ProductByHandle($handle: String!) {
  productByHandle(handle: $handle) {
    title
    handle
    featuredImage { url altText }
    variants(first: 1) { edges { node { price { amount currencyCode } } } }
  }
}
"#;

pub struct StorefrontCatalog {
    client: Client,
    endpoint: String,
    token: SecretString,
}

impl StorefrontCatalog {
    pub fn new(client: Client, shop: &str, api_version: &str, token: SecretString) -> Self {
        Self { client, endpoint: storefront_endpoint(shop, api_version), token }
    }
}

pub fn storefront_endpoint(shop: &str, api_version: &str) -> String {
    format!("https://{}/api/{}/graphql.json", shop.trim(), api_version.trim())
}

#[async_trait]
impl ProductCatalog for StorefrontCatalog {
    async fn fetch_by_handle(
        &self,
        handle: &Handle,
    ) -> Result<Option<CatalogProduct>, CatalogLookupError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(STOREFRONT_TOKEN_HEADER, self.token.expose_secret())
            .json(&json!({
                "query": PRODUCT_BY_HANDLE_QUERY,
                "variables": { "handle": handle.as_str() },
            }))
            .send()
            .await
            .map_err(|error| CatalogLookupError::Transport(error.to_string()))?;

        if !response.status().is_success() {
            return Err(CatalogLookupError::Status { status: response.status().as_u16() });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|error| CatalogLookupError::Decode(error.to_string()))?;
        parse_storefront_product(handle, &payload)
    }
}

/// Reads a GraphQL `productByHandle` response. A null product is a miss;
/// a response carrying only `errors` is a decode failure.
pub fn parse_storefront_product(
    handle: &Handle,
    payload: &Value,
) -> Result<Option<CatalogProduct>, CatalogLookupError> {
    let Some(data) = payload.get("data").filter(|data| !data.is_null()) else {
        let message = payload
            .pointer("/errors/0/message")
            .and_then(Value::as_str)
            .unwrap_or("response has no data");
        return Err(CatalogLookupError::Decode(message.to_string()));
    };

    let product = match data.get("productByHandle") {
        None | Some(Value::Null) => return Ok(None),
        Some(product) => product,
    };

    let price = product.pointer("/variants/edges/0/node/price");
    let price_amount = match price.and_then(|price| price.get("amount")) {
        None | Some(Value::Null) => None,
        Some(amount) => Some(decimal_from_json(amount).ok_or_else(|| {
            CatalogLookupError::Decode(format!("price amount `{amount}` is not a decimal"))
        })?),
    };

    Ok(Some(CatalogProduct {
        handle: product
            .get("handle")
            .and_then(Value::as_str)
            .map(Handle::from)
            .unwrap_or_else(|| handle.clone()),
        title: string_field(product, "/title"),
        image: string_field(product, "/featuredImage/url"),
        price_amount,
        currency_code: price.and_then(|price| string_field(price, "/currencyCode")),
    }))
}

pub struct ProductJsCatalog {
    client: Client,
    base_url: String,
}

impl ProductJsCatalog {
    pub fn new(client: Client, shop: &str) -> Self {
        Self { client, base_url: format!("https://{}", shop.trim()) }
    }
}

#[async_trait]
impl ProductCatalog for ProductJsCatalog {
    async fn fetch_by_handle(
        &self,
        handle: &Handle,
    ) -> Result<Option<CatalogProduct>, CatalogLookupError> {
        let url = format!("{}/products/{}.js", self.base_url, handle);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|error| CatalogLookupError::Transport(error.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(CatalogLookupError::Status { status: response.status().as_u16() });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|error| CatalogLookupError::Decode(error.to_string()))?;
        parse_product_js(handle, &payload)
    }
}

/// Reads a `/products/{handle}.js` document. The first variant's price is
/// in cents; this endpoint carries no currency.
pub fn parse_product_js(
    handle: &Handle,
    payload: &Value,
) -> Result<Option<CatalogProduct>, CatalogLookupError> {
    if !payload.is_object() {
        return Err(CatalogLookupError::Decode("product document is not an object".to_string()));
    }

    let image = string_field(payload, "/images/0")
        .or_else(|| string_field(payload, "/featured_image"))
        .map(absolute_asset_url);

    let price_amount = match payload.pointer("/variants/0/price") {
        None | Some(Value::Null) => None,
        Some(Value::Number(cents)) => match cents.as_i64() {
            Some(cents) => Some(cents_to_major(cents)),
            None => cents.to_string().parse::<Decimal>().ok().map(cents_in_major_units),
        },
        Some(Value::String(cents)) => cents.trim().parse::<Decimal>().ok().map(cents_in_major_units),
        Some(other) => {
            return Err(CatalogLookupError::Decode(format!("variant price `{other}` is not numeric")))
        }
    };

    Ok(Some(CatalogProduct {
        handle: handle.clone(),
        title: string_field(payload, "/title"),
        image,
        price_amount,
        currency_code: None,
    }))
}

fn cents_in_major_units(cents: Decimal) -> Decimal {
    cents / Decimal::ONE_HUNDRED
}

fn decimal_from_json(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(raw) => raw.trim().parse::<Decimal>().ok(),
        Value::Number(number) => number.to_string().parse::<Decimal>().ok(),
        _ => None,
    }
}

fn string_field(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|raw| !raw.is_empty())
        .map(str::to_string)
}

// Shop CDN links are often protocol-relative.
fn absolute_asset_url(url: String) -> String {
    if url.starts_with("//") {
        format!("https:{url}")
    } else {
        url
    }
}

#[cfg(test)]
mod tests {
    use quizlite_core::catalog::CatalogLookupError;
    use quizlite_core::domain::product::Handle;
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::{parse_product_js, parse_storefront_product, storefront_endpoint};

    #[test]
    fn endpoint_uses_shop_and_api_version() {
        assert_eq!(
            storefront_endpoint("demo.myshopify.com", "2024-07"),
            "https://demo.myshopify.com/api/2024-07/graphql.json"
        );
    }

    #[test]
    fn storefront_amount_is_already_in_major_units() {
        let payload = json!({
            "data": {
                "productByHandle": {
                    "title": "Shade A",
                    "handle": "shade-a",
                    "featuredImage": {"url": "https://cdn.example/a.png", "altText": null},
                    "variants": {"edges": [{"node": {"price": {"amount": "24.5", "currencyCode": "USD"}}}]}
                }
            }
        });

        let product = parse_storefront_product(&Handle::from("shade-a"), &payload)
            .expect("parse")
            .expect("product");

        assert_eq!(product.title.as_deref(), Some("Shade A"));
        assert_eq!(product.image.as_deref(), Some("https://cdn.example/a.png"));
        assert_eq!(product.price_amount, Some(Decimal::new(245, 1)));
        assert_eq!(product.currency_code.as_deref(), Some("USD"));
    }

    #[test]
    fn storefront_null_product_is_a_miss() {
        let payload = json!({"data": {"productByHandle": null}});

        let product = parse_storefront_product(&Handle::from("retired"), &payload).expect("parse");

        assert_eq!(product, None);
    }

    #[test]
    fn storefront_errors_without_data_fail_the_lookup() {
        let payload = json!({"errors": [{"message": "Access denied"}]});

        let error = parse_storefront_product(&Handle::from("shade-a"), &payload)
            .expect_err("errors payload");

        assert_eq!(error, CatalogLookupError::Decode("Access denied".to_string()));
    }

    #[test]
    fn storefront_product_without_variants_has_no_price() {
        let payload = json!({"data": {"productByHandle": {"title": "Gift card", "handle": "gift"}}});

        let product = parse_storefront_product(&Handle::from("gift"), &payload)
            .expect("parse")
            .expect("product");

        assert_eq!(product.price_amount, None);
        assert_eq!(product.image, None);
    }

    #[test]
    fn product_js_price_is_converted_from_cents() {
        let payload = json!({
            "title": "Shade B",
            "images": ["//cdn.shop.example/b.png"],
            "variants": [{"price": 2450}]
        });

        let product = parse_product_js(&Handle::from("shade-b"), &payload)
            .expect("parse")
            .expect("product");

        assert_eq!(product.price_amount, Some(Decimal::new(2450, 2)));
        assert_eq!(product.image.as_deref(), Some("https://cdn.shop.example/b.png"));
        assert_eq!(product.currency_code, None);
    }

    #[test]
    fn product_js_accepts_string_cents_and_featured_image() {
        let payload = json!({
            "title": "Shade C",
            "featured_image": "https://cdn.shop.example/c.png",
            "variants": [{"price": "1800"}]
        });

        let product = parse_product_js(&Handle::from("shade-c"), &payload)
            .expect("parse")
            .expect("product");

        assert_eq!(product.price_amount, Some(Decimal::new(18, 0)));
        assert_eq!(product.image.as_deref(), Some("https://cdn.shop.example/c.png"));
    }

    #[test]
    fn product_js_rejects_non_object_documents() {
        let error = parse_product_js(&Handle::from("shade-c"), &json!("<html>"))
            .expect_err("not an object");

        assert!(matches!(error, CatalogLookupError::Decode(_)));
    }
}
