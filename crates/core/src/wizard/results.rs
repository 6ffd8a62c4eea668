use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::domain::product::{Handle, ProductSummary};

pub const NO_MATCHES_MESSAGE: &str = "No matches yet — try different answers.";
pub const UNAVAILABLE_MESSAGE: &str = "We couldn't load your matches right now. Please try again.";

/// What the wizard shows once the recommendation pipeline has finished.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultsView {
    Products { title: String, cards: Vec<ProductCard> },
    NoMatches { title: String, message: &'static str },
    Unavailable { message: &'static str },
}

impl ResultsView {
    /// Builds the view from the pipeline outcome. The error text is only
    /// used by the caller for logging; users see a fixed message.
    pub fn from_outcome<E>(title: &str, outcome: Result<Vec<ProductSummary>, E>) -> Self {
        match outcome {
            Ok(products) if products.is_empty() => {
                Self::NoMatches { title: title.to_string(), message: NO_MATCHES_MESSAGE }
            }
            Ok(products) => Self::Products {
                title: title.to_string(),
                cards: products.iter().map(ProductCard::from_summary).collect(),
            },
            Err(_) => Self::Unavailable { message: UNAVAILABLE_MESSAGE },
        }
    }

    pub fn cards(&self) -> &[ProductCard] {
        match self {
            Self::Products { cards, .. } => cards,
            _ => &[],
        }
    }
}

/// Display-ready product tile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProductCard {
    pub handle: Handle,
    pub title: String,
    pub url: String,
    pub image: Option<String>,
    pub price: Option<String>,
}

impl ProductCard {
    pub fn from_summary(summary: &ProductSummary) -> Self {
        Self {
            handle: summary.handle.clone(),
            title: display_title(summary),
            url: product_url(&summary.handle),
            image: summary.image.clone(),
            price: summary
                .price
                .map(|amount| format_price(amount, summary.currency.as_deref())),
        }
    }
}

/// Catalog title, else the handle with dashes read as spaces.
pub fn display_title(summary: &ProductSummary) -> String {
    match summary.title.as_deref() {
        Some(title) if !title.trim().is_empty() => title.to_string(),
        _ => summary.handle.as_str().replace('-', " "),
    }
}

pub fn product_url(handle: &Handle) -> String {
    format!("/products/{handle}")
}

/// `USD 24.50`; the currency prefix is omitted when unknown.
pub fn format_price(amount: Decimal, currency: Option<&str>) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    match currency.filter(|code| !code.is_empty()) {
        Some(code) => format!("{code} {rounded}"),
        None => rounded.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::domain::product::{Handle, ProductSummary};
    use crate::wizard::results::{
        display_title, format_price, ResultsView, NO_MATCHES_MESSAGE, UNAVAILABLE_MESSAGE,
    };

    #[test]
    fn prices_render_with_two_decimals() {
        assert_eq!(format_price(Decimal::new(245, 1), Some("USD")), "USD 24.50");
        assert_eq!(format_price(Decimal::new(18, 0), None), "18.00");
        assert_eq!(format_price(Decimal::new(12_345, 3), Some("")), "12.35");
    }

    #[test]
    fn degraded_summaries_fall_back_to_the_handle() {
        let summary = ProductSummary::degraded(Handle::from("soft-matte-foundation"));

        assert_eq!(display_title(&summary), "soft matte foundation");
    }

    #[test]
    fn empty_result_is_a_friendly_message() {
        let view = ResultsView::from_outcome::<String>("Your matches", Ok(Vec::new()));

        assert_eq!(
            view,
            ResultsView::NoMatches {
                title: "Your matches".to_string(),
                message: NO_MATCHES_MESSAGE
            }
        );
        assert!(view.cards().is_empty());
    }

    #[test]
    fn failed_request_is_distinct_from_no_matches() {
        let view = ResultsView::from_outcome("Your matches", Err("connection refused"));

        assert_eq!(view, ResultsView::Unavailable { message: UNAVAILABLE_MESSAGE });
    }

    #[test]
    fn products_become_cards_in_order() {
        let enriched = ProductSummary {
            handle: Handle::from("shade-a"),
            title: Some("Shade A".to_string()),
            image: Some("https://cdn.example/shade-a.png".to_string()),
            price: Some(Decimal::new(2_400, 2)),
            currency: Some("USD".to_string()),
        };
        let degraded = ProductSummary::degraded(Handle::from("shade-b"));

        let view = ResultsView::from_outcome::<String>("Picked", Ok(vec![enriched, degraded]));

        let cards = view.cards();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].title, "Shade A");
        assert_eq!(cards[0].url, "/products/shade-a");
        assert_eq!(cards[0].price.as_deref(), Some("USD 24.00"));
        assert_eq!(cards[1].title, "shade b");
        assert_eq!(cards[1].price, None);
    }
}
