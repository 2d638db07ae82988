use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::price::parse_price;

/// One purchasable section as rendered on the ticket-selection page.
///
/// Snapshot only: the page owns the element, this is what a scan read.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TicketSection {
    pub name: String,
    /// `None` when the rendered price text had no parseable number.
    pub price: Option<Decimal>,
    /// False when the section is marked disabled or sold out.
    pub available: bool,
}

impl TicketSection {
    pub fn new(name: impl Into<String>, price: Option<Decimal>, available: bool) -> Self {
        Self {
            name: name.into(),
            price,
            available,
        }
    }

    /// Builds a section from raw page text.
    pub fn from_rendered(name: &str, price_text: Option<&str>, available: bool) -> Self {
        Self {
            name: name.trim().to_string(),
            price: price_text.and_then(parse_price),
            available,
        }
    }

    /// Unknown prices pass any budget.
    pub fn within_budget(&self, max_price: Decimal) -> bool {
        match self.price {
            Some(p) => p <= max_price,
            None => true,
        }
    }

    /// Case-insensitive substring match against any of the (already
    /// lower-cased) preferred terms.
    pub(crate) fn matches_any(&self, terms_lower: &[String]) -> bool {
        let name = self.name.to_lowercase();
        terms_lower.iter().any(|t| name.contains(t.as_str()))
    }
}

/// The subset of the carting preferences the selector needs.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionPolicy {
    pub max_price: Decimal,
    pub preferred_sections: Vec<String>,
    pub fallback_to_any_section: bool,
}

impl SelectionPolicy {
    /// Preferred terms lower-cased, blank entries dropped.
    pub(crate) fn normalized_terms(&self) -> Vec<String> {
        self.preferred_sections
            .iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }
}
