use listing::SelectionPolicy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_TICKET_QUANTITY: u8 = 1;
pub const MAX_TICKET_QUANTITY: u8 = 8;

/// User-edited carting preferences. One instance per tracker, persisted on
/// every update.
///
/// Missing fields in a persisted blob fall back to the defaults, so older
/// saved configs keep loading.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CartConfig {
    /// Master toggle; starts are no-ops while false.
    pub enabled: bool,
    /// Tickets to add per attempt, 1..=8.
    pub ticket_quantity: u8,
    /// Highest acceptable price per ticket.
    #[serde(with = "rust_decimal::serde::float")]
    pub max_price: Decimal,
    /// Section name fragments, in priority order. Empty means any section.
    pub preferred_sections: Vec<String>,
    /// Use the first affordable section when no preferred one qualifies.
    pub fallback_to_any_section: bool,
    /// Retries granted to an event after its first failed attempt.
    pub auto_retry_attempts: u32,
    /// Show desktop notifications.
    pub notifications: bool,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ticket_quantity: 2,
            max_price: Decimal::from(500),
            preferred_sections: Vec::new(),
            fallback_to_any_section: true,
            auto_retry_attempts: 3,
            notifications: true,
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("ticket quantity {0} out of range (1..=8)")]
    InvalidQuantity(u8),

    #[error("max price must not be negative (got {0})")]
    NegativeMaxPrice(Decimal),
}

impl CartConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_TICKET_QUANTITY..=MAX_TICKET_QUANTITY).contains(&self.ticket_quantity) {
            return Err(ConfigError::InvalidQuantity(self.ticket_quantity));
        }
        if self.max_price.is_sign_negative() {
            return Err(ConfigError::NegativeMaxPrice(self.max_price));
        }
        Ok(())
    }

    /// Overlays the fields present in `patch` and validates the result.
    /// `self` is left untouched when the merged config is invalid.
    pub fn apply(&self, patch: CartConfigPatch) -> Result<CartConfig, ConfigError> {
        let mut next = self.clone();

        if let Some(v) = patch.enabled {
            next.enabled = v;
        }
        if let Some(v) = patch.ticket_quantity {
            next.ticket_quantity = v;
        }
        if let Some(v) = patch.max_price {
            next.max_price = v;
        }
        if let Some(v) = patch.preferred_sections {
            next.preferred_sections = v;
        }
        if let Some(v) = patch.fallback_to_any_section {
            next.fallback_to_any_section = v;
        }
        if let Some(v) = patch.auto_retry_attempts {
            next.auto_retry_attempts = v;
        }
        if let Some(v) = patch.notifications {
            next.notifications = v;
        }

        next.validate()?;
        Ok(next)
    }

    pub fn selection_policy(&self) -> SelectionPolicy {
        SelectionPolicy {
            max_price: self.max_price,
            preferred_sections: self.preferred_sections.clone(),
            fallback_to_any_section: self.fallback_to_any_section,
        }
    }
}

/// Partial update; absent fields keep their current value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartConfigPatch {
    pub enabled: Option<bool>,
    pub ticket_quantity: Option<u8>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub max_price: Option<Decimal>,
    pub preferred_sections: Option<Vec<String>>,
    pub fallback_to_any_section: Option<bool>,
    pub auto_retry_attempts: Option<u32>,
    pub notifications: Option<bool>,
}
