use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use common::logger::TraceId;
use serde::{Deserialize, Serialize};

/// Event key, e.g. `"july-12"`. Unique per tracked event.
pub type EventId = String;

/// Progress of one carting attempt as reported by its driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Starting,
    CartPage,
    TicketsFound,
    QuantitySelected,
    AddingToCart,
    CartSuccess,
    CartError,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::CartSuccess | Phase::CartError)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Starting => "starting",
            Phase::CartPage => "cartPage",
            Phase::TicketsFound => "ticketsFound",
            Phase::QuantitySelected => "quantitySelected",
            Phase::AddingToCart => "addingToCart",
            Phase::CartSuccess => "cartSuccess",
            Phase::CartError => "cartError",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "starting" => Ok(Phase::Starting),
            "cartPage" => Ok(Phase::CartPage),
            "ticketsFound" => Ok(Phase::TicketsFound),
            "quantitySelected" => Ok(Phase::QuantitySelected),
            "addingToCart" => Ok(Phase::AddingToCart),
            "cartSuccess" => Ok(Phase::CartSuccess),
            "cartError" => Ok(Phase::CartError),
            other => Err(anyhow::anyhow!("Invalid Phase value: {}", other)),
        }
    }
}

/// What to cart: the event identity handed to `start_automatic_carting`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTarget {
    pub event_id: EventId,
    pub event_url: String,
    pub event_name: String,
}

impl EventTarget {
    pub fn new(
        event_id: impl Into<EventId>,
        event_url: impl Into<String>,
        event_name: impl Into<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_url: event_url.into(),
            event_name: event_name.into(),
        }
    }
}

/// A live attempt. Lives in the active map until it reaches a terminal phase.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartAttempt {
    pub event_id: EventId,
    pub event_url: String,
    pub event_name: String,
    pub start_time: DateTime<Utc>,
    pub status: Phase,
    /// 1-based; retries of the same event count up from here.
    pub attempt: u32,
    #[serde(skip)]
    pub trace_id: TraceId,
}

impl CartAttempt {
    pub fn target(&self) -> EventTarget {
        EventTarget::new(&self.event_id, &self.event_url, &self.event_name)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedCart {
    pub event_id: EventId,
    pub event_name: String,
    pub completed_time: DateTime<Utc>,
    pub checkout_url: String,
    pub attempt: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedCart {
    pub event_id: EventId,
    pub event_url: String,
    pub event_name: String,
    pub failed_time: DateTime<Utc>,
    pub reason: String,
    pub attempt: u32,
    /// True when the retry budget allowed another attempt to be queued.
    pub retry_scheduled: bool,
}

impl FailedCart {
    pub fn target(&self) -> EventTarget {
        EventTarget::new(&self.event_id, &self.event_url, &self.event_name)
    }
}
