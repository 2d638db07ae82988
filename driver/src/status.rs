//! Driver → tracker status channel.
//!
//! Each attempt gets its own `StatusSender`, stamped with the event id and the
//! attempt number. All senders feed one receiver owned by the tracker, which
//! drops envelopes for attempts it no longer tracks.
//!
//! Delivery is best-effort: a send into a closed channel is logged and
//! dropped. Messages from one sender arrive in the order they were emitted;
//! nothing is promised across senders.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use session::{EventId, Phase};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Phase report, serialized with a `status` tag:
/// `{"status":"ticketsFound","sectionName":"Floor","price":120.0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DriverReport {
    Starting,
    CartPage,
    TicketsFound {
        section_name: String,
        #[serde(
            default,
            with = "rust_decimal::serde::float_option",
            skip_serializing_if = "Option::is_none"
        )]
        price: Option<Decimal>,
    },
    QuantitySelected {
        quantity: u8,
    },
    AddingToCart,
    CartSuccess {
        checkout_url: String,
    },
    CartError {
        error: String,
    },
}

impl DriverReport {
    pub fn phase(&self) -> Phase {
        match self {
            DriverReport::Starting => Phase::Starting,
            DriverReport::CartPage => Phase::CartPage,
            DriverReport::TicketsFound { .. } => Phase::TicketsFound,
            DriverReport::QuantitySelected { .. } => Phase::QuantitySelected,
            DriverReport::AddingToCart => Phase::AddingToCart,
            DriverReport::CartSuccess { .. } => Phase::CartSuccess,
            DriverReport::CartError { .. } => Phase::CartError,
        }
    }
}

/// Wire message: `{eventId, status, ...phase fields}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusMessage {
    pub event_id: EventId,
    #[serde(flatten)]
    pub report: DriverReport,
}

/// A message plus the attempt it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusEnvelope {
    pub attempt: u32,
    pub message: StatusMessage,
}

pub fn status_channel(capacity: usize) -> (StatusHub, StatusReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (StatusHub { tx }, StatusReceiver { rx })
}

/// Mints per-attempt senders. Held by the tracker.
#[derive(Clone)]
pub struct StatusHub {
    tx: mpsc::Sender<StatusEnvelope>,
}

impl StatusHub {
    pub fn sender_for(&self, event_id: &str, attempt: u32) -> StatusSender {
        StatusSender {
            event_id: event_id.to_string(),
            attempt,
            tx: self.tx.clone(),
        }
    }
}

#[derive(Clone)]
pub struct StatusSender {
    event_id: EventId,
    attempt: u32,
    tx: mpsc::Sender<StatusEnvelope>,
}

impl StatusSender {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub async fn emit(&self, report: DriverReport) {
        debug!(
            event_id = %self.event_id,
            attempt = self.attempt,
            phase = %report.phase(),
            "status emitted"
        );

        let envelope = StatusEnvelope {
            attempt: self.attempt,
            message: StatusMessage {
                event_id: self.event_id.clone(),
                report,
            },
        };

        if self.tx.send(envelope).await.is_err() {
            warn!(
                event_id = %self.event_id,
                attempt = self.attempt,
                "status channel closed; message dropped"
            );
        }
    }
}

pub struct StatusReceiver {
    rx: mpsc::Receiver<StatusEnvelope>,
}

impl StatusReceiver {
    pub async fn recv(&mut self) -> Option<StatusEnvelope> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tickets_found_serializes_to_flat_wire_shape() {
        let msg = StatusMessage {
            event_id: "july-12".into(),
            report: DriverReport::TicketsFound {
                section_name: "Floor".into(),
                price: Some(Decimal::from(120)),
            },
        };

        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "eventId": "july-12",
                "status": "ticketsFound",
                "sectionName": "Floor",
                "price": 120.0
            })
        );
    }

    #[test]
    fn unit_phases_carry_only_the_tag() {
        let msg = StatusMessage {
            event_id: "e".into(),
            report: DriverReport::AddingToCart,
        };

        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"eventId": "e", "status": "addingToCart"})
        );
    }

    #[test]
    fn parses_inbound_error_and_success_messages() {
        let err: StatusMessage = serde_json::from_value(json!({
            "eventId": "july-13",
            "status": "cartError",
            "error": "Add to cart button not found"
        }))
        .unwrap();
        assert_eq!(err.report.phase(), Phase::CartError);

        let ok: StatusMessage = serde_json::from_value(json!({
            "eventId": "july-13",
            "status": "cartSuccess",
            "checkoutUrl": "https://tickets.example/cart"
        }))
        .unwrap();
        assert_eq!(
            ok.report,
            DriverReport::CartSuccess {
                checkout_url: "https://tickets.example/cart".into()
            }
        );
    }

    #[test]
    fn unknown_price_is_omitted() {
        let v = serde_json::to_value(DriverReport::TicketsFound {
            section_name: "Grada".into(),
            price: None,
        })
        .unwrap();
        assert!(v.get("price").is_none());
    }

    #[tokio::test]
    async fn senders_are_tagged_and_fifo() {
        let (hub, mut rx) = status_channel(8);
        let a = hub.sender_for("a", 1);
        let b = hub.sender_for("b", 3);

        a.emit(DriverReport::Starting).await;
        b.emit(DriverReport::Starting).await;
        a.emit(DriverReport::AddingToCart).await;

        let first = rx.recv().await.unwrap();
        assert_eq!((first.message.event_id.as_str(), first.attempt), ("a", 1));

        let second = rx.recv().await.unwrap();
        assert_eq!((second.message.event_id.as_str(), second.attempt), ("b", 3));

        let third = rx.recv().await.unwrap();
        assert_eq!(third.message.report, DriverReport::AddingToCart);
    }

    #[tokio::test]
    async fn emit_into_closed_channel_does_not_panic() {
        let (hub, rx) = status_channel(1);
        drop(rx);

        hub.sender_for("a", 1).emit(DriverReport::Starting).await;
    }
}
