use std::sync::Arc;

use async_trait::async_trait;
use listing::TicketSection;
use session::EventTarget;

use crate::error::PageError;

/// The ticket site as seen from inside one sandboxed page.
///
/// Implementations wrap a real browser tab or a scripted fixture. Every call
/// reads live page state; nothing is cached between calls because the page
/// may navigate at any time.
#[async_trait]
pub trait TicketPage: Send + Sync {
    async fn current_url(&self) -> Result<String, PageError>;

    /// Structural marker of the ticket-selection page is present.
    async fn is_selection_page(&self) -> Result<bool, PageError>;

    /// A cart or checkout summary is rendered.
    async fn has_cart_summary(&self) -> Result<bool, PageError>;

    /// Sections in document order.
    async fn sections(&self) -> Result<Vec<TicketSection>, PageError>;

    async fn click_section(&self, index: usize) -> Result<(), PageError>;

    /// Sets the quantity control and fires its change notification.
    /// `Ok(false)` when no quantity control is rendered.
    async fn set_quantity(&self, quantity: u8) -> Result<bool, PageError>;

    /// Triggers the add-to-cart control. `Ok(false)` when it is absent.
    async fn submit(&self) -> Result<bool, PageError>;

    /// Text of the first visible error banner, if any.
    async fn error_message(&self) -> Result<Option<String>, PageError>;
}

/// Opens and tears down isolated page contexts, one per event.
#[async_trait]
pub trait Sandbox: Send + Sync + 'static {
    async fn open(&self, target: &EventTarget) -> Result<Arc<dyn TicketPage>, PageError>;

    /// Releases the context opened for `event_id`. Idempotent.
    async fn close(&self, event_id: &str);
}
