//! Cart driver.
//!
//! Runs inside one sandboxed page and walks it through
//! locate → select → quantity → submit → verify, reporting every phase over
//! its `StatusSender`. The driver has no return value: the tracker learns the
//! outcome only from the final `cartSuccess` / `cartError` report.
//!
//! The page is never trusted to have done what was asked. After every action
//! the driver waits a settle delay and re-reads live page state.

use std::sync::Arc;
use std::time::Duration;

use listing::{SelectionPolicy, select_section};
use session::CartConfig;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::error::CartError;
use crate::page::TicketPage;
use crate::status::{DriverReport, StatusSender};

/// Settle delays and the verification poll bound.
#[derive(Clone, Debug)]
pub struct DriverTiming {
    /// After clicking the chosen section.
    pub section_settle: Duration,
    /// After setting the quantity.
    pub quantity_settle: Duration,
    /// After submitting to cart.
    pub submit_settle: Duration,
    /// Between verification polls.
    pub verify_interval: Duration,
    /// Verification polls before giving up.
    pub max_verify_polls: u32,
}

impl Default for DriverTiming {
    fn default() -> Self {
        Self::bounded_by(Duration::from_secs(5 * 60))
    }
}

impl DriverTiming {
    /// Default delays with the poll count derived from the attempt deadline,
    /// so the verify loop cannot outlive the attempt.
    pub fn bounded_by(attempt_timeout: Duration) -> Self {
        let verify_interval = Duration::from_secs(2);
        let polls = attempt_timeout
            .as_millis()
            .div_ceil(verify_interval.as_millis())
            .max(1);

        Self {
            section_settle: Duration::from_millis(1_000),
            quantity_settle: Duration::from_millis(500),
            submit_settle: Duration::from_millis(3_000),
            verify_interval,
            max_verify_polls: u32::try_from(polls).unwrap_or(u32::MAX),
        }
    }
}

pub struct CartDriver {
    page: Arc<dyn TicketPage>,
    policy: SelectionPolicy,
    quantity: u8,
    timing: DriverTiming,
    status: StatusSender,
}

impl CartDriver {
    pub fn new(
        page: Arc<dyn TicketPage>,
        config: &CartConfig,
        timing: DriverTiming,
        status: StatusSender,
    ) -> Self {
        Self {
            page,
            policy: config.selection_policy(),
            quantity: config.ticket_quantity,
            timing,
            status,
        }
    }

    /// Drives the page to a terminal outcome and reports it.
    #[instrument(
        skip(self),
        target = "driver",
        fields(event_id = %self.status.event_id(), attempt = self.status.attempt())
    )]
    pub async fn run(self) {
        self.status.emit(DriverReport::Starting).await;

        let report = match self.drive().await {
            Ok(checkout_url) => {
                info!(%checkout_url, "tickets in cart");
                DriverReport::CartSuccess { checkout_url }
            }
            Err(e) => {
                warn!(error = %e, "carting attempt failed");
                DriverReport::CartError {
                    error: e.to_string(),
                }
            }
        };

        self.status.emit(report).await;
    }

    async fn drive(&self) -> Result<String, CartError> {
        // Already sitting on a cart page (e.g. reloaded after a prior add).
        let url = self.page.current_url().await?;
        if is_cart_url(&url) {
            info!(%url, "page already at cart");
            return Ok(url);
        }

        self.locate().await?;
        self.select().await?;
        self.choose_quantity().await?;
        self.submit().await?;
        self.verify().await
    }

    async fn locate(&self) -> Result<(), CartError> {
        if !self.page.is_selection_page().await? {
            return Err(CartError::NotOnSelectionPage);
        }
        debug!("on ticket selection page");
        Ok(())
    }

    async fn select(&self) -> Result<(), CartError> {
        let sections = self.page.sections().await?;
        if sections.is_empty() {
            return Err(CartError::NoSections);
        }
        debug!(count = sections.len(), "ticket sections found");

        let Some(choice) = select_section(&sections, &self.policy) else {
            return Err(CartError::NoSuitableTickets);
        };

        info!(
            section = %choice.section.name,
            price = ?choice.section.price,
            fallback = choice.fallback,
            "section selected"
        );

        self.status
            .emit(DriverReport::TicketsFound {
                section_name: choice.section.name.clone(),
                price: choice.section.price,
            })
            .await;

        self.page.click_section(choice.index).await?;
        sleep(self.timing.section_settle).await;
        Ok(())
    }

    async fn choose_quantity(&self) -> Result<(), CartError> {
        if !self.page.set_quantity(self.quantity).await? {
            warn!(error = %CartError::QuantityControlMissing, "continuing to submit");
            return Ok(());
        }

        self.status
            .emit(DriverReport::QuantitySelected {
                quantity: self.quantity,
            })
            .await;

        sleep(self.timing.quantity_settle).await;
        Ok(())
    }

    async fn submit(&self) -> Result<(), CartError> {
        if !self.page.submit().await? {
            return Err(CartError::SubmitControlMissing);
        }

        self.status.emit(DriverReport::AddingToCart).await;
        sleep(self.timing.submit_settle).await;
        Ok(())
    }

    async fn verify(&self) -> Result<String, CartError> {
        let max = self.timing.max_verify_polls.max(1);

        for poll in 1..=max {
            let url = self.page.current_url().await?;
            if is_cart_url(&url) || self.page.has_cart_summary().await? {
                return Ok(url);
            }

            if let Some(text) = self.page.error_message().await? {
                let text = text.trim();
                let text = if text.is_empty() {
                    "Error adding to cart"
                } else {
                    text
                };
                return Err(CartError::PageErrorMessage(text.to_string()));
            }

            debug!(poll, max, "cart not reached yet");
            if poll < max {
                sleep(self.timing.verify_interval).await;
            }
        }

        Err(CartError::VerificationExhausted)
    }
}

/// Cart and checkout pages are recognised by path.
pub fn is_cart_url(url: &str) -> bool {
    url.contains("/cart") || url.contains("/checkout")
}
