use std::time::Duration;

use thiserror::Error;

/// Failures of the page/browser layer itself.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PageError {
    #[error("page context closed")]
    Closed,

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("page script failed: {0}")]
    Script(String),
}

/// Why a carting attempt ended without tickets in the cart.
///
/// Every variant is attempt-local: it ends one attempt and is reported to the
/// tracker as a `cartError` with this display text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CartError {
    #[error("Not on ticket selection page")]
    NotOnSelectionPage,

    #[error("No ticket sections found")]
    NoSections,

    #[error("No suitable tickets found within price range")]
    NoSuitableTickets,

    /// Non-fatal: the driver logs it and goes straight to submit.
    #[error("Quantity selector not found")]
    QuantityControlMissing,

    #[error("Add to cart button not found")]
    SubmitControlMissing,

    /// Text of an error banner rendered by the site.
    #[error("{0}")]
    PageErrorMessage(String),

    #[error("Cart status could not be verified")]
    VerificationExhausted,

    #[error("Carting process timed out after {}", deadline_text(.after))]
    Timeout { after: Duration },

    #[error("{0}")]
    Page(#[from] PageError),
}

/// "5 minutes" for whole minutes, "90 seconds" otherwise.
fn deadline_text(after: &Duration) -> String {
    let secs = after.as_secs();
    match (secs / 60, secs % 60) {
        (1, 0) => "1 minute".to_string(),
        (m, 0) if m > 0 => format!("{m} minutes"),
        _ => format!("{secs} seconds"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_reason_names_the_real_deadline() {
        let reason = |secs| CartError::Timeout { after: Duration::from_secs(secs) }.to_string();

        assert_eq!(reason(300), "Carting process timed out after 5 minutes");
        assert_eq!(reason(60), "Carting process timed out after 1 minute");
        assert_eq!(reason(30), "Carting process timed out after 30 seconds");
        assert_eq!(reason(90), "Carting process timed out after 90 seconds");
    }
}
