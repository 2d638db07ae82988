//! Notification texts.

use rust_decimal::Decimal;

use super::BrowserNotice;

pub const STARTING: &str = "Starting automatic carting process";
pub const ACCESSING_PAGE: &str = "Accessing ticket page";

pub fn tickets_found(section: &str, price: Option<Decimal>) -> String {
    match price {
        Some(p) => format!("Tickets found! {section} - ${p}"),
        None => format!("Tickets found! {section} - price unknown"),
    }
}

pub fn quantity_selected(quantity: u8) -> String {
    format!("Selected {quantity} tickets")
}

pub fn adding_to_cart(quantity: u8) -> String {
    format!("Adding {quantity} tickets to cart")
}

pub fn success_block(event_name: &str, quantity: u8, checkout_url: &str) -> String {
    format!(
        "🎫 **TICKETS ADDED TO CART!** 🎫\n\
         Event: {event_name}\n\
         Quantity: {quantity}\n\
         [PROCEED TO CHECKOUT]({checkout_url})"
    )
}

pub fn failure_block(event_name: &str, reason: &str) -> String {
    format!(
        "❌ **Carting Failed** ❌\n\
         Event: {event_name}\n\
         Reason: {reason}"
    )
}

pub fn start_notice(event_name: &str) -> BrowserNotice {
    BrowserNotice::new(
        format!("Starting to cart {event_name}"),
        "Ticket carting process started",
    )
}

pub fn success_notice(event_name: &str, quantity: u8, checkout_url: &str) -> BrowserNotice {
    BrowserNotice::new(
        "Tickets Added to Cart!",
        format!("{quantity} tickets for {event_name} are in your cart!"),
    )
    .linking(checkout_url)
}

pub fn failure_notice(event_name: &str, reason: &str) -> BrowserNotice {
    BrowserNotice::new(
        "Carting Failed",
        format!("Could not add tickets for {event_name}: {reason}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tickets_found_keeps_rendered_precision() {
        let price = Decimal::new(12050, 2);
        assert_eq!(tickets_found("Floor", Some(price)), "Tickets found! Floor - $120.50");
        assert_eq!(
            tickets_found("Grada", None),
            "Tickets found! Grada - price unknown"
        );
    }

    #[test]
    fn success_block_links_checkout() {
        let msg = success_block("July 12", 2, "https://t.example/cart");
        assert_eq!(
            msg,
            "🎫 **TICKETS ADDED TO CART!** 🎫\nEvent: July 12\nQuantity: 2\n[PROCEED TO CHECKOUT](https://t.example/cart)"
        );
    }

    #[test]
    fn failure_block_carries_reason() {
        assert_eq!(
            failure_block("July 12", "No ticket sections found"),
            "❌ **Carting Failed** ❌\nEvent: July 12\nReason: No ticket sections found"
        );
    }
}
