pub mod price;
pub mod selector;
pub mod types;

pub use price::parse_price;
pub use selector::{Selection, select_section};
pub use types::{SelectionPolicy, TicketSection};
