pub mod driver;
pub mod error;
pub mod fixture;
pub mod page;
pub mod status;

pub use driver::{CartDriver, DriverTiming};
pub use error::{CartError, PageError};
pub use page::{Sandbox, TicketPage};
pub use status::{
    DriverReport, StatusEnvelope, StatusHub, StatusMessage, StatusReceiver, StatusSender,
    status_channel,
};
