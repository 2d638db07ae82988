pub mod config;
pub mod manager;
pub mod model;
pub mod store;

pub use config::{CartConfig, CartConfigPatch, ConfigError};
pub use manager::{CartingSession, SessionSnapshot, StartKind, StartRejected, Transition};
pub use model::{CartAttempt, CompletedCart, EventId, EventTarget, FailedCart, Phase};
