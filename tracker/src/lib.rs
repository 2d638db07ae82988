pub mod config;
pub mod error;
pub mod notify;
pub mod tracker;

pub use config::TrackerConfig;
pub use error::TrackerError;
pub use notify::{
    BrowserNotice, BrowserSurface, CartNotification, HttpNotificationSink, LogSink,
    NotificationSink, TracingSurface,
};
pub use tracker::{CartTracker, TrackerDeps, TrackerHandle, spawn_tracker};
