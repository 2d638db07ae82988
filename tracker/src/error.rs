use session::{ConfigError, StartRejected};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    /// The tracker task has exited; the handle is dangling.
    #[error("tracker is not running")]
    Stopped,

    #[error(transparent)]
    Rejected(#[from] StartRejected),

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),

    /// The update is live in memory but could not be written to the store.
    #[error("failed to persist cart configuration: {0}")]
    Persist(String),
}
