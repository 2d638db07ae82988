use std::time::Duration;

#[derive(Clone, Debug)]
pub struct TrackerConfig {
    /// Preference store connection string.
    pub database_url: String,

    /// Base URL of the service exposing `/api/send-cart-notification`.
    /// `None` routes notifications to the log only.
    pub notify_base_url: Option<String>,

    // =========================
    // Attempt lifecycle
    // =========================
    /// Hard deadline for one attempt, measured from its start. An attempt
    /// still active when it fires is failed with a timeout.
    pub attempt_timeout: Duration,

    /// Wait between a failed attempt and its automatic retry.
    pub retry_cooldown: Duration,

    // =========================
    // Channels
    // =========================
    /// Capacity of the driver → tracker status channel.
    ///
    /// Drivers block on a full channel, which slows them down rather than
    /// dropping phase reports.
    pub status_capacity: usize,

    /// Capacity of the handle → tracker command channel.
    pub command_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://cart_prefs.db".to_string(),
            notify_base_url: None,
            attempt_timeout: Duration::from_secs(5 * 60),
            retry_cooldown: Duration::from_secs(30),
            status_capacity: 256,
            command_capacity: 64,
        }
    }
}

impl TrackerConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(url) = std::env::var("DATABASE_URL") {
            cfg.database_url = url;
        }
        cfg.notify_base_url = std::env::var("NOTIFY_BASE_URL")
            .ok()
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty());

        if let Some(d) = env_secs("CART_ATTEMPT_TIMEOUT_SECS") {
            cfg.attempt_timeout = d;
        }
        if let Some(d) = env_secs("CART_RETRY_COOLDOWN_SECS") {
            cfg.retry_cooldown = d;
        }

        cfg
    }
}

fn env_secs(key: &str) -> Option<Duration> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(e) => {
            tracing::warn!(key, value = %raw, error = %e, "ignoring malformed duration");
            None
        }
    }
}
