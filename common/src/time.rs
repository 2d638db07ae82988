use chrono::{DateTime, Utc};

/// Wall-clock timestamp recorded on attempts and terminal records.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

pub fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}
