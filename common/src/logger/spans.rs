use std::time::{Duration, Instant};

use tracing::Span;

use super::TraceId;

/// Root span for one carting attempt. Driver and tracker logs for the attempt
/// are emitted under it.
pub fn attempt_span(event_id: &str, attempt: u32, trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "cart_attempt",
        event_id = %event_id,
        attempt,
        trace_id = %trace_id
    )
}

/// Awaits `fut` and logs a warning under the `performance` target when it
/// took longer than `budget`.
pub async fn warn_if_slow<F, T>(op: &'static str, budget: Duration, fut: F) -> T
where
    F: std::future::Future<Output = T>,
{
    let started = Instant::now();
    let out = fut.await;

    let took = started.elapsed();
    if took > budget {
        tracing::warn!(
            target: "performance",
            op,
            took_ms = u64::try_from(took.as_millis()).unwrap_or(u64::MAX),
            budget_ms = u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
            "slow operation"
        );
    }
    out
}
