//! Carting session bookkeeping.
//!
//! Holds the three per-event maps (active, completed, failed), the last
//! reported phase per event and each event's retry budget. Pure state: no
//! timers, no I/O. The tracker drives it from a single task, so every method
//! takes `&mut self` and no locking is involved.
//!
//! Invariants:
//! - an event id is in at most one of {active, completed};
//! - a failed record is removed when the retry (or a manual restart) begins;
//! - automatic retries per event never exceed `auto_retry_attempts` read at
//!   the event's first start; manual restarts do not refill the budget;
//! - attempt numbers for an event are never reused.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::logger::TraceId;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::CartConfig;
use crate::model::{CartAttempt, CompletedCart, EventId, EventTarget, FailedCart, Phase};

/// Why a start request did not create an attempt. All of these are no-ops
/// from the caller's point of view.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StartRejected {
    #[error("automatic carting is disabled")]
    Disabled,

    #[error("carting already in progress")]
    AlreadyActive,

    #[error("carting already completed")]
    AlreadyCompleted,

    #[error("retry no longer applies to this event")]
    StaleRetry,
}

/// How an attempt is being started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartKind {
    /// User/caller initiated.
    Manual,
    /// Scheduled by a failure of attempt `after`.
    Retry { after: u32 },
}

/// A non-terminal phase change applied to an active attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Phase,
    pub to: Phase,
}

#[derive(Debug, Clone, Copy)]
struct RetryBudget {
    remaining: u32,
    attempts: u32,
}

#[derive(Default)]
pub struct CartingSession {
    active: HashMap<EventId, CartAttempt>,
    completed: HashMap<EventId, CompletedCart>,
    failed: HashMap<EventId, FailedCart>,
    last_status: HashMap<EventId, Phase>,
    budgets: HashMap<EventId, RetryBudget>,
}

impl CartingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new active attempt in phase `starting`.
    pub fn begin(
        &mut self,
        target: &EventTarget,
        config: &CartConfig,
        kind: StartKind,
        now: DateTime<Utc>,
    ) -> Result<&CartAttempt, StartRejected> {
        let id = &target.event_id;

        if !config.enabled {
            return Err(StartRejected::Disabled);
        }
        if self.active.contains_key(id) {
            return Err(StartRejected::AlreadyActive);
        }
        if self.completed.contains_key(id) {
            return Err(StartRejected::AlreadyCompleted);
        }

        let pending_retry = self
            .failed
            .get(id)
            .filter(|f| f.retry_scheduled)
            .map(|f| f.attempt);

        if let StartKind::Retry { after } = kind {
            if pending_retry != Some(after) {
                return Err(StartRejected::StaleRetry);
            }
        }

        // The budget is read once per event and never refilled, so attempt
        // numbers keep rising across manual restarts.
        let budget = self.budgets.entry(id.clone()).or_insert(RetryBudget {
            remaining: config.auto_retry_attempts,
            attempts: 0,
        });
        budget.attempts += 1;
        let attempt_no = budget.attempts;

        self.failed.remove(id);
        self.last_status.insert(id.clone(), Phase::Starting);

        let attempt = CartAttempt {
            event_id: id.clone(),
            event_url: target.event_url.clone(),
            event_name: target.event_name.clone(),
            start_time: now,
            status: Phase::Starting,
            attempt: attempt_no,
            trace_id: TraceId::new(),
        };

        info!(event_id = %id, attempt = attempt_no, ?kind, "carting attempt created");

        Ok(&*self.active.entry(id.clone()).or_insert(attempt))
    }

    /// Returns the active attempt only if it is the given attempt number.
    pub fn active_attempt(&self, event_id: &str, attempt: u32) -> Option<&CartAttempt> {
        self.active.get(event_id).filter(|a| a.attempt == attempt)
    }

    /// Applies a non-terminal phase. `None` when the attempt is not the
    /// current active one, when the phase is terminal, or when nothing
    /// changed.
    pub fn advance(&mut self, event_id: &str, attempt: u32, phase: Phase) -> Option<Transition> {
        if phase.is_terminal() {
            warn!(event_id, %phase, "terminal phase passed to advance; ignored");
            return None;
        }

        let a = self
            .active
            .get_mut(event_id)
            .filter(|a| a.attempt == attempt)?;

        if a.status == phase {
            return None;
        }

        let from = a.status;
        a.status = phase;
        self.last_status.insert(event_id.to_string(), phase);

        debug!(event_id, attempt, %from, to = %phase, "phase advanced");

        Some(Transition { from, to: phase })
    }

    /// Moves the attempt to `completed`.
    pub fn complete(
        &mut self,
        event_id: &str,
        attempt: u32,
        checkout_url: String,
        now: DateTime<Utc>,
    ) -> Option<CompletedCart> {
        self.active_attempt(event_id, attempt)?;
        let a = self.active.remove(event_id)?;

        let done = CompletedCart {
            event_id: a.event_id.clone(),
            event_name: a.event_name,
            completed_time: now,
            checkout_url,
            attempt,
        };

        self.completed.insert(a.event_id.clone(), done.clone());
        self.last_status.insert(a.event_id.clone(), Phase::CartSuccess);
        self.budgets.remove(&a.event_id);

        info!(event_id, attempt, "carting attempt completed");
        Some(done)
    }

    /// Moves the attempt to `failed`, consuming one retry if any remain.
    /// The returned record says whether a retry should be scheduled.
    pub fn fail(
        &mut self,
        event_id: &str,
        attempt: u32,
        reason: String,
        now: DateTime<Utc>,
    ) -> Option<FailedCart> {
        self.active_attempt(event_id, attempt)?;
        let a = self.active.remove(event_id)?;

        let retry_scheduled = match self.budgets.get_mut(event_id) {
            Some(b) if b.remaining > 0 => {
                b.remaining -= 1;
                true
            }
            _ => false,
        };

        let record = FailedCart {
            event_id: a.event_id.clone(),
            event_url: a.event_url,
            event_name: a.event_name,
            failed_time: now,
            reason,
            attempt,
            retry_scheduled,
        };

        self.failed.insert(a.event_id.clone(), record.clone());
        self.last_status.insert(a.event_id, Phase::CartError);

        info!(
            event_id,
            attempt,
            retry_scheduled,
            reason = %record.reason,
            "carting attempt failed"
        );
        Some(record)
    }

    /// Marks a queued retry as abandoned (e.g. carting was disabled before
    /// the cool-down elapsed).
    pub fn abandon_retry(&mut self, event_id: &str, after: u32) {
        if let Some(f) = self
            .failed
            .get_mut(event_id)
            .filter(|f| f.attempt == after && f.retry_scheduled)
        {
            f.retry_scheduled = false;
            debug!(event_id, after, "queued retry abandoned");
        }
    }

    pub fn retries_remaining(&self, event_id: &str) -> Option<u32> {
        self.budgets.get(event_id).map(|b| b.remaining)
    }

    pub fn last_status(&self, event_id: &str) -> Option<Phase> {
        self.last_status.get(event_id).copied()
    }

    pub fn is_active(&self, event_id: &str) -> bool {
        self.active.contains_key(event_id)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            active: self.active.clone(),
            completed: self.completed.clone(),
            failed: self.failed.clone(),
            last_status: self.last_status.clone(),
        }
    }
}

/// Point-in-time copy of the session maps.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub active: HashMap<EventId, CartAttempt>,
    pub completed: HashMap<EventId, CompletedCart>,
    pub failed: HashMap<EventId, FailedCart>,
    pub last_status: HashMap<EventId, Phase>,
}
