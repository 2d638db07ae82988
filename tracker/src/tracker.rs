//! Carting session tracker.
//!
//! One actor task owns the active config and the `CartingSession`. Everything
//! that can change that state arrives in the actor loop as a message:
//!
//! - commands from `TrackerHandle` (start, config, status, shutdown);
//! - driver status envelopes, tagged with their attempt number;
//! - timer expiries (attempt deadline, retry cool-down), also tagged.
//!
//! Envelopes and timers for an attempt that is no longer the event's active
//! one are dropped, so an old driver or an old deadline can never touch a
//! newer attempt. State is always updated before notifications go out.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use common::logger::{attempt_span, warn_if_slow};
use common::time::now_utc;
use driver::{
    CartDriver, CartError, DriverReport, DriverTiming, Sandbox, StatusEnvelope, StatusHub,
    StatusReceiver, status_channel,
};
use session::store::{PreferenceStore, load_config, save_config};
use session::{
    CartAttempt, CartConfig, CartConfigPatch, CartingSession, EventId, EventTarget, Phase,
    SessionSnapshot, StartKind,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{Instrument, debug, error, info, info_span, instrument, warn};

use crate::config::TrackerConfig;
use crate::error::TrackerError;
use crate::notify::{BrowserSurface, CartNotification, NotificationSink, messages};

/// Collaborators the tracker talks to. All are shared trait objects so the
/// CLI and tests can plug in their own.
#[derive(Clone)]
pub struct TrackerDeps {
    pub sandbox: Arc<dyn Sandbox>,
    pub sink: Arc<dyn NotificationSink>,
    pub surface: Arc<dyn BrowserSurface>,
    pub store: Arc<dyn PreferenceStore>,
}

enum Command {
    Start {
        target: EventTarget,
        reply: oneshot::Sender<Result<u32, TrackerError>>,
    },
    UpdateConfig {
        patch: CartConfigPatch,
        reply: oneshot::Sender<Result<CartConfig, TrackerError>>,
    },
    Config {
        reply: oneshot::Sender<CartConfig>,
    },
    Status {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

#[derive(Debug)]
enum TimerEvent {
    Deadline { event_id: EventId, attempt: u32 },
    Retry { target: EventTarget, after: u32 },
}

struct RunningAttempt {
    attempt: u32,
    task: JoinHandle<()>,
}

/// Cloneable front door to the tracker task.
#[derive(Clone)]
pub struct TrackerHandle {
    tx: mpsc::Sender<Command>,
}

impl TrackerHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, TrackerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| TrackerError::Stopped)?;
        rx.await.map_err(|_| TrackerError::Stopped)
    }

    /// Starts carting for `target` and returns the attempt number.
    ///
    /// `TrackerError::Rejected` means nothing happened: carting is disabled,
    /// or the event is already active or completed.
    pub async fn start_automatic_carting(&self, target: EventTarget) -> Result<u32, TrackerError> {
        self.request(|reply| Command::Start { target, reply })
            .await?
    }

    /// Applies `patch`, persists the result and returns the new config.
    pub async fn update_config(&self, patch: CartConfigPatch) -> Result<CartConfig, TrackerError> {
        self.request(|reply| Command::UpdateConfig { patch, reply })
            .await?
    }

    pub async fn config(&self) -> Result<CartConfig, TrackerError> {
        self.request(|reply| Command::Config { reply }).await
    }

    pub async fn status(&self) -> Result<SessionSnapshot, TrackerError> {
        self.request(|reply| Command::Status { reply }).await
    }

    /// Stops the tracker, tearing down every running attempt.
    pub async fn shutdown(&self) -> Result<(), TrackerError> {
        self.request(|reply| Command::Shutdown { reply }).await
    }
}

/// Loads the saved config from the preference store and starts the tracker.
pub async fn spawn_tracker(
    settings: TrackerConfig,
    deps: TrackerDeps,
) -> anyhow::Result<TrackerHandle> {
    let config = load_config(deps.store.as_ref()).await?;
    Ok(CartTracker::spawn(settings, config, deps))
}

pub struct CartTracker {
    settings: TrackerConfig,
    config: CartConfig,
    session: CartingSession,
    deps: TrackerDeps,
    hub: StatusHub,
    timers: mpsc::UnboundedSender<TimerEvent>,
    running: HashMap<EventId, RunningAttempt>,
}

impl CartTracker {
    /// Spawns the actor task with `config` as the active cart config.
    pub fn spawn(settings: TrackerConfig, config: CartConfig, deps: TrackerDeps) -> TrackerHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(settings.command_capacity.max(1));
        let (hub, status_rx) = status_channel(settings.status_capacity);
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();

        let tracker = Self {
            settings,
            config,
            session: CartingSession::new(),
            deps,
            hub,
            timers: timer_tx,
            running: HashMap::new(),
        };

        tokio::spawn(
            tracker
                .run(cmd_rx, status_rx, timer_rx)
                .instrument(info_span!("cart_tracker")),
        );

        TrackerHandle { tx: cmd_tx }
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut status: StatusReceiver,
        mut timers: mpsc::UnboundedReceiver<TimerEvent>,
    ) {
        info!(
            enabled = self.config.enabled,
            ticket_quantity = self.config.ticket_quantity,
            max_price = %self.config.max_price,
            "cart tracker started"
        );

        loop {
            tokio::select! {
                cmd = commands.recv() => {
                    let Some(cmd) = cmd else {
                        debug!("all tracker handles dropped");
                        self.teardown_all().await;
                        break;
                    };
                    if self.on_command(cmd).await.is_break() {
                        break;
                    }
                }
                Some(envelope) = status.recv() => self.on_status(envelope).await,
                Some(timer) = timers.recv() => self.on_timer(timer).await,
            }
        }

        info!("cart tracker stopped");
    }

    async fn on_command(&mut self, cmd: Command) -> ControlFlow<()> {
        match cmd {
            Command::Start { target, reply } => {
                let res = self.start(target, StartKind::Manual);
                let _ = reply.send(res);
            }
            Command::UpdateConfig { patch, reply } => {
                let res = self.update_config(patch).await;
                let _ = reply.send(res);
            }
            Command::Config { reply } => {
                let _ = reply.send(self.config.clone());
            }
            Command::Status { reply } => {
                let _ = reply.send(self.session.snapshot());
            }
            Command::Shutdown { reply } => {
                self.teardown_all().await;
                let _ = reply.send(());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    #[instrument(skip(self, target), fields(event_id = %target.event_id))]
    fn start(&mut self, target: EventTarget, kind: StartKind) -> Result<u32, TrackerError> {
        let attempt = match self.session.begin(&target, &self.config, kind, now_utc()) {
            Ok(a) => a.clone(),
            Err(rejected) => {
                info!(event_name = %target.event_name, ?kind, reason = %rejected, "carting not started");
                return Err(rejected.into());
            }
        };
        let n = attempt.attempt;

        info!(event_name = %target.event_name, event_url = %target.event_url, attempt = n, "starting automatic carting");

        self.notify(&target, messages::STARTING);
        if self.config.notifications {
            self.deps
                .surface
                .show(messages::start_notice(&target.event_name));
        }

        self.session.advance(&target.event_id, n, Phase::CartPage);
        self.spawn_attempt(&attempt);
        self.arm(
            self.settings.attempt_timeout,
            TimerEvent::Deadline {
                event_id: target.event_id.clone(),
                attempt: n,
            },
        );
        self.notify(&target, messages::ACCESSING_PAGE);

        Ok(n)
    }

    /// Opens the sandbox and runs the driver on its own task, under the
    /// attempt's span. A sandbox that fails to open ends the attempt with a
    /// `cartError` like any other driver failure.
    fn spawn_attempt(&mut self, attempt: &CartAttempt) {
        let target = attempt.target();
        let status = self.hub.sender_for(&target.event_id, attempt.attempt);
        let sandbox = Arc::clone(&self.deps.sandbox);
        let config = self.config.clone();
        let timing = DriverTiming::bounded_by(self.settings.attempt_timeout);
        let span = attempt_span(&target.event_id, attempt.attempt, &attempt.trace_id);
        let event_id = target.event_id.clone();

        let task = tokio::spawn(
            async move {
                match sandbox.open(&target).await {
                    Ok(page) => CartDriver::new(page, &config, timing, status).run().await,
                    Err(e) => {
                        warn!(error = %e, "sandbox failed to open");
                        let error = CartError::from(e).to_string();
                        status.emit(DriverReport::CartError { error }).await;
                    }
                }
            }
            .instrument(span),
        );

        let previous = self.running.insert(
            event_id,
            RunningAttempt {
                attempt: attempt.attempt,
                task,
            },
        );
        if let Some(prev) = previous {
            prev.task.abort();
        }
    }

    async fn on_status(&mut self, envelope: StatusEnvelope) {
        let StatusEnvelope { attempt, message } = envelope;
        let event_id = message.event_id;
        let phase = message.report.phase();

        let Some(current) = self.session.active_attempt(&event_id, attempt) else {
            debug!(%event_id, attempt, %phase, "status for untracked attempt dropped");
            return;
        };
        let target = current.target();

        match message.report {
            // The tracker sets these itself when the attempt starts.
            DriverReport::Starting | DriverReport::CartPage => {
                debug!(%event_id, attempt, %phase, "driver attached");
            }
            DriverReport::TicketsFound {
                section_name,
                price,
            } => {
                if self.session.advance(&event_id, attempt, phase).is_some() {
                    self.notify(&target, messages::tickets_found(&section_name, price));
                }
            }
            DriverReport::QuantitySelected { quantity } => {
                if self.session.advance(&event_id, attempt, phase).is_some() {
                    self.notify(&target, messages::quantity_selected(quantity));
                }
            }
            DriverReport::AddingToCart => {
                if self.session.advance(&event_id, attempt, phase).is_some() {
                    self.notify(
                        &target,
                        messages::adding_to_cart(self.config.ticket_quantity),
                    );
                }
            }
            DriverReport::CartSuccess { checkout_url } => {
                self.succeed(&event_id, attempt, checkout_url).await;
            }
            DriverReport::CartError { error } => {
                self.fail(&event_id, attempt, error).await;
            }
        }
    }

    async fn succeed(&mut self, event_id: &str, attempt: u32, checkout_url: String) {
        let Some(done) = self
            .session
            .complete(event_id, attempt, checkout_url, now_utc())
        else {
            return;
        };
        let quantity = self.config.ticket_quantity;

        self.deps.sink.dispatch(
            CartNotification::new(
                &done.event_id,
                &done.event_name,
                messages::success_block(&done.event_name, quantity, &done.checkout_url),
            )
            .with_mentions(),
        );
        if self.config.notifications {
            self.deps.surface.show(messages::success_notice(
                &done.event_name,
                quantity,
                &done.checkout_url,
            ));
        }

        self.teardown(event_id).await;
        self.deps.surface.open(&done.checkout_url);
    }

    async fn fail(&mut self, event_id: &str, attempt: u32, reason: String) {
        let Some(failed) = self.session.fail(event_id, attempt, reason, now_utc()) else {
            return;
        };

        self.deps.sink.dispatch(CartNotification::new(
            &failed.event_id,
            &failed.event_name,
            messages::failure_block(&failed.event_name, &failed.reason),
        ));
        if self.config.notifications {
            self.deps
                .surface
                .show(messages::failure_notice(&failed.event_name, &failed.reason));
        }

        self.teardown(event_id).await;

        if failed.retry_scheduled {
            info!(
                event_id,
                attempt,
                retries_left = self.session.retries_remaining(event_id).unwrap_or(0),
                cooldown_secs = self.settings.retry_cooldown.as_secs(),
                "retry scheduled"
            );
            self.arm(
                self.settings.retry_cooldown,
                TimerEvent::Retry {
                    target: failed.target(),
                    after: attempt,
                },
            );
        }
    }

    async fn on_timer(&mut self, timer: TimerEvent) {
        match timer {
            TimerEvent::Deadline { event_id, attempt } => {
                if self.session.active_attempt(&event_id, attempt).is_none() {
                    debug!(%event_id, attempt, "deadline for finished attempt ignored");
                    return;
                }
                let reason = CartError::Timeout {
                    after: self.settings.attempt_timeout,
                }
                .to_string();
                warn!(%event_id, attempt, "carting attempt timed out");
                self.fail(&event_id, attempt, reason).await;
            }
            TimerEvent::Retry { target, after } => {
                if !self.config.enabled {
                    info!(event_id = %target.event_id, after, "carting disabled; retry abandoned");
                    self.session.abandon_retry(&target.event_id, after);
                    return;
                }
                // A manual restart during the cool-down makes this retry stale;
                // `begin` rejects it.
                let _ = self.start(target, StartKind::Retry { after });
            }
        }
    }

    async fn update_config(&mut self, patch: CartConfigPatch) -> Result<CartConfig, TrackerError> {
        let next = self.config.apply(patch)?;
        self.config = next.clone();

        info!(
            enabled = next.enabled,
            ticket_quantity = next.ticket_quantity,
            max_price = %next.max_price,
            preferred_sections = ?next.preferred_sections,
            "cart configuration updated"
        );

        warn_if_slow(
            "save_cart_config",
            Duration::from_millis(250),
            save_config(self.deps.store.as_ref(), &next),
        )
        .await
        .map_err(|e| {
            error!(error = ?e, "cart configuration not persisted");
            TrackerError::Persist(e.to_string())
        })?;

        Ok(next)
    }

    async fn teardown(&mut self, event_id: &str) {
        if let Some(running) = self.running.remove(event_id) {
            running.task.abort();
            debug!(event_id, attempt = running.attempt, "driver task stopped");
        }
        self.deps.sandbox.close(event_id).await;
    }

    async fn teardown_all(&mut self) {
        let ids: Vec<EventId> = self.running.keys().cloned().collect();
        for id in ids {
            self.teardown(&id).await;
        }
    }

    fn notify(&self, target: &EventTarget, message: impl Into<String>) {
        self.deps.sink.dispatch(CartNotification::new(
            &target.event_id,
            &target.event_name,
            message,
        ));
    }

    fn arm(&self, delay: Duration, timer: TimerEvent) {
        let tx = self.timers.clone();
        tokio::spawn(async move {
            sleep(delay).await;
            let _ = tx.send(timer);
        });
    }
}
