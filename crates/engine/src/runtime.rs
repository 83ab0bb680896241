// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wake dispatcher for the reminder engine
//!
//! The host calls one named handler per event. Handlers run to completion
//! without awaiting; user-facing side effects are spawned through the
//! engine's [`Lifetime`] so the host can tell when it is safe to stop.

use crate::delivery::{Delivery, DeliveryOutcome, DeliverySink, Repeats};
use crate::error::EngineError;
use crate::lifetime::Lifetime;
use crate::reconcile::WindowReconciler;
use crate::state::EngineState;
use chrono::NaiveDateTime;
use kusuri_adapters::{NotifyAdapter, WindowAdapter, WindowError};
use kusuri_core::{
    AckLedger, Acknowledgements, ClientMessage, Clock, ControlMessage, EngineConfig,
    NotificationTag, Renotify, Schedule,
};

/// Host collaborators the engine talks to
pub struct EngineDeps<N, W> {
    pub notify: N,
    pub windows: W,
}

/// Result of one periodic wake
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WakeReport {
    /// Reminders inside the window
    pub due: usize,
    /// Notifications actually dispatched
    pub delivered: usize,
    /// Timers armed by self-healing, if it ran
    pub rearmed: Option<usize>,
}

/// What a notification tap did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowAction {
    Focused(String),
    Opened,
}

pub struct Engine<N: NotifyAdapter, W: WindowAdapter, C: Clock> {
    config: EngineConfig,
    state: EngineState,
    reconciler: WindowReconciler,
    sink: DeliverySink<N>,
    windows: W,
    clock: C,
    acks: AckLedger,
    lifetime: Lifetime,
}

impl<N, W, C> Engine<N, W, C>
where
    N: NotifyAdapter,
    W: WindowAdapter,
    C: Clock,
{
    pub fn new(deps: EngineDeps<N, W>, config: EngineConfig, clock: C) -> Result<Self, EngineError> {
        config.validate()?;
        let lifetime = Lifetime::new();
        Ok(Self {
            reconciler: WindowReconciler::new(config.window),
            sink: DeliverySink::new(deps.notify, config.notification.clone(), lifetime.clone()),
            windows: deps.windows,
            state: EngineState::new(),
            acks: AckLedger::new(),
            config,
            clock,
            lifetime,
        })
    }

    /// A fresh background process: nothing survives from a previous one
    pub fn on_install(&mut self) {
        self.state.reset();
        self.acks.clear();
        self.sink.reset();
        tracing::info!("engine installed");
    }

    /// Claim clients and ask every one of them to resend its schedule.
    ///
    /// Engine state is untouched; the returned messages are for broadcast.
    pub fn on_activate(&mut self) -> Vec<ClientMessage> {
        tracing::info!(
            supplied = self.state.is_supplied(),
            "engine activated, requesting reschedule"
        );
        vec![ClientMessage::RequestReschedule]
    }

    /// A client connected to the control channel.
    ///
    /// Until a schedule has been supplied, each new client is asked for one.
    pub fn on_client_connected(&self) -> Option<ClientMessage> {
        if self.state.is_supplied() {
            None
        } else {
            Some(ClientMessage::RequestReschedule)
        }
    }

    pub fn on_message(&mut self, message: ControlMessage) -> Option<ClientMessage> {
        tracing::debug!(kind = message.kind(), "control message");
        match message {
            ControlMessage::Schedule { times } => {
                let count = times.len();
                let armed = self.state.replace_schedule(times, self.clock.now());
                tracing::info!(count, armed, "schedule replaced");
                Some(ClientMessage::ScheduleAck { count })
            }
            ControlMessage::CheckNow { times, checks } => {
                let now = self.clock.now();
                // An explicit check always shows what is still open
                let report = self.reconcile(
                    &times,
                    now,
                    Some(&checks),
                    Renotify::Suppress,
                    Repeats::Deliver,
                );
                tracing::info!(
                    due = report.due,
                    delivered = report.delivered,
                    acknowledged = checks.len(),
                    "check-now"
                );
                self.acks.record(now.date(), checks);
                None
            }
            ControlMessage::Ping => Some(ClientMessage::Pong {
                scheduled: self.state.schedule().len(),
                timers: self.state.timers().armed_count(),
            }),
        }
    }

    /// Fire every timer whose instant has been reached, then re-arm each for
    /// its next occurrence. Returns the number fired.
    pub fn on_timer_deadline(&mut self) -> usize {
        let now = self.clock.now();
        let fired = self.state.timers_mut().fire_due(now);

        for timer in &fired {
            tracing::info!(id = %timer.id, tag = %timer.tag, target = %timer.target, "timer fired");
            self.sink.dispatch(Delivery {
                tag: timer.tag.clone(),
                message: timer.message.clone(),
                occurrence: timer.target.date(),
                renotify: Renotify::Replace,
            });
            match self.state.timers_mut().rearm(timer.id, now) {
                Some(next) => tracing::debug!(id = %timer.id, %next, "re-armed"),
                None => tracing::warn!(id = %timer.id, "timer could not be re-armed"),
            }
        }
        fired.len()
    }

    /// Coarse host wake. Wakes with a tag other than the configured one are
    /// ignored.
    pub fn on_periodic_wake(&mut self, tag: &str) -> WakeReport {
        if tag != self.config.wake_tag {
            tracing::debug!(tag, "ignoring unrelated periodic wake");
            return WakeReport::default();
        }
        if self.state.schedule().is_empty() {
            tracing::debug!("periodic wake with empty schedule");
            return WakeReport::default();
        }

        let now = self.clock.now();
        let schedule = self.state.schedule().clone();
        let acks = self.acks.for_date(now.date()).cloned();
        // Without renotify, repeated wakes inside one window stay quiet
        let renotify = self.config.reconcile_policy();
        let repeats = match renotify {
            Renotify::Suppress => Repeats::SkipIssued,
            Renotify::Replace => Repeats::Deliver,
        };
        let mut report = self.reconcile(&schedule, now, acks.as_ref(), renotify, repeats);

        // A silently restarted process loses its timers
        if self.state.timers().armed_count() == 0 {
            let armed = self.state.rearm(now);
            tracing::info!(armed, "self-healing: re-armed timers");
            report.rearmed = Some(armed);
        }

        tracing::info!(due = report.due, delivered = report.delivered, "periodic wake");
        report
    }

    /// Focus the app window, or open one
    pub fn on_notification_click(&self, tag: &NotificationTag) {
        tracing::info!(%tag, "notification clicked");
        let windows = self.windows.clone();
        let app_url = self.config.app_url.clone();
        self.lifetime.wait_until(async move {
            match focus_or_open(&windows, &app_url).await {
                Ok(action) => tracing::debug!(?action, "handled notification click"),
                Err(e) => tracing::warn!(error = %e, "notification click failed"),
            }
        });
    }

    /// One reconciliation pass; every due reminder is recorded as issued
    fn reconcile(
        &mut self,
        schedule: &Schedule,
        now: NaiveDateTime,
        acks: Option<&Acknowledgements>,
        renotify: Renotify,
        repeats: Repeats,
    ) -> WakeReport {
        let due = self.reconciler.due(schedule, now, acks);
        let due_count = due.len();

        let deliveries = due
            .into_iter()
            .map(|reminder| {
                tracing::debug!(
                    tag = %reminder.tag,
                    offset = reminder.offset_minutes,
                    "reminder due"
                );
                Delivery {
                    tag: reminder.tag,
                    message: reminder.spec.message.clone(),
                    occurrence: reminder.occurrence,
                    renotify,
                }
            })
            .collect();

        let outcomes = self.sink.deliver_pass(deliveries, repeats);
        WakeReport {
            due: due_count,
            delivered: outcomes
                .iter()
                .filter(|o| **o == DeliveryOutcome::Dispatched)
                .count(),
            rearmed: None,
        }
    }

    /// Earliest armed timer
    pub fn next_deadline(&self) -> Option<NaiveDateTime> {
        self.state.timers().next_deadline()
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn lifetime(&self) -> &Lifetime {
        &self.lifetime
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

/// Focus an existing app window at the root, or open one
pub async fn focus_or_open<W: WindowAdapter>(
    windows: &W,
    app_url: &str,
) -> Result<WindowAction, WindowError> {
    let base = app_url.trim_end_matches('/');
    let clients = windows.clients().await?;

    let existing = clients.into_iter().find(|client| {
        let url = client.url.as_str();
        url.starts_with(base) && (url.ends_with('/') || url.contains("index.html") || url == base)
    });

    match existing {
        Some(client) => {
            windows.focus(&client.id).await?;
            Ok(WindowAction::Focused(client.id))
        }
        None => {
            windows.open(app_url).await?;
            Ok(WindowAction::Opened)
        }
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
