// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification delivery with per-occurrence de-duplication
//!
//! Both the timer path and the reconciliation path end here. Reconciliation
//! hands over a whole pass at once; with [`Repeats::SkipIssued`] a tag whose
//! occurrence an earlier pass already issued is dropped, while reminders due
//! in the same pass never suppress each other.
//!
//! Display itself is fire-and-forget. Failures are logged and not retried,
//! so a revoked permission never turns into a retry loop.

use crate::lifetime::Lifetime;
use chrono::{Days, NaiveDate};
use kusuri_adapters::{NotifyAdapter, NotifyError};
use kusuri_core::{NotificationTag, NotificationTemplate, Renotify};
use std::collections::HashMap;

/// A request to alert the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub tag: NotificationTag,
    pub message: String,
    pub occurrence: NaiveDate,
    pub renotify: Renotify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Dispatched,
    /// Issued by an earlier pass for this occurrence
    Suppressed,
}

/// How a reconciliation pass treats occurrences earlier passes issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeats {
    Deliver,
    SkipIssued,
}

pub struct DeliverySink<N: NotifyAdapter> {
    notify: N,
    template: NotificationTemplate,
    issued: HashMap<NotificationTag, NaiveDate>,
    lifetime: Lifetime,
}

impl<N: NotifyAdapter> DeliverySink<N> {
    pub fn new(notify: N, template: NotificationTemplate, lifetime: Lifetime) -> Self {
        Self {
            notify,
            template,
            issued: HashMap::new(),
            lifetime,
        }
    }

    /// Show one notification without touching the issued ledger
    pub fn dispatch(&self, delivery: Delivery) {
        let Delivery {
            tag,
            message,
            occurrence,
            renotify,
        } = delivery;

        let notification = self
            .template
            .render(tag.clone(), message)
            .with_renotify(renotify);
        let notify = self.notify.clone();
        self.lifetime.wait_until(async move {
            match notify.show(&notification).await {
                Ok(()) => tracing::info!(tag = %notification.tag, "reminder delivered"),
                Err(NotifyError::PermissionDenied) => {
                    tracing::warn!(tag = %notification.tag, "notification permission denied")
                }
                Err(e) => tracing::warn!(tag = %notification.tag, error = %e, "delivery failed"),
            }
        });

        tracing::debug!(%tag, %occurrence, ?renotify, "dispatched");
    }

    /// Deliver one reconciliation pass and record it as issued.
    ///
    /// Outcomes are in input order. The ledger is consulted as it stood
    /// before the pass, so same-time reminders all go out together.
    pub fn deliver_pass(
        &mut self,
        deliveries: Vec<Delivery>,
        repeats: Repeats,
    ) -> Vec<DeliveryOutcome> {
        let mut issued = Vec::with_capacity(deliveries.len());
        let outcomes = deliveries
            .into_iter()
            .map(|delivery| {
                let repeat = self.issued_on(&delivery.tag) == Some(delivery.occurrence);
                if repeats == Repeats::SkipIssued && repeat {
                    tracing::debug!(
                        tag = %delivery.tag,
                        occurrence = %delivery.occurrence,
                        "already delivered, suppressing"
                    );
                    return DeliveryOutcome::Suppressed;
                }
                issued.push((delivery.tag.clone(), delivery.occurrence));
                self.dispatch(delivery);
                DeliveryOutcome::Dispatched
            })
            .collect();

        if let Some(latest) = issued.iter().map(|(_, date)| *date).max() {
            self.issued.extend(issued);
            self.prune(latest);
        }
        outcomes
    }

    /// Occurrence date the tag was last issued for
    pub fn issued_on(&self, tag: &NotificationTag) -> Option<NaiveDate> {
        self.issued.get(tag).copied()
    }

    /// Forget every issued occurrence
    pub fn reset(&mut self) {
        self.issued.clear();
    }

    // Entries older than yesterday can no longer match a reconciliation
    // window, which spans at most half a day either way.
    fn prune(&mut self, latest: NaiveDate) {
        let Some(cutoff) = latest.checked_sub_days(Days::new(1)) else {
            return;
        };
        self.issued.retain(|_, date| *date >= cutoff);
    }
}

#[cfg(test)]
#[path = "delivery_tests.rs"]
mod tests;
