// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use kusuri_adapters::FakeNotifyAdapter;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
}

fn delivery(tag: &str, occurrence: NaiveDate, renotify: Renotify) -> Delivery {
    Delivery {
        tag: NotificationTag::from(tag),
        message: format!("reminder {tag}"),
        occurrence,
        renotify,
    }
}

fn sink() -> (DeliverySink<FakeNotifyAdapter>, FakeNotifyAdapter, Lifetime) {
    let notify = FakeNotifyAdapter::new();
    let lifetime = Lifetime::new();
    let sink = DeliverySink::new(
        notify.clone(),
        NotificationTemplate::default(),
        lifetime.clone(),
    );
    (sink, notify, lifetime)
}

fn pass(sink: &mut DeliverySink<FakeNotifyAdapter>, tags: &[&str], on: NaiveDate) -> Vec<DeliveryOutcome> {
    let deliveries = tags
        .iter()
        .map(|tag| delivery(tag, on, Renotify::Suppress))
        .collect();
    sink.deliver_pass(deliveries, Repeats::SkipIssued)
}

#[tokio::test]
async fn dispatch_renders_template() {
    let (sink, notify, lifetime) = sink();

    sink.dispatch(delivery("09:00", day(1), Renotify::Replace));
    lifetime.drained().await;

    let calls = notify.calls();
    assert_eq!(calls.len(), 1);
    let n = &calls[0].notification;
    assert_eq!(n.title, "Medication reminder");
    assert_eq!(n.body, "reminder 09:00");
    assert_eq!(n.tag.as_str(), "09:00");
    assert_eq!(n.vibrate, vec![300, 100, 300]);
    assert_eq!(n.renotify, Renotify::Replace);
}

#[tokio::test]
async fn dispatch_leaves_ledger_alone() {
    let (mut sink, notify, lifetime) = sink();

    sink.dispatch(delivery("09:00", day(1), Renotify::Replace));
    assert_eq!(sink.issued_on(&NotificationTag::from("09:00")), None);

    let outcomes = pass(&mut sink, &["09:00"], day(1));
    assert_eq!(outcomes, vec![DeliveryOutcome::Dispatched]);
    lifetime.drained().await;
    assert_eq!(notify.calls().len(), 2);
}

#[tokio::test]
async fn skip_issued_drops_repeat_from_earlier_pass() {
    let (mut sink, notify, lifetime) = sink();

    pass(&mut sink, &["09:00"], day(1));
    assert_eq!(pass(&mut sink, &["09:00"], day(1)), vec![DeliveryOutcome::Suppressed]);

    // Next day's occurrence goes through
    assert_eq!(pass(&mut sink, &["09:00"], day(2)), vec![DeliveryOutcome::Dispatched]);

    lifetime.drained().await;
    assert_eq!(notify.calls().len(), 2);
}

#[tokio::test]
async fn same_tag_within_one_pass_all_dispatch() {
    let (mut sink, notify, lifetime) = sink();

    let outcomes = pass(&mut sink, &["09:00", "09:00"], day(1));
    assert_eq!(outcomes, vec![DeliveryOutcome::Dispatched; 2]);
    lifetime.drained().await;
    assert_eq!(notify.calls().len(), 2);

    // Both are repeats for the next pass
    assert_eq!(
        pass(&mut sink, &["09:00", "09:00"], day(1)),
        vec![DeliveryOutcome::Suppressed; 2]
    );
}

#[tokio::test]
async fn deliver_repeats_always_dispatches_and_records() {
    let (mut sink, notify, lifetime) = sink();

    for _ in 0..2 {
        sink.deliver_pass(
            vec![delivery("09:00", day(1), Renotify::Replace)],
            Repeats::Deliver,
        );
    }
    lifetime.drained().await;

    assert_eq!(notify.calls().len(), 2);
    assert_eq!(sink.issued_on(&NotificationTag::from("09:00")), Some(day(1)));
}

#[tokio::test]
async fn distinct_tags_do_not_interfere() {
    let (mut sink, notify, lifetime) = sink();

    pass(&mut sink, &["09:00"], day(1));
    pass(&mut sink, &["09:05"], day(1));
    lifetime.drained().await;

    assert_eq!(notify.calls().len(), 2);
}

#[tokio::test]
async fn denied_permission_is_recorded_and_not_retried() {
    let (mut sink, notify, lifetime) = sink();
    notify.deny(true);

    assert_eq!(pass(&mut sink, &["09:00"], day(1)), vec![DeliveryOutcome::Dispatched]);
    lifetime.drained().await;
    assert!(notify.calls().is_empty());

    notify.deny(false);
    assert_eq!(pass(&mut sink, &["09:00"], day(1)), vec![DeliveryOutcome::Suppressed]);
}

#[tokio::test]
async fn old_occurrences_are_pruned() {
    let (mut sink, _notify, lifetime) = sink();

    pass(&mut sink, &["09:00"], day(1));
    pass(&mut sink, &["21:00"], day(5));
    lifetime.drained().await;

    assert_eq!(sink.issued_on(&NotificationTag::from("09:00")), None);
    assert_eq!(sink.issued_on(&NotificationTag::from("21:00")), Some(day(5)));
}
