//! Deferred hides after a client PART.

mod common;

use chanfilter::Verdict;
use chanfilter::config::FilterConfig;
use common::Harness;
use std::time::Duration;

fn delayed() -> Harness {
    let h = Harness::with_config(FilterConfig {
        hide_delay_ms: 5_000,
        ..Default::default()
    });
    h.network.join("#rust", &["me"]);
    h
}

#[tokio::test(start_paused = true)]
async fn part_hides_after_grace_period() {
    let mut h = delayed();
    let a = h.connect(Some("A"));

    let (verdict, _) = h.client_line(a, "PART #rust");
    assert_eq!(verdict, Verdict::Halt);
    assert_eq!(h.registry.take_written(a), vec![":me!user@bouncer PART #rust"]);
    assert!(h.visible("A", "#rust"));

    let pending = h.pending.recv().await.unwrap();
    assert_eq!(pending.identifier, "A");
    assert_eq!(pending.channel, "#rust");
    assert!(h.filter.apply_pending(pending));
    assert!(!h.visible("A", "#rust"));
}

#[tokio::test(start_paused = true)]
async fn rejoin_within_grace_period_wins() {
    let mut h = delayed();
    let a = h.connect(Some("A"));

    h.client_line(a, "PART #rust");
    let (verdict, _) = h.client_line(a, "JOIN #rust");
    assert_eq!(verdict, Verdict::Halt);

    let pending = h.pending.recv().await.unwrap();
    assert!(!h.filter.apply_pending(pending));
    assert!(h.visible("A", "#rust"));
}

#[tokio::test(start_paused = true)]
async fn closed_session_drops_pending_hide() {
    let mut h = delayed();
    let a = h.connect(Some("A"));

    h.client_line(a, "PART #rust");
    h.registry.close(a);

    let pending = h.pending.recv().await.unwrap();
    assert!(!h.filter.apply_pending(pending));
    assert!(h.visible("A", "#rust"));
}

#[tokio::test(start_paused = true)]
async fn second_part_during_grace_goes_upstream() {
    let h = delayed();
    let a = h.connect(Some("A"));

    assert_eq!(h.client_line(a, "PART #rust").0, Verdict::Halt);
    let (verdict, line) = h.client_line(a, "PART #rust");
    assert_eq!(verdict, Verdict::Continue);
    assert_eq!(line, "PART #rust");
}

#[tokio::test(start_paused = true)]
async fn run_pending_applies_in_background() {
    let h = delayed();
    let a = h.connect(Some("A"));
    h.client_line(a, "PART #rust");

    let Harness {
        filter, pending, store, ..
    } = h;
    let worker = {
        let filter = filter.clone();
        tokio::spawn(async move { filter.run_pending(pending).await })
    };

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(store.is_visible("A", "#rust"));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(!store.is_visible("A", "#rust"));

    worker.abort();
}

#[tokio::test(start_paused = true)]
async fn join_zero_during_grace_does_not_part_twice() {
    let mut h = delayed();
    let a = h.connect(Some("A"));

    h.client_line(a, "PART #rust");
    assert_eq!(h.registry.take_written(a), vec![":me!user@bouncer PART #rust"]);

    assert_eq!(h.client_line(a, "JOIN 0").0, Verdict::Halt);
    assert!(h.registry.take_written(a).is_empty());
    assert!(!h.visible("A", "#rust"));

    let pending = h.pending.recv().await.unwrap();
    assert!(!h.filter.apply_pending(pending));
    assert!(!h.visible("A", "#rust"));
}

#[tokio::test(start_paused = true)]
async fn shutdown_ends_run_pending_after_draining() {
    let h = delayed();
    let a = h.connect(Some("A"));
    h.client_line(a, "PART #rust");

    let Harness {
        filter, pending, store, registry, ..
    } = h;
    let worker = {
        let filter = filter.clone();
        tokio::spawn(async move { filter.run_pending(pending).await })
    };

    filter.shutdown();
    worker.await.unwrap();
    assert!(!store.is_visible("A", "#rust"));

    // No scheduler left, so a later PART hides at once.
    let b = registry.add(Some("B"), "me");
    filter.on_login(b);
    let mut line = "PART #rust".to_string();
    assert_eq!(filter.on_client_line(b, &mut line), Verdict::Halt);
    assert!(!store.is_visible("B", "#rust"));
}

#[test]
fn without_runtime_hide_is_immediate() {
    let h = delayed();
    let a = h.connect(Some("A"));

    h.client_line(a, "PART #rust");
    assert!(!h.visible("A", "#rust"));
}
