mod common;

use std::time::Duration;

use common::{settle, wait_until, Counter, Recorder};
use telemeter::{Event, FlowConfig, OverflowPolicy, Resolvers, Telemeter};

const EVENTS: usize = 10_000;

#[tokio::test(start_paused = true)]
async fn test_drop_oldest_slow_relay_falls_behind_fast_one_does_not() {
    let fast = Counter::fast();
    let slow = Counter::slow(Duration::from_millis(10));

    let root = Telemeter::build(
        vec![fast.relay(), slow.relay()],
        vec![],
        Resolvers::new(),
        FlowConfig::default(),
    )
    .unwrap();
    assert_eq!(root.flow().overflow, OverflowPolicy::DropOldest);

    // 1. Record without ever waiting on the slow relay
    for i in 0..EVENTS {
        root.record(&Event::new(i.to_string()));
        tokio::task::yield_now().await;
    }

    // 2. Fast relay got everything, slow relay lost the oldest backlog
    wait_until(Duration::from_secs(600), || fast.get() == EVENTS).await;
    assert_eq!(fast.get(), EVENTS);
    assert!(slow.get() < EVENTS, "slow relay processed {}", slow.get());

    let snapshot = root.snapshot();
    assert_eq!(snapshot.published, EVENTS as u64);
    assert_eq!(snapshot.subscribers.len(), 2);
    assert_eq!(snapshot.subscribers[0].dropped, 0);
    assert!(snapshot.subscribers[1].dropped > 0);
}

#[tokio::test(start_paused = true)]
async fn test_suspend_delivers_everything_to_every_relay() {
    let fast = Counter::fast();
    let slow = Counter::slow(Duration::from_millis(1));

    let root = Telemeter::build(
        vec![fast.relay(), slow.relay()],
        vec![],
        Resolvers::new(),
        FlowConfig::lossless(),
    )
    .unwrap();

    // record() does not block, even though nothing has been consumed yet.
    for i in 0..EVENTS {
        root.record(&Event::new(i.to_string()));
    }
    assert!(root.snapshot().pending > 0);

    wait_until(Duration::from_secs(3600), || fast.get() == EVENTS && slow.get() == EVENTS).await;
    settle().await;
    assert_eq!(fast.get(), EVENTS);
    assert_eq!(slow.get(), EVENTS);

    let snapshot = root.snapshot();
    assert_eq!(snapshot.pending, 0);
    assert!(snapshot.subscribers.iter().all(|s| s.dropped == 0 && s.lag == 0));
}

#[tokio::test(start_paused = true)]
async fn test_stalled_child_relay_does_not_hold_back_parent() {
    let stalled = Counter::slow(Duration::from_secs(3600));
    let parent_relay = Recorder::new("parent");

    let root = Telemeter::builder()
        .relay_ref(parent_relay.relay())
        .build()
        .unwrap();
    let child = root.child(vec![stalled.relay()], vec![], Resolvers::new());

    for i in 0..1_000 {
        child.record(&Event::new(i.to_string()));
        tokio::task::yield_now().await;
    }

    wait_until(Duration::from_secs(60), || parent_relay.len() == 1_000).await;
    assert_eq!(stalled.get(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_stops_relays() {
    let relay = Recorder::new("r");
    let root = Telemeter::builder().relay_ref(relay.relay()).build().unwrap();

    root.record(&Event::new("before"));
    wait_until(Duration::from_secs(5), || relay.len() == 1).await;

    root.shutdown();
    root.record(&Event::new("after"));
    settle().await;

    assert_eq!(relay.descriptions(), vec!["before"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_external_scope_cancels_every_node_built_with_it() {
    let scope = tokio_util::sync::CancellationToken::new();
    let root_relay = Recorder::new("root");
    let child_relay = Recorder::new("child");

    let root = Telemeter::builder()
        .relay_ref(root_relay.relay())
        .flow(FlowConfig::default().with_scope(scope.clone()))
        .build()
        .unwrap();
    let child = root.child(vec![child_relay.relay()], vec![], Resolvers::new());

    scope.cancel();
    child.record(&Event::new("dropped on the floor"));
    settle().await;

    assert!(root.is_shut_down());
    assert!(child.is_shut_down());
    assert_eq!(root_relay.len(), 0);
    assert_eq!(child_relay.len(), 0);
}
