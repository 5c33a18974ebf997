// Integration tests for the feed synchronizer, driven through the
// in-memory transport with paused time so the actor settles
// deterministically.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::sync::watch;

use trackfeed_core::{
    AppConfig, Collaborators, CoreError, DataFeedConfig, DataFeedUpdate, DeviceData, FeedSync,
    MemoryTransport, OutboundMessage, RawAction, RecordingNavigator, StartDataFeed, SyncConfig,
    TrackerData, TrackerId, TransportError, app_context,
};

struct Harness {
    transport: MemoryTransport,
    navigator: Arc<RecordingNavigator>,
    config: watch::Sender<Option<AppConfig>>,
    feed_config: watch::Sender<DataFeedConfig>,
    sync: FeedSync,
}

fn start_with(sync_config: SyncConfig, transport: MemoryTransport, app: Option<AppConfig>) -> Harness {
    let navigator = Arc::new(RecordingNavigator::new());
    let (config, config_rx) = watch::channel(app);
    let (feed_config, feed_config_rx) = watch::channel(DataFeedConfig::default());

    let sync = FeedSync::start(
        sync_config,
        Collaborators {
            transport: Arc::new(transport.clone()),
            navigator: navigator.clone(),
            config: config_rx,
            feed_config: feed_config_rx,
        },
    );

    Harness {
        transport,
        navigator,
        config,
        feed_config,
        sync,
    }
}

fn start() -> Harness {
    start_with(SyncConfig::default(), MemoryTransport::new(), None)
}

/// Let the actor drain everything queued so far.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

fn feed(devices: &[(u8, u8)]) -> Arc<DataFeedUpdate> {
    Arc::new(DataFeedUpdate::new(devices.iter().map(|&(id, count)| {
        DeviceData::new(id).with_trackers((0..count).map(|n| TrackerData::new(TrackerId::new(id, n))))
    })))
}

fn onboarding(done_onboarding: bool) -> Option<AppConfig> {
    Some(AppConfig {
        done_onboarding,
        ..AppConfig::default()
    })
}

fn start_requests(transport: &MemoryTransport) -> Vec<StartDataFeed> {
    transport
        .sent()
        .into_iter()
        .filter_map(|message| match message {
            OutboundMessage::StartDataFeed(start) => Some(start),
            _ => None,
        })
        .collect()
}

// ── Rule A: feed ingestion ──────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn updates_are_applied_in_receipt_order() {
    let h = start();
    let ctx = h.sync.context();
    let updates = [feed(&[(1, 2)]), feed(&[(1, 1), (2, 1)]), feed(&[(3, 3)])];

    for update in &updates {
        assert_eq!(h.transport.publish(Arc::clone(update)), 1);
    }
    settle().await;

    let view = ctx.view().expect("scope is running");
    assert_eq!(view.version, 3);
    assert!(view
        .state
        .datafeed
        .as_ref()
        .is_some_and(|f| Arc::ptr_eq(f, &updates[2])));

    let ids: Vec<String> = view
        .trackers
        .iter()
        .map(|t| t.tracker.tracker_id.to_string())
        .collect();
    assert_eq!(ids, ["3/0", "3/1", "3/2"]);
}

#[tokio::test(start_paused = true)]
async fn subscription_is_registered_before_start_returns() {
    let h = start();

    // No yield between start and publish.
    assert_eq!(h.transport.subscriber_count(), 1);
    h.transport.publish(feed(&[(1, 1)]));
    settle().await;

    assert_eq!(h.sync.store().trackers().len(), 1);
}

// ── Rule B: resubscribe on connect ──────────────────────────────────

#[tokio::test(start_paused = true)]
async fn start_request_sent_once_per_reconnect() {
    let h = start();

    for connected in [false, true, true, false, true] {
        h.transport.set_connected(connected);
        settle().await;
    }

    assert_eq!(start_requests(&h.transport).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn reconnect_between_polls_still_resubscribes() {
    let h = start();
    h.transport.set_connected(true);
    settle().await;
    assert_eq!(start_requests(&h.transport).len(), 1);

    h.transport.set_connected(false);
    h.transport.set_connected(true);
    settle().await;

    assert_eq!(start_requests(&h.transport).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn disconnect_between_polls_sends_nothing() {
    let h = start();
    h.transport.set_connected(true);
    h.transport.set_connected(false);
    settle().await;

    assert!(start_requests(&h.transport).is_empty());
}

#[tokio::test(start_paused = true)]
async fn start_request_carries_current_feed_config() {
    let h = start();

    h.transport.set_connected(true);
    settle().await;

    let slow = DataFeedConfig {
        minimum_time_since_last: 500,
        ..DataFeedConfig::default()
    };
    h.feed_config.send_replace(slow.clone());
    h.transport.set_connected(false);
    settle().await;
    h.transport.set_connected(true);
    settle().await;

    let requests = start_requests(&h.transport);
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].data_feeds, vec![DataFeedConfig::default()]);
    assert_eq!(requests[1].data_feeds, vec![slow]);
}

#[tokio::test(start_paused = true)]
async fn already_connected_transport_is_subscribed_at_start() {
    let transport = MemoryTransport::new();
    transport.set_connected(true);

    let h = start_with(SyncConfig::default(), transport, None);
    settle().await;

    assert_eq!(start_requests(&h.transport).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_start_request_is_not_fatal() {
    let h = start();
    h.transport
        .fail_next_send(TransportError::SendFailed("socket closed".into()));

    h.transport.set_connected(true);
    settle().await;
    assert!(h.transport.sent().is_empty());

    // Not retried, but the next reconnect and feed ingestion still work.
    h.transport.set_connected(false);
    settle().await;
    h.transport.set_connected(true);
    h.transport.publish(feed(&[(1, 1)]));
    settle().await;

    assert_eq!(start_requests(&h.transport).len(), 1);
    assert_eq!(h.sync.store().version(), 1);
}

#[tokio::test(start_paused = true)]
async fn manual_request_requires_connection() {
    let h = start();

    assert!(matches!(
        h.sync.request_feed(),
        Err(CoreError::Transport(TransportError::NotConnected))
    ));

    h.transport.set_connected(true);
    settle().await;
    assert!(h.sync.request_feed().is_ok());
    assert_eq!(start_requests(&h.transport).len(), 2);
}

// ── Rule C: onboarding redirect ─────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn redirects_once_until_onboarding_is_done() {
    let h = start();

    for config in [None, onboarding(false), onboarding(false), onboarding(true)] {
        h.config.send_replace(config);
        settle().await;
    }

    assert_eq!(h.navigator.routes(), ["/onboarding/home"]);
}

#[tokio::test(start_paused = true)]
async fn config_round_trip_between_polls_is_coalesced() {
    let h = start_with(SyncConfig::default(), MemoryTransport::new(), onboarding(false));
    settle().await;

    h.config.send_replace(onboarding(true));
    h.config.send_replace(onboarding(false));
    settle().await;

    assert_eq!(h.navigator.routes(), ["/onboarding/home"]);
}

#[tokio::test(start_paused = true)]
async fn initial_config_is_evaluated_with_custom_entry() {
    let sync_config = SyncConfig {
        onboarding_entry: "/welcome".into(),
    };
    let h = start_with(sync_config, MemoryTransport::new(), onboarding(false));
    settle().await;

    assert_eq!(h.navigator.routes(), ["/welcome"]);
}

#[tokio::test(start_paused = true)]
async fn completed_onboarding_never_redirects() {
    let h = start_with(SyncConfig::default(), MemoryTransport::new(), onboarding(true));
    settle().await;
    h.config.send_replace(onboarding(true));
    settle().await;

    assert!(h.navigator.routes().is_empty());
}

// ── Handle and teardown ─────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn unknown_action_is_rejected_without_touching_state() {
    let h = start();
    let ctx = h.sync.context();
    h.transport.publish(feed(&[(1, 1)]));
    settle().await;
    let before = ctx.view().expect("scope is running");

    let result = ctx.dispatch_raw(RawAction {
        kind: "patch".into(),
        value: serde_json::Value::Null,
    });

    assert!(matches!(result, Err(CoreError::UnhandledAction { ref kind }) if kind == "patch"));
    let after = ctx.view().expect("scope is running");
    assert!(Arc::ptr_eq(&before, &after));
}

#[tokio::test(start_paused = true)]
async fn shutdown_releases_subscription_and_closes_handles() {
    let h = start();
    let ctx = h.sync.context();
    let store = Arc::clone(h.sync.store());
    h.transport.publish(feed(&[(1, 1)]));
    settle().await;

    h.sync.shutdown().await;

    assert_eq!(h.transport.subscriber_count(), 0);
    assert_eq!(h.transport.publish(feed(&[(2, 4)])), 0);
    settle().await;

    assert_eq!(store.version(), 1);
    assert_eq!(store.trackers().len(), 1);
    assert!(matches!(ctx.state(), Err(CoreError::ContextClosed)));
    assert!(matches!(ctx.trackers(), Err(CoreError::ContextClosed)));
}

#[tokio::test(start_paused = true)]
async fn no_rule_fires_after_shutdown() {
    let h = start();
    h.sync.shutdown().await;

    h.transport.set_connected(true);
    h.config.send_replace(onboarding(false));
    settle().await;

    assert!(h.transport.sent().is_empty());
    assert!(h.navigator.routes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn dropping_the_scope_closes_handles() {
    let h = start();
    let ctx = h.sync.context();

    drop(h.sync);
    settle().await;

    assert!(ctx.is_closed());
    assert_eq!(h.transport.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn scoped_lookup_reaches_the_running_store() {
    let h = start();
    h.transport.publish(feed(&[(1, 2)]));
    settle().await;

    let count = h
        .sync
        .context()
        .scope(async { app_context().and_then(|ctx| ctx.trackers()).map(|t| t.len()) })
        .await;
    assert!(matches!(count, Ok(2)));

    assert!(matches!(app_context(), Err(CoreError::MissingContext)));
}

#[tokio::test(start_paused = true)]
async fn stream_observes_ingested_updates() {
    let h = start();
    let mut stream = h.sync.context().subscribe().expect("scope is running");

    h.transport.publish(feed(&[(4, 1)]));
    let view = stream.changed().await.expect("store is alive");

    assert_eq!(view.version, 1);
    assert_eq!(view.trackers.len(), 1);
}
