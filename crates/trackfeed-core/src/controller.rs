// ── Feed synchronizer ──
//
// Owns the data store for one scope and keeps it current: ingests feed
// updates, re-subscribes whenever the transport reconnects, and redirects
// to onboarding when the configuration asks for it. All three rules run
// on a single actor task so each evaluation completes before the next.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::context::AppContext;
use crate::error::CoreError;
use crate::model::{AppConfig, DataFeedConfig, DataFeedUpdate, StartDataFeed};
use crate::navigation::Navigator;
use crate::policy::{OnboardingGate, ResubscribeGate};
use crate::store::{DataStore, StateAction};
use crate::transport::{OutboundMessage, Transport, TransportError};

/// External systems the synchronizer observes and drives.
pub struct Collaborators {
    pub transport: Arc<dyn Transport>,
    pub navigator: Arc<dyn Navigator>,
    /// Host application settings. `None` until they are loaded.
    pub config: watch::Receiver<Option<AppConfig>>,
    /// Subscription sent with every start request.
    pub feed_config: watch::Receiver<DataFeedConfig>,
}

// ── FeedSync ─────────────────────────────────────────────────────

/// A running synchronizer scope.
///
/// Dropping it ends the scope; [`shutdown`](Self::shutdown) also waits for
/// the actor task to finish.
pub struct FeedSync {
    store: Arc<DataStore>,
    transport: Arc<dyn Transport>,
    feed_config: watch::Receiver<DataFeedConfig>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl FeedSync {
    /// Start a scope. Must be called from within a tokio runtime.
    ///
    /// The feed subscription is registered before this returns, so no
    /// update published afterwards is missed.
    pub fn start(config: SyncConfig, collaborators: Collaborators) -> Self {
        let Collaborators {
            transport,
            navigator,
            config: app_config,
            feed_config,
        } = collaborators;

        let store = Arc::new(DataStore::new());
        let cancel = CancellationToken::new();

        let channels = Channels {
            feed: transport.subscribe_feed(),
            connectivity: transport.connectivity(),
            config: app_config,
        };
        let actor = SyncActor {
            store: Arc::clone(&store),
            transport: Arc::clone(&transport),
            navigator,
            feed_config: feed_config.clone(),
            onboarding_entry: config.onboarding_entry,
            resubscribe: ResubscribeGate::new(),
            onboarding: OnboardingGate::new(),
        };
        let task = tokio::spawn(actor.run(channels, cancel.clone()));

        info!("feed sync started");
        Self {
            store,
            transport,
            feed_config,
            cancel,
            task: Some(task),
        }
    }

    /// A handle valid until this scope ends.
    pub fn context(&self) -> AppContext {
        AppContext::new(Arc::clone(&self.store), self.cancel.clone())
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.store
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Send a start request now with the current subscription, outside the
    /// reconnect rule.
    pub fn request_feed(&self) -> Result<(), CoreError> {
        if !self.is_running() {
            return Err(CoreError::ContextClosed);
        }
        send_start(self.transport.as_ref(), &self.feed_config)?;
        Ok(())
    }

    /// End the scope and wait for the actor task.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "feed sync task did not finish cleanly");
            }
        }
        info!(version = self.store.version(), "feed sync stopped");
    }
}

impl Drop for FeedSync {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Actor ────────────────────────────────────────────────────────

struct Channels {
    feed: mpsc::UnboundedReceiver<Arc<DataFeedUpdate>>,
    connectivity: watch::Receiver<bool>,
    config: watch::Receiver<Option<AppConfig>>,
}

struct SyncActor {
    store: Arc<DataStore>,
    transport: Arc<dyn Transport>,
    navigator: Arc<dyn Navigator>,
    feed_config: watch::Receiver<DataFeedConfig>,
    onboarding_entry: String,
    resubscribe: ResubscribeGate,
    onboarding: OnboardingGate,
}

impl SyncActor {
    async fn run(mut self, channels: Channels, cancel: CancellationToken) {
        let Channels {
            mut feed,
            mut connectivity,
            mut config,
        } = channels;

        // Both rules also fire on the values present at startup.
        let connected = *connectivity.borrow_and_update();
        self.on_connectivity(connected);
        let initial = config.borrow_and_update().clone();
        self.on_config(initial.as_ref());

        let mut feed_open = true;
        let mut connectivity_open = true;
        let mut config_open = true;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                update = feed.recv(), if feed_open => match update {
                    Some(update) => self.on_feed(update),
                    None => {
                        debug!("feed subscription closed by transport");
                        feed_open = false;
                    }
                },
                changed = connectivity.changed(), if connectivity_open => {
                    if changed.is_ok() {
                        let connected = *connectivity.borrow_and_update();
                        self.on_connectivity_changed(connected);
                    } else {
                        connectivity_open = false;
                    }
                }
                changed = config.changed(), if config_open => {
                    if changed.is_ok() {
                        let current = config.borrow_and_update().clone();
                        self.on_config(current.as_ref());
                    } else {
                        config_open = false;
                    }
                }
            }
        }

        debug!("feed sync actor exiting");
    }

    fn on_feed(&self, update: Arc<DataFeedUpdate>) {
        self.store.dispatch(StateAction::DataFeed(update));
    }

    fn on_connectivity(&mut self, connected: bool) {
        let fire = self.resubscribe.observe(connected);
        self.resubscribe_if(connected, fire);
    }

    fn on_connectivity_changed(&mut self, connected: bool) {
        let fire = self.resubscribe.observe_change(connected);
        self.resubscribe_if(connected, fire);
    }

    fn resubscribe_if(&self, connected: bool, fire: bool) {
        debug!(connected, fire, "connectivity evaluated");
        if !fire {
            return;
        }

        if let Err(e) = send_start(self.transport.as_ref(), &self.feed_config) {
            warn!(error = %e, "data feed start request failed");
        }
    }

    fn on_config(&mut self, config: Option<&AppConfig>) {
        let fire = self.onboarding.observe(config);
        debug!(loaded = config.is_some(), fire, "configuration evaluated");
        if fire {
            info!(route = %self.onboarding_entry, "redirecting to onboarding");
            self.navigator.navigate(&self.onboarding_entry);
        }
    }
}

/// Ask the server to start the feed with the subscription current at
/// send time.
fn send_start(
    transport: &dyn Transport,
    feed_config: &watch::Receiver<DataFeedConfig>,
) -> Result<(), TransportError> {
    let data_feed = feed_config.borrow().clone();
    transport.send(OutboundMessage::StartDataFeed(StartDataFeed {
        data_feeds: vec![data_feed],
    }))?;
    info!("data feed start requested");
    Ok(())
}
