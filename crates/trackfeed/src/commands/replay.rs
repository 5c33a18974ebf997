//! Replay command: drives the feed synchronizer from a session script.
//!
//! The script is JSON lines. Blank lines and `#` comments are skipped.
//! Every event is applied in order and the actor is given a chance to
//! react before the next one.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;
use tokio::sync::watch;
use tracing::{debug, info};

use trackfeed_config::Config;
use trackfeed_core::{
    AppConfig, BodyPart, Collaborators, DataFeedConfig, DataFeedUpdate, DeviceId, FeedSync,
    FlatDeviceTracker, MemoryTransport, OutboundMessage, RawAction, RecordingNavigator,
    StartDataFeed, StateStream, StoreView, TrackerFilter, TrackerId, TrackerStatus, app_context,
};

use crate::cli::{GlobalOpts, ReplayArgs};
use crate::error::CliError;
use crate::output;

/// Yields given to the actor after a connectivity or config event.
const SETTLE_YIELDS: usize = 4;

// ── Script ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "value", rename_all = "snake_case")]
enum ScriptEvent {
    Connected(bool),
    Config(Option<AppConfig>),
    Feed(DataFeedUpdate),
    FeedConfig(DataFeedConfig),
    Action(RawAction),
}

impl ScriptEvent {
    fn kind(&self) -> &'static str {
        match self {
            Self::Connected(_) => "connected",
            Self::Config(_) => "config",
            Self::Feed(_) => "feed",
            Self::FeedConfig(_) => "feed_config",
            Self::Action(_) => "action",
        }
    }
}

#[derive(Debug)]
struct ScriptLine {
    line: usize,
    event: ScriptEvent,
}

fn parse_script(path: &Path, text: &str) -> Result<Vec<ScriptLine>, CliError> {
    text.lines()
        .enumerate()
        .map(|(idx, raw)| (idx + 1, raw.trim()))
        .filter(|(_, raw)| !raw.is_empty() && !raw.starts_with('#'))
        .map(|(line, raw)| {
            serde_json::from_str(raw)
                .map(|event| ScriptLine { line, event })
                .map_err(|e| CliError::Script {
                    path: path.display().to_string(),
                    line,
                    message: e.to_string(),
                })
        })
        .collect()
}

// ── Report ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct TrackerSummary {
    id: TrackerId,
    device: Option<DeviceId>,
    device_name: Option<String>,
    body_part: Option<BodyPart>,
    status: Option<TrackerStatus>,
    temp: Option<f32>,
}

impl From<&FlatDeviceTracker> for TrackerSummary {
    fn from(entry: &FlatDeviceTracker) -> Self {
        Self {
            id: entry.tracker.tracker_id,
            device: entry.device.as_ref().map(|d| d.id),
            device_name: entry.device.as_ref().map(|d| d.display_name()),
            body_part: entry.tracker.body_part(),
            status: entry.tracker.status,
            temp: entry.tracker.temp,
        }
    }
}

#[derive(Tabled)]
struct TrackerRow {
    #[tabled(rename = "Tracker")]
    id: String,
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Body Part")]
    body_part: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Temp")]
    temp: String,
}

impl From<&TrackerSummary> for TrackerRow {
    fn from(t: &TrackerSummary) -> Self {
        let dash = || "-".to_owned();
        Self {
            id: t.id.to_string(),
            device: t.device_name.clone().unwrap_or_else(dash),
            body_part: t.body_part.map_or_else(dash, |p| p.to_string()),
            status: t.status.map_or_else(dash, |s| s.to_string()),
            temp: t.temp.map_or_else(dash, |c| format!("{c:.1}°C")),
        }
    }
}

#[derive(Debug, Serialize)]
struct ReplayReport {
    events: usize,
    version: u64,
    updated_at: Option<DateTime<Utc>>,
    start_requests: Vec<StartDataFeed>,
    navigations: Vec<String>,
    synthetic_trackers: usize,
    trackers: Vec<TrackerSummary>,
}

impl ReplayReport {
    fn new(
        events: usize,
        view: &StoreView,
        transport: &MemoryTransport,
        navigator: &RecordingNavigator,
        device: Option<DeviceId>,
    ) -> Self {
        let filter = device.map_or(TrackerFilter::All, TrackerFilter::ByDevice);
        Self {
            events,
            version: view.version,
            updated_at: view.updated_at,
            start_requests: start_requests(transport),
            navigations: navigator.routes(),
            synthetic_trackers: view.state.synthetic_trackers().len(),
            trackers: filter
                .apply(&view.trackers)
                .iter()
                .map(TrackerSummary::from)
                .collect(),
        }
    }

    fn detail(&self) -> Result<String, CliError> {
        let mut out = String::new();
        let last_update = self
            .updated_at
            .map_or_else(|| "never".to_owned(), |t| t.format("%H:%M:%S%.3f UTC").to_string());
        let navigations = if self.navigations.is_empty() {
            "none".to_owned()
        } else {
            self.navigations.join(", ")
        };

        let field = |e: std::fmt::Error| CliError::Validation {
            field: "report".into(),
            reason: e.to_string(),
        };
        writeln!(out, "Events replayed:    {}", self.events).map_err(field)?;
        writeln!(out, "Store version:      {}", self.version).map_err(field)?;
        writeln!(out, "Last update:        {last_update}").map_err(field)?;
        writeln!(out, "Start requests:     {}", self.start_requests.len()).map_err(field)?;
        writeln!(out, "Navigations:        {navigations}").map_err(field)?;
        writeln!(out, "Synthetic trackers: {}", self.synthetic_trackers).map_err(field)?;

        let rows: Vec<TrackerRow> = self.trackers.iter().map(TrackerRow::from).collect();
        out.push_str(&output::render_table(&rows));
        Ok(out)
    }

    fn tracker_ids(&self) -> String {
        self.trackers
            .iter()
            .map(|t| t.id.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
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

// ── Handler ──────────────────────────────────────────────────────────

pub async fn handle(args: ReplayArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let text = std::fs::read_to_string(&args.script)?;
    let script = parse_script(&args.script, &text)?;
    info!(events = script.len(), path = %args.script.display(), "replaying session");

    let transport = MemoryTransport::new();
    let navigator = Arc::new(RecordingNavigator::new());
    let (config_tx, config_rx) = watch::channel(args.with_config.then(|| cfg.app.clone()));
    let (feed_tx, feed_rx) = watch::channel(cfg.feed.clone());

    let sync = FeedSync::start(
        cfg.sync_config(),
        Collaborators {
            transport: Arc::new(transport.clone()),
            navigator: navigator.clone(),
            config: config_rx,
            feed_config: feed_rx,
        },
    );
    let store = Arc::clone(sync.store());
    settle().await;

    let context = sync.context();
    let mut session = Session {
        views: context.subscribe()?,
        transport: &transport,
        config: &config_tx,
        feed_config: &feed_tx,
        apply_mask: args.apply_mask,
    };
    let played = context.scope(session.play(&script)).await;
    sync.shutdown().await;
    played?;

    let report = ReplayReport::new(script.len(), &store.view(), &transport, &navigator, args.device);
    let out = output::render_single(global.output, &report, ReplayReport::detail, ReplayReport::tracker_ids)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

struct Session<'a> {
    views: StateStream,
    transport: &'a MemoryTransport,
    config: &'a watch::Sender<Option<AppConfig>>,
    feed_config: &'a watch::Sender<DataFeedConfig>,
    apply_mask: bool,
}

impl Session<'_> {
    async fn play(&mut self, script: &[ScriptLine]) -> Result<(), CliError> {
        for ScriptLine { line, event } in script {
            debug!(line, event = event.kind(), "replaying event");
            match event {
                ScriptEvent::Connected(connected) => {
                    self.transport.set_connected(*connected);
                    settle().await;
                }
                ScriptEvent::Config(config) => {
                    self.config.send_replace(config.clone());
                    settle().await;
                }
                ScriptEvent::FeedConfig(feed_config) => {
                    self.feed_config.send_replace(feed_config.clone());
                }
                ScriptEvent::Feed(update) => self.ingest(update).await?,
                ScriptEvent::Action(raw) => {
                    app_context()?
                        .dispatch_raw(raw.clone())
                        .map_err(|e| CliError::from_action(e, *line))?;
                }
            }
        }
        Ok(())
    }

    /// Publish an update and wait until the store has applied it.
    async fn ingest(&mut self, update: &DataFeedUpdate) -> Result<(), CliError> {
        let expected = self.views.latest().version + 1;
        if self.transport.publish(Arc::new(self.shape(update))) == 0 {
            debug!("no feed subscriber, update dropped");
            return Ok(());
        }
        self.views
            .wait_for(|view| view.version >= expected)
            .await
            .map(drop)
            .ok_or_else(|| CliError::Internal {
                message: "store closed during replay".into(),
            })
    }

    /// Shape an update the way the server would for the latest start
    /// request. Without `--apply-mask`, or before any request, the update
    /// passes through unchanged.
    fn shape(&self, update: &DataFeedUpdate) -> DataFeedUpdate {
        if !self.apply_mask {
            return update.clone();
        }
        match latest_subscription(self.transport) {
            Some(subscription) => subscription.shape(update),
            None => {
                debug!("no start request yet, update not shaped");
                update.clone()
            }
        }
    }
}

fn latest_subscription(transport: &MemoryTransport) -> Option<DataFeedConfig> {
    start_requests(transport)
        .pop()
        .and_then(|start| start.data_feeds.into_iter().next())
}

/// Connectivity and config changes have no observable completion when no
/// rule fires. On the `current_thread` runtime `main` builds, each yield
/// re-queues this task behind the actor that the send just woke, so the
/// actor's evaluation finishes before the next event is played.
async fn settle() {
    for _ in 0..SETTLE_YIELDS {
        tokio::task::yield_now().await;
    }
}
