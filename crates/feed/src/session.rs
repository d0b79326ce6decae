//! Single-writer feed session
//!
//! Owns the only write path into [`FeedState`]. Events are applied one at a
//! time in arrival order. While a snapshot fetch is outstanding, events are
//! queued and applied after the snapshot, so a reload never wipes pairs that
//! arrived during the fetch. Ending the session discards any fetch still in
//! flight.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use pairwatch_core::{FeedConfig, FeedError, FeedResult};

use crate::engine::Reaction;
use crate::events::{EventItem, Snapshot};
use crate::snapshot::SnapshotSource;
use crate::state::FeedState;

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub snapshot_timeout: Duration,
    /// Periodic full reload; `None` disables polling
    pub poll_interval: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            snapshot_timeout: Duration::from_secs(10),
            poll_interval: Some(Duration::from_secs(180)),
        }
    }
}

impl From<&FeedConfig> for SessionConfig {
    fn from(config: &FeedConfig) -> Self {
        Self {
            snapshot_timeout: config.snapshot_timeout(),
            poll_interval: config.poll_interval(),
        }
    }
}

type PendingFetch = JoinHandle<FeedResult<Snapshot>>;

pub struct FeedSession {
    config: SessionConfig,
    state: FeedState,
    source: Arc<dyn SnapshotSource>,
}

impl FeedSession {
    pub fn new(config: SessionConfig, state: FeedState, source: Arc<dyn SnapshotSource>) -> Self {
        Self {
            config,
            state,
            source,
        }
    }

    /// Get shared state reference
    pub fn state(&self) -> FeedState {
        self.state.clone()
    }

    /// Run until `shutdown` fires (or its sender is dropped).
    pub async fn run(self, mut events: mpsc::Receiver<EventItem>, mut shutdown: oneshot::Receiver<()>) {
        info!("Starting feed session");

        let mut pending: Option<PendingFetch> = Some(self.spawn_fetch());
        let mut queued: VecDeque<EventItem> = VecDeque::new();
        let mut events_open = true;
        let mut poll = self.config.poll_interval.map(|period| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Feed session shutdown requested");
                    break;
                }

                result = wait_fetch(&mut pending) => {
                    pending = None;
                    let result = result.unwrap_or_else(|e| {
                        Err(FeedError::Transport(format!("snapshot task failed: {e}")))
                    });
                    self.state.write(|engine| engine.apply_snapshot(result));

                    if !queued.is_empty() {
                        debug!(queued = queued.len(), "Applying events queued during fetch");
                    }
                    while pending.is_none() {
                        let Some(item) = queued.pop_front() else { break };
                        if self.dispatch(item) == Reaction::Resync {
                            pending = Some(self.spawn_fetch());
                        }
                    }
                }

                item = events.recv(), if events_open => {
                    match item {
                        Some(item) if pending.is_some() => queued.push_back(item),
                        Some(item) => {
                            if self.dispatch(item) == Reaction::Resync {
                                info!("Connected, reloading snapshot");
                                pending = Some(self.spawn_fetch());
                            }
                        }
                        None => {
                            warn!("Event source closed");
                            events_open = false;
                        }
                    }
                }

                _ = tick(&mut poll) => {
                    if pending.is_none() {
                        debug!("Polling snapshot");
                        pending = Some(self.spawn_fetch());
                    }
                }
            }
        }

        if let Some(handle) = pending.take() {
            debug!("Discarding in-flight snapshot fetch");
            handle.abort();
        }

        info!("Feed session stopped");
    }

    fn dispatch(&self, item: EventItem) -> Reaction {
        self.state.write(|engine| match item {
            Ok(event) => engine.apply_event(event),
            Err(err) => {
                engine.reject(err);
                Reaction::Continue
            }
        })
    }

    fn spawn_fetch(&self) -> PendingFetch {
        let source = Arc::clone(&self.source);
        let timeout = self.config.snapshot_timeout;

        tokio::spawn(async move {
            match tokio::time::timeout(timeout, source.fetch_pairs()).await {
                Ok(result) => result,
                Err(_) => Err(FeedError::Timeout(timeout)),
            }
        })
    }
}

async fn wait_fetch(
    pending: &mut Option<PendingFetch>,
) -> Result<FeedResult<Snapshot>, tokio::task::JoinError> {
    match pending {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

async fn tick(poll: &mut Option<Interval>) {
    match poll {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::FeedEvent;
    use crate::test_support::pair;
    use pairwatch_core::{PairRecord, Severity};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays scripted responses, each after `delay`
    struct ScriptedSource {
        responses: Mutex<VecDeque<FeedResult<Snapshot>>>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(delay: Duration, responses: Vec<FeedResult<Vec<PairRecord>>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(
                    responses.into_iter().map(|r| r.map(Snapshot::from)).collect(),
                ),
                delay,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl SnapshotSource for ScriptedSource {
        async fn fetch_pairs(&self) -> FeedResult<Snapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.responses
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(Snapshot::default()))
        }
    }

    struct Harness {
        state: FeedState,
        events: mpsc::Sender<EventItem>,
        shutdown: oneshot::Sender<()>,
        handle: JoinHandle<()>,
    }

    fn start(config: SessionConfig, source: Arc<ScriptedSource>) -> Harness {
        let state = FeedState::new(50);
        let session = FeedSession::new(config, state.clone(), source);
        let (events, rx) = mpsc::channel(64);
        let (shutdown, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(session.run(rx, shutdown_rx));
        Harness {
            state,
            events,
            shutdown,
            handle,
        }
    }

    impl Harness {
        async fn stop(self) -> FeedState {
            let _ = self.shutdown.send(());
            self.handle.await.unwrap();
            self.state
        }
    }

    fn no_poll() -> SessionConfig {
        SessionConfig {
            snapshot_timeout: Duration::from_secs(10),
            poll_interval: None,
        }
    }

    fn addresses(state: &FeedState) -> Vec<String> {
        state.current_view().iter().map(|p| p.address.clone()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_during_fetch_apply_after_snapshot() {
        let source = ScriptedSource::new(
            Duration::from_secs(5),
            vec![Ok(vec![pair("0x1", "A", "WETH")])],
        );
        let h = start(no_poll(), source);

        h.events.send(Ok(FeedEvent::NewPair(pair("0x2", "B", "WETH")))).await.unwrap();
        h.events.send(Ok(FeedEvent::NewPair(pair("0x3", "C", "WETH")))).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        // still fetching: nothing applied yet
        assert!(h.state.current_view().is_empty());

        tokio::time::sleep(Duration::from_secs(10)).await;
        let state = h.stop().await;
        assert_eq!(addresses(&state), vec!["0x3", "0x2", "0x1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_keeps_previous_load() {
        let source = ScriptedSource::new(
            Duration::from_millis(10),
            vec![
                Ok(vec![
                    pair("0x1", "A", "WETH"),
                    pair("0x2", "B", "WETH"),
                    pair("0x3", "C", "WETH"),
                ]),
                Err(FeedError::Transport("connection refused".into())),
            ],
        );
        let config = SessionConfig {
            snapshot_timeout: Duration::from_secs(10),
            poll_interval: Some(Duration::from_secs(180)),
        };
        let h = start(config, source.clone());

        tokio::time::sleep(Duration::from_secs(200)).await;
        let state = h.stop().await;

        assert_eq!(source.calls(), 2);
        assert_eq!(state.current_view().len(), 3);
        let last = state.current_log().last().cloned().unwrap();
        assert_eq!(last.severity, Severity::Error);
        assert_eq!(state.stats().snapshot_failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_fetch_failure() {
        let source = ScriptedSource::new(
            Duration::from_secs(60),
            vec![Ok(vec![pair("0x1", "A", "WETH")])],
        );
        let h = start(no_poll(), source);

        tokio::time::sleep(Duration::from_secs(15)).await;
        let state = h.stop().await;

        assert!(state.current_view().is_empty());
        let last = state.current_log().last().cloned().unwrap();
        assert_eq!(last.severity, Severity::Error);
        assert!(last.message.contains("timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_discards_in_flight_fetch() {
        let source = ScriptedSource::new(
            Duration::from_secs(30),
            vec![Ok(vec![pair("0x1", "A", "WETH")])],
        );
        let h = start(no_poll(), source.clone());

        tokio::time::sleep(Duration::from_secs(1)).await;
        let state = h.stop().await;
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(source.calls(), 1);
        assert!(state.current_view().is_empty());
        assert!(state.current_log().is_empty());
        assert!(state.last_update().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_triggers_reload() {
        let source = ScriptedSource::new(
            Duration::from_millis(10),
            vec![
                Ok(vec![pair("0x1", "A", "WETH")]),
                Ok(vec![pair("0x1", "A", "WETH"), pair("0x9", "MISSED", "WETH")]),
            ],
        );
        let h = start(no_poll(), source.clone());
        tokio::time::sleep(Duration::from_secs(1)).await;

        h.events.send(Ok(FeedEvent::Connected)).await.unwrap();
        h.events.send(Ok(FeedEvent::Disconnected)).await.unwrap();
        h.events.send(Ok(FeedEvent::Connected)).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let state = h.stop().await;
        assert_eq!(source.calls(), 2);
        assert_eq!(addresses(&state), vec!["0x1", "0x9"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_connect_after_failed_load_reloads() {
        let source = ScriptedSource::new(
            Duration::from_millis(10),
            vec![
                Err(FeedError::Transport("connection refused".into())),
                Ok(vec![pair("0x1", "A", "WETH")]),
            ],
        );
        let h = start(no_poll(), source.clone());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(h.state.current_view().is_empty());

        // server comes up: the event feed connects for the first time
        h.events.send(Ok(FeedEvent::Connected)).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let state = h.stop().await;
        assert_eq!(source.calls(), 2);
        assert_eq!(addresses(&state), vec!["0x1"]);
        assert_eq!(state.stats().snapshot_failures, 1);
        assert_eq!(state.stats().snapshot_loads, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_during_initial_fetch_does_not_double_load() {
        let source = ScriptedSource::new(
            Duration::from_secs(2),
            vec![Ok(vec![pair("0x1", "A", "WETH")])],
        );
        let h = start(no_poll(), source.clone());

        // queued behind the pending fetch, applied once it has loaded
        h.events.send(Ok(FeedEvent::Connected)).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;

        let state = h.stop().await;
        assert_eq!(source.calls(), 1);
        assert_eq!(addresses(&state), vec!["0x1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_decode_errors_are_logged_and_skipped() {
        let source = ScriptedSource::new(Duration::from_millis(10), vec![Ok(vec![])]);
        let h = start(no_poll(), source);
        tokio::time::sleep(Duration::from_secs(1)).await;

        h.events
            .send(Err(FeedError::MalformedEvent("bad frame".into())))
            .await
            .unwrap();
        h.events.send(Ok(FeedEvent::NewPair(pair("0x1", "A", "WETH")))).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let state = h.stop().await;
        assert_eq!(state.current_view().len(), 1);
        assert_eq!(state.stats().malformed_dropped, 1);
        assert!(state
            .current_log()
            .iter()
            .any(|e| e.severity == Severity::Error && e.message.contains("bad frame")));
    }
}
