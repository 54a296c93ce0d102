//! Per-widget polling: a fetch loop on the widget's refresh interval plus
//! an independent 1-second countdown ticker for the UI.
//!
//! Each cycle spawns its fetch as its own task, so a request that outlasts
//! the refresh interval can overlap the next one; no mutual exclusion is
//! enforced. Stopping a poller aborts the timers; an in-flight fetch is
//! abandoned silently.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Duration, Instant};

use crate::core::rate_tracker::RateTracker;
use crate::fetcher::JsonSource;
use crate::models::Widget;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Success,
    Failed,
}

/// Observable snapshot of one widget's poll cycle.
#[derive(Debug, Clone, Default)]
pub struct WidgetState {
    pub phase: Phase,
    /// Last successfully fetched payload. Survives later failures so the
    /// UI can keep stale data visible next to the error.
    pub payload: Option<Value>,
    pub last_update: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

pub struct WidgetPoller {
    state_rx: watch::Receiver<WidgetState>,
    countdown_rx: watch::Receiver<u64>,
    retry_tx: mpsc::Sender<()>,
    fetch_task: JoinHandle<()>,
    countdown_task: JoinHandle<()>,
}

impl WidgetPoller {
    /// Spawns the fetch loop (one immediate fetch, then one per refresh
    /// interval) and the countdown ticker.
    pub fn spawn(
        widget: Widget,
        source: Arc<dyn JsonSource>,
        tracker: Option<RateTracker>,
    ) -> Self {
        let refresh = widget.refresh.max(1);

        let (state_tx, state_rx) = watch::channel(WidgetState::default());
        let (countdown_tx, countdown_rx) = watch::channel(refresh);
        let (retry_tx, retry_rx) = mpsc::channel(1);
        let (cycle_tx, cycle_rx) = mpsc::channel(4);

        let widget = Arc::new(widget);
        let fetch_task = tokio::spawn(run_fetch_loop(
            widget,
            source,
            tracker,
            state_tx,
            cycle_tx,
            retry_rx,
        ));
        let countdown_task = tokio::spawn(run_countdown(refresh, countdown_tx, cycle_rx));

        Self {
            state_rx,
            countdown_rx,
            retry_tx,
            fetch_task,
            countdown_task,
        }
    }

    pub fn state(&self) -> watch::Receiver<WidgetState> {
        self.state_rx.clone()
    }

    /// Seconds until the next scheduled fetch, for display.
    pub fn countdown(&self) -> watch::Receiver<u64> {
        self.countdown_rx.clone()
    }

    /// Requests an immediate refetch (the "try again" action). A request
    /// already queued is enough; extras are dropped.
    pub fn retry(&self) {
        let _ = self.retry_tx.try_send(());
    }
}

impl Drop for WidgetPoller {
    fn drop(&mut self) {
        self.fetch_task.abort();
        self.countdown_task.abort();
    }
}

async fn run_fetch_loop(
    widget: Arc<Widget>,
    source: Arc<dyn JsonSource>,
    tracker: Option<RateTracker>,
    state_tx: watch::Sender<WidgetState>,
    cycle_tx: mpsc::Sender<()>,
    mut retry_rx: mpsc::Receiver<()>,
) {
    let period = Duration::from_secs(widget.refresh.max(1));
    // First tick completes immediately: the initial fetch.
    let mut ticker = interval(period);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            Some(_) = retry_rx.recv() => {
                // Manual retry: fetch now and restart the cadence.
                ticker.reset();
            }
        }

        let _ = cycle_tx.try_send(());

        // Fire-and-forget so a slow response cannot delay the next cycle.
        tokio::spawn(fetch_once(
            widget.clone(),
            source.clone(),
            tracker.clone(),
            state_tx.clone(),
        ));
    }
}

async fn fetch_once(
    widget: Arc<Widget>,
    source: Arc<dyn JsonSource>,
    tracker: Option<RateTracker>,
    state_tx: watch::Sender<WidgetState>,
) {
    state_tx.send_modify(|state| {
        state.phase = Phase::Loading;
        state.error = None;
    });

    match source.fetch_json(&widget.api).await {
        Ok(payload) => {
            state_tx.send_modify(|state| {
                state.phase = Phase::Success;
                state.payload = Some(payload);
                state.last_update = Some(Utc::now());
                state.error = None;
            });

            if let (Some(provider), Some(limit), Some(tracker)) =
                (&widget.provider, widget.rate_limit, &tracker)
            {
                if let Err(e) = tracker.record_call(provider, limit.period).await {
                    tracing::warn!(provider = %provider, "failed to record API usage: {}", e);
                }
            }
        }
        Err(e) => {
            tracing::warn!(widget = %widget.name, "fetch failed: {}", e);
            state_tx.send_modify(|state| {
                state.phase = Phase::Failed;
                state.error = Some(e.to_string());
                // Last-known payload stays visible.
            });
        }
    }
}

async fn run_countdown(
    refresh: u64,
    countdown_tx: watch::Sender<u64>,
    mut cycle_rx: mpsc::Receiver<()>,
) {
    let mut remaining = refresh;
    // First decrement lands a full second in.
    let mut ticker = interval_at(Instant::now() + Duration::from_secs(1), Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                remaining = if remaining <= 1 { refresh } else { remaining - 1 };
                let _ = countdown_tx.send(remaining);
            }
            Some(_) = cycle_rx.recv() => {
                remaining = refresh;
                let _ = countdown_tx.send(remaining);
            }
        }
    }
}
