//! Dashboard refresh coordination.
//!
//! Decides when the security dashboard re-fetches, fans the independent
//! sources out concurrently, drops responses that a newer request has
//! superseded, and owns the periodic refresh task for a mounted dashboard.

mod sequence;
mod sources;

pub use sequence::*;
pub use sources::*;

use crate::client::{ApiError, RequestExecutor};
use crate::config::RefreshConfig;
use chrono::{DateTime, Utc};
use futures::future::{join_all, try_join_all};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How a fan-out reacts to a failing source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanOutMode {
    /// Failed sources mark their own panel; the rest still populate.
    PartialTolerant,
    /// The first failure fails the whole refresh. Used for the initial load.
    AllOrNothing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum PanelState {
    Loaded(Value),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub panels: BTreeMap<DashboardSource, PanelState>,
    /// Shared banner error from the most recent refresh
    pub error: Option<String>,
    pub attack_page: u32,
    pub refreshed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// Data was younger than the staleness window.
    Skipped { age: Duration },
    Refreshed(DashboardSnapshot),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    pub staleness: Duration,
    pub interval: Duration,
    pub page_size: u32,
}

impl From<&RefreshConfig> for RefreshPolicy {
    fn from(config: &RefreshConfig) -> Self {
        Self {
            staleness: Duration::from_secs(config.staleness_seconds),
            interval: Duration::from_secs(config.interval_seconds),
            page_size: config.attack_page_size,
        }
    }
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self::from(&RefreshConfig::default())
    }
}

struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Refresh state for one dashboard instance.
pub struct RefreshCoordinator {
    executor: Arc<RequestExecutor>,
    policy: RefreshPolicy,
    last_refresh: Mutex<Option<Instant>>,
    refreshed_at: RwLock<Option<DateTime<Utc>>>,
    loading: AtomicUsize,
    sequences: SequenceGuard,
    panels: RwLock<BTreeMap<DashboardSource, PanelState>>,
    error: RwLock<Option<String>>,
    attack_page: AtomicU32,
    updates: watch::Sender<u64>,
}

impl RefreshCoordinator {
    pub fn new(executor: Arc<RequestExecutor>, policy: RefreshPolicy) -> Self {
        Self {
            executor,
            policy,
            last_refresh: Mutex::new(None),
            refreshed_at: RwLock::new(None),
            loading: AtomicUsize::new(0),
            sequences: SequenceGuard::new(),
            panels: RwLock::new(BTreeMap::new()),
            error: RwLock::new(None),
            attack_page: AtomicU32::new(1),
            updates: watch::channel(0).0,
        }
    }

    /// Start the attack list on `page` instead of the first one.
    pub fn starting_at_page(self, page: u32) -> Self {
        self.attack_page.store(page.max(1), Ordering::SeqCst);
        self
    }

    /// Receiver bumped after every refresh that fetched data.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.updates.subscribe()
    }

    pub fn policy(&self) -> &RefreshPolicy {
        &self.policy
    }

    /// True while any fan-out is still waiting on a source.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst) > 0
    }

    pub fn error(&self) -> Option<String> {
        self.error.read().clone()
    }

    pub fn last_refresh_age(&self) -> Option<Duration> {
        self.last_refresh.lock().map(|at| at.elapsed())
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            panels: self.panels.read().clone(),
            error: self.error.read().clone(),
            attack_page: self.attack_page.load(Ordering::SeqCst),
            refreshed_at: *self.refreshed_at.read(),
        }
    }

    /// Refresh every source unless the data is still fresh.
    ///
    /// `force` bypasses the staleness window. In [`FanOutMode::AllOrNothing`]
    /// a failure leaves the panels and the staleness clock untouched.
    pub async fn refresh(
        &self,
        force: bool,
        mode: FanOutMode,
    ) -> Result<RefreshOutcome, ApiError> {
        let started = Instant::now();
        let previous = {
            let mut last = self.last_refresh.lock();
            if let Some(at) = *last {
                let age = started.duration_since(at);
                if !force && age < self.policy.staleness {
                    tracing::debug!(age_ms = age.as_millis() as u64, "Dashboard data fresh, skipping refresh");
                    return Ok(RefreshOutcome::Skipped { age });
                }
            }
            last.replace(started)
        };

        let _loading = LoadingGuard::new(&self.loading);
        let page = self.attack_page.load(Ordering::SeqCst);
        let tickets: Vec<(DashboardSource, u64)> = DashboardSource::ALL
            .iter()
            .map(|source| (*source, self.sequences.begin(source.as_str())))
            .collect();
        tracing::debug!(force, ?mode, page, "Refreshing dashboard");

        match mode {
            FanOutMode::PartialTolerant => {
                let results = join_all(tickets.iter().map(|(source, ticket)| async move {
                    (*source, *ticket, self.fetch(*source, page).await)
                }))
                .await;

                let mut first_error = None;
                let mut any_loaded = false;
                let mut panels = self.panels.write();
                for (source, ticket, result) in results {
                    if !self.sequences.is_latest(source.as_str(), ticket) {
                        tracing::debug!(%source, "Discarding superseded response");
                        continue;
                    }
                    let state = match result {
                        Ok(value) => {
                            any_loaded = true;
                            PanelState::Loaded(value)
                        }
                        Err(e) => {
                            tracing::warn!(%source, error = %e, "Dashboard source failed");
                            let message = e.user_message();
                            first_error.get_or_insert_with(|| message.clone());
                            PanelState::Failed(message)
                        }
                    };
                    panels.insert(source, state);
                }
                drop(panels);
                if !any_loaded {
                    // Nothing arrived, so the next call must not be skipped.
                    self.rewind_last_refresh(started, previous);
                }
                *self.error.write() = first_error;
            }
            FanOutMode::AllOrNothing => {
                let fetched = try_join_all(tickets.iter().map(|(source, ticket)| async move {
                    self.fetch(*source, page)
                        .await
                        .map(|value| (*source, *ticket, value))
                }))
                .await;

                match fetched {
                    Ok(values) => {
                        let mut panels = self.panels.write();
                        for (source, ticket, value) in values {
                            if self.sequences.is_latest(source.as_str(), ticket) {
                                panels.insert(source, PanelState::Loaded(value));
                            }
                        }
                        drop(panels);
                        *self.error.write() = None;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Dashboard load failed");
                        self.rewind_last_refresh(started, previous);
                        *self.error.write() = Some(e.user_message());
                        return Err(e);
                    }
                }
            }
        }

        *self.refreshed_at.write() = Some(Utc::now());
        self.updates.send_modify(|n| *n += 1);
        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Dashboard refreshed"
        );
        Ok(RefreshOutcome::Refreshed(self.snapshot()))
    }

    /// Undo the freshness stamp of a load that produced no data, unless a
    /// later refresh already replaced it.
    fn rewind_last_refresh(&self, started: Instant, previous: Option<Instant>) {
        let mut last = self.last_refresh.lock();
        if *last == Some(started) {
            *last = previous;
        }
    }

    /// Load one page of the attack list.
    ///
    /// Returns `Ok(None)` when a later page request was issued before this
    /// one completed; the stale result is dropped.
    pub async fn fetch_attack_page(&self, page: u32) -> Result<Option<Value>, ApiError> {
        let page = page.max(1);
        self.attack_page.store(page, Ordering::SeqCst);
        let source = DashboardSource::AttackedEndpoints;
        let ticket = self.sequences.begin(source.as_str());

        let result = self.fetch(source, page).await;
        if !self.sequences.is_latest(source.as_str(), ticket) {
            tracing::debug!(page, "Discarding superseded attack page");
            return Ok(None);
        }

        let value = result?;
        self.panels
            .write()
            .insert(source, PanelState::Loaded(value.clone()));
        Ok(Some(value))
    }

    async fn fetch(&self, source: DashboardSource, page: u32) -> Result<Value, ApiError> {
        self.executor
            .get_json(&source.path(page, self.policy.page_size))
            .await
    }

    /// Run the staleness check every `policy.interval` until cancelled.
    pub fn start(self: Arc<Self>, cancel_token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let period = self.policy.interval.max(Duration::from_millis(1));
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            tracing::info!(
                interval_ms = period.as_millis() as u64,
                "Starting periodic dashboard refresh"
            );

            loop {
                tokio::select! {
                    biased;
                    _ = cancel_token.cancelled() => break,
                    _ = interval.tick() => {
                        tokio::select! {
                            biased;
                            _ = cancel_token.cancelled() => break,
                            result = self.refresh(false, FanOutMode::PartialTolerant) => {
                                if let Err(e) = result {
                                    tracing::warn!(error = %e, "Periodic refresh failed");
                                }
                            }
                        }
                    }
                }
            }

            tracing::info!("Periodic dashboard refresh stopped");
        })
    }

    /// Start periodic refresh tied to the returned handle's lifetime.
    pub fn mount(self: &Arc<Self>) -> RefreshHandle {
        let token = CancellationToken::new();
        let task = Arc::clone(self).start(token.clone());
        RefreshHandle {
            token,
            task: Some(task),
        }
    }
}

/// Owns a periodic refresh task. Dropping it cancels the task.
pub struct RefreshHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancel and wait for the task to exit.
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Periodic refresh task ended abnormally");
            }
        }
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
