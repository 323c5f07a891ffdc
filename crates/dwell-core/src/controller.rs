//! The session state machine.
//!
//! Reconciles three asynchronously arriving streams (tab activation, tab
//! updates, system idle state) plus tab removal into one consistent timer per
//! tab. Per-tab state is implicit in registry membership:
//!
//! - **Untracked**: no open visit.
//! - **Open/Running**: visit open, timer accruing.
//! - **Open/Paused**: visit open, timer stopped (background tab or user idle).
//!
//! The global [`SystemMode`] gates whether the focused tab's timer may run.
//! Every handler runs to completion synchronously; only the sink may defer
//! work, and its outcome never feeds back into registry state.

use chrono::{DateTime, Utc};

use crate::event::{IdleState, LoadStatus, TabEvent, TabUpdate};
use crate::registry::{FinishedVisit, RegistryError, VisitRegistry};
use crate::sink::{IdentitySource, VisitRecord, VisitSink};
use crate::site;
use crate::types::TabId;

/// Configuration for the session controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Visits whose finalized duration is below this are dropped unsent.
    /// Default: 1000 (one second).
    pub min_visit_ms: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self { min_visit_ms: 1_000 }
    }
}

/// Whether the user is present, per the idle-detection collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SystemMode {
    #[default]
    Active,
    Idle,
}

impl SystemMode {
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl From<IdleState> for SystemMode {
    fn from(state: IdleState) -> Self {
        if state.is_active() { Self::Active } else { Self::Idle }
    }
}

/// Observable per-tab state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabState {
    Untracked,
    Running,
    Paused,
}

/// Outcome counters for closed visits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushStats {
    /// Records handed to the sink.
    pub delivered: u64,
    /// Visits below the significance threshold.
    pub too_short: u64,
    /// Visits dropped because no user identifier was available.
    pub no_identity: u64,
}

/// Drives a [`VisitRegistry`] from browser events and flushes finished visits
/// to a [`VisitSink`].
#[derive(Debug)]
pub struct SessionController<S, I> {
    registry: VisitRegistry,
    focused: Option<TabId>,
    mode: SystemMode,
    config: TrackerConfig,
    stats: FlushStats,
    sink: S,
    identity: I,
}

impl<S: VisitSink, I: IdentitySource> SessionController<S, I> {
    pub fn new(sink: S, identity: I, config: TrackerConfig) -> Self {
        Self {
            registry: VisitRegistry::new(),
            focused: None,
            mode: SystemMode::Active,
            config,
            stats: FlushStats::default(),
            sink,
            identity,
        }
    }

    /// Dispatches one event observed at `now`.
    pub fn handle(&mut self, event: TabEvent, now: DateTime<Utc>) {
        match event {
            TabEvent::Activated { tab_id } => self.on_activated(tab_id, now),
            TabEvent::Updated(update) => self.on_updated(update, now),
            TabEvent::Removed { tab_id } => self.on_removed(tab_id, now),
            TabEvent::IdleStateChanged { state } => self.on_idle_state_changed(state, now),
        }
    }

    /// Rule 1: `tab_id` became the focused tab.
    ///
    /// Every other timer is paused. The focused tab's timer runs only while
    /// the system is active.
    pub fn on_activated(&mut self, tab_id: TabId, now: DateTime<Utc>) {
        tracing::trace!(%tab_id, "tab activated");
        self.focused = Some(tab_id);
        self.registry.pause_all_except(tab_id, now);
        if self.mode.is_active() {
            self.registry.resume_if_open(tab_id, now);
        } else {
            self.registry.pause_if_open(tab_id, now);
        }
    }

    /// Splits an update into its navigation and title parts.
    ///
    /// An update flagged active for a tab that is not the focused one counts
    /// as an activation first. Navigation is evaluated before any title
    /// change carried by the same event.
    pub fn on_updated(&mut self, update: TabUpdate, now: DateTime<Utc>) {
        let tab_id = update.tab_id;
        if update.active == Some(true) && self.focused != Some(tab_id) {
            self.on_activated(tab_id, now);
        }

        if let Some(url) = update.url.as_deref() {
            let focused = update.active.unwrap_or(self.focused == Some(tab_id));
            if focused {
                self.on_navigated(tab_id, url, update.title.as_deref(), now);
            } else {
                tracing::trace!(%tab_id, url, "ignoring background navigation");
            }
        }

        if let Some(title) = update.title.as_deref() {
            if update.status == Some(LoadStatus::Complete) || update.url.is_none() {
                self.on_load_complete(tab_id, title);
            }
        }
    }

    /// Rule 2: the focused tab navigated to `url`.
    ///
    /// Ignored URLs end the open visit. A different site ends the open visit
    /// and starts a new one. The same site rewrites the url in place without
    /// touching the open time or the timer.
    pub fn on_navigated(&mut self, tab_id: TabId, url: &str, title: Option<&str>, now: DateTime<Utc>) {
        if site::is_ignored(url) {
            if self.registry.has_open(tab_id) {
                self.flush(tab_id, now);
            }
            return;
        }

        if let Some(visit) = self.registry.visit(tab_id) {
            let new_site = site::site_of(url);
            if site::same_site(visit.site.as_deref(), new_site.as_deref()) {
                if let Err(err) = self.registry.update_url_in_place(tab_id, url) {
                    tracing::warn!(%err, "same-site update failed");
                }
                return;
            }
            self.flush(tab_id, now);
        }

        self.open_visit(tab_id, url, title.unwrap_or(url), now);
    }

    /// Rule 3: the page finished loading with a settled title.
    pub fn on_load_complete(&mut self, tab_id: TabId, title: &str) {
        if self.registry.has_open(tab_id) {
            if let Err(err) = self.registry.update_title(tab_id, title) {
                tracing::warn!(%err, "title update failed");
            }
        }
    }

    /// Rule 4: the system idle state changed.
    ///
    /// Only the focused tab is touched; background tabs are already paused.
    pub fn on_idle_state_changed(&mut self, state: IdleState, now: DateTime<Utc>) {
        self.mode = SystemMode::from(state);
        tracing::debug!(?state, "idle state changed");

        let Some(tab_id) = self.focused else {
            return;
        };
        if self.mode.is_active() {
            self.registry.resume_if_open(tab_id, now);
        } else {
            self.registry.pause_if_open(tab_id, now);
        }
    }

    /// Rule 5: the tab was closed.
    ///
    /// All state for the handle is dropped before returning, so a reused
    /// handle starts Untracked.
    pub fn on_removed(&mut self, tab_id: TabId, now: DateTime<Utc>) {
        if self.registry.has_open(tab_id) {
            self.flush(tab_id, now);
        }
        if self.focused == Some(tab_id) {
            self.focused = None;
        }
    }

    /// Closes every open visit as if its tab were removed.
    pub fn shutdown(&mut self, now: DateTime<Utc>) {
        for tab_id in self.registry.open_tabs() {
            self.on_removed(tab_id, now);
        }
        tracing::debug!(stats = ?self.stats, "session controller shut down");
    }

    pub fn tab_state(&self, tab_id: TabId) -> TabState {
        match self.registry.timer(tab_id) {
            None => TabState::Untracked,
            Some(timer) if timer.is_running() => TabState::Running,
            Some(_) => TabState::Paused,
        }
    }

    pub const fn registry(&self) -> &VisitRegistry {
        &self.registry
    }

    pub const fn focused_tab(&self) -> Option<TabId> {
        self.focused
    }

    pub const fn mode(&self) -> SystemMode {
        self.mode
    }

    pub const fn stats(&self) -> FlushStats {
        self.stats
    }

    pub const fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Opens a visit, force-closing a stale one left behind by a missed close.
    ///
    /// The new timer runs only if the tab is focused and the system active.
    fn open_visit(&mut self, tab_id: TabId, url: &str, title: &str, now: DateTime<Utc>) {
        match self.registry.open(tab_id, url, title, now) {
            Ok(()) => {}
            Err(RegistryError::AlreadyOpen { .. }) => {
                tracing::warn!(%tab_id, "stale visit still open; closing it first");
                self.flush(tab_id, now);
                if let Err(err) = self.registry.open(tab_id, url, title, now) {
                    tracing::warn!(%err, "could not open visit");
                    return;
                }
            }
            Err(err) => {
                tracing::warn!(%err, "could not open visit");
                return;
            }
        }

        if !self.mode.is_active() || self.focused != Some(tab_id) {
            self.registry.pause_if_open(tab_id, now);
        }
    }

    /// Closes the tab's visit and hands the record to the sink.
    fn flush(&mut self, tab_id: TabId, now: DateTime<Utc>) {
        match self.registry.close(tab_id, now) {
            Ok(finished) => self.deliver(finished),
            Err(err) => tracing::debug!(%err, "nothing to flush"),
        }
    }

    fn deliver(&mut self, finished: FinishedVisit) {
        if finished.duration_ms < self.config.min_visit_ms {
            tracing::debug!(
                tab_id = %finished.tab_id,
                duration_ms = finished.duration_ms,
                "dropping visit below significance threshold"
            );
            self.stats.too_short += 1;
            return;
        }

        let Some(user_id) = self.identity.user_id() else {
            tracing::warn!(url = %finished.url, "no user identifier; visit not sent");
            self.stats.no_identity += 1;
            return;
        };

        let record = VisitRecord::new(user_id, finished);
        tracing::info!(
            url = %record.url,
            seconds = record.time_spent_seconds,
            "flushing visit"
        );
        self.stats.delivered += 1;
        self.sink.deliver(record);
    }
}
