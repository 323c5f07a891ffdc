//! Ownership of open visits and their timers, keyed by tab.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::site;
use crate::timer::TabTimer;
use crate::types::TabId;

/// Protocol violations against the registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A visit is already open for the tab; it must be closed first.
    #[error("tab {tab_id} already has an open visit")]
    AlreadyOpen { tab_id: TabId },

    /// There is no open visit for the tab.
    #[error("tab {tab_id} has no open visit")]
    NoOpenVisit { tab_id: TabId },
}

/// One continuous attention session on one site within one tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    pub url: String,
    pub title: String,
    pub open_time: DateTime<Utc>,
    /// Hostname extracted at open time; `None` if extraction failed.
    pub site: Option<String>,
}

/// A visit removed from the registry with its finalized duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedVisit {
    pub tab_id: TabId,
    pub url: String,
    pub title: String,
    pub open_time: DateTime<Utc>,
    pub close_time: DateTime<Utc>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
struct Entry {
    visit: Visit,
    timer: TabTimer,
}

/// Maps each tracked tab to its open visit and timer.
///
/// A tab has at most one entry. Entries are only created for trackable URLs,
/// which is the caller's responsibility to check.
#[derive(Debug, Default)]
pub struct VisitRegistry {
    entries: HashMap<TabId, Entry>,
}

impl VisitRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a visit with a running timer.
    pub fn open(
        &mut self,
        tab_id: TabId,
        url: &str,
        title: &str,
        now: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        if self.entries.contains_key(&tab_id) {
            return Err(RegistryError::AlreadyOpen { tab_id });
        }

        let visit = Visit {
            url: url.to_string(),
            title: title.to_string(),
            open_time: now,
            site: site::site_of(url),
        };
        self.entries.insert(
            tab_id,
            Entry {
                visit,
                timer: TabTimer::started(now),
            },
        );
        tracing::debug!(%tab_id, url, "opened visit");
        Ok(())
    }

    /// Replaces the url of the open visit, keeping open time and timer.
    pub fn update_url_in_place(&mut self, tab_id: TabId, url: &str) -> Result<(), RegistryError> {
        let entry = self.entry_mut(tab_id)?;
        entry.visit.url = url.to_string();
        tracing::trace!(%tab_id, url, "updated visit url in place");
        Ok(())
    }

    /// Replaces the title of the open visit.
    pub fn update_title(&mut self, tab_id: TabId, title: &str) -> Result<(), RegistryError> {
        let entry = self.entry_mut(tab_id)?;
        title.clone_into(&mut entry.visit.title);
        Ok(())
    }

    /// Finalizes the tab's timer and removes its visit.
    pub fn close(&mut self, tab_id: TabId, now: DateTime<Utc>) -> Result<FinishedVisit, RegistryError> {
        let Entry { visit, mut timer } = self
            .entries
            .remove(&tab_id)
            .ok_or(RegistryError::NoOpenVisit { tab_id })?;

        let duration_ms = timer.finalize(now);
        tracing::debug!(%tab_id, url = %visit.url, duration_ms, "closed visit");

        Ok(FinishedVisit {
            tab_id,
            url: visit.url,
            title: visit.title,
            open_time: visit.open_time,
            close_time: now,
            duration_ms,
        })
    }

    pub fn has_open(&self, tab_id: TabId) -> bool {
        self.entries.contains_key(&tab_id)
    }

    /// Returns the open visit for the tab, if any.
    pub fn visit(&self, tab_id: TabId) -> Option<&Visit> {
        self.entries.get(&tab_id).map(|entry| &entry.visit)
    }

    /// Returns the tab's timer, if a visit is open.
    pub fn timer(&self, tab_id: TabId) -> Option<&TabTimer> {
        self.entries.get(&tab_id).map(|entry| &entry.timer)
    }

    /// Pauses every timer except the one belonging to `tab_id`.
    pub fn pause_all_except(&mut self, tab_id: TabId, now: DateTime<Utc>) {
        for (id, entry) in &mut self.entries {
            if *id != tab_id {
                entry.timer.pause(now);
            }
        }
    }

    /// Pauses the tab's timer if a visit is open. Returns whether one was.
    pub fn pause_if_open(&mut self, tab_id: TabId, now: DateTime<Utc>) -> bool {
        self.entries.get_mut(&tab_id).is_some_and(|entry| {
            entry.timer.pause(now);
            true
        })
    }

    /// Resumes the tab's timer if a visit is open. Returns whether one was.
    pub fn resume_if_open(&mut self, tab_id: TabId, now: DateTime<Utc>) -> bool {
        self.entries.get_mut(&tab_id).is_some_and(|entry| {
            entry.timer.resume(now);
            true
        })
    }

    /// Tabs with an open visit, in ascending order.
    pub fn open_tabs(&self) -> Vec<TabId> {
        let mut tabs: Vec<TabId> = self.entries.keys().copied().collect();
        tabs.sort_unstable();
        tabs
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry_mut(&mut self, tab_id: TabId) -> Result<&mut Entry, RegistryError> {
        self.entries
            .get_mut(&tab_id)
            .ok_or(RegistryError::NoOpenVisit { tab_id })
    }
}
