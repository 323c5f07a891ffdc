//! Browser events consumed by the session controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::TabId;

/// A browser event with the instant it was observed.
///
/// `timestamp` is optional on the wire; hosts substitute the current time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimedEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub event: TabEvent,
}

/// Events from the tab and idle-detection collaborators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TabEvent {
    /// A tab became the focused tab.
    Activated { tab_id: TabId },
    /// A tab's url, title or load status changed.
    Updated(TabUpdate),
    /// A tab was closed.
    Removed { tab_id: TabId },
    /// The system idle state changed.
    IdleStateChanged { state: IdleState },
}

/// Changes reported for a tab.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TabUpdate {
    pub tab_id: TabId,
    /// New address, present only when the tab navigated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// The tab's current title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LoadStatus>,
    /// Whether the browser reports the tab as the active one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl TabUpdate {
    /// An update carrying no changes.
    #[must_use]
    pub const fn new(tab_id: TabId) -> Self {
        Self {
            tab_id,
            url: None,
            title: None,
            status: None,
            active: None,
        }
    }

    /// A navigation of `tab_id` to `url`.
    #[must_use]
    pub fn navigated(tab_id: TabId, url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::new(tab_id)
        }
    }

    /// A load-complete notification carrying the settled title.
    #[must_use]
    pub fn completed(tab_id: TabId, title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            status: Some(LoadStatus::Complete),
            ..Self::new(tab_id)
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }
}

/// Page load status carried by update events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    Loading,
    Complete,
}

/// System idle state as reported by the idle-detection collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdleState {
    Active,
    Idle,
    Locked,
}

impl IdleState {
    /// Anything other than `Active` counts as the user being away.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_activation_without_timestamp() {
        let parsed: TimedEvent = serde_json::from_str(r#"{"type":"activated","tab_id":3}"#).unwrap();
        assert_eq!(parsed.timestamp, None);
        assert_eq!(
            parsed.event,
            TabEvent::Activated {
                tab_id: TabId::new(3)
            }
        );
    }

    #[test]
    fn parses_update_with_all_fields() {
        let json = r#"{
            "type": "updated",
            "timestamp": "2025-01-29T12:00:00.250Z",
            "tab_id": 9,
            "url": "https://a.example/",
            "title": "A",
            "status": "complete",
            "active": true
        }"#;
        let parsed: TimedEvent = serde_json::from_str(json).unwrap();
        assert!(parsed.timestamp.is_some());
        let TabEvent::Updated(update) = parsed.event else {
            panic!("expected update event");
        };
        assert_eq!(update.tab_id, TabId::new(9));
        assert_eq!(update.url.as_deref(), Some("https://a.example/"));
        assert_eq!(update.status, Some(LoadStatus::Complete));
        assert_eq!(update.active, Some(true));
    }

    #[test]
    fn parses_idle_states() {
        for (raw, active) in [("active", true), ("idle", false), ("locked", false)] {
            let json = format!(r#"{{"type":"idle_state_changed","state":"{raw}"}}"#);
            let parsed: TimedEvent = serde_json::from_str(&json).unwrap();
            let TabEvent::IdleStateChanged { state } = parsed.event else {
                panic!("expected idle event");
            };
            assert_eq!(state.is_active(), active);
        }
    }

    #[test]
    fn rejects_unknown_event_type() {
        let result: Result<TimedEvent, _> = serde_json::from_str(r#"{"type":"zoomed","tab_id":1}"#);
        assert!(result.is_err());
    }
}
