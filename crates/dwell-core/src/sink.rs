//! Delivery-side interfaces: the finished-visit record, the sink that accepts
//! it, and the identity source that stamps it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::registry::FinishedVisit;
use crate::types::UserId;

/// A finished visit as handed to the collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitRecord {
    pub user_id: UserId,
    pub url: String,
    pub title: String,
    #[serde(with = "iso_millis")]
    pub open_time: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub close_time: DateTime<Utc>,
    pub time_spent_seconds: u64,
}

impl VisitRecord {
    /// Builds the delivery record for a finished visit.
    pub fn new(user_id: UserId, visit: FinishedVisit) -> Self {
        Self {
            user_id,
            url: visit.url,
            title: visit.title,
            open_time: visit.open_time,
            close_time: visit.close_time,
            time_spent_seconds: whole_seconds(visit.duration_ms),
        }
    }
}

/// Rounds milliseconds to the nearest second, exact halves going down.
#[must_use]
pub const fn whole_seconds(duration_ms: u64) -> u64 {
    duration_ms.saturating_add(499) / 1000
}

/// Accepts finished visits for delivery.
///
/// Delivery is fire-and-forget: implementations report their own failures and
/// must not block the caller on I/O.
pub trait VisitSink {
    fn deliver(&mut self, record: VisitRecord);
}

impl VisitSink for Vec<VisitRecord> {
    fn deliver(&mut self, record: VisitRecord) {
        self.push(record);
    }
}

/// Supplies the provisioned user identifier, if any.
pub trait IdentitySource {
    fn user_id(&self) -> Option<UserId>;
}

impl IdentitySource for Option<UserId> {
    fn user_id(&self) -> Option<UserId> {
        self.clone()
    }
}

impl IdentitySource for UserId {
    fn user_id(&self) -> Option<UserId> {
        Some(self.clone())
    }
}

/// ISO-8601 UTC timestamps with millisecond precision, e.g.
/// `2025-01-29T12:00:00.000Z`.
mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
