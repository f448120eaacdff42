//! Minimal event projection

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sentinel user id for events carrying no identifying fields at all.
pub const ANONYMOUS_USER: &str = "anonymous";

/// The reduced per-event record persisted in a cached chunk.
///
/// Upstream events carry far more data than the reports need; only the
/// timestamp, the event id, a resolved user identity and a small set of
/// tags extracted by key lookup survive the projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub timestamp: DateTime<Utc>,
    pub event_id: String,
    pub user_id: String,

    /// Source-specific tags (e.g. decline reason, merchant identifier).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl EventRecord {
    /// Calendar date (UTC) the event occurred on; the unit of window membership.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// Look up a tag value by key.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

/// Resolve the user identity for an upstream event.
///
/// Preference order: explicit user id, then email, then IP address, then
/// the `"anonymous"` sentinel. Empty strings count as absent.
pub fn resolve_user_id(
    id: Option<&str>,
    email: Option<&str>,
    ip_address: Option<&str>,
) -> String {
    [id, email, ip_address]
        .into_iter()
        .flatten()
        .find(|v| !v.trim().is_empty())
        .unwrap_or(ANONYMOUS_USER)
        .to_string()
}
