//! Cached chunk model

use chrono::{DateTime, NaiveDate, Utc};
use payreport_core::{EventRecord, SourceRef};
use serde::{Deserialize, Serialize};

use crate::window::Window;

/// One persisted cache record covering exactly one window.
///
/// A chunk's identity is its `(start_date, end_date)` pair; once written it
/// is authoritative for that span and is never re-fetched or amended. An
/// empty event list is still a valid chunk: it marks the window as
/// "known, no data".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedChunk {
    /// When the upstream fetch that produced this chunk completed.
    pub fetched_at: DateTime<Utc>,
    pub source_id: String,
    pub source_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub event_count: usize,
    pub events: Vec<EventRecord>,
}

impl CachedChunk {
    pub fn new(source: &SourceRef, window: Window, events: Vec<EventRecord>) -> Self {
        Self {
            fetched_at: Utc::now(),
            source_id: source.id.clone(),
            source_name: source.name.clone(),
            start_date: window.start,
            end_date: window.end,
            event_count: events.len(),
            events,
        }
    }

    pub fn window(&self) -> Window {
        Window::new(self.start_date, self.end_date)
    }

    pub fn source(&self) -> SourceRef {
        SourceRef::new(&self.source_id, &self.source_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn event(ts: DateTime<Utc>, id: &str) -> EventRecord {
        EventRecord {
            timestamp: ts,
            event_id: id.to_string(),
            user_id: "u1".to_string(),
            tags: BTreeMap::new(),
        }
    }

    #[test]
    fn test_chunk_round_trips_through_json() {
        let source = SourceRef::new("123", "Card Declines");
        let window = Window::new(
            NaiveDate::from_ymd_opt(2025, 9, 9).unwrap(),
            NaiveDate::from_ymd_opt(2025, 9, 15).unwrap(),
        );
        let events = vec![
            event(Utc.with_ymd_and_hms(2025, 9, 10, 8, 0, 0).unwrap(), "e1"),
            event(Utc.with_ymd_and_hms(2025, 9, 11, 9, 0, 0).unwrap(), "e2"),
        ];

        let chunk = CachedChunk::new(&source, window, events);
        let json = serde_json::to_string_pretty(&chunk).unwrap();
        let parsed: CachedChunk = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, chunk);
        assert_eq!(parsed.window(), window);
        assert_eq!(parsed.event_count, 2);
    }

    #[test]
    fn test_empty_chunk_is_valid() {
        let source = SourceRef::new("123", "Card Declines");
        let window = Window::new(
            NaiveDate::from_ymd_opt(2025, 9, 9).unwrap(),
            NaiveDate::from_ymd_opt(2025, 9, 15).unwrap(),
        );

        let chunk = CachedChunk::new(&source, window, Vec::new());
        assert_eq!(chunk.event_count, 0);
        assert!(chunk.events.is_empty());
    }
}
