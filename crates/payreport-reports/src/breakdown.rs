//! Event breakdown aggregators
//!
//! Pure functions over the merged event list; no I/O. Groups carry the
//! total event count and the number of distinct resolved users, sorted
//! descending by event count with first-seen order breaking ties.

use payreport_core::EventRecord;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Tag key carrying the payment decline reason.
pub const REASON_TAG: &str = "reason";

/// Tag key carrying the merchant identifier.
pub const MERCHANT_TAG: &str = "merchant";

/// Reasons like "Card 4242 is not a valid card number" embed the card
/// number, so every decline lands in its own group; anything ending in this
/// suffix is collapsed into one canonical bucket.
const INVALID_CARD_SUFFIX: &str = "is not a valid card number";

/// Canonical bucket for collapsed invalid-card-number reasons.
pub const INVALID_CARD_BUCKET: &str = "Invalid card number";

/// Bucket for events with no reason tag at all.
pub const NO_REASON_BUCKET: &str = "(no reason)";

/// One aggregated group in a breakdown table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakdownRow {
    pub label: String,
    pub events: usize,
    pub users: usize,
}

/// Group events by normalized decline reason.
pub fn reason_breakdown(events: &[EventRecord]) -> Vec<BreakdownRow> {
    breakdown_by(events, |event| Some(normalize_reason(event.tag(REASON_TAG))))
}

/// Group events by merchant identifier; events without the tag are ignored.
pub fn merchant_breakdown(events: &[EventRecord]) -> Vec<BreakdownRow> {
    breakdown_by(events, |event| event.tag(MERCHANT_TAG).map(str::to_string))
}

/// Number of distinct resolved user ids across the event list.
pub fn distinct_users(events: &[EventRecord]) -> usize {
    events
        .iter()
        .map(|e| e.user_id.as_str())
        .collect::<HashSet<&str>>()
        .len()
}

fn normalize_reason(reason: Option<&str>) -> String {
    match reason {
        Some(r) if r.trim_end().ends_with(INVALID_CARD_SUFFIX) => INVALID_CARD_BUCKET.to_string(),
        Some(r) => r.to_string(),
        None => NO_REASON_BUCKET.to_string(),
    }
}

fn breakdown_by<F>(events: &[EventRecord], key_fn: F) -> Vec<BreakdownRow>
where
    F: Fn(&EventRecord) -> Option<String>,
{
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, (usize, HashSet<&str>)> = HashMap::new();

    for event in events {
        let Some(label) = key_fn(event) else {
            continue;
        };
        let entry = groups.entry(label.clone()).or_insert_with(|| {
            order.push(label);
            (0, HashSet::new())
        });
        entry.0 += 1;
        entry.1.insert(event.user_id.as_str());
    }

    let mut rows: Vec<BreakdownRow> = order
        .into_iter()
        .map(|label| {
            let (events, users) = &groups[&label];
            BreakdownRow {
                label,
                events: *events,
                users: users.len(),
            }
        })
        .collect();

    // Stable sort: ties keep first-seen order.
    rows.sort_by(|a, b| b.events.cmp(&a.events));
    rows
}
