//! Window planning and gap detection
//!
//! A window is an inclusive calendar-date interval and the unit of both
//! fetching and caching. The planner slices a requested range into
//! fixed-size windows; the gap detector diffs a plan against the windows
//! already persisted on disk.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// An inclusive `[start, end]` calendar-date interval (UTC dates).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Window {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        debug_assert!(start <= end, "window start after end");
        Self { start, end }
    }

    /// Number of days covered, counting both endpoints.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// True when the two intervals share at least one day.
    pub fn overlaps(&self, other: &Window) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Slice `[start, end]` into chronological, non-overlapping windows of
/// `chunk_days` days each, the last truncated to end exactly at `end`.
///
/// A start after the end yields an empty plan; `start == end` is the
/// single-day range and yields one one-day window.
pub fn plan_windows(start: NaiveDate, end: NaiveDate, chunk_days: u32) -> Vec<Window> {
    if chunk_days == 0 || start > end {
        return Vec::new();
    }

    let mut windows = Vec::new();
    let mut cursor = start;
    while cursor <= end {
        let nominal_end = cursor + Duration::days(i64::from(chunk_days) - 1);
        let window_end = nominal_end.min(end);
        windows.push(Window::new(cursor, window_end));
        cursor = window_end + Duration::days(1);
    }

    windows
}

/// Return the planned windows with no persisted chunk, in plan order.
///
/// Matching is exact `(start, end)` equality, not overlap: a chunk sliced
/// with a different chunk size never satisfies a planned window even when
/// it covers the same days. Changing the chunk size between runs therefore
/// re-fetches any range sliced differently before.
pub fn missing_windows(planned: &[Window], existing: &HashSet<Window>) -> Vec<Window> {
    planned
        .iter()
        .copied()
        .filter(|w| !existing.contains(w))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn window(s: (i32, u32, u32), e: (i32, u32, u32)) -> Window {
        Window::new(date(s.0, s.1, s.2), date(e.0, e.1, e.2))
    }

    #[test]
    fn test_plan_september_to_october_weekly() {
        let windows = plan_windows(date(2025, 9, 9), date(2025, 10, 9), 7);

        assert_eq!(
            windows,
            vec![
                window((2025, 9, 9), (2025, 9, 15)),
                window((2025, 9, 16), (2025, 9, 22)),
                window((2025, 9, 23), (2025, 9, 29)),
                window((2025, 9, 30), (2025, 10, 6)),
                window((2025, 10, 7), (2025, 10, 9)),
            ]
        );
        assert_eq!(windows.last().unwrap().len_days(), 3);
    }

    #[test]
    fn test_plan_exact_multiple_has_no_truncated_window() {
        // 14 days inclusive, chunked by 7
        let windows = plan_windows(date(2025, 9, 9), date(2025, 9, 22), 7);

        assert_eq!(windows.len(), 2);
        assert!(windows.iter().all(|w| w.len_days() == 7));
        assert_eq!(windows[1].end, date(2025, 9, 22));
    }

    #[test]
    fn test_plan_covers_range_without_gaps_or_overlap() {
        let windows = plan_windows(date(2025, 1, 1), date(2025, 3, 17), 30);

        assert_eq!(windows[0].start, date(2025, 1, 1));
        assert_eq!(windows.last().unwrap().end, date(2025, 3, 17));
        for pair in windows.windows(2) {
            assert_eq!(pair[1].start, pair[0].end + Duration::days(1));
        }
    }

    #[test]
    fn test_plan_single_day_range() {
        let windows = plan_windows(date(2025, 9, 9), date(2025, 9, 9), 7);

        assert_eq!(windows, vec![window((2025, 9, 9), (2025, 9, 9))]);
        assert_eq!(windows[0].len_days(), 1);
    }

    #[test]
    fn test_plan_inverted_range_is_empty() {
        assert!(plan_windows(date(2025, 9, 10), date(2025, 9, 9), 7).is_empty());
    }

    #[test]
    fn test_plan_zero_chunk_days_is_empty() {
        assert!(plan_windows(date(2025, 9, 9), date(2025, 9, 20), 0).is_empty());
    }

    #[test]
    fn test_missing_windows_all_absent() {
        let planned = plan_windows(date(2025, 9, 9), date(2025, 9, 22), 7);
        let missing = missing_windows(&planned, &HashSet::new());

        assert_eq!(missing, planned);
    }

    #[test]
    fn test_missing_windows_all_present() {
        let planned = plan_windows(date(2025, 9, 9), date(2025, 9, 22), 7);
        let existing: HashSet<Window> = planned.iter().copied().collect();

        assert!(missing_windows(&planned, &existing).is_empty());
    }

    #[test]
    fn test_missing_windows_exact_subset() {
        let planned = plan_windows(date(2025, 9, 9), date(2025, 10, 9), 7);
        let mut existing = HashSet::new();
        existing.insert(planned[0]);
        existing.insert(planned[2]);

        let missing = missing_windows(&planned, &existing);
        assert_eq!(missing, vec![planned[1], planned[3], planned[4]]);
    }

    #[test]
    fn test_missing_windows_is_monotonic() {
        let planned = plan_windows(date(2025, 9, 9), date(2025, 10, 9), 7);
        let mut existing = HashSet::new();

        let mut previous = missing_windows(&planned, &existing).len();
        for w in &planned {
            existing.insert(*w);
            let now = missing_windows(&planned, &existing).len();
            assert!(now <= previous, "adding chunks must never grow the gap set");
            previous = now;
        }
        assert_eq!(previous, 0);
    }

    #[test]
    fn test_overlap_semantics_do_not_satisfy_gaps() {
        // A 14-day chunk covers the same days as two 7-day windows but
        // satisfies neither of them.
        let planned = plan_windows(date(2025, 9, 9), date(2025, 9, 22), 7);
        let mut existing = HashSet::new();
        existing.insert(window((2025, 9, 9), (2025, 9, 22)));

        assert_eq!(missing_windows(&planned, &existing), planned);
    }

    #[test]
    fn test_window_overlaps() {
        let a = window((2025, 9, 9), (2025, 9, 15));
        assert!(a.overlaps(&window((2025, 9, 15), (2025, 9, 20))));
        assert!(a.overlaps(&window((2025, 9, 1), (2025, 9, 9))));
        assert!(!a.overlaps(&window((2025, 9, 16), (2025, 9, 22))));
    }
}
