//! Chunked date-range event cache
//!
//! Partitions a continuous date range into fixed-size windows, persists one
//! chunk per window, fetches only the windows with no chunk yet, and merges
//! cached plus freshly fetched data into a flat event list. Re-running the
//! same range issues no upstream calls at all.

pub mod chunk;
pub mod migrate;
pub mod store;
pub mod window;

pub use chunk::CachedChunk;
pub use migrate::{migrate_legacy, MigrationStats};
pub use store::{ChunkStore, DirStore, MemoryStore, StoreStats};
pub use window::{missing_windows, plan_windows, Window};

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use payreport_core::{EventRecord, SourceRef};
use std::collections::HashSet;

/// Upstream collaborator boundary consumed by the cache.
///
/// Implementors own pagination and authentication; the cache only sees the
/// flattened per-window result. A returned error aborts that window only.
#[async_trait]
pub trait EventFetcher {
    async fn fetch_window(&self, source: &SourceRef, window: Window)
        -> Result<Vec<EventRecord>>;
}

/// Counters describing one `ensure_range` run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Windows the plan called for.
    pub planned: usize,
    /// Windows already on disk and skipped.
    pub already_cached: usize,
    /// Windows fetched and persisted this run.
    pub fetched: usize,
    /// Windows whose fetch failed; no chunk written, eligible next run.
    pub failed: usize,
}

/// The cache facade: a chunk store plus the fetch-and-cache flow on top.
pub struct EventCache<S> {
    store: S,
}

impl<S: ChunkStore> EventCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Make sure every window covering `[start, end]` has a persisted chunk,
    /// fetching only the missing ones.
    ///
    /// A window-level fetch failure is logged and skipped; the window stays
    /// un-cached and a future run will pick it up. Events the fetcher returns
    /// outside the window's bounds (pagination crossing a boundary) are
    /// dropped before persisting. An empty result still persists an empty
    /// chunk so the window is never queried again.
    pub async fn ensure_range<F>(
        &self,
        fetcher: &F,
        source: &SourceRef,
        start: NaiveDate,
        end: NaiveDate,
        chunk_days: u32,
    ) -> Result<FetchOutcome>
    where
        F: EventFetcher + ?Sized,
    {
        let planned = plan_windows(start, end, chunk_days);
        let existing: HashSet<Window> = self.store.list(source)?.into_iter().collect();
        let missing = missing_windows(&planned, &existing);

        let mut outcome = FetchOutcome {
            planned: planned.len(),
            already_cached: planned.len() - missing.len(),
            ..FetchOutcome::default()
        };

        log::info!(
            "{}: {} windows planned, {} cached, {} to fetch",
            source.id,
            outcome.planned,
            outcome.already_cached,
            missing.len()
        );

        for window in missing {
            match fetcher.fetch_window(source, window).await {
                Ok(events) => {
                    let total = events.len();
                    let in_window: Vec<EventRecord> = events
                        .into_iter()
                        .filter(|e| window.contains(e.date()))
                        .collect();
                    if in_window.len() < total {
                        log::debug!(
                            "{} {}: dropped {} out-of-window events",
                            source.id,
                            window,
                            total - in_window.len()
                        );
                    }

                    self.store.put(source, &CachedChunk::new(source, window, in_window))?;
                    outcome.fetched += 1;
                }
                Err(err) => {
                    log::warn!(
                        "{} {}: fetch failed, window left un-cached for a later run: {:#}",
                        source.id,
                        window,
                        err
                    );
                    outcome.failed += 1;
                }
            }
        }

        Ok(outcome)
    }

    /// Load every chunk overlapping `[start, end]`, trim each event list to
    /// the requested dates, and concatenate in ascending chunk-start order.
    ///
    /// Within a chunk, on-disk order is preserved; there is no cross-chunk
    /// sort by event timestamp.
    pub fn read_range(
        &self,
        source: &SourceRef,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<EventRecord>> {
        if start > end {
            return Ok(Vec::new());
        }
        let requested = Window::new(start, end);

        let mut windows: Vec<Window> = self
            .store
            .list(source)?
            .into_iter()
            .filter(|w| w.overlaps(&requested))
            .collect();
        windows.sort();

        let mut events = Vec::new();
        for window in windows {
            if let Some(chunk) = self.store.get(source, window)? {
                events.extend(
                    chunk
                        .events
                        .into_iter()
                        .filter(|e| requested.contains(e.date())),
                );
            }
        }

        Ok(events)
    }
}
