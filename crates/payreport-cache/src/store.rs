//! Chunk persistence with pluggable backends
//!
//! The planner and merge logic only see the `ChunkStore` trait, so they can
//! be tested against the in-memory fake. The production backend is a
//! directory of JSON files, one per window, inside a per-source directory.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use payreport_core::SourceRef;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::chunk::CachedChunk;
use crate::window::Window;

/// Storage backend for cached chunks, keyed by source and window.
pub trait ChunkStore {
    /// Windows with a persisted chunk for this source, in no guaranteed order.
    fn list(&self, source: &SourceRef) -> Result<Vec<Window>>;

    /// Load one chunk. `None` when the window has never been persisted;
    /// an error when the persisted data cannot be read or parsed.
    fn get(&self, source: &SourceRef, window: Window) -> Result<Option<CachedChunk>>;

    /// Persist one chunk. Chunks are immutable in principle; writing the
    /// same window twice overwrites, which only the legacy migration does.
    fn put(&self, source: &SourceRef, chunk: &CachedChunk) -> Result<()>;
}

/// Directory-of-JSON-files backend.
///
/// Layout: `<root>/<slug>-<id>/<start>_to_<end>.json`.
pub struct DirStore {
    root: PathBuf,
}

/// Totals reported by `DirStore::stats`.
#[derive(Debug, Default, Clone)]
pub struct StoreStats {
    pub sources: usize,
    pub chunks: usize,
    pub total_bytes: u64,
}

impl DirStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        if !root.exists() {
            fs::create_dir_all(&root)
                .with_context(|| format!("failed to create cache directory: {}", root.display()))?;
        }

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn source_dir(&self, source: &SourceRef) -> PathBuf {
        self.root.join(source.dir_name())
    }

    fn chunk_path(&self, source: &SourceRef, window: Window) -> PathBuf {
        self.source_dir(source)
            .join(format!("{}_to_{}.json", window.start, window.end))
    }

    /// Count chunk files and bytes across every source directory.
    pub fn stats(&self) -> Result<StoreStats> {
        let mut stats = StoreStats::default();

        for entry in fs::read_dir(&self.root)
            .with_context(|| format!("failed to read cache directory: {}", self.root.display()))?
        {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            stats.sources += 1;

            for file in fs::read_dir(entry.path())? {
                let file = file?;
                if file.path().extension().map_or(false, |ext| ext == "json") {
                    stats.chunks += 1;
                    stats.total_bytes += file.metadata()?.len();
                }
            }
        }

        Ok(stats)
    }
}

/// Parse `<start>_to_<end>.json` back into a window.
fn parse_chunk_filename(name: &str) -> Option<Window> {
    let stem = name.strip_suffix(".json")?;
    let (start, end) = stem.split_once("_to_")?;
    let start: NaiveDate = start.parse().ok()?;
    let end: NaiveDate = end.parse().ok()?;
    if start > end {
        return None;
    }
    Some(Window::new(start, end))
}

impl ChunkStore for DirStore {
    fn list(&self, source: &SourceRef) -> Result<Vec<Window>> {
        let dir = self.source_dir(source);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut windows = Vec::new();
        for entry in fs::read_dir(&dir)
            .with_context(|| format!("failed to read source directory: {}", dir.display()))?
        {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            match parse_chunk_filename(&name) {
                Some(window) => windows.push(window),
                None => log::debug!("ignoring non-chunk file in {}: {}", dir.display(), name),
            }
        }

        Ok(windows)
    }

    fn get(&self, source: &SourceRef, window: Window) -> Result<Option<CachedChunk>> {
        let path = self.chunk_path(source, window);

        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read chunk file: {}", path.display()))?;

        let chunk: CachedChunk = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse chunk file: {}", path.display()))?;

        Ok(Some(chunk))
    }

    fn put(&self, source: &SourceRef, chunk: &CachedChunk) -> Result<()> {
        let path = self.chunk_path(source, chunk.window());

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create source directory: {}", parent.display()))?;
        }

        let content =
            serde_json::to_string_pretty(chunk).context("failed to serialize chunk")?;

        fs::write(&path, content)
            .with_context(|| format!("failed to write chunk file: {}", path.display()))?;

        log::debug!("chunk saved: {}", path.display());

        Ok(())
    }
}

/// In-memory backend for tests.
#[derive(Default)]
pub struct MemoryStore {
    chunks: Mutex<HashMap<(String, Window), CachedChunk>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<(String, Window), CachedChunk>>> {
        self.chunks.lock().map_err(|_| anyhow!("store mutex poisoned"))
    }
}

impl ChunkStore for MemoryStore {
    fn list(&self, source: &SourceRef) -> Result<Vec<Window>> {
        Ok(self
            .lock()?
            .keys()
            .filter(|(id, _)| id == &source.id)
            .map(|(_, window)| *window)
            .collect())
    }

    fn get(&self, source: &SourceRef, window: Window) -> Result<Option<CachedChunk>> {
        Ok(self.lock()?.get(&(source.id.clone(), window)).cloned())
    }

    fn put(&self, source: &SourceRef, chunk: &CachedChunk) -> Result<()> {
        self.lock()?
            .insert((source.id.clone(), chunk.window()), chunk.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use payreport_core::EventRecord;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_chunk(source: &SourceRef, window: Window) -> CachedChunk {
        let events = vec![EventRecord {
            timestamp: Utc
                .with_ymd_and_hms(2025, 9, 10, 12, 0, 0)
                .unwrap(),
            event_id: "e1".to_string(),
            user_id: "u1".to_string(),
            tags: BTreeMap::new(),
        }];
        CachedChunk::new(source, window, events)
    }

    #[test]
    fn test_dir_store_put_then_get_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = DirStore::new(temp_dir.path()).unwrap();
        let source = SourceRef::new("123", "Card Declines");
        let window = Window::new(date(2025, 9, 9), date(2025, 9, 15));

        let chunk = sample_chunk(&source, window);
        store.put(&source, &chunk).unwrap();

        let loaded = store.get(&source, window).unwrap().unwrap();
        assert_eq!(loaded.events, chunk.events);
        assert_eq!(loaded.window(), window);
    }

    #[test]
    fn test_dir_store_filename_convention() {
        let temp_dir = TempDir::new().unwrap();
        let store = DirStore::new(temp_dir.path()).unwrap();
        let source = SourceRef::new("123", "Card Declines");
        let window = Window::new(date(2025, 9, 9), date(2025, 9, 15));

        store.put(&source, &sample_chunk(&source, window)).unwrap();

        let expected = temp_dir
            .path()
            .join("card-declines-123")
            .join("2025-09-09_to_2025-09-15.json");
        assert!(expected.exists());
    }

    #[test]
    fn test_dir_store_get_missing_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = DirStore::new(temp_dir.path()).unwrap();
        let source = SourceRef::new("123", "Card Declines");

        let got = store
            .get(&source, Window::new(date(2025, 9, 9), date(2025, 9, 15)))
            .unwrap();
        assert!(got.is_none());
    }

    #[test]
    fn test_dir_store_corrupt_chunk_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = DirStore::new(temp_dir.path()).unwrap();
        let source = SourceRef::new("123", "Card Declines");
        let window = Window::new(date(2025, 9, 9), date(2025, 9, 15));

        let dir = temp_dir.path().join("card-declines-123");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("2025-09-09_to_2025-09-15.json"), "{ truncated").unwrap();

        assert!(store.get(&source, window).is_err());
    }

    #[test]
    fn test_dir_store_list_ignores_foreign_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = DirStore::new(temp_dir.path()).unwrap();
        let source = SourceRef::new("123", "Card Declines");
        let window = Window::new(date(2025, 9, 9), date(2025, 9, 15));

        store.put(&source, &sample_chunk(&source, window)).unwrap();
        let dir = temp_dir.path().join("card-declines-123");
        fs::write(dir.join("notes.txt"), "not a chunk").unwrap();
        fs::write(dir.join("legacy.json.bak"), "{}").unwrap();

        let listed = store.list(&source).unwrap();
        assert_eq!(listed, vec![window]);
    }

    #[test]
    fn test_parse_chunk_filename() {
        assert_eq!(
            parse_chunk_filename("2025-09-09_to_2025-09-15.json"),
            Some(Window::new(date(2025, 9, 9), date(2025, 9, 15)))
        );
        assert_eq!(parse_chunk_filename("2025-09-09.json"), None);
        assert_eq!(parse_chunk_filename("2025-09-15_to_2025-09-09.json"), None);
        assert_eq!(parse_chunk_filename("readme.md"), None);
    }

    #[test]
    fn test_dir_store_stats() {
        let temp_dir = TempDir::new().unwrap();
        let store = DirStore::new(temp_dir.path()).unwrap();
        let source = SourceRef::new("123", "Card Declines");

        store
            .put(
                &source,
                &sample_chunk(&source, Window::new(date(2025, 9, 9), date(2025, 9, 15))),
            )
            .unwrap();
        store
            .put(
                &source,
                &sample_chunk(&source, Window::new(date(2025, 9, 16), date(2025, 9, 22))),
            )
            .unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.sources, 1);
        assert_eq!(stats.chunks, 2);
        assert!(stats.total_bytes > 0);
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        let source = SourceRef::new("123", "Card Declines");
        let window = Window::new(date(2025, 9, 9), date(2025, 9, 15));

        assert!(store.get(&source, window).unwrap().is_none());

        let chunk = sample_chunk(&source, window);
        store.put(&source, &chunk).unwrap();

        assert_eq!(store.get(&source, window).unwrap(), Some(chunk));
        assert_eq!(store.list(&source).unwrap(), vec![window]);
    }
}
