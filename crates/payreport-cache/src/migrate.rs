//! One-time legacy cache migration
//!
//! Early versions kept one oversized JSON file per source covering the whole
//! fetched range. This splits such a file into per-window chunks and renames
//! the legacy file to `<name>.bak` as a safety backup; it is never deleted.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::chunk::CachedChunk;
use crate::store::ChunkStore;
use crate::window::plan_windows;

/// Outcome of one legacy-file migration.
#[derive(Debug, Clone)]
pub struct MigrationStats {
    pub windows_written: usize,
    pub events_migrated: usize,
    pub backup_path: PathBuf,
}

/// Split `legacy_path` into per-window chunks of `chunk_days` days.
///
/// The legacy record has the same shape as a chunk, just spanning the whole
/// range. Every planned window inside the legacy span is persisted, empty
/// ones included, so the span stays fully covered afterwards.
pub fn migrate_legacy<S: ChunkStore>(
    store: &S,
    legacy_path: &Path,
    chunk_days: u32,
) -> Result<MigrationStats> {
    let content = fs::read_to_string(legacy_path)
        .with_context(|| format!("failed to read legacy cache file: {}", legacy_path.display()))?;

    let legacy: CachedChunk = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse legacy cache file: {}", legacy_path.display()))?;

    let source = legacy.source();
    let windows = plan_windows(legacy.start_date, legacy.end_date, chunk_days);
    if windows.is_empty() {
        return Err(anyhow!(
            "legacy file {} spans no valid range ({}..{})",
            legacy_path.display(),
            legacy.start_date,
            legacy.end_date
        ));
    }

    let mut stats = MigrationStats {
        windows_written: 0,
        events_migrated: 0,
        backup_path: PathBuf::new(),
    };

    for window in windows {
        let events: Vec<_> = legacy
            .events
            .iter()
            .filter(|e| window.contains(e.date()))
            .cloned()
            .collect();
        stats.events_migrated += events.len();

        store.put(&source, &CachedChunk::new(&source, window, events))?;
        stats.windows_written += 1;
    }

    let file_name = legacy_path
        .file_name()
        .ok_or_else(|| anyhow!("legacy path has no file name: {}", legacy_path.display()))?;
    let backup = legacy_path.with_file_name(format!("{}.bak", file_name.to_string_lossy()));
    fs::rename(legacy_path, &backup).with_context(|| {
        format!(
            "failed to rename legacy file {} to {}",
            legacy_path.display(),
            backup.display()
        )
    })?;
    stats.backup_path = backup;

    log::info!(
        "migrated {} events from {} into {} chunks, backup at {}",
        stats.events_migrated,
        source.id,
        stats.windows_written,
        stats.backup_path.display()
    );

    Ok(stats)
}
