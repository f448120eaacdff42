//! Cache management commands

use anyhow::Result;

use payreport_cache::{migrate_legacy, DirStore};

use crate::cli::args::CacheAction;
use crate::config::PayreportConfig;

pub async fn handle_cache_command(action: &CacheAction, config: &PayreportConfig) -> Result<()> {
    let cache_dir = &config.cache.directory;

    match action {
        CacheAction::Stats => {
            println!("📊 Cache statistics");
            println!("   Directory: {}", cache_dir.display());

            let store = DirStore::new(cache_dir)?;
            let stats = store.stats()?;

            println!("   Sources: {}", stats.sources);
            println!("   Chunks: {}", stats.chunks);
            println!("   Size: {} KB", stats.total_bytes / 1024);
        }

        CacheAction::Migrate {
            legacy_file,
            chunk_days,
        } => {
            println!("🔄 Migrating legacy cache file");
            println!("   File: {}", legacy_file.display());
            println!("   Chunk size: {} days", chunk_days);

            let store = DirStore::new(cache_dir)?;
            let stats = migrate_legacy(&store, legacy_file, *chunk_days)?;

            println!("✅ Migration complete");
            println!(
                "   {} events rewritten into {} window chunks",
                stats.events_migrated, stats.windows_written
            );
            println!("   Original kept at: {}", stats.backup_path.display());
        }
    }

    Ok(())
}
