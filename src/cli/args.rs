use anyhow::{anyhow, Result};
use chrono::{Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::pipeline::ReportKind;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = None
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a payreport.toml config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a weekly report (7-day default range, 7-day cache chunks)
    Weekly(ReportArgs),

    /// Generate a monthly report (30-day default range, 30-day cache chunks)
    Monthly(ReportArgs),

    /// Inspect and maintain the event cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Parser, Debug, Default)]
pub struct ReportArgs {
    /// First day of the range (YYYY-MM-DD); defaults from --end-date and --days
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Last day of the range, inclusive (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// Range length in days, used when --start-date is not given
    #[arg(long)]
    pub days: Option<u32>,

    /// Skip the payment-event source entirely
    #[arg(long)]
    pub skip_sentry: bool,

    /// Skip form submission counts
    #[arg(long)]
    pub skip_gravity_forms: bool,

    /// Where to write the report (overrides config)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show cache size and chunk counts
    Stats,

    /// Split a legacy single-file cache into date-window chunks
    Migrate {
        /// Path to the legacy cache file
        legacy_file: PathBuf,

        /// Window size for the rewritten chunks
        #[arg(long, default_value = "7")]
        chunk_days: u32,
    },
}

/// Resolve the inclusive date range for a report run.
///
/// `end` defaults to today, `start` to `end - (days - 1)` so the range spans
/// exactly `days` days counting both endpoints.
pub fn resolve_range(args: &ReportArgs, kind: ReportKind) -> Result<(NaiveDate, NaiveDate)> {
    let end = args.end_date.unwrap_or_else(|| Utc::now().date_naive());

    let start = match args.start_date {
        Some(start) => start,
        None => {
            let days = args.days.unwrap_or_else(|| kind.default_days());
            if days == 0 {
                return Err(anyhow!("--days must be at least 1"));
            }
            end - Duration::days(i64::from(days) - 1)
        }
    };

    if start > end {
        return Err(anyhow!(
            "invalid range: start date {} is after end date {}",
            start,
            end
        ));
    }

    Ok((start, end))
}
