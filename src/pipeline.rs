//! Report pipeline: cache fill, cache read, aggregate, render, write.

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, Utc};
use std::path::Path;

use payreport_cache::{DirStore, EventCache};
use payreport_core::SourceRef;
use payreport_reports::{
    distinct_users, merchant_breakdown, reason_breakdown, render_report, report_filename,
    validate_output_directory, FormSection, SourceSection,
};

use crate::config::PayreportConfig;
use crate::sources::{GravityFormsClient, SentryClient};

/// Report flavor; decides the default range length and cache chunk size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Weekly,
    Monthly,
}

impl ReportKind {
    pub fn slug(&self) -> &'static str {
        match self {
            ReportKind::Weekly => "weekly",
            ReportKind::Monthly => "monthly",
        }
    }

    /// Range length used when no explicit dates are given.
    pub fn default_days(&self) -> u32 {
        match self {
            ReportKind::Weekly => 7,
            ReportKind::Monthly => 30,
        }
    }

    /// Cache chunk size in days. Chunk files written at one size are not
    /// gap-checked against another, so each kind keeps its own granularity.
    pub fn chunk_days(&self) -> u32 {
        match self {
            ReportKind::Weekly => 7,
            ReportKind::Monthly => 30,
        }
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub report_path: Option<std::path::PathBuf>,
    pub sources: usize,
    pub total_events: usize,
    pub forms: usize,
    pub windows_fetched: usize,
    pub windows_cached: usize,
    pub windows_failed: usize,
}

/// Run one report end to end.
///
/// Per-source fetch failures degrade the run (the window stays un-cached and
/// is retried next time); a report-write failure is logged and leaves
/// `report_path` empty rather than discarding the aggregation work.
pub async fn run_report(
    config: &PayreportConfig,
    kind: ReportKind,
    start: NaiveDate,
    end: NaiveDate,
    skip_sentry: bool,
    skip_gravity_forms: bool,
    output_dir: Option<&Path>,
) -> Result<RunSummary> {
    let mut summary = RunSummary {
        report_path: None,
        sources: 0,
        total_events: 0,
        forms: 0,
        windows_fetched: 0,
        windows_cached: 0,
        windows_failed: 0,
    };

    let mut sections: Vec<SourceSection> = Vec::new();

    if !skip_sentry && !config.sentry.issues.is_empty() {
        let client = SentryClient::new(&config.sentry)?;
        let cache = EventCache::new(DirStore::new(&config.cache.directory)?);

        for issue in &config.sentry.issues {
            let source = SourceRef::new(&issue.id, &issue.name);

            let outcome = cache
                .ensure_range(&client, &source, start, end, kind.chunk_days())
                .await
                .with_context(|| format!("failed to fill cache for {}", issue.name))?;
            summary.windows_fetched += outcome.fetched;
            summary.windows_cached += outcome.already_cached;
            summary.windows_failed += outcome.failed;

            let events = cache
                .read_range(&source, start, end)
                .with_context(|| format!("failed to read cached events for {}", issue.name))?;

            log::info!(
                "{}: {} events in {}..{} ({} fetched, {} cached, {} failed windows)",
                issue.name,
                events.len(),
                start,
                end,
                outcome.fetched,
                outcome.already_cached,
                outcome.failed
            );

            summary.total_events += events.len();
            sections.push(SourceSection {
                source_name: issue.name.clone(),
                total_events: events.len(),
                distinct_users: distinct_users(&events),
                reasons: reason_breakdown(&events),
                merchants: merchant_breakdown(&events),
            });
        }
    }

    let mut forms: Vec<FormSection> = Vec::new();
    if !skip_gravity_forms && !config.gravity_forms.forms.is_empty() {
        let client = GravityFormsClient::new(&config.gravity_forms)?;
        forms = client
            .entry_counts(&config.gravity_forms.forms, start, end)
            .await;
    }

    if sections.is_empty() && forms.is_empty() {
        return Err(anyhow!(
            "nothing to report: no sources or forms configured (or everything skipped)"
        ));
    }

    summary.sources = sections.len();
    summary.forms = forms.len();

    let markdown = render_report(Utc::now(), start, end, &sections, &forms);

    let output_dir = output_dir.unwrap_or_else(|| config.report.output_dir.as_path());
    let path = output_dir.join(report_filename(kind.slug(), start, end));
    match validate_output_directory(output_dir).and_then(|_| {
        std::fs::write(&path, &markdown)
            .with_context(|| format!("failed to write report: {}", path.display()))
    }) {
        Ok(()) => summary.report_path = Some(path),
        Err(err) => log::error!("report generated but not written: {:#}", err),
    }

    Ok(summary)
}
