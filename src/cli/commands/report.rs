//! Weekly / monthly report commands

use anyhow::Result;
use std::path::Path;

use crate::cli::args::ReportArgs;
use crate::cli::resolve_range;
use crate::config::PayreportConfig;
use crate::pipeline::{run_report, ReportKind};

pub async fn run_report_command(
    args: &ReportArgs,
    kind: ReportKind,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = PayreportConfig::load(config_path)?;
    config.validate(args.skip_sentry, args.skip_gravity_forms)?;

    let (start, end) = resolve_range(args, kind)?;

    println!("📅 {} report: {} to {}", kind.slug(), start, end);

    let summary = run_report(
        &config,
        kind,
        start,
        end,
        args.skip_sentry,
        args.skip_gravity_forms,
        args.output_dir.as_deref(),
    )
    .await?;

    println!(
        "   Sources: {} ({} events), forms: {}",
        summary.sources, summary.total_events, summary.forms
    );
    println!(
        "   Windows: {} fetched, {} already cached, {} failed",
        summary.windows_fetched, summary.windows_cached, summary.windows_failed
    );
    if summary.windows_failed > 0 {
        println!("⚠️  Some windows could not be fetched; they will be retried next run");
    }

    match &summary.report_path {
        Some(path) => println!("✅ Report written: {}", path.display()),
        None => println!("⚠️  Report could not be written (see log)"),
    }

    Ok(())
}
