use anyhow::Result;
use clap::Parser;

use crate::cli::args::{Args, Commands};
use crate::cli::commands::{handle_cache_command, run_report_command};
use crate::config::PayreportConfig;
use crate::pipeline::ReportKind;

pub struct RootCommand;

impl RootCommand {
    pub async fn execute() -> Result<()> {
        let args = Args::parse();

        println!("payreport v{}", env!("CARGO_PKG_VERSION"));

        match &args.command {
            Commands::Weekly(report_args) => {
                run_report_command(report_args, ReportKind::Weekly, args.config.as_deref()).await
            }
            Commands::Monthly(report_args) => {
                run_report_command(report_args, ReportKind::Monthly, args.config.as_deref()).await
            }
            Commands::Cache { action } => {
                let config = PayreportConfig::load(args.config.as_deref())?;
                handle_cache_command(action, &config).await
            }
        }
    }
}
