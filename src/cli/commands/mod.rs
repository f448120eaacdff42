pub mod cache;
pub mod report;

pub use cache::handle_cache_command;
pub use report::run_report_command;
