pub mod args;
pub mod commands;
pub mod root;

pub use args::{resolve_range, Args, CacheAction, Commands, ReportArgs};
pub use root::RootCommand;
