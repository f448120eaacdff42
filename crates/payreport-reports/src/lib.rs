//! Aggregation and report rendering for payreport.
//!
//! This crate provides:
//! - Pure aggregators over merged event lists (reason/merchant breakdowns)
//! - Markdown report rendering
//! - Output filename and directory utilities

pub mod breakdown;
pub mod filename;
pub mod markdown;

pub use breakdown::{
    distinct_users, merchant_breakdown, reason_breakdown, BreakdownRow, INVALID_CARD_BUCKET,
    MERCHANT_TAG, REASON_TAG,
};
pub use filename::{report_filename, validate_output_directory};
pub use markdown::{render_report, FormSection, SourceSection};
