//! Core types shared across the payreport crates.
//!
//! This crate holds the minimal event projection stored in the chunk cache
//! and the source identity used to key cached data on disk.

pub mod event;
pub mod source;

pub use event::{resolve_user_id, EventRecord, ANONYMOUS_USER};
pub use source::{slugify, SourceRef};
