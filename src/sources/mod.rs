//! Upstream API clients.

pub mod gravity_forms;
pub mod sentry;

pub use gravity_forms::{FormActivity, GravityFormsClient};
pub use sentry::SentryClient;
