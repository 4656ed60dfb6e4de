//! LLM provider plumbing for the field-extraction step.
//!
//! Follows the same provider pattern as the recognition engine: resolve a
//! backend from the configured model name, degrade to `Unavailable` instead
//! of failing startup, and surface a single failed call immediately — the
//! extraction layer decides what a failure means (an empty record), not this
//! one.

mod api;
mod provider;

pub use api::LlmApiClient;
pub use provider::{CompletionOptions, LlmBackend, LlmProvider};
