//! Implant analysis pipeline: two-pass search, prompt rendering, completion, and output cleanup.

pub(crate) mod cleanup;
pub(crate) mod engine;
pub(crate) mod prompt;

pub use cleanup::CleanupOptions;
pub use engine::{Analysis, LookupError, LookupOptions, LookupRequest, analyze};
