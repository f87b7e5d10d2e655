pub(crate) mod client;
mod types;

pub use client::{CompletionError, CompletionProvider, ModelTier, OpenAiClient};
