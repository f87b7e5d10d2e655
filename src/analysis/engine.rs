use serde::Serialize;
use tracing::{info, warn};

use super::cleanup::{CleanupOptions, clean_output};
use super::prompt::build_prompt;
use crate::openai::{CompletionError, CompletionProvider, ModelTier};
use crate::search::links::DEFAULT_TOP_K;
use crate::search::{
    LinkSet, RetryPolicy, SearchError, SearchProvider, SearchQuery, SearchScope, fetch_links,
};

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("search provider unavailable: {0}")]
    SearchUnavailable(#[source] SearchError),

    #[error("no matching information found")]
    NotFound,

    #[error("summarizer rate limited: {0}")]
    SummarizerRateLimited(String),

    #[error("summarizer failed: {0}")]
    Summarizer(#[source] CompletionError),
}

impl From<CompletionError> for LookupError {
    fn from(e: CompletionError) -> Self {
        match e {
            CompletionError::RateLimited(message) => LookupError::SummarizerRateLimited(message),
            other => LookupError::Summarizer(other),
        }
    }
}

/// One implant to analyze: manufacturer and model, plus an optional associated lead/probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupRequest {
    pub manufacturer: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead: Option<String>,
}

impl LookupRequest {
    pub fn new(manufacturer: &str, model: &str, lead: Option<&str>) -> Result<Self, LookupError> {
        let manufacturer = manufacturer.trim();
        let model = model.trim();
        if manufacturer.is_empty() {
            return Err(LookupError::InvalidInput("manufacturer must not be empty".into()));
        }
        if model.is_empty() {
            return Err(LookupError::InvalidInput("model must not be empty".into()));
        }
        Ok(Self {
            manufacturer: manufacturer.to_string(),
            model: model.to_string(),
            lead: lead.map(str::trim).filter(|l| !l.is_empty()).map(str::to_string),
        })
    }

    /// Text used for the quoted search term.
    pub fn identifier(&self) -> String {
        format!("{} {}", self.manufacturer, self.model).trim().to_string()
    }
}

/// Operator settings shared by every lookup of a session.
#[derive(Debug, Clone, Copy)]
pub struct LookupOptions {
    pub scope: SearchScope,
    pub top_k: u8,
    pub tier: ModelTier,
    pub cleanup: CleanupOptions,
    pub retry: RetryPolicy,
}

impl Default for LookupOptions {
    fn default() -> Self {
        Self {
            scope: SearchScope::default(),
            top_k: DEFAULT_TOP_K,
            tier: ModelTier::default(),
            cleanup: CleanupOptions::default(),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Analysis {
    pub implant: LookupRequest,
    pub links: LinkSet,
    /// The manufacturer-restricted pass came back empty and the broad pass was used.
    pub broadened: bool,
    pub model: &'static str,
    pub raw: String,
    pub text: String,
}

/// Search, fall back to a broad search when the restricted pass is empty, then summarize.
pub async fn analyze(
    search: &impl SearchProvider,
    completion: &impl CompletionProvider,
    request: &LookupRequest,
    options: &LookupOptions,
) -> Result<Analysis, LookupError> {
    let identifier = request.identifier();
    info!(implant = %identifier, scope = ?options.scope, "lookup started");

    let (links, broadened) = find_links(search, &identifier, options).await?;
    if links.is_empty() {
        info!(implant = %identifier, "no links found");
        return Err(LookupError::NotFound);
    }

    let model = options.tier.model_id();
    let prompt = build_prompt(request, &links);
    let raw = completion
        .complete(model, &prompt)
        .await
        .inspect_err(|e| warn!(implant = %identifier, error = %e, "summarizer failed"))?;

    let text = clean_output(&raw, options.cleanup);
    info!(implant = %identifier, links = links.len(), broadened, "lookup complete");

    Ok(Analysis {
        implant: request.clone(),
        links,
        broadened,
        model,
        raw,
        text,
    })
}

async fn find_links(
    search: &impl SearchProvider,
    identifier: &str,
    options: &LookupOptions,
) -> Result<(LinkSet, bool), LookupError> {
    let first = run_pass(search, identifier, options.scope, options).await?;
    if !first.is_empty() || options.scope == SearchScope::Broad {
        return Ok((first, false));
    }

    warn!(implant = %identifier, "restricted search empty, widening to broad search");
    let second = run_pass(search, identifier, SearchScope::Broad, options).await?;
    Ok((second, true))
}

async fn run_pass(
    search: &impl SearchProvider,
    identifier: &str,
    scope: SearchScope,
    options: &LookupOptions,
) -> Result<LinkSet, LookupError> {
    let query = SearchQuery::build(identifier, scope);
    fetch_links(search, &query, options.top_k, &options.retry)
        .await
        .map_err(|e| {
            warn!(error = %e, ?scope, "search failed after retries");
            LookupError::SearchUnavailable(e)
        })
}
