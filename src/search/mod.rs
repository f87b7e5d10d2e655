//! Web search: query construction, SerpAPI access, and PDF-first link ranking.

pub(crate) mod fetcher;
pub(crate) mod links;
pub(crate) mod query;
pub(crate) mod serpapi;
mod types;

pub use fetcher::{RetryPolicy, fetch_links};
pub use links::LinkSet;
pub use query::{SearchQuery, SearchScope};
pub use serpapi::{SearchError, SearchProvider, SerpApiClient};
