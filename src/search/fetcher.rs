use std::time::Duration;

use tracing::{debug, warn};

use super::links::LinkSet;
use super::query::SearchQuery;
use super::serpapi::{SearchError, SearchProvider};

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_STEP: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            backoff_step: BACKOFF_STEP,
        }
    }
}

impl RetryPolicy {
    #[cfg(test)]
    pub(crate) fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff_step: Duration::ZERO,
        }
    }

    /// Linear backoff with equal jitter: step*(n+1)/2 + rand(0, step*(n+1)/2).
    fn delay(&self, attempt: u32) -> Duration {
        let base = self.backoff_step.as_millis() as u64 * u64::from(attempt + 1);
        let half = base / 2;
        Duration::from_millis(half + fastrand::u64(..half.max(1)))
    }
}

/// Runs one search and ranks the result, retrying transient provider failures.
///
/// Returns an empty `LinkSet` only when the provider answered with no links;
/// an unreachable provider is always an error.
pub async fn fetch_links(
    provider: &impl SearchProvider,
    query: &SearchQuery,
    top_k: u8,
    retry: &RetryPolicy,
) -> Result<LinkSet, SearchError> {
    let attempts = retry.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match provider.search(query, top_k).await {
            Ok(links) => {
                let received = links.len();
                let set = LinkSet::rank(links, usize::from(top_k));
                debug!(received, kept = set.len(), "links ranked");
                return Ok(set);
            }
            Err(e) if e.is_retriable() && attempt + 1 < attempts => {
                let delay = retry.delay(attempt);
                warn!(
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "search failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
