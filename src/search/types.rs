use serde::Deserialize;
use serde_json::Value;

/// Subset of the SerpAPI Google response that the fetcher reads.
/// `organic_results` stays untyped so a malformed entry cannot fail the whole page.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub organic_results: Option<Vec<Value>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl SearchResponse {
    /// Links of all organic results that carry a non-empty string `link`.
    pub fn links(&self) -> Vec<String> {
        self.organic_results
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(|r| r.get("link")?.as_str())
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }
}
