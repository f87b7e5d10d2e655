use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use super::query::SearchQuery;
use super::types::SearchResponse;
use crate::config::ApiKey;

const API_URL: &str = "https://serpapi.com/search.json";
const ENGINE: &str = "google";
const LOCALE: &str = "de";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// SerpAPI reports an empty Google result page as an error string in a 200 body.
const NO_RESULTS_MARKER: &str = "hasn't returned any results";

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("SERPAPI_API_KEY not set. Get one at https://serpapi.com/manage-api-key")]
    ApiKeyNotSet,

    #[error("search API rate limit exceeded")]
    RateLimited,

    #[error("search API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("search network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl SearchError {
    /// Rate limits, server errors and transport failures are worth another attempt.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            SearchError::RateLimited
                | SearchError::Network(_)
                | SearchError::Api {
                    code: 500..=599,
                    ..
                }
        )
    }
}

/// Web search returning raw result links in provider order.
/// Implemented by `SerpApiClient` for production; mock implementations used in tests.
pub trait SearchProvider {
    async fn search(&self, query: &SearchQuery, num: u8) -> Result<Vec<String>, SearchError>;
}

#[derive(Clone)]
pub struct SerpApiClient {
    http: Client,
    api_key: ApiKey,
    base_url: String,
}

impl SerpApiClient {
    pub fn new(http: Client, api_key: ApiKey) -> Result<Self, SearchError> {
        if api_key.expose().trim().is_empty() {
            return Err(SearchError::ApiKeyNotSet);
        }
        Ok(Self {
            http,
            api_key,
            base_url: API_URL.to_string(),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: ApiKey::new("test-key"),
            base_url: format!("{base_url}/search.json"),
        }
    }

    fn request_url(&self, query: &SearchQuery, num: u8) -> Result<url::Url, SearchError> {
        let num = num.to_string();
        url::Url::parse_with_params(
            &self.base_url,
            [
                ("engine", ENGINE),
                ("q", query.as_str()),
                ("api_key", self.api_key.expose()),
                ("num", num.as_str()),
                ("hl", LOCALE),
            ],
        )
        .map_err(|e| SearchError::Api {
            code: 0,
            message: format!("invalid search URL: {e}"),
        })
    }
}

impl SearchProvider for SerpApiClient {
    async fn search(&self, query: &SearchQuery, num: u8) -> Result<Vec<String>, SearchError> {
        let url = self.request_url(query, num)?;

        debug_assert!(
            url.scheme() == "https" || cfg!(test),
            "API key must only be sent over HTTPS"
        );

        let response = self
            .http
            .get(url)
            .header("User-Agent", crate::USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("SerpAPI rate limited");
            return Err(SearchError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<SearchResponse>(&text)
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| {
                    let end = text.floor_char_boundary(200);
                    format!("HTTP {status}: {}", &text[..end])
                });
            warn!(status = %status, "SerpAPI error");
            return Err(SearchError::Api {
                code: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        let body: SearchResponse = serde_json::from_str(&text).map_err(|e| {
            warn!(error = %e, "unreadable SerpAPI response");
            SearchError::Api {
                code: status.as_u16(),
                message: format!("unreadable response body: {e}"),
            }
        })?;

        if let Some(err) = &body.error {
            if err.contains(NO_RESULTS_MARKER) {
                debug!("SerpAPI returned no results");
                return Ok(Vec::new());
            }
            warn!(error = %err, "SerpAPI error in 200 response");
            return Err(SearchError::Api {
                code: status.as_u16(),
                message: err.clone(),
            });
        }

        let links = body.links();
        debug!(links = links.len(), "search complete");
        Ok(links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retriable_classification() {
        assert!(SearchError::RateLimited.is_retriable());
        assert!(
            SearchError::Api {
                code: 503,
                message: "unavailable".into()
            }
            .is_retriable()
        );
        assert!(
            !SearchError::Api {
                code: 401,
                message: "Invalid API key".into()
            }
            .is_retriable()
        );
        assert!(!SearchError::ApiKeyNotSet.is_retriable());
    }

    #[test]
    fn blank_key_rejected() {
        let result = SerpApiClient::new(Client::new(), ApiKey::new("  "));
        assert!(matches!(result, Err(SearchError::ApiKeyNotSet)));
    }

    #[test]
    fn api_key_not_set_message_names_variable() {
        assert!(SearchError::ApiKeyNotSet.to_string().contains("SERPAPI_API_KEY"));
    }
}

#[cfg(test)]
mod http_tests {
    use super::*;
    use crate::search::query::SearchScope;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn query() -> SearchQuery {
        SearchQuery::build("Medtronic Attesta DR ATDR01", SearchScope::Manufacturers)
    }

    #[tokio::test]
    async fn search_sends_fixed_parameters_and_returns_links() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .and(query_param("engine", "google"))
            .and(query_param("hl", "de"))
            .and(query_param("num", "10"))
            .and(query_param("api_key", "test-key"))
            .and(query_param("q", query().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "organic_results": [
                    {"link": "https://www.medtronic.com/mri"},
                    {"title": "no link"},
                    {"link": "https://www.medtronic.com/manual.pdf"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = SerpApiClient::with_base_url(Client::new(), &server.uri());
        let links = client.search(&query(), 10).await.unwrap();

        assert_eq!(
            links,
            vec![
                "https://www.medtronic.com/mri",
                "https://www.medtronic.com/manual.pdf"
            ]
        );
    }

    #[tokio::test]
    async fn no_results_error_is_empty_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": "Google hasn't returned any results for this query."
            })))
            .mount(&server)
            .await;

        let client = SerpApiClient::with_base_url(Client::new(), &server.uri());
        let links = client.search(&query(), 10).await.unwrap();
        assert!(links.is_empty());
    }

    #[tokio::test]
    async fn other_error_in_200_body_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": "Your account has run out of searches."
            })))
            .mount(&server)
            .await;

        let client = SerpApiClient::with_base_url(Client::new(), &server.uri());
        match client.search(&query(), 10).await {
            Err(SearchError::Api { message, .. }) => {
                assert!(message.contains("run out of searches"));
            }
            other => panic!("expected Api error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_200_body_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "organic_results": "not a list"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = SerpApiClient::with_base_url(Client::new(), &server.uri());
        match client.search(&query(), 10).await {
            Err(e @ SearchError::Api { code: 200, .. }) => {
                assert!(e.to_string().contains("unreadable response body"), "got: {e}");
                assert!(!e.is_retriable());
            }
            other => panic!("expected Api(200), got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn status_429_is_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = SerpApiClient::with_base_url(Client::new(), &server.uri());
        let result = client.search(&query(), 10).await;
        assert!(matches!(result, Err(SearchError::RateLimited)));
    }

    #[tokio::test]
    async fn status_401_uses_error_body_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": "Invalid API key."
            })))
            .mount(&server)
            .await;

        let client = SerpApiClient::with_base_url(Client::new(), &server.uri());
        match client.search(&query(), 10).await {
            Err(SearchError::Api { code: 401, message }) => {
                assert_eq!(message, "Invalid API key.");
            }
            other => panic!("expected Api(401), got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn status_500_without_json_keeps_body_snippet() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream broke"))
            .mount(&server)
            .await;

        let client = SerpApiClient::with_base_url(Client::new(), &server.uri());
        match client.search(&query(), 10).await {
            Err(e @ SearchError::Api { code: 500, .. }) => {
                assert!(e.to_string().contains("upstream broke"), "got: {e}");
                assert!(e.is_retriable());
            }
            other => panic!("expected Api(500), got: {other:?}"),
        }
    }
}
