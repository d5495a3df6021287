// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Search backend client.
//!
//! Requests go to a rolling two-day index pattern:
//!
//! ```text
//! http://<host>:9200/<log-syslog-error-{now/d}>,<log-syslog-error-{now/d-1d}>/_search?ignore_unavailable=true
//! ```
//!
//! with the index pattern percent-encoded as a single path segment. The query
//! travels as a JSON body on a GET request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::debug;

use crate::error::{ConfigError, SearchError};
use crate::query::SearchQuery;

pub const DEFAULT_SCHEME: &str = "http";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 9200;
pub const INDEX_PATTERN: &str = "<log-syslog-error-{now/d}>,<log-syslog-error-{now/d-1d}>";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error bodies are cut to this many characters before being reported.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Outcome of a successful search round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResult {
    /// Log messages in the order the backend returned them.
    Found(Vec<String>),
    NoLogsFound,
}

/// Anything able to run a [`SearchQuery`].
#[async_trait]
pub trait LogSearch {
    async fn execute(&self, query: &SearchQuery) -> Result<SearchResult, SearchError>;
}

/// Fully resolved `_search` URL, computed once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEndpoint {
    url: Url,
}

impl SearchEndpoint {
    /// `http://{host}:9200/...` for the given backend host.
    pub fn new(host: &str) -> Result<Self, ConfigError> {
        Self::with_port(host, DEFAULT_PORT)
    }

    pub fn with_port(host: &str, port: u16) -> Result<Self, ConfigError> {
        let host = host.trim();
        // IPv6 literals need brackets in the authority
        let host = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]")
        } else {
            host.to_string()
        };
        Self::from_base_url(&format!("{DEFAULT_SCHEME}://{host}:{port}"))
    }

    /// Builds the endpoint under an arbitrary `scheme://host:port` prefix.
    pub fn from_base_url(base_url: &str) -> Result<Self, ConfigError> {
        let raw = format!(
            "{}/{}/_search",
            base_url.trim_end_matches('/'),
            encoded_index_pattern()
        );
        let mut url = Url::parse(&raw).map_err(|source| ConfigError::Endpoint {
            url: raw.clone(),
            source,
        })?;
        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(ConfigError::Invalid(format!(
                "search endpoint '{raw}' has no host"
            )));
        }
        url.query_pairs_mut().append_pair("ignore_unavailable", "true");

        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// The index pattern with every reserved character escaped.
#[must_use]
pub fn encoded_index_pattern() -> String {
    url::form_urlencoded::byte_serialize(INDEX_PATTERN.as_bytes()).collect()
}

/// HTTP client bound to a single [`SearchEndpoint`].
#[derive(Debug, Clone)]
pub struct SearchClient {
    client: Client,
    endpoint: SearchEndpoint,
}

impl SearchClient {
    pub fn new(endpoint: SearchEndpoint) -> Result<Self, ConfigError> {
        Self::with_timeout(endpoint, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(endpoint: SearchEndpoint, timeout: Duration) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ConfigError::Client)?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &SearchEndpoint {
        &self.endpoint
    }
}

#[async_trait]
impl LogSearch for SearchClient {
    async fn execute(&self, query: &SearchQuery) -> Result<SearchResult, SearchError> {
        let body = serde_json::to_vec(query.body())?;
        debug!(
            url = %self.endpoint.url,
            body_len = body.len(),
            "search request"
        );

        let response = self
            .client
            .get(self.endpoint.url.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        debug!(status = %status, content_length = bytes.len(), "search response");

        if !status.is_success() {
            return Err(SearchError::Status {
                status: status.as_u16(),
                body: truncate(&String::from_utf8_lossy(&bytes)),
            });
        }

        parse_response(&bytes)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Hits,
}

#[derive(Debug, Deserialize)]
struct Hits {
    total: TotalHits,
    hits: Vec<Hit>,
}

/// `hits.total` is an object since Elasticsearch 7 and a bare integer before
/// (or with `rest_total_hits_as_int`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TotalHits {
    Object { value: u64 },
    Count(u64),
}

impl TotalHits {
    fn value(&self) -> u64 {
        match self {
            TotalHits::Object { value } | TotalHits::Count(value) => *value,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source")]
    source: HitSource,
}

#[derive(Debug, Deserialize)]
struct HitSource {
    log: LogField,
}

#[derive(Debug, Deserialize)]
struct LogField {
    syslog: SyslogField,
}

#[derive(Debug, Deserialize)]
struct SyslogField {
    message: String,
}

/// Decodes a `_search` response body into the ordered log messages.
pub fn parse_response(body: &[u8]) -> Result<SearchResult, SearchError> {
    let response: SearchResponse = serde_json::from_slice(body)?;

    if response.hits.total.value() == 0 || response.hits.hits.is_empty() {
        return Ok(SearchResult::NoLogsFound);
    }

    Ok(SearchResult::Found(
        response
            .hits
            .hits
            .into_iter()
            .map(|hit| hit.source.log.syslog.message)
            .collect(),
    ))
}

fn truncate(text: &str) -> String {
    let mut chars = text.chars();
    let mut out: String = chars.by_ref().take(MAX_ERROR_BODY_CHARS).collect();
    if chars.next().is_some() {
        out.push('…');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_index_pattern() {
        assert_eq!(
            encoded_index_pattern(),
            "%3Clog-syslog-error-%7Bnow%2Fd%7D%3E%2C%3Clog-syslog-error-%7Bnow%2Fd-1d%7D%3E"
        );
    }

    #[test]
    fn test_default_endpoint() {
        let endpoint = SearchEndpoint::new(DEFAULT_HOST).unwrap();
        assert_eq!(
            endpoint.url().as_str(),
            "http://127.0.0.1:9200/%3Clog-syslog-error-%7Bnow%2Fd%7D%3E%2C%3Clog-syslog-error-%7Bnow%2Fd-1d%7D%3E/_search?ignore_unavailable=true"
        );
    }

    #[test]
    fn test_endpoint_host_override() {
        let endpoint = SearchEndpoint::new("analytics.example.net").unwrap();
        assert_eq!(endpoint.url().host_str(), Some("analytics.example.net"));
        assert_eq!(endpoint.url().port(), Some(9200));
        assert_eq!(endpoint.url().scheme(), "http");
        assert_eq!(endpoint.url().query(), Some("ignore_unavailable=true"));
    }

    #[test]
    fn test_endpoint_custom_port() {
        let endpoint = SearchEndpoint::with_port("analytics.example.net", 19200).unwrap();
        assert_eq!(endpoint.url().port(), Some(19200));
        assert!(endpoint.url().path().ends_with("/_search"));
    }

    #[test]
    fn test_endpoint_ipv6_host() {
        let endpoint = SearchEndpoint::new("::1").unwrap();
        assert_eq!(endpoint.url().host_str(), Some("[::1]"));
    }

    #[test]
    fn test_endpoint_rejects_bad_host() {
        assert!(SearchEndpoint::new("bad host").is_err());
        assert!(SearchEndpoint::from_base_url("not a url").is_err());
    }

    #[test]
    fn test_endpoint_from_base_url_trims_slash() {
        let endpoint = SearchEndpoint::from_base_url("http://127.0.0.1:1234/").unwrap();
        assert!(endpoint
            .url()
            .as_str()
            .starts_with("http://127.0.0.1:1234/%3Clog-syslog-error-"));
        assert!(endpoint.url().path().ends_with("/_search"));
    }

    #[test]
    fn test_parse_response_found() {
        let body = br#"{
            "took": 3,
            "timed_out": false,
            "hits": {
                "total": {"value": 2, "relation": "eq"},
                "max_score": 0.0,
                "hits": [
                    {"_source": {"log": {"syslog": {"message": "first"}}}},
                    {"_source": {"log": {"syslog": {"message": "second"}}}}
                ]
            }
        }"#;

        assert_eq!(
            parse_response(body).unwrap(),
            SearchResult::Found(vec!["first".to_string(), "second".to_string()])
        );
    }

    #[test]
    fn test_parse_response_zero_hits() {
        let body = br#"{"hits": {"total": {"value": 0, "relation": "eq"}, "hits": []}}"#;
        assert_eq!(parse_response(body).unwrap(), SearchResult::NoLogsFound);
    }

    #[test]
    fn test_parse_response_integer_total() {
        let body = br#"{"hits": {"total": 1, "hits": [
            {"_source": {"log": {"syslog": {"message": "legacy"}}}}
        ]}}"#;
        assert_eq!(
            parse_response(body).unwrap(),
            SearchResult::Found(vec!["legacy".to_string()])
        );
    }

    #[test]
    fn test_parse_response_missing_path() {
        let body = br#"{"hits": {"total": {"value": 1}, "hits": [{"_source": {"log": {}}}]}}"#;
        assert!(matches!(parse_response(body), Err(SearchError::Shape(_))));

        let body = br#"{"error": {"type": "index_not_found_exception"}, "status": 404}"#;
        assert!(matches!(parse_response(body), Err(SearchError::Shape(_))));

        assert!(matches!(
            parse_response(b"<html>"),
            Err(SearchError::Shape(_))
        ));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short"), "short");
        let long = "x".repeat(MAX_ERROR_BODY_CHARS + 10);
        let cut = truncate(&long);
        assert!(cut.ends_with('…'));
        assert_eq!(cut.chars().count(), MAX_ERROR_BODY_CHARS + 1);
    }
}
