use async_trait::async_trait;
use common::config::ArtifactoryConfig;
use reqwest::Url;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use rules::{AqlQuery, ArtifactRecord, ArtifactStore, StoreError};
use serde::Deserialize;

use crate::aql::decode_results;

/// Header carrying the Artifactory API key (`X-JFrog-Art-Api`)
pub const API_KEY_HEADER: &str = "x-jfrog-art-api";

/// HTTP session against an Artifactory instance
#[derive(Debug, Clone)]
pub struct ArtifactoryClient {
    base_url: Url,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    message: String,
}

fn transport(err: reqwest::Error) -> StoreError {
    StoreError::Transport(Box::new(err))
}

impl ArtifactoryClient {
    /// Create a client from configuration; timeout and API key apply to every request
    pub fn new(config: &ArtifactoryConfig) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let value =
                HeaderValue::from_str(key).map_err(|e| StoreError::Transport(Box::new(e)))?;
            headers.insert(API_KEY_HEADER, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(transport)?;

        let base_url = Url::parse(config.url.trim_end_matches('/'))
            .map_err(|e| StoreError::InvalidRequest(format!("{}: {e}", config.url)))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::InvalidRequest(format!(
                "{} cannot be used as a base URL",
                config.url
            )));
        }

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Append path segments to the base URL, each percent-encoded as one segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::InvalidRequest(format!("{} has no path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Turn a non-success response into `StoreError::Api`, preferring the message
/// from Artifactory's `{"errors": [...]}` body
async fn error_for_status(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|body| body.errors.into_iter().next())
        .map(|e| e.message)
        .unwrap_or(text);
    Err(StoreError::Api { status, message })
}

#[async_trait]
impl ArtifactStore for ArtifactoryClient {
    async fn check_repository(&self, repo: &str) -> Result<(), StoreError> {
        // dot segments are dropped by the URL parser and would address another resource
        if matches!(repo, "" | "." | "..") {
            return Err(StoreError::InvalidRequest(format!(
                "`{repo}` is not a repository name"
            )));
        }
        let url = self.endpoint(&["api", "storage", repo])?;
        log::debug!("GET {url}");
        let resp = self.http.get(url).send().await.map_err(transport)?;
        error_for_status(resp).await?;
        Ok(())
    }

    async fn find_items(&self, query: &AqlQuery) -> Result<Vec<ArtifactRecord>, StoreError> {
        let url = self.endpoint(&["api", "search", "aql"])?;
        log::debug!("POST {url}: {query}");
        let resp = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "text/plain")
            .body(query.to_string())
            .send()
            .await
            .map_err(transport)?;
        let body = error_for_status(resp).await?.text().await.map_err(transport)?;
        decode_results(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = ArtifactoryConfig {
            url: "https://repo.example.com/artifactory/".to_string(),
            ..ArtifactoryConfig::default()
        };
        let client = ArtifactoryClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "https://repo.example.com/artifactory");
        assert_eq!(
            client.endpoint(&["api", "storage", "libs"]).unwrap().as_str(),
            "https://repo.example.com/artifactory/api/storage/libs"
        );
    }

    #[test]
    fn test_endpoint_encodes_each_segment() {
        let client = ArtifactoryClient::new(&ArtifactoryConfig::default()).unwrap();
        assert_eq!(
            client
                .endpoint(&["api", "storage", "libs#evil"])
                .unwrap()
                .as_str(),
            "http://localhost:8082/artifactory/api/storage/libs%23evil"
        );
        assert_eq!(
            client
                .endpoint(&["api", "storage", "libs?x=1"])
                .unwrap()
                .as_str(),
            "http://localhost:8082/artifactory/api/storage/libs%3Fx=1"
        );
    }

    #[test]
    fn test_root_base_url() {
        let config = ArtifactoryConfig {
            url: "http://artifactory:8081".to_string(),
            ..ArtifactoryConfig::default()
        };
        let client = ArtifactoryClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint(&["api", "search", "aql"]).unwrap().as_str(),
            "http://artifactory:8081/api/search/aql"
        );
    }

    #[test]
    fn test_malformed_url_rejected() {
        let config = ArtifactoryConfig {
            url: "not a url".to_string(),
            ..ArtifactoryConfig::default()
        };
        assert!(matches!(
            ArtifactoryClient::new(&config).unwrap_err(),
            StoreError::InvalidRequest(_)
        ));
    }

    #[tokio::test]
    async fn test_dot_segment_names_rejected_before_request() {
        // nothing listens here; a request would fail with a transport error
        let config = ArtifactoryConfig {
            url: "http://127.0.0.1:9/artifactory".to_string(),
            ..ArtifactoryConfig::default()
        };
        let client = ArtifactoryClient::new(&config).unwrap();
        for repo in ["", ".", ".."] {
            assert!(matches!(
                client.check_repository(repo).await.unwrap_err(),
                StoreError::InvalidRequest(_)
            ));
        }
    }

    #[test]
    fn test_invalid_api_key_rejected() {
        let config = ArtifactoryConfig {
            api_key: Some("bad\nkey".to_string()),
            timeout: Duration::from_secs(1),
            ..ArtifactoryConfig::default()
        };
        assert!(matches!(
            ArtifactoryClient::new(&config).unwrap_err(),
            StoreError::Transport(_)
        ));
    }
}
