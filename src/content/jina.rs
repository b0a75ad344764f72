use crate::util::validate_url;
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use thiserror::Error;

/// Public Jina reader endpoint.
pub const DEFAULT_READER_BASE_URL: &str = "https://r.jina.ai";

const MAX_CONTENT_SIZE: usize = 5 * 1024 * 1024; // 5MB
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const MAX_RETRIES: u32 = 2;

/// Readable article content is rarely shorter than this once the reader's
/// metadata header is included; shorter selector results are retried
/// without the selector.
const MIN_CONTENT_LEN: usize = 200;

/// Containers that usually hold the article body on news sites.
const TARGET_SELECTORS: &str =
    "article, .article-body, .story-content, .entry-content, .post-content, main";

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Request timed out after 20s")]
    Timeout,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid UTF-8 in response")]
    InvalidUtf8,
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Insecure base URL: HTTPS required (except localhost for testing)")]
    InsecureBaseUrl,
}

impl ContentError {
    fn is_retryable(&self) -> bool {
        match self {
            ContentError::Timeout | ContentError::Network(_) => true,
            ContentError::HttpStatus(status) => *status >= 500,
            _ => false,
        }
    }
}

/// Fetches article pages as markdown through the Jina reader.
#[derive(Clone)]
pub struct ReaderClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl std::fmt::Debug for ReaderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ReaderClient {
    pub fn new(http: reqwest::Client, api_key: Option<SecretString>) -> Self {
        Self {
            http,
            base_url: DEFAULT_READER_BASE_URL.to_string(),
            api_key,
        }
    }

    /// Use a different reader host. HTTPS only, except localhost.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ContentError> {
        let base = base_url.trim_end_matches('/');
        if !base.starts_with("https://") {
            let is_localhost =
                base.starts_with("http://127.0.0.1") || base.starts_with("http://localhost");
            if !is_localhost {
                tracing::error!(base_url = %base, "Rejecting non-HTTPS reader base URL");
                return Err(ContentError::InsecureBaseUrl);
            }
            tracing::warn!(base_url = %base, "Using non-HTTPS reader base URL (localhost only)");
        }
        self.base_url = base.to_string();
        Ok(self)
    }

    /// The API key only ever goes to the official host.
    fn sends_key(&self) -> bool {
        self.base_url == DEFAULT_READER_BASE_URL
    }

    /// Fetch readable content for an article URL.
    pub async fn fetch(&self, url: &str) -> Result<String, ContentError> {
        let parsed = validate_url(url).map_err(|_| ContentError::InvalidUrl)?;
        let reader_url = format!("{}/{}", self.base_url, parsed.as_str());

        let content = self.fetch_with_retry(&reader_url, true).await?;
        if content.len() >= MIN_CONTENT_LEN {
            return Ok(strip_boilerplate(&content));
        }

        tracing::debug!(
            content_len = content.len(),
            "Target selector returned minimal content, retrying without selector"
        );
        let content = self.fetch_with_retry(&reader_url, false).await?;
        Ok(strip_boilerplate(&content))
    }

    async fn fetch_with_retry(
        &self,
        reader_url: &str,
        use_selector: bool,
    ) -> Result<String, ContentError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(reader_url, use_selector).await {
                Ok(content) => return Ok(content),
                Err(e) if e.is_retryable() && attempt < MAX_RETRIES => {
                    let delay = Duration::from_secs(1 << attempt);
                    tracing::debug!(error = %e, retry = attempt + 1, "Retrying reader fetch");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, reader_url: &str, use_selector: bool) -> Result<String, ContentError> {
        let mut request = self.http.get(reader_url);
        if use_selector {
            request = request.header("X-Target-Selector", TARGET_SELECTORS);
        }
        if let Some(key) = self.api_key.as_ref().filter(|_| self.sends_key()) {
            request = request.header("Authorization", format!("Bearer {}", key.expose_secret()));
        }

        let response = tokio::time::timeout(REQUEST_TIMEOUT, request.send())
            .await
            .map_err(|_| ContentError::Timeout)??;

        if !response.status().is_success() {
            return Err(ContentError::HttpStatus(response.status().as_u16()));
        }

        read_limited_text(response, MAX_CONTENT_SIZE).await
    }
}

/// Drop navigation and comment scaffolding lines the reader leaves in.
fn strip_boilerplate(content: &str) -> String {
    content
        .lines()
        .filter(|line| {
            let t = line.trim();
            !(t.starts_with("[Skip to content]")
                || t.starts_with("[Skip to main content]")
                || t == "Menu"
                || t == "Loading Comments..."
                || t == "Advertisement"
                || t.contains("Proudly powered by WordPress"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

async fn read_limited_text(
    response: reqwest::Response,
    limit: usize,
) -> Result<String, ContentError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ContentError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len() + chunk.len() > limit {
            return Err(ContentError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    String::from_utf8(bytes).map_err(|_| ContentError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn long_article() -> String {
        format!("Title: Budget\n\n{}", "The budget passed. ".repeat(20))
    }

    async fn client_for(server: &MockServer) -> ReaderClient {
        ReaderClient::new(reqwest::Client::new(), Some(SecretString::from("jina-key")))
            .with_base_url(&server.uri())
            .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_returns_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex("^/https://www.ft.lk/.*"))
            .and(header_exists("X-Target-Selector"))
            .respond_with(ResponseTemplate::new(200).set_body_string(long_article()))
            .mount(&server)
            .await;

        let content = client_for(&server)
            .await
            .fetch("https://www.ft.lk/front-page/budget")
            .await
            .unwrap();
        assert!(content.starts_with("Title: Budget"));
    }

    #[tokio::test]
    async fn test_api_key_not_sent_to_custom_host() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header_exists("Authorization"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(long_article()))
            .mount(&server)
            .await;

        assert!(client_for(&server)
            .await
            .fetch("https://www.ft.lk/a")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server).await.fetch("https://www.ft.lk/a").await;
        assert!(matches!(result, Err(ContentError::HttpStatus(404))));
    }

    #[tokio::test]
    async fn test_private_url_rejected_before_request() {
        let server = MockServer::start().await;
        let result = client_for(&server).await.fetch("http://10.0.0.5/admin").await;
        assert!(matches!(result, Err(ContentError::InvalidUrl)));
    }

    #[test]
    fn test_insecure_base_rejected() {
        let result = ReaderClient::new(reqwest::Client::new(), None).with_base_url("http://r.example");
        assert!(matches!(result, Err(ContentError::InsecureBaseUrl)));
    }

    #[test]
    fn test_strip_boilerplate() {
        let raw = "[Skip to content](#main)\nMenu\nBody line\nAdvertisement\nMore body";
        assert_eq!(strip_boilerplate(raw), "Body line\nMore body");
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = ReaderClient::new(reqwest::Client::new(), Some(SecretString::from("k-123")));
        assert!(!format!("{:?}", client).contains("k-123"));
    }
}
