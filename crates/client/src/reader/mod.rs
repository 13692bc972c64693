//! Client for the Markdown rendering service.
//!
//! ### Request shape
//! - `GET {base_url}/{target_url}`; the target is appended verbatim as a path suffix
//! - Optional `Authorization: Bearer <api_key>`
//! - Redirects limited to 5, request timeout from config (default: 60s)
//!
//! ### Response handling
//! - 2xx: body is the Markdown rendering (UTF-8, lossy)
//! - Anything else is an error carrying the status and a snippet of the body
//! - Bodies larger than `max_bytes` are rejected

pub mod error;
pub mod url;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Url, header};

pub use error::ReaderError;
pub use self::url::{UrlError, canonicalize};

use jinamd_core::AppConfig;

/// Default base URL for the Jina Reader.
const DEFAULT_BASE_URL: &str = "https://r.jina.ai";

/// Longest slice of an error body echoed back to the caller.
const ERROR_DETAIL_CHARS: usize = 200;

/// Turns a web page into Markdown.
///
/// The server only talks to this trait, so tests and alternative services can
/// stand in for the Jina Reader.
#[async_trait]
pub trait MarkdownReader: Send + Sync {
    /// Fetch `url` rendered as Markdown.
    async fn read(&self, url: &Url) -> Result<String, ReaderError>;
}

/// Configuration for the Jina Reader client.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Base URL (default: https://r.jina.ai).
    pub base_url: String,
    /// Bearer token; anonymous access when unset.
    pub api_key: Option<String>,
    /// User-agent string (default: jinamd/0.1).
    pub user_agent: String,
    /// Request timeout (default: 60s).
    pub timeout: Duration,
    /// Maximum response body size in bytes (default: 5MB).
    pub max_bytes: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            user_agent: "jinamd/0.1".to_string(),
            timeout: Duration::from_secs(60),
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

impl From<&AppConfig> for ReaderConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.reader_base_url.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            max_bytes: config.max_bytes,
        }
    }
}

/// Jina Reader client.
#[derive(Debug, Clone)]
pub struct JinaReader {
    http: Client,
    config: ReaderConfig,
}

impl JinaReader {
    /// Create a new reader with the given configuration.
    pub fn new(config: ReaderConfig) -> Result<Self, ReaderError> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| ReaderError::Build(e.to_string()))?;

        Ok(Self { http, config })
    }

    /// The rendering-service URL for a target page.
    pub fn endpoint(&self, target: &Url) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), target)
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }
}

#[async_trait]
impl MarkdownReader for JinaReader {
    async fn read(&self, url: &Url) -> Result<String, ReaderError> {
        let start = Instant::now();
        let endpoint = self.endpoint(url);

        let mut request = self
            .http
            .get(&endpoint)
            .header(header::ACCEPT, "text/markdown, text/plain;q=0.9, */*;q=0.8");
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("rendering service responded {} for {}", status, url);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail: String = body.trim().chars().take(ERROR_DETAIL_CHARS).collect();
            return Err(ReaderError::HttpError { status: status.as_u16(), detail });
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(ReaderError::TooLarge { len, max: self.config.max_bytes });
        }

        let bytes = response.bytes().await?;
        if bytes.len() > self.config.max_bytes {
            return Err(ReaderError::TooLarge { len: bytes.len() as u64, max: self.config.max_bytes });
        }

        tracing::debug!("rendered {} in {:?} ({} bytes)", url, start.elapsed(), bytes.len());

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn reader_for(server: &MockServer) -> JinaReader {
        JinaReader::new(ReaderConfig { base_url: server.uri(), ..Default::default() }).unwrap()
    }

    fn target(s: &str) -> Url {
        canonicalize(s).unwrap()
    }

    #[test]
    fn test_reader_config_default() {
        let config = ReaderConfig::default();
        assert_eq!(config.base_url, "https://r.jina.ai");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_reader_config_from_app_config() {
        let app = AppConfig { api_key: Some(String::new()), timeout_ms: 1_500, ..Default::default() };
        let config = ReaderConfig::from(&app);
        assert!(config.api_key.is_none());
        assert_eq!(config.timeout, Duration::from_millis(1_500));
        assert_eq!(config.base_url, app.reader_base_url);
    }

    #[test]
    fn test_endpoint_appends_target() {
        let reader = JinaReader::new(ReaderConfig { base_url: "https://r.jina.ai/".into(), ..Default::default() })
            .unwrap();
        let endpoint = reader.endpoint(&target("https://example.com/docs?q=1"));
        assert_eq!(endpoint, "https://r.jina.ai/https://example.com/docs?q=1");
    }

    #[tokio::test]
    async fn test_read_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/https://example.com/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# Example\n\nHello world"))
            .expect(1)
            .mount(&server)
            .await;

        let markdown = reader_for(&server).read(&target("https://example.com")).await.unwrap();
        assert_eq!(markdown, "# Example\n\nHello world");
    }

    #[tokio::test]
    async fn test_read_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header_eq("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let reader = JinaReader::new(ReaderConfig {
            base_url: server.uri(),
            api_key: Some("secret".into()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(reader.read(&target("https://example.com")).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_read_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(422).set_body_string("cannot render"))
            .mount(&server)
            .await;

        let result = reader_for(&server).read(&target("https://example.com")).await;
        match result {
            Err(ReaderError::HttpError { status, detail }) => {
                assert_eq!(status, 422);
                assert_eq!(detail, "cannot render");
            }
            other => panic!("expected HttpError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_read_too_large() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(64)))
            .mount(&server)
            .await;

        let reader =
            JinaReader::new(ReaderConfig { base_url: server.uri(), max_bytes: 16, ..Default::default() }).unwrap();

        let result = reader.read(&target("https://example.com")).await;
        assert!(matches!(result, Err(ReaderError::TooLarge { max: 16, .. })));
    }

    #[tokio::test]
    async fn test_read_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("late").set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let reader = JinaReader::new(ReaderConfig {
            base_url: server.uri(),
            timeout: Duration::from_millis(100),
            ..Default::default()
        })
        .unwrap();

        let result = reader.read(&target("https://example.com")).await;
        assert!(matches!(result, Err(ReaderError::Timeout)));
    }
}
