//! HTTP fetching and content classification for discovered manifest URLs.
//!
//! The resolver is deliberately infallible from the caller's point of view:
//! network errors, non-200 statuses, and undecodable bodies all collapse to
//! `None` ("nothing usable at this URL"), which the prober records as a
//! candidate failure.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::{Error, Result};

/// Structured format a manifest body decoded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    /// Body parsed as JSON.
    Json,
    /// Body parsed as YAML.
    Yaml,
}

/// Classified body of a fetched manifest URL.
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestContent {
    /// Body decoded into a structured value.
    Structured {
        /// Which decoder succeeded.
        format: ManifestFormat,
        /// The decoded document.
        value: Value,
    },
    /// Non-empty body that matched no structured decoder. Content was
    /// present, so discovery still counts the candidate as a success.
    Opaque {
        /// The response's content type, if the server sent one.
        content_type: Option<String>,
    },
}

impl ManifestContent {
    /// The `sources` list of a structured mapping payload, if present.
    #[must_use]
    pub fn sources(&self) -> Option<&[Value]> {
        match self {
            Self::Structured { value, .. } => {
                value.get("sources").and_then(Value::as_array).map(Vec::as_slice)
            },
            Self::Opaque { .. } => None,
        }
    }

    #[must_use]
    pub const fn is_structured(&self) -> bool {
        matches!(self, Self::Structured { .. })
    }
}

/// HTTP client for fetching and classifying manifest documents.
pub struct ContentFetcher {
    client: Client,
}

impl ContentFetcher {
    /// Creates a fetcher with the default 30 second request timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Creates a fetcher with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("scout/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(Error::Network)?;
        Ok(Self { client })
    }

    /// Fetch a URL and classify its body.
    ///
    /// Returns `None` on any network error, non-200 status, or empty body.
    /// No error escapes this method.
    pub async fn resolve(&self, url: &str) -> Option<ManifestContent> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                debug!(%url, error = %err, "manifest fetch failed");
                return None;
            },
        };

        let status = response.status();
        if status != StatusCode::OK {
            debug!(%url, %status, "manifest fetch returned non-200");
            return None;
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(std::string::ToString::to_string);

        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                debug!(%url, error = %err, "manifest body read failed");
                return None;
            },
        };

        classify(url, content_type.as_deref(), &body)
    }
}

/// Classify a response body by content-type and URL extension hints.
///
/// Decode attempts fall through on failure; a non-empty body that nothing
/// decoded is reported as opaque content rather than an error.
fn classify(url: &str, content_type: Option<&str>, body: &str) -> Option<ManifestContent> {
    let declared = content_type.unwrap_or("");

    if declared.starts_with("application/json") || url.ends_with(".json") {
        match serde_json::from_str(body) {
            Ok(value) => {
                return Some(ManifestContent::Structured {
                    format: ManifestFormat::Json,
                    value,
                });
            },
            Err(err) => debug!(%url, error = %err, "JSON decode failed, falling through"),
        }
    }

    if declared.starts_with("application/yaml")
        || declared.starts_with("application/x-yaml")
        || url.ends_with(".yaml")
        || url.ends_with(".yml")
    {
        match serde_yaml::from_str::<Value>(body) {
            Ok(value) => {
                return Some(ManifestContent::Structured {
                    format: ManifestFormat::Yaml,
                    value,
                });
            },
            Err(err) => debug!(%url, error = %err, "YAML decode failed, falling through"),
        }
    }

    if body.trim().is_empty() {
        return None;
    }

    Some(ManifestContent::Opaque {
        content_type: content_type.map(std::string::ToString::to_string),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn classify_json_by_content_type() {
        let content = classify(
            "https://example.edu/manifest",
            Some("application/json; charset=utf-8"),
            r#"{"sources": []}"#,
        )
        .unwrap();
        assert!(matches!(
            content,
            ManifestContent::Structured {
                format: ManifestFormat::Json,
                ..
            }
        ));
    }

    #[test]
    fn classify_json_by_extension() {
        let content = classify("https://example.edu/m.json", None, r#"{"a": 1}"#).unwrap();
        assert!(content.is_structured());
    }

    #[test]
    fn classify_yaml_by_extension() {
        let content = classify(
            "https://example.edu/m.yaml",
            Some("text/plain"),
            "sources:\n  - path: a\n    type: rdf\n",
        )
        .unwrap();
        match content {
            ManifestContent::Structured { format, value } => {
                assert_eq!(format, ManifestFormat::Yaml);
                assert_eq!(value["sources"][0]["path"], "a");
            },
            ManifestContent::Opaque { .. } => panic!("expected structured YAML"),
        }
    }

    #[test]
    fn invalid_json_falls_through_to_opaque() {
        let content = classify(
            "https://example.edu/m.json",
            Some("application/json"),
            "not json at all",
        )
        .unwrap();
        // "not json at all" is also not valid strict JSON, but it is a
        // non-empty body, so it survives as opaque content.
        assert!(matches!(content, ManifestContent::Opaque { .. }));
    }

    #[test]
    fn plain_text_is_opaque() {
        let content = classify("https://example.edu/m", Some("text/plain"), "hello").unwrap();
        match content {
            ManifestContent::Opaque { content_type } => {
                assert_eq!(content_type.as_deref(), Some("text/plain"));
            },
            ManifestContent::Structured { .. } => panic!("expected opaque"),
        }
    }

    #[test]
    fn empty_body_is_not_found() {
        assert!(classify("https://example.edu/m", Some("text/plain"), "  \n").is_none());
    }

    #[test]
    fn sources_accessor_requires_mapping() {
        let mapping = classify("https://x/m.json", None, r#"{"sources":[{"path":"a"}]}"#).unwrap();
        assert_eq!(mapping.sources().map(<[Value]>::len), Some(1));

        let list = classify("https://x/m.json", None, r#"[1, 2]"#).unwrap();
        assert!(list.sources().is_none());

        let opaque = classify("https://x/m", Some("text/plain"), "raw").unwrap();
        assert!(opaque.sources().is_none());
    }

    #[tokio::test]
    async fn resolve_parses_json_response() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/manifest.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"sources":[{"path":"a","type":"rdf"}]}"#)
                    .insert_header("content-type", "application/json"),
            )
            .mount(&server)
            .await;

        let fetcher = ContentFetcher::new()?;
        let url = format!("{}/manifest.json", server.uri());
        let content = fetcher.resolve(&url).await.unwrap();

        assert_eq!(content.sources().map(<[Value]>::len), Some(1));
        Ok(())
    }

    #[tokio::test]
    async fn resolve_absorbs_404() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = ContentFetcher::new()?;
        let url = format!("{}/missing", server.uri());
        assert!(fetcher.resolve(&url).await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn resolve_absorbs_connection_errors() {
        // Nothing listens on this port.
        let fetcher = ContentFetcher::with_timeout(Duration::from_millis(250)).unwrap();
        assert!(fetcher.resolve("http://127.0.0.1:1/manifest").await.is_none());
    }

    #[tokio::test]
    async fn resolve_treats_empty_200_as_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/empty"))
            .respond_with(ResponseTemplate::new(200).set_body_string(""))
            .mount(&server)
            .await;

        let fetcher = ContentFetcher::new().unwrap();
        let url = format!("{}/empty", server.uri());
        assert!(fetcher.resolve(&url).await.is_none());
    }
}
