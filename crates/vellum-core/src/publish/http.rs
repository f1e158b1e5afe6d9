//! HTTP-backed publisher adapter
//!
//! Posts the article to a per-platform publish endpoint (typically a local
//! bridge process that owns the platform's real wire protocol) and maps the
//! HTTP outcome onto the publish error taxonomy.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{PublishError, PublishReceipt, Publisher};
use crate::models::{Article, Platform, PlatformConfig};

const PUBLISH_TIMEOUT: Duration = Duration::from_secs(30);

/// Publisher that delegates to per-platform HTTP endpoints
pub struct HttpPublisher {
    client: reqwest::Client,
    endpoints: HashMap<Platform, String>,
}

#[derive(Serialize)]
struct PublishRequest<'a> {
    article_id: String,
    title: &'a str,
    content: &'a str,
    tags: &'a [String],
    summary: &'a str,
    source_type: &'a str,
    config: &'a PlatformConfig,
}

#[derive(Deserialize)]
struct PublishResponse {
    url: Option<String>,
    error: Option<String>,
    message: Option<String>,
}

impl HttpPublisher {
    /// Create a publisher from a platform → endpoint map.
    ///
    /// Endpoints must include the scheme; trailing slashes are stripped.
    pub fn new(endpoints: HashMap<Platform, String>) -> Result<Self, PublishError> {
        let mut normalized = HashMap::new();
        for (platform, endpoint) in endpoints {
            let endpoint = endpoint.trim();
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(PublishError::permanent(format!(
                    "publish endpoint for {platform} must include http:// or https://"
                )));
            }
            normalized.insert(platform, endpoint.trim_end_matches('/').to_string());
        }
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(PUBLISH_TIMEOUT)
                .build()
                .map_err(|e| PublishError::transient(e.to_string()))?,
            endpoints: normalized,
        })
    }

    fn endpoint(&self, platform: Platform) -> Result<&str, PublishError> {
        self.endpoints
            .get(&platform)
            .map(String::as_str)
            .ok_or_else(|| {
                PublishError::permanent(format!("no publish endpoint configured for {platform}"))
            })
    }
}

/// Map an HTTP status onto the publish error taxonomy
fn classify_status(status: StatusCode) -> super::PublishErrorKind {
    use super::PublishErrorKind::{CredentialExpired, Permanent, Transient};
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CredentialExpired,
        StatusCode::TOO_MANY_REQUESTS => Transient,
        s if s.is_server_error() => Transient,
        _ => Permanent,
    }
}

fn error_text(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<PublishResponse>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

#[async_trait::async_trait]
impl Publisher for HttpPublisher {
    async fn publish(
        &self,
        article: &Article,
        config: &PlatformConfig,
    ) -> Result<PublishReceipt, PublishError> {
        let endpoint = self.endpoint(config.platform())?;

        let request = PublishRequest {
            article_id: article.id.as_str(),
            title: &article.title,
            content: &article.content,
            tags: &article.tags,
            summary: &article.summary,
            source_type: article.source_type.as_str(),
            config,
        };

        let response = self
            .client
            .post(endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| PublishError::transient(format!("publish request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError {
                kind: classify_status(status),
                message: error_text(status, &body),
            });
        }

        let payload = response
            .json::<PublishResponse>()
            .await
            .map_err(|e| PublishError::transient(format!("invalid publish response: {e}")))?;

        payload
            .url
            .filter(|url| !url.trim().is_empty())
            .map(|url| PublishReceipt { url })
            .ok_or_else(|| PublishError::permanent("publish response did not include a url"))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::super::PublishErrorKind;
    use super::*;

    #[test]
    fn classifies_credential_statuses() {
        assert_eq!(
            classify_status(StatusCode::UNAUTHORIZED),
            PublishErrorKind::CredentialExpired
        );
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN),
            PublishErrorKind::CredentialExpired
        );
    }

    #[test]
    fn classifies_transient_statuses() {
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            PublishErrorKind::Transient
        );
        assert_eq!(
            classify_status(StatusCode::BAD_GATEWAY),
            PublishErrorKind::Transient
        );
    }

    #[test]
    fn classifies_client_errors_as_permanent() {
        assert_eq!(
            classify_status(StatusCode::UNPROCESSABLE_ENTITY),
            PublishErrorKind::Permanent
        );
    }

    #[test]
    fn error_text_prefers_structured_message() {
        let body = r#"{"error": "draft too long"}"#;
        assert_eq!(
            error_text(StatusCode::BAD_REQUEST, body),
            "draft too long (400)"
        );
        assert_eq!(error_text(StatusCode::BAD_GATEWAY, ""), "HTTP 502");
    }

    #[test]
    fn rejects_unschemed_endpoints() {
        let endpoints = HashMap::from([(Platform::Juejin, "api.example.com".to_string())]);
        assert!(HttpPublisher::new(endpoints).is_err());
    }

    #[test]
    fn missing_endpoint_is_permanent() {
        let publisher = HttpPublisher::new(HashMap::new()).unwrap();
        let err = publisher.endpoint(Platform::Zhihu).unwrap_err();
        assert_eq!(err.kind, PublishErrorKind::Permanent);
    }
}
