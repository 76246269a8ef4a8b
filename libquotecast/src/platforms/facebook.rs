//! Facebook Graph API publisher
//!
//! Plain HTTPS calls against the Graph API. A response body carrying an
//! `error` object is a failure even when the HTTP status is 200.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

use crate::config::FacebookConfig;
use crate::error::{PlatformError, Result};
use crate::platforms::Publisher;

/// Graph error codes that mean the token is invalid or expired
const AUTH_ERROR_CODES: &[i64] = &[190];

/// Graph error codes for application, user and page throttling
const RATE_LIMIT_ERROR_CODES: &[i64] = &[4, 17, 32, 613];

/// Invalid parameter and duplicate post; retrying the same content fails again
const VALIDATION_ERROR_CODES: &[i64] = &[100, 506];

#[derive(Debug, Deserialize)]
struct GraphError {
    message: String,
    #[serde(default)]
    code: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct GraphResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    post_id: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<GraphError>,
}

/// Graph API client for page posts
#[derive(Debug, Clone)]
pub struct FacebookPublisher {
    client: reqwest::Client,
    base_url: String,
}

impl FacebookPublisher {
    /// Create a publisher from the `[facebook]` configuration section
    pub fn new(config: &FacebookConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PlatformError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Point the client at a different API root (used with mock servers)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Exchange a user token for the page-scoped token of `page_id`
    pub async fn fetch_page_token(&self, page_id: &str, user_token: &str) -> Result<String> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, page_id))
            .query(&[("fields", "access_token"), ("access_token", user_token)])
            .send()
            .await
            .map_err(|e| PlatformError::from_transport(e, PlatformError::Authentication))?;

        let body = read_graph_response(response).await?;
        body.access_token.ok_or_else(|| {
            PlatformError::Authentication(format!(
                "no page access token returned for {}; check the user token's page permissions",
                page_id
            ))
            .into()
        })
    }
}

#[async_trait]
impl Publisher for FacebookPublisher {
    async fn create_text_post(
        &self,
        page_id: &str,
        credential: &str,
        message: &str,
        preset_id: Option<&str>,
    ) -> Result<String> {
        let mut payload = serde_json::json!({
            "message": message,
            "access_token": credential,
        });
        if let Some(preset) = preset_id {
            payload["text_format_preset_id"] = serde_json::Value::String(preset.to_string());
        }

        tracing::debug!(page_id, preset_id, "Creating text post");

        let response = self
            .client
            .post(format!("{}/{}/feed", self.base_url, page_id))
            .json(&payload)
            .send()
            .await
            .map_err(|e| PlatformError::from_transport(e, PlatformError::Posting))?;

        let body = read_graph_response(response).await?;
        body.id
            .ok_or_else(|| PlatformError::Posting("response did not include a post id".to_string()).into())
    }

    async fn create_image_post(
        &self,
        page_id: &str,
        credential: &str,
        image_url: &str,
        caption: &str,
    ) -> Result<String> {
        tracing::debug!(page_id, image_url, "Creating photo post");

        let response = self
            .client
            .post(format!("{}/{}/photos", self.base_url, page_id))
            .form(&[
                ("url", image_url),
                ("caption", caption),
                ("access_token", credential),
            ])
            .send()
            .await
            .map_err(|e| PlatformError::from_transport(e, PlatformError::Posting))?;

        let body = read_graph_response(response).await?;
        // The feed post id is preferred over the photo object id
        body.post_id
            .or(body.id)
            .ok_or_else(|| PlatformError::Posting("response did not include a post id".to_string()).into())
    }

    async fn share_post(
        &self,
        post_id: &str,
        target_page_id: &str,
        target_credential: &str,
    ) -> Result<String> {
        let link = format!("https://www.facebook.com/{}", post_id);
        tracing::debug!(post_id, target_page_id, "Sharing post by link");

        let response = self
            .client
            .post(format!("{}/{}/feed", self.base_url, target_page_id))
            .form(&[("link", link.as_str()), ("access_token", target_credential)])
            .send()
            .await
            .map_err(|e| PlatformError::from_transport(e, PlatformError::Posting))?;

        let body = read_graph_response(response).await?;
        body.id
            .ok_or_else(|| PlatformError::Posting("share response did not include a post id".to_string()).into())
    }

    fn name(&self) -> &str {
        "facebook"
    }
}

async fn read_graph_response(response: reqwest::Response) -> Result<GraphResponse> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| PlatformError::from_transport(e, PlatformError::Posting))?;

    let parsed: Option<GraphResponse> = serde_json::from_str(&text).ok();

    if let Some(error) = parsed.as_ref().and_then(|body| body.error.as_ref()) {
        return Err(classify_graph_error(status, error).into());
    }

    if !status.is_success() {
        let message = format!("HTTP {}: {}", status, text.trim());
        return Err(classify_status(status, message).into());
    }

    parsed.ok_or_else(|| PlatformError::Posting(format!("unexpected response body: {}", text.trim())).into())
}

fn classify_graph_error(status: StatusCode, error: &GraphError) -> PlatformError {
    match error.code {
        Some(code) if AUTH_ERROR_CODES.contains(&code) => {
            PlatformError::Authentication(error.message.clone())
        }
        Some(code) if RATE_LIMIT_ERROR_CODES.contains(&code) => {
            PlatformError::RateLimit(error.message.clone())
        }
        Some(code) if VALIDATION_ERROR_CODES.contains(&code) => {
            PlatformError::Validation(error.message.clone())
        }
        _ => classify_status(status, error.message.clone()),
    }
}

fn classify_status(status: StatusCode, message: String) -> PlatformError {
    match status {
        StatusCode::UNAUTHORIZED => PlatformError::Authentication(message),
        StatusCode::TOO_MANY_REQUESTS => PlatformError::RateLimit(message),
        _ => PlatformError::Posting(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QuotecastError;
    use wiremock::matchers::{body_json, body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn publisher(server: &MockServer) -> FacebookPublisher {
        FacebookPublisher::new(&FacebookConfig::default())
            .unwrap()
            .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_text_post_with_preset() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/page-1/feed"))
            .and(body_json(serde_json::json!({
                "message": "Stay curious",
                "access_token": "tok",
                "text_format_preset_id": "106018623298955",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "page-1_111"})))
            .expect(1)
            .mount(&server)
            .await;

        let id = publisher(&server)
            .create_text_post("page-1", "tok", "Stay curious", Some("106018623298955"))
            .await
            .unwrap();
        assert_eq!(id, "page-1_111");
    }

    #[tokio::test]
    async fn test_text_post_without_preset_omits_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/page-1/feed"))
            .and(body_json(serde_json::json!({
                "message": "Plain",
                "access_token": "tok",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "page-1_112"})))
            .mount(&server)
            .await;

        let id = publisher(&server)
            .create_text_post("page-1", "tok", "Plain", None)
            .await
            .unwrap();
        assert_eq!(id, "page-1_112");
    }

    #[tokio::test]
    async fn test_image_post_prefers_post_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/page-1/photos"))
            .and(body_string_contains("url=https%3A%2F%2Fimg.example%2Fa.png"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "photo_9",
                "post_id": "page-1_222",
            })))
            .mount(&server)
            .await;

        let id = publisher(&server)
            .create_image_post("page-1", "tok", "https://img.example/a.png", "caption")
            .await
            .unwrap();
        assert_eq!(id, "page-1_222");
    }

    #[tokio::test]
    async fn test_image_post_falls_back_to_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/page-1/photos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "photo_10"})))
            .mount(&server)
            .await;

        let id = publisher(&server)
            .create_image_post("page-1", "tok", "https://img.example/b.png", "caption")
            .await
            .unwrap();
        assert_eq!(id, "photo_10");
    }

    #[tokio::test]
    async fn test_share_posts_link_to_target() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/page-2/feed"))
            .and(body_string_contains("link=https%3A%2F%2Fwww.facebook.com%2Fpage-1_111"))
            .and(body_string_contains("access_token=target-tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "page-2_333"})))
            .expect(1)
            .mount(&server)
            .await;

        let id = publisher(&server)
            .share_post("page-1_111", "page-2", "target-tok")
            .await
            .unwrap();
        assert_eq!(id, "page-2_333");
    }

    #[tokio::test]
    async fn test_expired_token_is_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/page-1/feed"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"message": "Error validating access token", "type": "OAuthException", "code": 190}
            })))
            .mount(&server)
            .await;

        let result = publisher(&server)
            .create_text_post("page-1", "stale", "hi", None)
            .await;
        match result {
            Err(QuotecastError::Platform(PlatformError::Authentication(msg))) => {
                assert_eq!(msg, "Error validating access token");
            }
            other => panic!("expected authentication error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_throttling_code_is_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/page-1/photos"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"message": "Application request limit reached", "code": 4}
            })))
            .mount(&server)
            .await;

        let result = publisher(&server)
            .create_image_post("page-1", "tok", "https://img.example/c.png", "c")
            .await;
        assert!(matches!(
            result,
            Err(QuotecastError::Platform(PlatformError::RateLimit(_)))
        ));
    }

    #[tokio::test]
    async fn test_error_body_with_ok_status_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/page-1/feed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": {"message": "An unknown error has occurred.", "code": 1}
            })))
            .mount(&server)
            .await;

        let result = publisher(&server)
            .create_text_post("page-1", "tok", "again", None)
            .await;
        match result {
            Err(QuotecastError::Platform(PlatformError::Posting(msg))) => {
                assert_eq!(msg, "An unknown error has occurred.");
            }
            other => panic!("expected posting error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_duplicate_post_is_validation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/page-1/feed"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"message": "Duplicate status message", "code": 506}
            })))
            .mount(&server)
            .await;

        let result = publisher(&server)
            .create_text_post("page-1", "tok", "again", None)
            .await;
        assert!(matches!(
            result,
            Err(QuotecastError::Platform(PlatformError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn test_server_error_without_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/page-2/feed"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let result = publisher(&server).share_post("p_1", "page-2", "tok").await;
        match result {
            Err(QuotecastError::Platform(PlatformError::Posting(msg))) => {
                assert!(msg.contains("502"));
            }
            other => panic!("expected posting error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_page_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page-1"))
            .and(query_param("fields", "access_token"))
            .and(query_param("access_token", "user-tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "page-tok",
                "id": "page-1",
            })))
            .mount(&server)
            .await;

        let token = publisher(&server)
            .fetch_page_token("page-1", "user-tok")
            .await
            .unwrap();
        assert_eq!(token, "page-tok");
    }

    #[tokio::test]
    async fn test_fetch_page_token_missing_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "page-1"})))
            .mount(&server)
            .await;

        let result = publisher(&server).fetch_page_token("page-1", "user-tok").await;
        assert!(matches!(
            result,
            Err(QuotecastError::Platform(PlatformError::Authentication(_)))
        ));
    }

    #[tokio::test]
    async fn test_token_exchange_transport_error_omits_user_token() {
        let publisher = FacebookPublisher::new(&FacebookConfig::default())
            .unwrap()
            .with_base_url("http://127.0.0.1:9");

        let err = publisher
            .fetch_page_token("page-1", "EAAB-user-secret")
            .await
            .unwrap_err();
        assert!(matches!(err, QuotecastError::Platform(PlatformError::Network(_))));
        assert!(!err.to_string().contains("EAAB-user-secret"));
    }
}
