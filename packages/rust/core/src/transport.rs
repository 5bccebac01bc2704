//! HTTP client for the chat backend.

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use nuru_shared::{ChatReply, ChatRequest, ChatResponseBody, NuruError, Result, TransportConfig};

const USER_AGENT: &str = concat!("Nuru-Widget/", env!("CARGO_PKG_VERSION"));

/// Body of `GET /api/health`.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// Client for `POST /api/chat` and `GET /api/health`.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| NuruError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one message and decode the reply.
    ///
    /// The body is decoded whatever the HTTP status: a backend that answers
    /// `500` with `{"error": "..."}` yields [`ChatReply::Error`]. Only
    /// connection failures and undecodable bodies are `Err`.
    #[instrument(skip_all, fields(session_id = request.session_id))]
    pub async fn send(&self, request: &ChatRequest<'_>) -> Result<ChatReply> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| NuruError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "chat backend returned non-success status");
        }

        let body: ChatResponseBody = response
            .json()
            .await
            .map_err(|e| NuruError::parse(format!("{url}: undecodable reply (HTTP {status}): {e}")))?;

        if let Some(echoed) = body.session_id.as_deref() {
            if echoed != request.session_id {
                debug!(echoed, "backend echoed a different session id");
            }
        }

        Ok(ChatReply::from(body))
    }

    /// Query the backend health endpoint.
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<HealthStatus> {
        let url = format!("{}/api/health", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| NuruError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NuruError::Network(format!("{url}: HTTP {status}")));
        }

        response
            .json()
            .await
            .map_err(|e| NuruError::parse(format!("{url}: invalid JSON body: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer) -> ChatClient {
        ChatClient::new(&TransportConfig {
            base_url: format!("{}/", server.uri()),
            timeout: Duration::from_secs(5),
        })
        .expect("build client")
    }

    #[tokio::test]
    async fn posts_request_body_and_decodes_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_json(json!({
                "message": "hello",
                "session_id": "session_1",
                "audit_context": { "waste_score": 55 }
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "response": "**Hi**", "session_id": "session_1" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let context = json!({ "waste_score": 55 });
        let reply = client(&server)
            .send(&ChatRequest {
                message: "hello",
                session_id: "session_1",
                audit_context: Some(&context),
            })
            .await
            .unwrap();

        assert_eq!(reply, ChatReply::Response("**Hi**".into()));
    }

    #[tokio::test]
    async fn omits_audit_context_when_absent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_json(json!({ "message": "hi", "session_id": "s" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "ok" })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client(&server)
            .send(&ChatRequest {
                message: "hi",
                session_id: "s",
                audit_context: None,
            })
            .await
            .unwrap();

        assert_eq!(reply, ChatReply::Response("ok".into()));
    }

    #[tokio::test]
    async fn error_body_is_decoded_even_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "model down" })))
            .mount(&server)
            .await;

        let reply = client(&server)
            .send(&ChatRequest {
                message: "hi",
                session_id: "s",
                audit_context: None,
            })
            .await
            .unwrap();

        assert_eq!(reply, ChatReply::Error("model down".into()));
    }

    #[tokio::test]
    async fn undecodable_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let result = client(&server)
            .send(&ChatRequest {
                message: "hi",
                session_id: "s",
                audit_context: None,
            })
            .await;

        assert!(matches!(result, Err(NuruError::Parse { .. })));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_error() {
        let client = ChatClient::new(&TransportConfig {
            base_url: "http://127.0.0.1:9".into(),
            timeout: Duration::from_secs(2),
        })
        .unwrap();

        let result = client
            .send(&ChatRequest {
                message: "hi",
                session_id: "s",
                audit_context: None,
            })
            .await;

        assert!(matches!(result, Err(NuruError::Network(_))));
    }

    #[tokio::test]
    async fn health_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "healthy" })))
            .mount(&server)
            .await;

        let health = client(&server).health().await.unwrap();
        assert!(health.is_healthy());
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = ChatClient::new(&TransportConfig {
            base_url: "http://localhost:5000///".into(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
    }
}
