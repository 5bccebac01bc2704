//! Hand-off context discovery.
//!
//! When a visitor arrives from one of the analysis tools, the page URL carries
//! a hand-off session id in its fragment. The resolver asks each configured
//! tool for that session, in priority order, and keeps the first answer.
//! Misses are expected and never fatal: the widget simply starts without
//! context.

mod fragment;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, instrument};
use url::Url;

use nuru_shared::{HandoffSourceConfig, NuruError, ResolvedContext, ResolverConfig, Result};

pub use fragment::session_from_fragment;

/// User-Agent string for probe requests.
const USER_AGENT: &str = concat!("Nuru-Widget/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// ContextResolver
// ---------------------------------------------------------------------------

/// Priority-ordered lookup of a hand-off session across upstream tools.
#[derive(Debug, Clone)]
pub struct ContextResolver {
    client: Client,
    sources: Vec<HandoffSourceConfig>,
}

impl ContextResolver {
    /// Build a resolver with its own HTTP client.
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| NuruError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            sources: config.sources.clone(),
        })
    }

    /// Configured sources, in probe order.
    pub fn sources(&self) -> &[HandoffSourceConfig] {
        &self.sources
    }

    /// Resolve the hand-off context for a page URL.
    ///
    /// Without a `session` parameter in the fragment this returns `None`
    /// immediately, without any network call.
    #[instrument(skip_all, fields(url = %page_url))]
    pub async fn resolve(&self, page_url: &Url) -> Option<ResolvedContext> {
        let Some(session) = session_from_fragment(page_url) else {
            debug!("no hand-off session in page fragment");
            return None;
        };
        self.resolve_session(&session).await
    }

    /// Probe each source in order; the first success wins and later sources
    /// are not contacted.
    #[instrument(skip(self))]
    pub async fn resolve_session(&self, session: &str) -> Option<ResolvedContext> {
        for source in &self.sources {
            match self.probe(source, session).await {
                Ok(raw) => {
                    let resolved = ResolvedContext::new(&source.name, raw);
                    info!(
                        source = %source.name,
                        kind = resolved.context.kind(),
                        "hand-off context resolved"
                    );
                    return Some(resolved);
                }
                Err(e) => {
                    debug!(source = %source.name, error = %e, "probe miss");
                }
            }
        }

        info!(probes = self.sources.len(), "no source knows this session");
        None
    }

    /// One probe: `GET {base_url}/api/session/{session}`.
    async fn probe(&self, source: &HandoffSourceConfig, session: &str) -> Result<Value> {
        let url = session_url(&source.base_url, session)?;

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| NuruError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NuruError::Network(format!("{url}: HTTP {status}")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| NuruError::parse(format!("{url}: invalid JSON body: {e}")))?;

        if !body.is_object() {
            return Err(NuruError::parse(format!("{url}: body is not a JSON object")));
        }

        Ok(body)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Append `api/session/{session}` to a base URL, encoding the session as a
/// single path segment.
fn session_url(base_url: &str, session: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)
        .map_err(|e| NuruError::validation(format!("invalid source URL '{base_url}': {e}")))?;

    url.path_segments_mut()
        .map_err(|_| NuruError::validation(format!("source URL '{base_url}' cannot be a base")))?
        .pop_if_empty()
        .extend(["api", "session", session]);

    Ok(url)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use nuru_shared::HandoffContext;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn source(name: &str, server: &MockServer) -> HandoffSourceConfig {
        HandoffSourceConfig {
            name: name.into(),
            base_url: server.uri(),
        }
    }

    fn resolver(sources: Vec<HandoffSourceConfig>) -> ContextResolver {
        ContextResolver::new(&ResolverConfig {
            sources,
            timeout: Duration::from_secs(5),
        })
        .expect("build resolver")
    }

    #[test]
    fn session_url_appends_segments() {
        let url = session_url("https://roi.example.com", "abc").unwrap();
        assert_eq!(url.as_str(), "https://roi.example.com/api/session/abc");

        let url = session_url("https://tools.example.com/roi/", "a/b c").unwrap();
        assert_eq!(
            url.as_str(),
            "https://tools.example.com/roi/api/session/a%2Fb%20c"
        );
    }

    #[test]
    fn session_url_rejects_garbage() {
        assert!(session_url("not a url", "abc").is_err());
        assert!(session_url("mailto:someone@example.com", "abc").is_err());
    }

    #[tokio::test]
    async fn no_session_means_no_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let resolver = resolver(vec![source("roi", &server)]);
        let page = Url::parse("https://example.com/#/chat").unwrap();

        assert!(resolver.resolve(&page).await.is_none());
    }

    #[tokio::test]
    async fn second_source_wins_and_third_is_not_probed() {
        let roi = MockServer::start().await;
        let readiness = MockServer::start().await;
        let audit = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/session/abc123"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&roi)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/session/abc123"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "overall_score": 80, "readiness_level": "Ready" })),
            )
            .expect(1)
            .mount(&readiness)
            .await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "waste_score": 50 })))
            .expect(0)
            .mount(&audit)
            .await;

        let resolver = resolver(vec![
            source("roi-projector", &roi),
            source("readiness-scanner", &readiness),
            source("intelligence-audit", &audit),
        ]);
        let page = Url::parse("https://example.com/#/chat?session=abc123").unwrap();

        let resolved = resolver.resolve(&page).await.expect("resolved");
        assert_eq!(resolved.source, "readiness-scanner");
        assert!(matches!(resolved.context, HandoffContext::Readiness(_)));
        assert_eq!(resolved.raw["overall_score"], 80);
    }

    #[tokio::test]
    async fn first_source_wins_even_if_later_ones_match() {
        let roi = MockServer::start().await;
        let readiness = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/session/s1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "process_name": "Invoicing",
                "annual_savings": 12000,
                "roi_percentage": 150,
                "breakeven_months": 6,
                "risk_level": "medium"
            })))
            .expect(1)
            .mount(&roi)
            .await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "overall_score": 1 })))
            .expect(0)
            .mount(&readiness)
            .await;

        let resolver = resolver(vec![source("roi", &roi), source("readiness", &readiness)]);
        let resolved = resolver.resolve_session("s1").await.expect("resolved");

        assert_eq!(resolved.source, "roi");
        assert_eq!(resolved.context.kind(), "roi");
    }

    #[tokio::test]
    async fn all_misses_resolve_to_none() {
        let failing = MockServer::start().await;
        let not_json = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&failing)
            .await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .expect(1)
            .mount(&not_json)
            .await;

        let unreachable = HandoffSourceConfig {
            name: "offline".into(),
            base_url: "http://127.0.0.1:9".into(),
        };

        let resolver = resolver(vec![
            source("failing", &failing),
            unreachable,
            source("not-json", &not_json),
        ]);

        assert!(resolver.resolve_session("abc").await.is_none());
    }

    #[tokio::test]
    async fn non_object_body_is_a_miss() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["a", "b"])))
            .mount(&server)
            .await;

        let resolver = resolver(vec![source("list", &server)]);
        assert!(resolver.resolve_session("abc").await.is_none());
    }
}
