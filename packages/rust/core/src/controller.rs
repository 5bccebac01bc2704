//! Widget controller: one chat view from greeting to replies.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{error, info, instrument, warn};
use url::Url;

use nuru_discovery::ContextResolver;
use nuru_shared::{ChatMessage, ChatReply, ChatRequest, ResolvedContext, SessionId};
use nuru_storage::{KeyValueStore, SessionManager};

use crate::greeting::synthesize_greeting;
use crate::surface::{Surface, TYPING_INDICATOR_ID};
use crate::transport::ChatClient;

/// Shown in place of any backend or transport failure.
pub const APOLOGY_MESSAGE: &str =
    "Sorry, I'm having trouble connecting right now. Please try again in a moment.";

/// Why a submission was dropped without contacting the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredReason {
    /// The input was empty after trimming.
    Blank,
    /// A previous message is still awaiting its reply.
    Pending,
}

/// Result of [`WidgetController::send_message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Ignored(IgnoredReason),
    /// The backend answered and its reply was appended.
    Replied,
    /// Something failed and the apology was appended instead.
    Apologized,
}

/// Clears the pending flag when the send finishes, however it finishes.
struct PendingGuard<'a>(&'a AtomicBool);

impl<'a> PendingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives one widget view.
///
/// At most one message is in flight at a time: submissions made while a
/// reply is pending are ignored, not queued.
pub struct WidgetController<S> {
    session_id: SessionId,
    context: Option<ResolvedContext>,
    transport: ChatClient,
    surface: S,
    pending: AtomicBool,
}

impl<S: Surface> WidgetController<S> {
    pub fn new(
        session_id: SessionId,
        context: Option<ResolvedContext>,
        transport: ChatClient,
        surface: S,
    ) -> Self {
        Self {
            session_id,
            context,
            transport,
            surface,
            pending: AtomicBool::new(false),
        }
    }

    /// Start a view: establish the session, resolve any hand-off context
    /// from `page_url`, then show the greeting.
    #[instrument(skip_all)]
    pub async fn start<K: KeyValueStore>(
        sessions: &SessionManager<K>,
        resolver: &ContextResolver,
        page_url: Option<&Url>,
        transport: ChatClient,
        surface: S,
    ) -> Self {
        let session_id = sessions.session_id().await;
        let context = match page_url {
            Some(url) => resolver.resolve(url).await,
            None => None,
        };

        info!(
            session_id = %session_id,
            context = context.as_ref().map(|c| c.context.kind()).unwrap_or("none"),
            "widget started"
        );

        let controller = Self::new(session_id, context, transport, surface);
        controller.greet();
        controller
    }

    /// Append the greeting for the resolved context.
    pub fn greet(&self) {
        let greeting = synthesize_greeting(self.context.as_ref().map(|c| &c.context));
        self.surface.append(&ChatMessage::assistant(greeting));
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn context(&self) -> Option<&ResolvedContext> {
        self.context.as_ref()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn transport(&self) -> &ChatClient {
        &self.transport
    }

    /// Whether a message is awaiting its reply.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Submit the user's text.
    ///
    /// On success the reply is appended; on any failure the fixed apology is
    /// appended. The typing indicator is removed in both cases before the
    /// assistant message appears.
    #[instrument(skip_all, fields(session_id = %self.session_id))]
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        let message = text.trim();
        if message.is_empty() {
            return SendOutcome::Ignored(IgnoredReason::Blank);
        }

        let Some(_pending) = PendingGuard::acquire(&self.pending) else {
            warn!("message submitted while a reply is pending, ignored");
            return SendOutcome::Ignored(IgnoredReason::Pending);
        };

        self.surface.append(&ChatMessage::user(message));
        self.surface.clear_input();
        self.surface.show_typing(TYPING_INDICATOR_ID);

        let request = ChatRequest {
            message,
            session_id: self.session_id.as_str(),
            audit_context: self.context.as_ref().map(|c| &c.raw),
        };

        let reply = match self.transport.send(&request).await {
            Ok(ChatReply::Response(reply)) => Some(reply),
            Ok(ChatReply::Error(e)) => {
                error!(error = %e, "chat backend reported an error");
                None
            }
            Err(e) => {
                error!(error = %e, "chat request failed");
                None
            }
        };

        self.surface.hide_typing(TYPING_INDICATOR_ID);

        match reply {
            Some(reply) => {
                self.surface.append(&ChatMessage::assistant(reply));
                SendOutcome::Replied
            }
            None => {
                self.surface.append(&ChatMessage::assistant(APOLOGY_MESSAGE));
                SendOutcome::Apologized
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use nuru_shared::{HandoffSourceConfig, ResolverConfig, TransportConfig};
    use nuru_storage::MemoryStore;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::surface::{SurfaceEntry, TranscriptSurface, message_html};

    fn transport(server: &MockServer) -> ChatClient {
        ChatClient::new(&TransportConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn controller(
        server: &MockServer,
        context: Option<ResolvedContext>,
    ) -> WidgetController<Arc<TranscriptSurface>> {
        WidgetController::new(
            SessionId::from("session_test".to_string()),
            context,
            transport(server),
            Arc::new(TranscriptSurface::new()),
        )
    }

    #[tokio::test]
    async fn reply_is_rendered_after_user_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_json(json!({ "message": "hello", "session_id": "session_test" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "response": "**Hi** there" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let widget = controller(&server, None);
        widget.surface().set_input("  hello  ");

        assert_eq!(widget.send_message("  hello  ").await, SendOutcome::Replied);

        let messages = widget.surface().messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].is_user);
        assert_eq!(messages[0].content, "hello");
        assert_eq!(
            message_html(&messages[1]),
            r#"<div class="message bot-message"><p><strong>Hi</strong> there</p></div>"#
        );
        assert_eq!(widget.surface().input(), "");
        assert!(!widget.surface().is_typing());
        assert!(!widget.is_pending());
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let widget = controller(&server, None);
        assert_eq!(
            widget.send_message(" \n\t ").await,
            SendOutcome::Ignored(IgnoredReason::Blank)
        );
        assert!(widget.surface().entries().is_empty());
    }

    #[tokio::test]
    async fn submission_while_pending_is_ignored() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "response": "first reply" }))
                    .set_delay(Duration::from_millis(300)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let widget = controller(&server, None);

        let (first, second) = tokio::join!(widget.send_message("one"), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            assert!(widget.is_pending());
            widget.send_message("two").await
        });

        assert_eq!(first, SendOutcome::Replied);
        assert_eq!(second, SendOutcome::Ignored(IgnoredReason::Pending));

        let user_messages: Vec<_> = widget
            .surface()
            .messages()
            .into_iter()
            .filter(|m| m.is_user)
            .collect();
        assert_eq!(user_messages.len(), 1);
        assert_eq!(user_messages[0].content, "one");
        assert!(!widget.is_pending());
    }

    #[tokio::test]
    async fn backend_error_shows_single_apology() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "x" })))
            .expect(1)
            .mount(&server)
            .await;

        let widget = controller(&server, None);
        assert_eq!(widget.send_message("hi").await, SendOutcome::Apologized);

        let entries = widget.surface().entries();
        assert_eq!(entries.len(), 2);
        assert!(!entries.iter().any(|e| matches!(e, SurfaceEntry::Typing { .. })));

        let messages = widget.surface().messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, APOLOGY_MESSAGE);
    }

    #[tokio::test]
    async fn transport_failure_shows_apology_and_releases_pending() {
        let widget = WidgetController::new(
            SessionId::from("session_test".to_string()),
            None,
            ChatClient::new(&TransportConfig {
                base_url: "http://127.0.0.1:9".into(),
                timeout: Duration::from_secs(2),
            })
            .unwrap(),
            Arc::new(TranscriptSurface::new()),
        );

        assert_eq!(widget.send_message("hi").await, SendOutcome::Apologized);
        assert!(!widget.is_pending());
        assert!(!widget.surface().is_typing());
        assert_eq!(
            widget.surface().messages().last().map(|m| m.content.as_str()),
            Some(APOLOGY_MESSAGE)
        );
    }

    #[tokio::test]
    async fn resolved_context_is_sent_as_audit_context() {
        let server = MockServer::start().await;
        let raw = json!({ "waste_score": 72, "company_name": "Acme" });

        Mock::given(method("POST"))
            .and(body_json(json!({
                "message": "what now?",
                "session_id": "session_test",
                "audit_context": raw.clone(),
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "ok" })))
            .expect(1)
            .mount(&server)
            .await;

        let widget = controller(&server, Some(ResolvedContext::new("intelligence-audit", raw)));
        assert_eq!(widget.send_message("what now?").await, SendOutcome::Replied);
    }

    #[tokio::test]
    async fn start_greets_with_resolved_context() {
        let backend = MockServer::start().await;
        let scanner = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/session/abc"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "overall_score": 80, "readiness_level": "Ready" })),
            )
            .expect(1)
            .mount(&scanner)
            .await;

        let resolver = ContextResolver::new(&ResolverConfig {
            sources: vec![HandoffSourceConfig {
                name: "readiness-scanner".into(),
                base_url: scanner.uri(),
            }],
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        let sessions = SessionManager::new(MemoryStore::new());
        let page = Url::parse("https://localos.example/#/chat?session=abc").unwrap();

        let widget = WidgetController::start(
            &sessions,
            &resolver,
            Some(&page),
            transport(&backend),
            Arc::new(TranscriptSurface::new()),
        )
        .await;

        assert_eq!(widget.session_id(), &sessions.session_id().await);
        assert_eq!(
            widget.context().map(|c| c.source.as_str()),
            Some("readiness-scanner")
        );

        let messages = widget.surface().messages();
        assert_eq!(messages.len(), 1);
        assert!(!messages[0].is_user);
        assert!(messages[0].content.contains("great shape"));
    }

    #[tokio::test]
    async fn start_without_url_uses_generic_greeting() {
        let backend = MockServer::start().await;
        let resolver = ContextResolver::new(&ResolverConfig {
            sources: Vec::new(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        let sessions = SessionManager::new(MemoryStore::new());

        let widget = WidgetController::start(
            &sessions,
            &resolver,
            None,
            transport(&backend),
            Arc::new(TranscriptSurface::new()),
        )
        .await;

        assert!(widget.context().is_none());
        assert_eq!(
            widget.surface().messages()[0].content,
            crate::greeting::GENERIC_GREETING
        );
    }
}
