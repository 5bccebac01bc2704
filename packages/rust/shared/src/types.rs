//! Core domain types for the chat widget.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Fixed key under which the session identifier is persisted.
pub const SESSION_STORAGE_KEY: &str = "nuru_session_id";

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// Opaque per-browser session token correlating chat turns server-side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Synthesize a fresh identifier: a UUID v7 (millisecond timestamp plus
    /// random bits) rendered without hyphens.
    pub fn generate() -> Self {
        Self(format!("session_{}", Uuid::now_v7().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// HandoffContext
// ---------------------------------------------------------------------------

/// Hand-off data produced by the ROI Projector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiContext {
    #[serde(default)]
    pub process_name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub annual_savings: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub roi_percentage: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub breakeven_months: f64,
    #[serde(default)]
    pub risk_level: String,
}

/// Hand-off data produced by the AI Readiness Scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessContext {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub overall_score: f64,
    #[serde(default)]
    pub readiness_level: String,
}

/// Hand-off data produced by the Intelligence Waste Audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditContext {
    #[serde(default)]
    pub company_name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub waste_score: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_hours_wasted: f64,
    #[serde(default)]
    pub top_waste_zones: Vec<WasteZone>,
}

/// One entry of an audit's `top_waste_zones`. Producers send either a bare
/// name or an object with a name and an optional hour count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WasteZone {
    Name(String),
    Detailed {
        #[serde(alias = "zone", alias = "area")]
        name: String,
        #[serde(default, alias = "hours_wasted")]
        hours: Option<f64>,
    },
}

impl WasteZone {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Detailed { name, .. } => name,
        }
    }

    pub fn hours(&self) -> Option<f64> {
        match self {
            Self::Name(_) => None,
            Self::Detailed { hours, .. } => *hours,
        }
    }
}

/// Hand-off context, tagged once when it is resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum HandoffContext {
    Roi(RoiContext),
    Readiness(ReadinessContext),
    Audit(AuditContext),
    /// A session record with none of the known shapes. Still forwarded to
    /// the backend, but greeted generically.
    Unrecognized,
}

impl HandoffContext {
    /// Tag a session body by field presence: `annual_savings`, then
    /// `overall_score`, then `waste_score`.
    pub fn classify(raw: &Value) -> Self {
        let Some(obj) = raw.as_object() else {
            return Self::Unrecognized;
        };

        let parsed = if obj.contains_key("annual_savings") {
            serde_json::from_value(raw.clone()).map(Self::Roi)
        } else if obj.contains_key("overall_score") {
            serde_json::from_value(raw.clone()).map(Self::Readiness)
        } else if obj.contains_key("waste_score") {
            serde_json::from_value(raw.clone()).map(Self::Audit)
        } else {
            return Self::Unrecognized;
        };

        parsed.unwrap_or_else(|e| {
            tracing::debug!(error = %e, "hand-off body has a known key but a malformed shape");
            Self::Unrecognized
        })
    }

    /// Short label for logs and the TUI.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Roi(_) => "roi",
            Self::Readiness(_) => "readiness",
            Self::Audit(_) => "audit",
            Self::Unrecognized => "unrecognized",
        }
    }
}

/// The first successful probe's answer.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedContext {
    /// Name of the tool that answered.
    pub source: String,
    /// Tagged shape, used for greeting selection.
    pub context: HandoffContext,
    /// The body as received, forwarded verbatim with every chat request.
    pub raw: Value,
}

impl ResolvedContext {
    pub fn new(source: impl Into<String>, raw: Value) -> Self {
        Self {
            source: source.into(),
            context: HandoffContext::classify(&raw),
            raw,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
    Null,
}

/// Accept `42`, `42.5`, `"42"`, `"1,200"`; `null` becomes zero.
fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(s) => s
            .trim()
            .replace(',', "")
            .parse()
            .map_err(serde::de::Error::custom),
        NumberOrText::Null => Ok(0.0),
    }
}

// ---------------------------------------------------------------------------
// ChatMessage
// ---------------------------------------------------------------------------

/// A single entry of the append-only message log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub content: String,
    pub is_user: bool,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_user: true,
            sent_at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_user: false,
            sent_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types (POST /api/chat)
// ---------------------------------------------------------------------------

/// Request body for `POST /api/chat`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
    pub session_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_context: Option<&'a Value>,
}

/// Response body for `POST /api/chat`. Either field may be absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResponseBody {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Backend outcome once the body has been decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatReply {
    Response(String),
    /// Application error reported by the backend. Never shown to the end user.
    Error(String),
}

impl From<ChatResponseBody> for ChatReply {
    fn from(body: ChatResponseBody) -> Self {
        match (body.response, body.error) {
            (Some(reply), _) if !reply.is_empty() => Self::Response(reply),
            (_, Some(error)) => Self::Error(error),
            _ => Self::Error("empty reply".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn session_id_format() {
        let id = SessionId::generate();
        assert!(id.as_str().starts_with("session_"));
        assert_eq!(id.as_str().len(), "session_".len() + 32);
        assert_ne!(id, SessionId::generate());
    }

    #[test]
    fn classify_roi_first() {
        // A body carrying both markers is still ROI-shaped.
        let raw = json!({
            "process_name": "Invoice matching",
            "annual_savings": "48,000",
            "roi_percentage": 320,
            "breakeven_months": 4,
            "risk_level": "low",
            "overall_score": 90
        });
        match HandoffContext::classify(&raw) {
            HandoffContext::Roi(roi) => {
                assert_eq!(roi.annual_savings, 48_000.0);
                assert_eq!(roi.risk_level, "low");
            }
            other => panic!("expected Roi, got {other:?}"),
        }
    }

    #[test]
    fn classify_readiness_and_audit() {
        let readiness = json!({ "overall_score": 65, "readiness_level": "Developing" });
        assert_eq!(HandoffContext::classify(&readiness).kind(), "readiness");

        let audit = json!({
            "company_name": "Acme",
            "waste_score": 72,
            "total_hours_wasted": 140,
            "top_waste_zones": ["Reporting", { "zone": "Email triage", "hours": 30 }]
        });
        match HandoffContext::classify(&audit) {
            HandoffContext::Audit(a) => {
                assert_eq!(a.top_waste_zones.len(), 2);
                assert_eq!(a.top_waste_zones[1].name(), "Email triage");
                assert_eq!(a.top_waste_zones[1].hours(), Some(30.0));
            }
            other => panic!("expected Audit, got {other:?}"),
        }
    }

    #[test]
    fn classify_unknown_and_malformed() {
        assert_eq!(
            HandoffContext::classify(&json!({ "foo": 1 })),
            HandoffContext::Unrecognized
        );
        assert_eq!(
            HandoffContext::classify(&json!(["not", "an", "object"])),
            HandoffContext::Unrecognized
        );
        assert_eq!(
            HandoffContext::classify(&json!({ "overall_score": "high" })),
            HandoffContext::Unrecognized
        );
    }

    #[test]
    fn chat_request_omits_missing_context() {
        let req = ChatRequest {
            message: "hi",
            session_id: "session_1",
            audit_context: None,
        };
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body, json!({ "message": "hi", "session_id": "session_1" }));

        let ctx = json!({ "waste_score": 10 });
        let req = ChatRequest {
            audit_context: Some(&ctx),
            ..req
        };
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["audit_context"]["waste_score"], 10);
    }

    #[test]
    fn reply_from_body() {
        let body: ChatResponseBody =
            serde_json::from_str(r#"{"response":"Hello","session_id":"s"}"#).unwrap();
        assert_eq!(ChatReply::from(body), ChatReply::Response("Hello".into()));

        let body: ChatResponseBody = serde_json::from_str(r#"{"error":"boom"}"#).unwrap();
        assert_eq!(ChatReply::from(body), ChatReply::Error("boom".into()));

        let body: ChatResponseBody = serde_json::from_str("{}").unwrap();
        assert!(matches!(ChatReply::from(body), ChatReply::Error(_)));
    }
}
