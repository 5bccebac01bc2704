//! Widget behaviour for Nuru.
//!
//! Ties session identity, hand-off context discovery, the greeting, the chat
//! transport and the presentation surface into a single [`WidgetController`].

pub mod controller;
pub mod greeting;
pub mod surface;
pub mod transport;

pub use controller::{APOLOGY_MESSAGE, IgnoredReason, SendOutcome, WidgetController};
pub use greeting::{synthesize_greeting, synthesize_greeting_with};
pub use surface::{Surface, SurfaceEntry, TYPING_INDICATOR_ID, TranscriptSurface, message_html};
pub use transport::{ChatClient, HealthStatus};
