//! Shared types, error model, and configuration for the Nuru chat widget.
//!
//! This crate is the foundation depended on by all other Nuru crates.
//! It provides:
//! - [`NuruError`], the unified error type
//! - Domain types ([`SessionId`], [`HandoffContext`], [`ChatMessage`], wire types)
//! - Configuration ([`AppConfig`], [`TransportConfig`], [`ResolverConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BackendConfig, HandoffConfig, HandoffSourceConfig, ResolverConfig, StorageConfig,
    TransportConfig, config_dir, config_file_path, expand_home, init_config, load_config,
    load_config_from,
};
pub use error::{NuruError, Result};
pub use types::{
    AuditContext, ChatMessage, ChatReply, ChatRequest, ChatResponseBody, HandoffContext,
    ReadinessContext, ResolvedContext, RoiContext, SESSION_STORAGE_KEY, SessionId, WasteZone,
};
