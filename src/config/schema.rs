//! Configuration schema definitions.
//!
//! All types derive Serde traits and default every field, so a minimal
//! (or empty) TOML document is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::backend::BackendKind;

/// Root configuration for a service.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Settings for the root application.
    pub application: AppConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Application settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Mount prefix; empty mounts at the root.
    pub prefix: String,

    /// Version also served without a version segment; -1 for none.
    pub default_version: i32,

    /// Treat `/a` and `/a/` as the same path.
    pub strict_slash: bool,

    /// Accept routes without a version.
    pub allow_legacy_routes: bool,

    /// Render versions as `/1` instead of `/v1`.
    pub simple_versions: bool,

    /// Router backend.
    pub router: BackendKind,

    pub host: String,

    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            default_version: -1,
            strict_slash: true,
            allow_legacy_routes: false,
            simple_versions: false,
            router: BackendKind::Axum,
            host: String::new(),
            port: 3000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level filter (trace, debug, info, warn, error) used when
    /// `RUST_LOG` is unset.
    pub log_level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}
