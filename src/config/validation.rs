//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ports, versions) and the backend selector
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: ServiceConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;

use crate::config::schema::ServiceConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("application.port {0} is outside 1024-65535")]
    Port(u16),

    #[error("application.default_version {0} must be -1 or non-negative")]
    DefaultVersion(i32),

    #[error("application.router must select a backend")]
    Router,

    /// Neither a plain level nor a `target=level` directive.
    #[error("observability.log_level '{0}' is not a valid filter")]
    LogLevel(String),
}

const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let app = &config.application;

    if app.port < 1024 {
        errors.push(ValidationError::Port(app.port));
    }
    if app.default_version < -1 {
        errors.push(ValidationError::DefaultVersion(app.default_version));
    }
    if !app.router.is_defined() {
        errors.push(ValidationError::Router);
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    let is_directive = level.contains('=');
    if !is_directive && !LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::LogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
