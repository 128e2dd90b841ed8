//! Authentication abstractions.
//!
//! # Responsibilities
//! - Define the user, authenticator, user manager and provider contracts
//! - Ship basic in-memory implementations (basic.rs)
//!
//! # Design Decisions
//! - The routing engine knows nothing about these types; they only reach
//!   requests through the auth middleware, as request-context values
//! - Trait objects behind `Arc` so one provider can serve every request task

pub mod basic;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::http::Request;

pub use basic::{BasicAuthenticator, BasicProvider, BasicUser, MemoryUserManager};

/// An authenticated principal.
pub trait User: fmt::Debug + Send + Sync {
    fn username(&self) -> &str;
    fn email(&self) -> &str;
    fn display_name(&self) -> String;
    fn api_key(&self) -> &str;
    fn roles(&self) -> Vec<String>;
}

pub type SharedUser = Arc<dyn User>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("user '{0}' does not exist")]
    UserNotFound(String),

    #[error("no user for the given token")]
    InvalidToken,

    #[error("request carries no credentials")]
    MissingCredentials,

    #[error("invalid credentials for '{0}'")]
    InvalidCredentials(String),

    #[error("auth provider is incomplete")]
    Incomplete,

    #[error("must open auth provider before reloading")]
    NotOpen,
}

/// Answers access questions about users.
pub trait Authenticator: Send + Sync {
    fn check_authenticated(&self, user: &dyn User) -> bool;
    fn check_group_access(&self, user: &dyn User, group: &str) -> bool;
    fn check_resource_access(&self, user: &dyn User, resource: &str) -> bool;
    fn user_from_request(
        &self,
        manager: &dyn UserManager,
        req: &Request,
    ) -> Result<SharedUser, AuthError>;
}

/// Looks up, creates and issues tokens for users.
pub trait UserManager: Send + Sync {
    fn user_by_token(&self, token: &str) -> Result<SharedUser, AuthError>;
    fn user_by_id(&self, id: &str) -> Result<SharedUser, AuthError>;
    fn get_or_create_user(&self, user: &dyn User) -> Result<SharedUser, AuthError>;
    fn create_user_token(&self, username: &str, password: &str) -> Result<String, AuthError>;
}

/// Bundles an authenticator and user manager behind an open/close lifecycle.
///
/// Both accessors return `None` until the provider is opened.
pub trait Provider: Send + Sync {
    fn open(&self) -> Result<(), AuthError>;
    fn reload(&self) -> Result<(), AuthError>;
    fn close(&self) -> Result<(), AuthError>;
    fn authenticator(&self) -> Option<Arc<dyn Authenticator>>;
    fn user_manager(&self) -> Option<Arc<dyn UserManager>>;
}
