//! In-memory auth implementations.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::auth::{AuthError, Authenticator, Provider, SharedUser, User, UserManager};
use crate::http::Request;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicUser {
    pub id: String,
    pub email: String,
    pub key: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl BasicUser {
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        key: impl Into<String>,
        roles: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            key: key.into(),
            roles,
        }
    }

    pub fn from_user(user: &dyn User) -> Self {
        Self::new(user.username(), user.email(), user.api_key(), user.roles())
    }
}

impl User for BasicUser {
    fn username(&self) -> &str {
        &self.id
    }

    fn email(&self) -> &str {
        &self.email
    }

    fn display_name(&self) -> String {
        format!("{} <{}>", self.id, self.email)
    }

    fn api_key(&self) -> &str {
        &self.key
    }

    fn roles(&self) -> Vec<String> {
        self.roles.clone()
    }
}

/// Bearer token from the `Authorization` header.
fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authenticator over a fixed set of known users and group memberships.
#[derive(Debug, Clone, Default)]
pub struct BasicAuthenticator {
    users: HashSet<String>,
    groups: HashMap<String, HashSet<String>>,
}

impl BasicAuthenticator {
    /// `groups` maps a group name to the usernames in it. Users are also
    /// members of every group named in their roles.
    pub fn new<'a>(
        users: impl IntoIterator<Item = &'a dyn User>,
        groups: HashMap<String, Vec<String>>,
    ) -> Self {
        Self {
            users: users.into_iter().map(|u| u.username().to_string()).collect(),
            groups: groups
                .into_iter()
                .map(|(group, members)| (group, members.into_iter().collect()))
                .collect(),
        }
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

impl Authenticator for BasicAuthenticator {
    fn check_authenticated(&self, user: &dyn User) -> bool {
        self.users.contains(user.username())
    }

    fn check_group_access(&self, user: &dyn User, group: &str) -> bool {
        if !self.check_authenticated(user) {
            return false;
        }
        let listed = self
            .groups
            .get(group)
            .is_some_and(|members| members.contains(user.username()));
        listed || user.roles().iter().any(|r| r == group)
    }

    fn check_resource_access(&self, user: &dyn User, resource: &str) -> bool {
        self.check_group_access(user, resource)
    }

    fn user_from_request(
        &self,
        manager: &dyn UserManager,
        req: &Request,
    ) -> Result<SharedUser, AuthError> {
        let token = bearer_token(req).ok_or(AuthError::MissingCredentials)?;
        manager.user_by_token(token)
    }
}

/// Concurrent in-memory user store with token issuance.
#[derive(Debug, Default)]
pub struct MemoryUserManager {
    users: DashMap<String, BasicUser>,
    tokens: DashMap<String, String>,
    issued: AtomicU64,
}

impl MemoryUserManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = BasicUser>) -> Self {
        let manager = Self::new();
        for user in users {
            manager.users.insert(user.id.clone(), user);
        }
        manager
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserManager for MemoryUserManager {
    fn user_by_token(&self, token: &str) -> Result<SharedUser, AuthError> {
        let id = self
            .tokens
            .get(token)
            .map(|entry| entry.value().clone())
            .ok_or(AuthError::InvalidToken)?;
        self.user_by_id(&id)
    }

    fn user_by_id(&self, id: &str) -> Result<SharedUser, AuthError> {
        self.users
            .get(id)
            .map(|entry| Arc::new(entry.value().clone()) as SharedUser)
            .ok_or_else(|| AuthError::UserNotFound(id.to_string()))
    }

    fn get_or_create_user(&self, user: &dyn User) -> Result<SharedUser, AuthError> {
        let stored = self
            .users
            .entry(user.username().to_string())
            .or_insert_with(|| BasicUser::from_user(user))
            .value()
            .clone();
        Ok(Arc::new(stored))
    }

    /// Issue a token for `username`; the password is the user's API key.
    fn create_user_token(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let user = self.user_by_id(username)?;
        if user.api_key() != password {
            return Err(AuthError::InvalidCredentials(username.to_string()));
        }

        let n = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
        let token = format!("{}.{}", username, n);
        self.tokens.insert(token.clone(), username.to_string());
        Ok(token)
    }
}

/// Provider over a fixed authenticator and user manager.
pub struct BasicProvider {
    authenticator: Option<Arc<dyn Authenticator>>,
    user_manager: Option<Arc<dyn UserManager>>,
    open: AtomicBool,
}

impl BasicProvider {
    pub fn new(
        authenticator: Option<Arc<dyn Authenticator>>,
        user_manager: Option<Arc<dyn UserManager>>,
    ) -> Self {
        Self {
            authenticator,
            user_manager,
            open: AtomicBool::new(false),
        }
    }

    fn is_complete(&self) -> bool {
        self.authenticator.is_some() && self.user_manager.is_some()
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}

impl Provider for BasicProvider {
    /// Marks the provider open even when incomplete, then reports it.
    fn open(&self) -> Result<(), AuthError> {
        self.open.store(true, Ordering::Release);
        if !self.is_complete() {
            return Err(AuthError::Incomplete);
        }
        Ok(())
    }

    fn reload(&self) -> Result<(), AuthError> {
        if !self.is_open() {
            return Err(AuthError::NotOpen);
        }
        if !self.is_complete() {
            return Err(AuthError::Incomplete);
        }
        Ok(())
    }

    fn close(&self) -> Result<(), AuthError> {
        self.open.store(false, Ordering::Release);
        Ok(())
    }

    fn authenticator(&self) -> Option<Arc<dyn Authenticator>> {
        if !self.is_open() {
            return None;
        }
        self.authenticator.clone()
    }

    fn user_manager(&self) -> Option<Arc<dyn UserManager>> {
        if !self.is_open() {
            return None;
        }
        self.user_manager.clone()
    }
}
