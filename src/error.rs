//! Error types for route registration, resolution and merging.
//!
//! # Design Decisions
//! - One `Error` variant per failure kind; callers match on variants, not strings
//! - Multi-cause operations (resolve, merge, assemble) return `ErrorList`
//!   so the caller sees every problem at once instead of the first one
//! - Malformed input never panics; it becomes an entry in an `ErrorList`

use std::fmt;

use thiserror::Error;

use crate::backend::BackendKind;

/// Why a single route could not be attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RouteDefect {
    /// Negative version in an application that does not allow legacy routes.
    #[error("version {0} is only valid when legacy routes are allowed")]
    Unversioned(i32),

    #[error("no methods are defined")]
    NoMethods,

    #[error("no handler is defined")]
    NoHandler,
}

/// A single failure raised by the routing engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The router backend selector is missing or unusable.
    #[error("improperly specified router implementation '{0}'")]
    InvalidBackend(BackendKind),

    /// A middleware value is not one of the supported shapes.
    #[error("middleware #{index} for {scope} is {type_name}, which is not supported")]
    InvalidMiddleware {
        scope: String,
        index: usize,
        type_name: String,
    },

    #[error("{route} is not a valid route, skipping: {defect}")]
    InvalidRoute { route: String, defect: RouteDefect },

    #[error("route prefix '{0}' defined more than once")]
    DuplicatePrefix(String),

    #[error("cannot merge route '{pattern}' (version {version}) with existing application that already has this route defined")]
    DuplicateRoute { pattern: String, version: i32 },

    /// The backend refused a registration (conflict or caught panic).
    #[error("router rejected '{path}': {message}")]
    Registration { path: String, message: String },

    #[error("application is already resolved")]
    AlreadyResolved,

    #[error("application is not resolved")]
    NotResolved,

    #[error("can only call merge once per root application")]
    AlreadyMerged,

    #[error("cannot merge applications into an application with a prefix")]
    PrefixedMergeTarget,

    #[error("must specify at least one application")]
    NoApplications,

    #[error("cannot merge applications: app #{index} uses {found}, and all apps must use {expected}")]
    MixedBackends {
        index: usize,
        found: BackendKind,
        expected: BackendKind,
    },

    #[error("{0} is not a valid version")]
    InvalidVersion(i32),

    #[error("port {0} is not in the permitted range 1024-65535")]
    InvalidPort(u16),
}

/// An ordered collection of zero or more [`Error`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorList {
    errors: Vec<Error>,
}

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, err: Error) {
        self.errors.push(err);
    }

    /// Record the error half of a result, discarding the success value.
    pub fn add<T>(&mut self, result: Result<T, Error>) {
        if let Err(err) = result {
            self.errors.push(err);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.errors.iter()
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// `Ok(())` when nothing was collected, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), ErrorList> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return write!(f, "no errors");
        }
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorList {}

impl From<Error> for ErrorList {
    fn from(err: Error) -> Self {
        Self { errors: vec![err] }
    }
}

impl Extend<Error> for ErrorList {
    fn extend<I: IntoIterator<Item = Error>>(&mut self, iter: I) {
        self.errors.extend(iter);
    }
}

impl IntoIterator for ErrorList {
    type Item = Error;
    type IntoIter = std::vec::IntoIter<Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorList {
    type Item = &'a Error;
    type IntoIter = std::slice::Iter<'a, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list_resolves_ok() {
        let list = ErrorList::new();
        assert!(list.is_empty());
        assert!(list.into_result().is_ok());
    }

    #[test]
    fn test_display_joins_causes() {
        let mut list = ErrorList::new();
        list.push(Error::DuplicatePrefix("/foo".into()));
        list.add::<()>(Err(Error::AlreadyMerged));
        list.add(Ok::<_, Error>(42));

        assert_eq!(list.len(), 2);
        assert_eq!(
            list.to_string(),
            "route prefix '/foo' defined more than once; can only call merge once per root application"
        );
        assert!(list.into_result().is_err());
    }
}
