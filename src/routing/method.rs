//! HTTP methods accepted by routes.

use std::collections::BTreeSet;
use std::fmt;

use axum::routing::MethodFilter;

/// The methods a route can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
    Patch,
}

/// Methods accepted by a single route.
pub type MethodSet = BTreeSet<Method>;

impl Method {
    pub const ALL: [Method; 5] = [
        Method::Get,
        Method::Put,
        Method::Post,
        Method::Delete,
        Method::Patch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
        }
    }

    pub fn to_http(self) -> axum::http::Method {
        match self {
            Method::Get => axum::http::Method::GET,
            Method::Put => axum::http::Method::PUT,
            Method::Post => axum::http::Method::POST,
            Method::Delete => axum::http::Method::DELETE,
            Method::Patch => axum::http::Method::PATCH,
        }
    }

    /// `None` for methods routes cannot be declared with (HEAD, OPTIONS, ...).
    pub fn from_http(method: &axum::http::Method) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.to_http() == *method)
    }

    pub(crate) fn filter(self) -> MethodFilter {
        match self {
            Method::Get => MethodFilter::GET,
            Method::Put => MethodFilter::PUT,
            Method::Post => MethodFilter::POST,
            Method::Delete => MethodFilter::DELETE,
            Method::Patch => MethodFilter::PATCH,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Combined axum filter for a method set; `None` when the set is empty.
pub(crate) fn method_filter(methods: &MethodSet) -> Option<MethodFilter> {
    methods
        .iter()
        .map(|m| m.filter())
        .reduce(|acc, f| acc.or(f))
}
