//! HTTP verbs supported by service invocation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Verb of a forwarded invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    /// Read.
    Get,
    /// Create.
    Post,
    /// Replace / action.
    Put,
    /// Remove.
    Delete,
}

impl HttpVerb {
    /// Transport method for this verb.
    #[must_use]
    pub const fn as_method(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }

    /// Parse a transport method; `None` for verbs outside the closed set.
    #[must_use]
    pub fn from_method(method: &reqwest::Method) -> Option<Self> {
        [Self::Get, Self::Post, Self::Put, Self::Delete]
            .into_iter()
            .find(|verb| verb.as_method() == *method)
    }

    /// Whether repeating the call has the same effect as issuing it once.
    #[must_use]
    pub const fn is_idempotent(self) -> bool {
        matches!(self, Self::Get | Self::Put | Self::Delete)
    }

    /// Upper-case verb name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
