//! Node endpoints.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Immutable base URL of one remote node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeEndpoint(String);

impl NodeEndpoint {
    /// Parse and normalize an endpoint (http or https, lowercase scheme and
    /// host, no trailing slash).
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let url = reqwest::Url::parse(trimmed)
            .map_err(|e| Error::Config(format!("invalid node endpoint {:?}: {}", s, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "node endpoint {:?} must use http or https",
                s
            )));
        }

        Ok(Self(url.as_str().trim_end_matches('/').to_string()))
    }

    /// For compile-time constants already known to be well formed.
    pub(crate) fn from_static(s: &'static str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Full URL of a route on this node.
    pub fn join(&self, path: &str) -> String {
        format!("{}{}", self.0, path)
    }
}

impl fmt::Display for NodeEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NodeEndpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for NodeEndpoint {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<NodeEndpoint> for String {
    fn from(e: NodeEndpoint) -> Self {
        e.0
    }
}
