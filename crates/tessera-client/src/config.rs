//! Client configuration.
//!
//! Configuration is an explicit value handed to the client at construction.
//! It is assembled once from defaults, an optional JSON override file and
//! environment variables (later sources win) and never re-read afterwards.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::endpoint::NodeEndpoint;
use crate::error::{Error, Result};

/// Minimum agreeing nodes when nothing else is configured.
pub const DEFAULT_MIN_NODE_COUNT: usize = 6;

/// Default node set.
pub const DEFAULT_BOOTSTRAP_URLS: [&str; 10] = [
    "https://node2.litgateway.com:7370",
    "https://node2.litgateway.com:7371",
    "https://node2.litgateway.com:7372",
    "https://node2.litgateway.com:7373",
    "https://node2.litgateway.com:7374",
    "https://node2.litgateway.com:7375",
    "https://node2.litgateway.com:7376",
    "https://node2.litgateway.com:7377",
    "https://node2.litgateway.com:7378",
    "https://node2.litgateway.com:7379",
];

/// Environment variable naming the JSON override file.
pub const CONFIG_FILE_VAR: &str = "TESSERA_CONFIG";

/// What to do when signing shares disagree on the unsigned artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactPolicy {
    /// Log a warning and combine using the majority artifact.
    #[default]
    Warn,
    /// Fail the operation with [`Error::ArtifactMismatch`].
    Reject,
}

impl FromStr for ArtifactPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warn" => Ok(Self::Warn),
            "reject" => Ok(Self::Reject),
            other => Err(Error::Config(format!("unknown artifact policy {:?}", other))),
        }
    }
}

/// Configuration for a node quorum client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Node set contacted on connect.
    pub bootstrap_urls: Vec<NodeEndpoint>,

    /// Minimum number of agreeing nodes for any round to be trusted.
    pub min_node_count: usize,

    /// Verbose logging (debug level for per-node traffic).
    pub debug: bool,

    /// Leniency when shares sign different artifacts.
    pub artifact_policy: ArtifactPolicy,

    /// Per-request timeout for the HTTP transport.
    /// `None` leaves the transport's own default in place.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            bootstrap_urls: DEFAULT_BOOTSTRAP_URLS
                .iter()
                .copied()
                .map(NodeEndpoint::from_static)
                .collect(),
            min_node_count: DEFAULT_MIN_NODE_COUNT,
            debug: true,
            artifact_policy: ArtifactPolicy::default(),
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Defaults, then the file named by `TESSERA_CONFIG`, then `TESSERA_*`
    /// environment variables. The result is validated.
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var(CONFIG_FILE_VAR) {
            config = config.apply(ConfigOverride::from_file(path)?);
        }

        config = config.apply(ConfigOverride::from_env()?);
        config.validate()?;
        Ok(config)
    }

    /// Overlay every field the override sets.
    #[must_use]
    pub fn apply(mut self, o: ConfigOverride) -> Self {
        if let Some(urls) = o.bootstrap_urls {
            self.bootstrap_urls = urls;
        }
        if let Some(n) = o.min_node_count {
            self.min_node_count = n;
        }
        if let Some(debug) = o.debug {
            self.debug = debug;
        }
        if let Some(policy) = o.artifact_policy {
            self.artifact_policy = policy;
        }
        if let Some(ms) = o.request_timeout_ms {
            self.request_timeout = Some(Duration::from_millis(ms));
        }
        self
    }

    /// Reject configurations under which quorum could never be reached.
    pub fn validate(&self) -> Result<()> {
        if self.min_node_count == 0 {
            return Err(Error::Config("min_node_count must be at least 1".into()));
        }
        if self.min_node_count > self.bootstrap_urls.len() {
            return Err(Error::Config(format!(
                "min_node_count {} exceeds the {} configured nodes",
                self.min_node_count,
                self.bootstrap_urls.len()
            )));
        }

        let mut seen = self.bootstrap_urls.clone();
        seen.sort();
        if let Some(dup) = seen.windows(2).find(|w| w[0] == w[1]) {
            return Err(Error::Config(format!("duplicate node endpoint {}", dup[0])));
        }

        Ok(())
    }

    /// Default tracing filter directive for this configuration.
    pub fn log_directive(&self) -> &'static str {
        if self.debug {
            "tessera=debug"
        } else {
            "tessera=info"
        }
    }

    /// Replace the node set.
    #[must_use]
    pub fn with_nodes(mut self, nodes: Vec<NodeEndpoint>) -> Self {
        self.bootstrap_urls = nodes;
        self
    }

    /// Set the minimum agreeing node count.
    #[must_use]
    pub fn with_min_node_count(mut self, n: usize) -> Self {
        self.min_node_count = n;
        self
    }

    /// Set the artifact divergence policy.
    #[must_use]
    pub fn with_artifact_policy(mut self, policy: ArtifactPolicy) -> Self {
        self.artifact_policy = policy;
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Enable or disable verbose logging.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Partial configuration; every unset field keeps its previous value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverride {
    pub bootstrap_urls: Option<Vec<NodeEndpoint>>,
    pub min_node_count: Option<usize>,
    pub debug: Option<bool>,
    pub artifact_policy: Option<ArtifactPolicy>,
    pub request_timeout_ms: Option<u64>,
}

impl ConfigOverride {
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Read `TESSERA_*` variables from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Read `TESSERA_*` variables through `lookup`.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bootstrap_urls = lookup("TESSERA_BOOTSTRAP_URLS")
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(NodeEndpoint::parse)
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?;

        let min_node_count = lookup("TESSERA_MIN_NODE_COUNT")
            .map(|s| {
                s.trim()
                    .parse::<usize>()
                    .map_err(|e| Error::Config(format!("invalid TESSERA_MIN_NODE_COUNT: {}", e)))
            })
            .transpose()?;

        let debug = lookup("TESSERA_DEBUG")
            .map(|s| match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => Ok(true),
                "0" | "false" | "no" => Ok(false),
                other => Err(Error::Config(format!("invalid TESSERA_DEBUG {:?}", other))),
            })
            .transpose()?;

        let artifact_policy = lookup("TESSERA_ARTIFACT_POLICY")
            .map(|s| s.parse::<ArtifactPolicy>())
            .transpose()?;

        let request_timeout_ms = lookup("TESSERA_REQUEST_TIMEOUT_MS")
            .map(|s| {
                s.trim()
                    .parse::<u64>()
                    .map_err(|e| Error::Config(format!("invalid TESSERA_REQUEST_TIMEOUT_MS: {}", e)))
            })
            .transpose()?;

        Ok(Self {
            bootstrap_urls,
            min_node_count,
            debug,
            artifact_policy,
            request_timeout_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = ClientConfig::default();
        assert_eq!(config.bootstrap_urls.len(), 10);
        assert_eq!(config.min_node_count, 6);
        assert!(config.debug);
        assert_eq!(config.artifact_policy, ArtifactPolicy::Warn);
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_impossible_quorum() {
        assert!(ClientConfig::default().with_min_node_count(0).validate().is_err());
        assert!(ClientConfig::default().with_min_node_count(11).validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_nodes() {
        let node = NodeEndpoint::parse("http://127.0.0.1:1").unwrap();
        let config = ClientConfig::default()
            .with_nodes(vec![node.clone(), node])
            .with_min_node_count(1);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn validate_rejects_case_variant_duplicates() {
        let config = ClientConfig::default()
            .with_nodes(vec![
                NodeEndpoint::parse("http://node:7370").unwrap(),
                NodeEndpoint::parse("HTTP://Node:7370/").unwrap(),
            ])
            .with_min_node_count(1);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn env_overrides() {
        let o = ConfigOverride::from_vars(vars(&[
            ("TESSERA_BOOTSTRAP_URLS", "http://a:1, http://b:2,"),
            ("TESSERA_MIN_NODE_COUNT", "2"),
            ("TESSERA_DEBUG", "false"),
            ("TESSERA_ARTIFACT_POLICY", "reject"),
        ]))
        .unwrap();

        let config = ClientConfig::default().apply(o);
        assert_eq!(config.bootstrap_urls.len(), 2);
        assert_eq!(config.min_node_count, 2);
        assert!(!config.debug);
        assert_eq!(config.artifact_policy, ArtifactPolicy::Reject);
        assert_eq!(config.log_directive(), "tessera=info");
        config.validate().unwrap();
    }

    #[test]
    fn env_rejects_bad_values() {
        assert!(ConfigOverride::from_vars(vars(&[("TESSERA_MIN_NODE_COUNT", "six")])).is_err());
        assert!(ConfigOverride::from_vars(vars(&[("TESSERA_DEBUG", "maybe")])).is_err());
        assert!(ConfigOverride::from_vars(vars(&[("TESSERA_BOOTSTRAP_URLS", "::")])).is_err());
    }

    #[test]
    fn empty_env_changes_nothing() {
        let o = ConfigOverride::from_vars(|_| None).unwrap();
        assert_eq!(o, ConfigOverride::default());
    }

    #[test]
    fn file_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"bootstrapUrls": ["http://127.0.0.1:7000"], "minNodeCount": 1, "requestTimeoutMs": 2500}}"#
        )
        .unwrap();

        let config = ClientConfig::default().apply(ConfigOverride::from_file(file.path()).unwrap());
        assert_eq!(config.bootstrap_urls[0].as_str(), "http://127.0.0.1:7000");
        assert_eq!(config.min_node_count, 1);
        assert_eq!(config.request_timeout, Some(Duration::from_millis(2500)));
        assert!(config.debug, "unset fields keep their value");
    }
}
