//! Node connection: one request/response exchange with one node.
//!
//! A transport performs a single attempt and classifies the result. It does
//! not retry; a failed exchange is a [`NodeFailure`] value for the round to
//! account for, never an error thrown at the caller.

use std::future::Future;

use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tessera_quorum::{NodeFailure, NodeResult};
use tracing::debug;

use crate::config::ClientConfig;
use crate::endpoint::NodeEndpoint;
use crate::error::Result;
use crate::protocol::{CLIENT_VERSION, VERSION_HEADER};

/// Sends one JSON command to one node.
pub trait NodeTransport: Send + Sync + 'static {
    /// POST `body` to `path` on `node` and return the JSON response body.
    fn send(
        &self,
        node: &NodeEndpoint,
        path: &str,
        body: &Value,
    ) -> impl Future<Output = NodeResult<Value>> + Send;
}

/// HTTP transport backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport honouring the configured request timeout.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl NodeTransport for HttpTransport {
    async fn send(&self, node: &NodeEndpoint, path: &str, body: &Value) -> NodeResult<Value> {
        let url = node.join(path);
        debug!(%url, %body, "Sending command to node");

        let response = self
            .client
            .post(&url)
            .header(VERSION_HEADER, CLIENT_VERSION)
            .json(body)
            .send()
            .await
            // Strip the URL so identical failures on different nodes vote together
            .map_err(|e| NodeFailure::Unreachable(e.without_url().to_string()))?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"));

        let data = if is_json {
            match response.json::<Value>().await {
                Ok(v) => Some(v),
                Err(e) if status.is_success() => {
                    return Err(NodeFailure::Malformed(e.without_url().to_string()));
                }
                Err(_) => None,
            }
        } else {
            None
        };

        if !status.is_success() {
            debug!(%url, status = status.as_u16(), "Node returned error status");
            return Err(match data {
                Some(body) => NodeFailure::Reported(body),
                None => NodeFailure::Status(status.as_u16()),
            });
        }

        data.ok_or_else(|| NodeFailure::Malformed("response is not JSON".to_string()))
    }
}
