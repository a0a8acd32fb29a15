//! Scripted in-memory nodes and a recording combiner.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tessera_client::{
    ClientConfig, NodeEndpoint, NodeFailure, NodeQuorumClient, NodeResult, NodeTransport,
    ShareInput, ThresholdCombiner,
};

pub const SUBNET_KEY: &str = "5eed";
pub const NETWORK_KEY: &str = "0e7e";
pub const KEY_SET: &str = "ab12";

/// How a scripted node answers one route.
#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Fail(NodeFailure),
    /// Never answers.
    Silent,
}

#[derive(Default)]
struct Script {
    replies: Mutex<HashMap<(String, String), Reply>>,
    sent: Mutex<Vec<(String, String, Value)>>,
    requests: AtomicUsize,
}

/// Nodes answer from a script; unscripted routes stay silent.
#[derive(Clone, Default)]
pub struct MockTransport {
    script: Arc<Script>,
}

impl MockTransport {
    pub fn on(&self, node: &NodeEndpoint, path: &str, reply: Reply) {
        self.script
            .replies
            .lock()
            .unwrap()
            .insert((node.to_string(), path.to_string()), reply);
    }

    /// Requests issued so far, any route.
    pub fn requests(&self) -> usize {
        self.script.requests.load(Ordering::SeqCst)
    }

    /// Bodies sent to `path`.
    pub fn bodies(&self, path: &str) -> Vec<Value> {
        self.script
            .sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, p, _)| p == path)
            .map(|(_, _, b)| b.clone())
            .collect()
    }
}

impl NodeTransport for MockTransport {
    fn send(
        &self,
        node: &NodeEndpoint,
        path: &str,
        body: &Value,
    ) -> impl Future<Output = NodeResult<Value>> + Send {
        self.script.requests.fetch_add(1, Ordering::SeqCst);
        self.script
            .sent
            .lock()
            .unwrap()
            .push((node.to_string(), path.to_string(), body.clone()));

        let reply = self
            .script
            .replies
            .lock()
            .unwrap()
            .get(&(node.to_string(), path.to_string()))
            .cloned()
            .unwrap_or(Reply::Silent);

        async move {
            match reply {
                Reply::Json(v) => Ok(v),
                Reply::Fail(f) => Err(f),
                Reply::Silent => futures::future::pending().await,
            }
        }
    }
}

/// Deterministic stand-in for the threshold backend.
///
/// Signatures are the share indices as bytes; decryption returns the
/// indices followed by the ciphertext; encryption prefixes the key.
#[derive(Default)]
pub struct RecordingCombiner {
    pub seen: Mutex<Vec<Vec<u32>>>,
}

impl RecordingCombiner {
    pub fn last_indices(&self) -> Vec<u32> {
        self.seen.lock().unwrap().last().cloned().unwrap_or_default()
    }

    fn record(&self, shares: &[ShareInput]) -> Vec<u8> {
        let indices: Vec<u32> = shares.iter().map(|s| s.index).collect();
        self.seen.lock().unwrap().push(indices.clone());
        indices.into_iter().map(|i| i as u8).collect()
    }
}

impl ThresholdCombiner for RecordingCombiner {
    fn combine_signature_shares(
        &self,
        public_key_set: &[u8],
        shares: &[ShareInput],
    ) -> Result<Vec<u8>, String> {
        assert_eq!(public_key_set, hex::decode(KEY_SET).unwrap());
        Ok(self.record(shares))
    }

    fn combine_decryption_shares(
        &self,
        _public_key_set: &[u8],
        shares: &[ShareInput],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, String> {
        let mut out = self.record(shares);
        out.extend_from_slice(ciphertext);
        Ok(out)
    }

    fn encrypt_under_network_key(
        &self,
        public_key: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, String> {
        let mut out = public_key.to_vec();
        out.extend_from_slice(plaintext);
        Ok(out)
    }
}

/// Route client logs to the test harness; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("tessera=debug")
        .with_test_writer()
        .try_init();
}

pub fn nodes(n: usize) -> Vec<NodeEndpoint> {
    (0..n)
        .map(|i| NodeEndpoint::parse(&format!("http://127.0.0.1:{}", 7370 + i)).unwrap())
        .collect()
}

pub fn handshake_reply(subnet_key: &str) -> Reply {
    Reply::Json(json!({
        "serverPublicKey": "serverkey",
        "subnetPublicKey": subnet_key,
        "networkPublicKey": NETWORK_KEY,
        "networkPublicKeySet": KEY_SET,
    }))
}

pub fn signing_reply(index: u32, share: &str, unsigned: &str) -> Reply {
    Reply::Json(json!({
        "shareIndex": index,
        "signatureShare": share,
        "unsignedJwt": unsigned,
    }))
}

pub fn node_error(code: &str) -> Reply {
    Reply::Fail(NodeFailure::Reported(json!({
        "errorCode": code,
        "message": format!("{} from node", code),
    })))
}

pub fn config(endpoints: Vec<NodeEndpoint>, min: usize) -> ClientConfig {
    ClientConfig::default()
        .with_nodes(endpoints)
        .with_min_node_count(min)
}

/// Build a client and wait until every node that will answer has handshaked.
pub async fn connected_client(
    mock: &MockTransport,
    config: ClientConfig,
    combiner: Arc<RecordingCombiner>,
    expected_connected: usize,
) -> NodeQuorumClient<MockTransport> {
    let client = NodeQuorumClient::with_transport(config, mock.clone(), combiner).unwrap();
    client.connect().await.unwrap();

    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        while client.connected_nodes().await.len() < expected_connected {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("late handshakes never arrived");

    client
}
