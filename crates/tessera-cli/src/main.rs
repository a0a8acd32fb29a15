//! tessera CLI tool
//!
//! Inspects a Tessera node set without doing any threshold cryptography.
//!
//! Usage:
//!   tessera connect
//!   tessera config
//!   tessera help

use std::sync::Arc;

use serde_json::json;
use tessera_client::config::CONFIG_FILE_VAR;
use tessera_client::{ClientConfig, NodeQuorumClient, ShareInput, ThresholdCombiner};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// `connect` never combines shares; every call reports the backend missing.
struct NoCombiner;

impl ThresholdCombiner for NoCombiner {
    fn combine_signature_shares(&self, _: &[u8], _: &[ShareInput]) -> Result<Vec<u8>, String> {
        Err("no threshold backend in the CLI".into())
    }

    fn combine_decryption_shares(
        &self,
        _: &[u8],
        _: &[ShareInput],
        _: &[u8],
    ) -> Result<Vec<u8>, String> {
        Err("no threshold backend in the CLI".into())
    }

    fn encrypt_under_network_key(&self, _: &[u8], _: &[u8]) -> Result<Vec<u8>, String> {
        Err("no threshold backend in the CLI".into())
    }
}

fn print_usage() {
    eprintln!("tessera - Inspect a Tessera node set");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  tessera connect   Handshake with the nodes and print the trusted keys");
    eprintln!("  tessera config    Print the effective configuration");
    eprintln!("  tessera help      Show this message");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  {}                   JSON override file", CONFIG_FILE_VAR);
    eprintln!("  TESSERA_BOOTSTRAP_URLS           Comma-separated node URLs");
    eprintln!("  TESSERA_MIN_NODE_COUNT           Minimum agreeing nodes");
    eprintln!("  TESSERA_DEBUG                    Verbose logging (true/false)");
    eprintln!("  TESSERA_ARTIFACT_POLICY          warn or reject");
    eprintln!("  TESSERA_REQUEST_TIMEOUT_MS       Per-request timeout");
    eprintln!("  RUST_LOG                         Overrides the log filter");
}

fn init_tracing(config: &ClientConfig) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_directive().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn connect(config: ClientConfig) -> Result<(), String> {
    let client =
        NodeQuorumClient::new(config, Arc::new(NoCombiner)).map_err(|e| e.to_string())?;
    client.connect().await.map_err(|e| e.to_string())?;

    let nodes: Vec<String> = client
        .connected_nodes()
        .await
        .into_iter()
        .map(String::from)
        .collect();
    let output = json!({
        "readyState": client.ready_state().to_string(),
        "trustedKeys": client.trusted_keys(),
        "connectedNodes": nodes,
    });

    let pretty = serde_json::to_string_pretty(&output).map_err(|e| e.to_string())?;
    println!("{}", pretty);
    Ok(())
}

fn show_config(config: &ClientConfig) -> Result<(), String> {
    let pretty = serde_json::to_string_pretty(config).map_err(|e| e.to_string())?;
    println!("{}", pretty);
    Ok(())
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let command = args[1].as_str();
    if matches!(command, "-h" | "--help" | "help") {
        print_usage();
        std::process::exit(0);
    }

    let config = match ClientConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    init_tracing(&config);

    let result = match command {
        "connect" => connect(config).await,
        "config" => show_config(&config),
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
